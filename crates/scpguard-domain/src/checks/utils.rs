use scpguard_types::{Location, RepoPath};

pub fn doc_location(path: &RepoPath, statement: Option<u32>) -> Option<Location> {
    Some(Location {
        path: path.clone(),
        statement,
    })
}

/// Regions a probe request is evaluated in. An empty allow-list means "no region
/// context", which is a single probe without `aws:RequestedRegion`.
pub fn probe_regions_or_global(regions: &[String]) -> Vec<Option<&str>> {
    if regions.is_empty() {
        vec![None]
    } else {
        regions.iter().map(|r| Some(r.as_str())).collect()
    }
}
