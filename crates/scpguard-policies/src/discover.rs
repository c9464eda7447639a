use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use scpguard_types::RepoPath;
use walkdir::WalkDir;

/// Discover policy documents under `root`.
///
/// Every `*.json` file below `root` is a candidate. Hidden directories (`.git`,
/// `.github`, ...) are skipped. Paths are returned relative to `root`, sorted.
pub fn discover_policies(root: &Utf8Path) -> anyhow::Result<Vec<RepoPath>> {
    anyhow::ensure!(root.is_dir(), "policy directory not found: {root}");

    let mut out: Vec<RepoPath> = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = entry.with_context(|| format!("walk {root}"))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(abs) = Utf8PathBuf::from_path_buf(entry.path().to_path_buf()) else {
            tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 path");
            continue;
        };
        if abs.extension() != Some("json") {
            continue;
        }
        let rel = abs.strip_prefix(root).unwrap_or(&abs);
        out.push(RepoPath::new(rel.as_str()));
    }

    // Stable order.
    out.sort();
    out.dedup();

    Ok(out)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}
