//! Policy adapters: discover policy files, read and parse SCP documents.
//!
//! This crate is allowed to do filesystem IO. Parse failures are not errors here:
//! a document that cannot be parsed is kept in the set with `parse_error` so the
//! validity check can report it alongside everything else.

#![forbid(unsafe_code)]

mod discover;
mod parse;

use anyhow::Context;
use camino::Utf8Path;
use rayon::prelude::*;
use scpguard_domain::model::{PolicyDocumentModel, PolicySetModel};
use scpguard_types::RepoPath;

pub use discover::discover_policies;
pub use parse::{PolicyParseError, parse_policy};

/// Fuzz-friendly API for testing parsing robustness without filesystem access.
/// These functions are designed to never panic on any input.
pub mod fuzz {
    use super::*;

    /// Parse arbitrary text as a policy file.
    ///
    /// Returns `Ok(())` when the text is a policy document or describe-policy output,
    /// `Err(...)` otherwise. **Never panics** on any input.
    pub fn parse_policy_text(text: &str) -> Result<(), PolicyParseError> {
        let path = RepoPath::new("fuzz.json");
        let _ = parse::parse_policy(&path, text)?;
        Ok(())
    }
}

/// Read and parse one policy file relative to `root`.
pub fn load_policy(root: &Utf8Path, path: &RepoPath) -> anyhow::Result<PolicyDocumentModel> {
    let abs = root.join(path.as_str());
    let bytes = std::fs::read(&abs).with_context(|| format!("read {abs}"))?;
    let parsed = std::str::from_utf8(&bytes)
        .map_err(PolicyParseError::Utf8)
        .and_then(|text| parse::parse_policy(path, text));
    match parsed {
        Ok(doc) => {
            tracing::debug!(
                path = path.as_str(),
                statements = doc.statements.len(),
                size_chars = doc.size_chars,
                "parsed policy"
            );
            Ok(doc)
        }
        Err(err) => {
            tracing::warn!(path = path.as_str(), error = %err, "policy failed to parse");
            Ok(parse::unparsed_document(path, bytes.len(), &err))
        }
    }
}

/// Build the in-memory policy set used by the engine.
///
/// Files are parsed in parallel; the resulting document order is the sorted
/// discovery order.
pub fn build_policy_set(root: &Utf8Path) -> anyhow::Result<PolicySetModel> {
    let paths = discover::discover_policies(root).context("discover policies")?;
    tracing::info!(root = %root, files = paths.len(), "discovered policy files");

    let documents = paths
        .par_iter()
        .map(|path| load_policy(root, path))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(PolicySetModel {
        root: RepoPath::from(root),
        documents,
    })
}
