//! Integration tests for policy set construction against the shared fixtures.

use camino::Utf8PathBuf;
use scpguard_policies::{build_policy_set, discover_policies};
use std::path::PathBuf;

/// Get the path to the test fixtures directory (repo root / tests / fixtures).
fn fixtures_dir() -> Utf8PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    // crates/scpguard-policies -> crates -> repo root
    let repo_root = manifest_dir
        .parent()
        .expect("scpguard-policies should have parent (crates)")
        .parent()
        .expect("crates should have parent (repo root)");
    Utf8PathBuf::from_path_buf(repo_root.join("tests").join("fixtures"))
        .expect("fixture path should be valid UTF-8")
}

#[test]
fn clean_fixture_parses_every_document() {
    let root = fixtures_dir().join("clean").join("policies");
    let model = build_policy_set(&root).expect("build policy set");

    assert!(!model.documents.is_empty());
    for doc in &model.documents {
        assert!(
            doc.parse_error.is_none(),
            "{} failed: {:?}",
            doc.path.as_str(),
            doc.parse_error
        );
        assert_eq!(doc.version.as_deref(), Some("2012-10-17"));
    }
}

#[test]
fn describe_policy_output_uses_summary_name() {
    let root = fixtures_dir().join("clean").join("policies");
    let model = build_policy_set(&root).expect("build policy set");
    let exported = model
        .documents
        .iter()
        .find(|d| d.path.as_str() == "exported/deny-key-deletion.json")
        .expect("exported policy present");
    assert_eq!(exported.name, "DenyKeyDeletion");
}

#[test]
fn discovery_is_idempotent() {
    let root = fixtures_dir().join("clean").join("policies");
    let run1 = discover_policies(&root).expect("first discovery should succeed");
    let run2 = discover_policies(&root).expect("second discovery should succeed");
    assert_eq!(run1, run2);

    let mut sorted = run1.clone();
    sorted.sort();
    assert_eq!(run1, sorted, "discovery order should be lexicographic");
}

#[test]
fn invalid_fixture_reports_parse_errors_in_the_model() {
    let root = fixtures_dir().join("invalid").join("policies");
    let model = build_policy_set(&root).expect("build policy set");
    assert!(model.documents.iter().any(|d| d.parse_error.is_some()));
}
