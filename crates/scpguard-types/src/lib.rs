//! Stable DTOs and IDs used across the scpguard workspace.
//!
//! This crate is intentionally boring:
//! - data types for the emitted report
//! - stable string IDs and codes
//! - canonical relative path handling
//! - explain registry for remediation guidance

#![forbid(unsafe_code)]

pub mod explain;
pub mod ids;
pub mod path;
pub mod receipt;

pub use explain::{ExamplePair, Explanation, lookup_explanation};
pub use path::RepoPath;
pub use receipt::{
    Finding, Location, RunMeta, SCHEMA_REPORT_V1, ScpguardData, ScpguardReport, Severity,
    ToolMeta, Verdict, VerdictCounts, VerdictEnvelope, VerdictStatus,
};
