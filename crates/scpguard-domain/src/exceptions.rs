//! Time-boxed guardrail exceptions.
//!
//! An exception suppresses findings of one check whose subject matches `target`
//! until (and including) its expiry date.

use globset::{Glob, GlobMatcher};
use schemars::JsonSchema;
use scpguard_types::Finding;
use serde::{Deserialize, Serialize};
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExceptionEntry {
    pub id: String,
    /// Check the exception applies to, or `*` for every check.
    pub check_id: String,
    /// Glob matched against the finding subject.
    pub target: String,
    pub reason: String,
    #[schemars(with = "String")]
    #[serde(with = "iso_date")]
    pub created: Date,
    /// Last day (inclusive) the exception is honoured.
    #[schemars(with = "String")]
    #[serde(with = "iso_date")]
    pub expires: Date,
}

impl ExceptionEntry {
    pub fn is_active(&self, today: Date) -> bool {
        self.expires >= today
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExceptionError {
    #[error("exception {id}: invalid target glob '{target}'")]
    InvalidTarget {
        id: String,
        target: String,
        #[source]
        source: globset::Error,
    },
}

#[derive(Clone, Debug, Default)]
pub struct ExceptionSet {
    entries: Vec<(ExceptionEntry, GlobMatcher)>,
}

impl ExceptionSet {
    pub fn new(entries: Vec<ExceptionEntry>) -> Result<Self, ExceptionError> {
        let entries = entries
            .into_iter()
            .map(|e| match compile_target(&e.target) {
                Ok(matcher) => Ok((e, matcher)),
                Err(source) => Err(ExceptionError::InvalidTarget {
                    id: e.id.clone(),
                    target: e.target.clone(),
                    source,
                }),
            })
            .collect::<Result<Vec<_>, ExceptionError>>()?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> impl Iterator<Item = &ExceptionEntry> {
        self.entries.iter().map(|(e, _)| e)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First active exception covering `check_id` + `subject`.
    pub fn covering(&self, check_id: &str, subject: &str, today: Date) -> Option<&ExceptionEntry> {
        self.entries
            .iter()
            .find(|(e, m)| {
                e.is_active(today)
                    && (e.check_id == "*" || e.check_id == check_id)
                    && m.is_match(subject)
            })
            .map(|(e, _)| e)
    }
}

pub fn compile_target(target: &str) -> Result<GlobMatcher, globset::Error> {
    Ok(Glob::new(target)?.compile_matcher())
}

/// Drop findings covered by an active exception; returns the kept findings and the
/// number suppressed.
pub fn apply_exceptions(
    findings: Vec<Finding>,
    exceptions: &ExceptionSet,
    today: Date,
) -> (Vec<Finding>, u32) {
    if exceptions.is_empty() {
        return (findings, 0);
    }
    let before = findings.len();
    let kept: Vec<Finding> = findings
        .into_iter()
        .filter(|f| exceptions.covering(&f.check_id, f.subject(), today).is_none())
        .collect();
    let suppressed = (before - kept.len()) as u32;
    (kept, suppressed)
}
