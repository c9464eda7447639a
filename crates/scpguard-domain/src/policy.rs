use globset::{Glob, GlobSet, GlobSetBuilder};
use scpguard_types::Severity;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailOn {
    Error,
    Warn,
}

/// Compiled allowlist of finding subjects (document paths, actions, regions).
#[derive(Clone, Debug, Default)]
pub struct Allowlist {
    set: Option<GlobSet>,
}

impl Allowlist {
    pub fn new(patterns: &[String]) -> Result<Self, globset::Error> {
        if patterns.is_empty() {
            return Ok(Self::default());
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            set: Some(builder.build()?),
        })
    }

    pub fn is_allowed(&self, subject: &str) -> bool {
        self.set
            .as_ref()
            .map(|set| set.is_match(subject))
            .unwrap_or(false)
    }
}

#[derive(Clone, Debug)]
pub struct CheckPolicy {
    pub enabled: bool,
    pub severity: Severity,
    pub allow: Allowlist,
}

impl CheckPolicy {
    pub fn enabled(severity: Severity) -> Self {
        Self {
            enabled: true,
            severity,
            allow: Allowlist::default(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            severity: Severity::Info,
            allow: Allowlist::default(),
        }
    }
}

/// Guardrail parameters shared by the region and protected-action checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Guardrails {
    pub allowed_regions: Vec<String>,
    /// Regions probed for the region restriction. Allowed regions are probed too.
    pub probe_regions: Vec<String>,
    pub probe_action: String,
    pub protected_actions: Vec<String>,
    pub max_policy_chars: usize,
}

#[derive(Clone, Debug)]
pub struct EffectiveConfig {
    pub profile: String,
    pub fail_on: FailOn,
    pub max_findings: usize,
    pub guardrails: Guardrails,
    pub checks: BTreeMap<String, CheckPolicy>,
}

impl EffectiveConfig {
    pub fn check_policy(&self, check_id: &str) -> Option<&CheckPolicy> {
        self.checks.get(check_id).filter(|p| p.enabled)
    }
}
