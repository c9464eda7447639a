use scpguard_domain::policy::{CheckPolicy, EffectiveConfig, FailOn, Guardrails};
use scpguard_types::Severity;
use std::collections::BTreeMap;

/// Regions workloads are allowed to run in.
pub const DEFAULT_ALLOWED_REGIONS: &[&str] = &["eu-west-2", "eu-west-1", "us-east-1"];

/// Actions that must be explicitly denied by the policy set.
pub const DEFAULT_PROTECTED_ACTIONS: &[&str] = &[
    "cloudtrail:StopLogging",
    "cloudtrail:DeleteTrail",
    "kms:ScheduleKeyDeletion",
    "kms:DeleteAlias",
];

/// AWS commercial regions probed by the region restriction check.
pub const DEFAULT_PROBE_REGIONS: &[&str] = &[
    "af-south-1",
    "ap-east-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-south-1",
    "ap-south-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-southeast-4",
    "ca-central-1",
    "ca-west-1",
    "eu-central-1",
    "eu-central-2",
    "eu-north-1",
    "eu-south-1",
    "eu-south-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "il-central-1",
    "me-central-1",
    "me-south-1",
    "sa-east-1",
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
];

pub const DEFAULT_PROBE_ACTION: &str = "ec2:RunInstances";

/// Service quota for SCP documents, counted without whitespace.
pub const DEFAULT_MAX_POLICY_CHARS: usize = 5120;

pub const DEFAULT_EXCEPTIONS_FILE: &str = "scpguard-exceptions.toml";

const DEFAULT_MAX_FINDINGS: usize = 200;

/// Preset profiles are opinionated defaults.
///
/// Keep these small and readable. Anything complex should go into repo config.
pub fn preset(profile: &str) -> EffectiveConfig {
    match profile {
        "warn" => warn_profile(),
        "compat" => compat_profile(),
        // default
        _ => strict_profile(),
    }
}

fn strict_profile() -> EffectiveConfig {
    EffectiveConfig {
        profile: "strict".to_string(),
        fail_on: FailOn::Error,
        max_findings: DEFAULT_MAX_FINDINGS,
        guardrails: default_guardrails(),
        checks: default_checks(Severity::Error),
    }
}

fn warn_profile() -> EffectiveConfig {
    EffectiveConfig {
        profile: "warn".to_string(),
        fail_on: FailOn::Warn,
        max_findings: DEFAULT_MAX_FINDINGS,
        guardrails: default_guardrails(),
        checks: default_checks(Severity::Warn),
    }
}

fn compat_profile() -> EffectiveConfig {
    // Everything is on, but nothing fails the build unless config raises it.
    EffectiveConfig {
        profile: "compat".to_string(),
        fail_on: FailOn::Error,
        max_findings: DEFAULT_MAX_FINDINGS,
        guardrails: default_guardrails(),
        checks: default_checks(Severity::Warn),
    }
}

fn default_guardrails() -> Guardrails {
    Guardrails {
        allowed_regions: to_owned(DEFAULT_ALLOWED_REGIONS),
        probe_regions: to_owned(DEFAULT_PROBE_REGIONS),
        probe_action: DEFAULT_PROBE_ACTION.to_string(),
        protected_actions: to_owned(DEFAULT_PROTECTED_ACTIONS),
        max_policy_chars: DEFAULT_MAX_POLICY_CHARS,
    }
}

fn to_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn default_checks(default_severity: Severity) -> BTreeMap<String, CheckPolicy> {
    use scpguard_types::ids::*;
    let mut m = BTreeMap::new();

    m.insert(
        CHECK_SCP_DOCUMENT_VALID.to_string(),
        CheckPolicy::enabled(default_severity),
    );
    m.insert(
        CHECK_SCP_SIZE_LIMIT.to_string(),
        CheckPolicy::enabled(default_severity),
    );
    m.insert(
        CHECK_SCP_PROTECTED_ACTIONS.to_string(),
        CheckPolicy::enabled(default_severity),
    );
    m.insert(
        CHECK_SCP_REGION_RESTRICTION.to_string(),
        CheckPolicy::enabled(default_severity),
    );
    // Expired exceptions are housekeeping, never a gate.
    m.insert(
        CHECK_SCP_EXCEPTIONS.to_string(),
        CheckPolicy::enabled(Severity::Info),
    );

    m
}
