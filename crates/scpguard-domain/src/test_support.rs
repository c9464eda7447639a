use crate::exceptions::ExceptionEntry;
use crate::model::{
    ActionBlock, ConditionModel, Effect, PolicyDocumentModel, PolicySetModel, StatementModel,
};
use crate::policy::{CheckPolicy, EffectiveConfig, FailOn, Guardrails};
use scpguard_types::{RepoPath, Severity, ids};
use std::collections::BTreeMap;
use time::Date;
use time::macros::date;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn statement(effect: Effect, actions: &[&str]) -> StatementModel {
    StatementModel {
        index: 0,
        sid: None,
        effect,
        action: ActionBlock::Match(strings(actions)),
        resource: ActionBlock::Match(strings(&["*"])),
        conditions: Vec::new(),
    }
}

pub fn deny(actions: &[&str]) -> StatementModel {
    statement(Effect::Deny, actions)
}

pub fn allow(actions: &[&str]) -> StatementModel {
    statement(Effect::Allow, actions)
}

pub fn cond(operator: &str, key: &str, values: &[&str]) -> ConditionModel {
    ConditionModel {
        operator: operator.to_string(),
        key: key.to_string(),
        values: strings(values),
    }
}

/// Build a document; statement indexes are assigned in order.
pub fn doc(path: &str, statements: Vec<StatementModel>) -> PolicyDocumentModel {
    let path = RepoPath::new(path);
    let statements = statements
        .into_iter()
        .enumerate()
        .map(|(i, mut s)| {
            s.index = i as u32;
            s
        })
        .collect();
    PolicyDocumentModel {
        name: path.stem().to_string(),
        path,
        version: Some(ids::POLICY_VERSION_2012.to_string()),
        statements,
        size_chars: 200,
        parse_error: None,
    }
}

pub fn set(documents: Vec<PolicyDocumentModel>) -> PolicySetModel {
    PolicySetModel {
        root: RepoPath::new("."),
        documents,
    }
}

pub fn default_guardrails() -> Guardrails {
    Guardrails {
        allowed_regions: strings(&["eu-west-2", "eu-west-1", "us-east-1"]),
        probe_regions: strings(&["us-west-2", "ap-south-1", "eu-west-2"]),
        probe_action: "ec2:RunInstances".to_string(),
        protected_actions: strings(&[
            "cloudtrail:StopLogging",
            "kms:ScheduleKeyDeletion",
            "kms:DeleteAlias",
        ]),
        max_policy_chars: 5120,
    }
}

pub fn config_with_check(check_id: &str, severity: Severity) -> EffectiveConfig {
    let mut checks = BTreeMap::new();
    checks.insert(check_id.to_string(), CheckPolicy::enabled(severity));
    EffectiveConfig {
        profile: "test".to_string(),
        fail_on: FailOn::Error,
        max_findings: 200,
        guardrails: default_guardrails(),
        checks,
    }
}

pub fn config_with_check_allow(
    check_id: &str,
    severity: Severity,
    allow: Vec<&str>,
) -> EffectiveConfig {
    let mut policy = CheckPolicy::enabled(severity);
    policy.allow = crate::policy::Allowlist::new(&strings(&allow)).expect("valid allowlist");
    let mut cfg = config_with_check(check_id, severity);
    cfg.checks.insert(check_id.to_string(), policy);
    cfg
}

/// Every check enabled at error severity.
pub fn config_with_guardrails() -> EffectiveConfig {
    let mut cfg = config_with_check(ids::CHECK_SCP_DOCUMENT_VALID, Severity::Error);
    for id in [
        ids::CHECK_SCP_SIZE_LIMIT,
        ids::CHECK_SCP_PROTECTED_ACTIONS,
        ids::CHECK_SCP_REGION_RESTRICTION,
        ids::CHECK_SCP_EXCEPTIONS,
    ] {
        cfg.checks
            .insert(id.to_string(), CheckPolicy::enabled(Severity::Error));
    }
    cfg
}

/// The canonical guardrail set: trail and key protection plus a region deny.
pub fn sample_policy_set() -> PolicySetModel {
    let mut trail = deny(&["cloudtrail:StopLogging"]);
    trail.sid = Some("DenyCloudTrailDisable".to_string());
    let mut kms = deny(&["kms:ScheduleKeyDeletion", "kms:DeleteAlias"]);
    kms.sid = Some("DenyKeyDeletion".to_string());

    let mut region = deny(&[]);
    region.sid = Some("DenyOutsideAllowedRegions".to_string());
    region.action = ActionBlock::NotMatch(strings(&["iam:*", "organizations:*", "sts:*"]));
    region.conditions = vec![cond(
        "StringNotEquals",
        "aws:RequestedRegion",
        &["eu-west-2", "eu-west-1", "us-east-1"],
    )];

    set(vec![
        doc("deny-guardrails.json", vec![trail, kms]),
        doc("region-restriction.json", vec![region]),
    ])
}

pub fn exception(check_id: &str, target: &str, expires: Date) -> ExceptionEntry {
    ExceptionEntry {
        id: format!("ex-{}", target.replace(['*', ':'], "")),
        check_id: check_id.to_string(),
        target: target.to_string(),
        reason: "approved deviation".to_string(),
        created: date!(2026 - 01 - 01),
        expires,
    }
}
