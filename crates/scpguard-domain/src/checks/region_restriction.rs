use crate::decision::{AccessRequest, Decision, decide};
use crate::model::PolicySetModel;
use crate::policy::EffectiveConfig;
use scpguard_types::{Finding, ids};
use serde_json::json;

pub fn run(model: &PolicySetModel, cfg: &EffectiveConfig, out: &mut Vec<Finding>) {
    let Some(policy) = cfg.check_policy(ids::CHECK_SCP_REGION_RESTRICTION) else {
        return;
    };
    let guardrails = &cfg.guardrails;
    // Without an allow-list there is nothing to restrict to.
    if guardrails.allowed_regions.is_empty() {
        return;
    }
    let action = guardrails.probe_action.as_str();

    for region in &guardrails.probe_regions {
        if guardrails.allowed_regions.contains(region) || policy.allow.is_allowed(region) {
            continue;
        }
        let decision = decide(model, &AccessRequest::new(action, "*").in_region(region));
        if decision.is_explicit_deny() {
            continue;
        }
        out.push(Finding {
            severity: policy.severity,
            check_id: ids::CHECK_SCP_REGION_RESTRICTION.to_string(),
            code: ids::CODE_REGION_NOT_DENIED.to_string(),
            message: format!("requests to '{action}' in region '{region}' are not denied"),
            location: None,
            help: Some(
                "Deny requests whose aws:RequestedRegion is outside the allowed regions."
                    .to_string(),
            ),
            url: None,
            fingerprint: None,
            data: json!({
                "subject": region,
                "action": action,
                "decision": decision.label(),
            }),
        });
    }

    for region in &guardrails.allowed_regions {
        if policy.allow.is_allowed(region) {
            continue;
        }
        let decision = decide(model, &AccessRequest::new(action, "*").in_region(region));
        let Decision::ExplicitDeny(matched) = decision else {
            continue;
        };
        let document = matched.document.as_str();
        out.push(Finding {
            severity: policy.severity,
            check_id: ids::CHECK_SCP_REGION_RESTRICTION.to_string(),
            code: ids::CODE_ALLOWED_REGION_DENIED.to_string(),
            message: format!("allowed region '{region}' is denied for '{action}' by {document}"),
            location: Some(scpguard_types::Location {
                path: matched.document.clone(),
                statement: Some(matched.statement),
            }),
            help: Some(
                "Make sure no Deny statement applies to requests inside the allowed regions."
                    .to_string(),
            ),
            url: None,
            fingerprint: None,
            data: json!({
                "subject": region,
                "action": action,
                "sid": matched.sid,
            }),
        });
    }
}
