use crate::checks::utils::probe_regions_or_global;
use crate::decision::{AccessRequest, decide};
use crate::model::PolicySetModel;
use crate::policy::EffectiveConfig;
use scpguard_types::{Finding, ids};
use serde_json::json;

pub fn run(model: &PolicySetModel, cfg: &EffectiveConfig, out: &mut Vec<Finding>) {
    let Some(policy) = cfg.check_policy(ids::CHECK_SCP_PROTECTED_ACTIONS) else {
        return;
    };
    let regions = probe_regions_or_global(&cfg.guardrails.allowed_regions);

    for action in &cfg.guardrails.protected_actions {
        if policy.allow.is_allowed(action) {
            continue;
        }

        let mut exposed: Vec<&str> = Vec::new();
        let mut outcome: Option<&'static str> = None;
        for region in &regions {
            let mut request = AccessRequest::new(action.as_str(), "*");
            if let Some(r) = region {
                request = request.in_region(r);
            }
            let decision = decide(model, &request);
            if !decision.is_explicit_deny() {
                exposed.push(region.unwrap_or("*"));
                if outcome.is_none() {
                    outcome = Some(decision.label());
                }
            }
        }

        if exposed.is_empty() {
            continue;
        }

        let message = if regions.len() == 1 && regions[0].is_none() {
            format!("protected action '{action}' is not explicitly denied")
        } else {
            let listed = exposed.join(", ");
            format!("protected action '{action}' is not explicitly denied in: {listed}")
        };

        out.push(Finding {
            severity: policy.severity,
            check_id: ids::CHECK_SCP_PROTECTED_ACTIONS.to_string(),
            code: ids::CODE_ACTION_NOT_DENIED.to_string(),
            message,
            location: None,
            help: Some(
                "Add a Deny statement covering this action for Resource \"*\".".to_string(),
            ),
            url: None,
            fingerprint: None,
            data: json!({
                "subject": action,
                "regions": exposed,
                "decision": outcome,
            }),
        });
    }
}
