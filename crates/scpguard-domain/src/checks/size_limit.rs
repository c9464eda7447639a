use crate::checks::utils::doc_location;
use crate::model::PolicySetModel;
use crate::policy::EffectiveConfig;
use scpguard_types::{Finding, ids};
use serde_json::json;

pub fn run(model: &PolicySetModel, cfg: &EffectiveConfig, out: &mut Vec<Finding>) {
    let Some(policy) = cfg.check_policy(ids::CHECK_SCP_SIZE_LIMIT) else {
        return;
    };
    let limit = cfg.guardrails.max_policy_chars;

    for doc in &model.documents {
        if doc.parse_error.is_some() || doc.size_chars <= limit {
            continue;
        }
        if policy.allow.is_allowed(doc.path.as_str()) {
            continue;
        }
        out.push(Finding {
            severity: policy.severity,
            check_id: ids::CHECK_SCP_SIZE_LIMIT.to_string(),
            code: ids::CODE_DOCUMENT_TOO_LARGE.to_string(),
            message: format!(
                "policy '{}' is {} characters, above the limit of {}",
                doc.name, doc.size_chars, limit
            ),
            location: doc_location(&doc.path, None),
            help: Some(
                "Merge statements or use action wildcards to shrink the policy.".to_string(),
            ),
            url: None,
            fingerprint: None,
            data: json!({
                "subject": doc.path.as_str(),
                "size_chars": doc.size_chars,
                "limit": limit,
            }),
        });
    }
}
