use crate::exceptions::ExceptionSet;
use crate::policy::EffectiveConfig;
use scpguard_types::{Finding, ids};
use serde_json::json;
use time::Date;

pub fn run(exceptions: &ExceptionSet, cfg: &EffectiveConfig, today: Date, out: &mut Vec<Finding>) {
    let Some(policy) = cfg.check_policy(ids::CHECK_SCP_EXCEPTIONS) else {
        return;
    };

    for entry in exceptions.entries() {
        if entry.is_active(today) || policy.allow.is_allowed(&entry.id) {
            continue;
        }
        out.push(Finding {
            severity: policy.severity,
            check_id: ids::CHECK_SCP_EXCEPTIONS.to_string(),
            code: ids::CODE_EXCEPTION_EXPIRED.to_string(),
            message: format!(
                "exception {} for {} '{}' expired on {}",
                entry.id, entry.check_id, entry.target, entry.expires
            ),
            location: None,
            help: Some("Run `scpguard exceptions cleanup` or renew the exception.".to_string()),
            url: None,
            fingerprint: None,
            data: json!({
                "subject": entry.id,
                "check_id": entry.check_id,
                "target": entry.target,
                "reason": entry.reason,
                "expires": entry.expires.to_string(),
            }),
        });
    }
}
