use crate::checks::utils::doc_location;
use crate::matcher::is_supported_operator;
use crate::model::{ActionBlock, Effect, PolicySetModel};
use crate::policy::EffectiveConfig;
use scpguard_types::{Finding, ids};
use serde_json::json;
use std::collections::BTreeMap;

pub fn run(model: &PolicySetModel, cfg: &EffectiveConfig, out: &mut Vec<Finding>) {
    let Some(policy) = cfg.check_policy(ids::CHECK_SCP_DOCUMENT_VALID) else {
        return;
    };

    for doc in &model.documents {
        let path = doc.path.as_str();
        if policy.allow.is_allowed(path) {
            continue;
        }

        let mut push = |code: &str, message: String, statement: Option<u32>, help: &str| {
            out.push(Finding {
                severity: policy.severity,
                check_id: ids::CHECK_SCP_DOCUMENT_VALID.to_string(),
                code: code.to_string(),
                message,
                location: doc_location(&doc.path, statement),
                help: Some(help.to_string()),
                url: None,
                fingerprint: None,
                data: json!({
                    "subject": path,
                    "document": doc.name,
                    "statement": statement,
                }),
            });
        };

        if let Some(err) = &doc.parse_error {
            push(
                ids::CODE_INVALID_DOCUMENT,
                format!("policy '{}' could not be parsed: {}", doc.name, err),
                None,
                "Policy files must be JSON policy documents or describe-policy output.",
            );
            continue;
        }

        if doc.statements.is_empty() {
            push(
                ids::CODE_INVALID_DOCUMENT,
                format!("policy '{}' has no statements", doc.name),
                None,
                "Add at least one statement to the Statement list.",
            );
        }

        match doc.version.as_deref() {
            Some(ids::POLICY_VERSION_2012) => {}
            Some(other) => push(
                ids::CODE_UNSUPPORTED_VERSION,
                format!("policy '{}' uses unsupported Version '{}'", doc.name, other),
                None,
                "Set \"Version\": \"2012-10-17\".",
            ),
            None => push(
                ids::CODE_UNSUPPORTED_VERSION,
                format!("policy '{}' has no Version", doc.name),
                None,
                "Set \"Version\": \"2012-10-17\".",
            ),
        }

        let mut seen_sids: BTreeMap<&str, u32> = BTreeMap::new();
        for stmt in &doc.statements {
            if let Some(sid) = stmt.sid.as_deref().filter(|s| !s.is_empty()) {
                if let Some(first) = seen_sids.get(sid) {
                    push(
                        ids::CODE_DUPLICATE_SID,
                        format!(
                            "policy '{}' repeats Sid '{}' (first used by statement {})",
                            doc.name, sid, first
                        ),
                        Some(stmt.index),
                        "Give every statement a unique Sid.",
                    );
                } else {
                    seen_sids.insert(sid, stmt.index);
                }
            }

            if let Effect::Other(effect) = &stmt.effect {
                push(
                    ids::CODE_INVALID_STATEMENT,
                    format!(
                        "statement {} of '{}' has invalid Effect '{}'",
                        stmt.index, doc.name, effect
                    ),
                    Some(stmt.index),
                    "Effect must be \"Allow\" or \"Deny\".",
                );
            }

            match stmt.action {
                ActionBlock::Missing => push(
                    ids::CODE_INVALID_STATEMENT,
                    format!(
                        "statement {} of '{}' has neither Action nor NotAction",
                        stmt.index, doc.name
                    ),
                    Some(stmt.index),
                    "Add an Action (or NotAction) element.",
                ),
                ActionBlock::Conflict => push(
                    ids::CODE_INVALID_STATEMENT,
                    format!(
                        "statement {} of '{}' has both Action and NotAction",
                        stmt.index, doc.name
                    ),
                    Some(stmt.index),
                    "Use exactly one of Action or NotAction.",
                ),
                ActionBlock::Match(_) | ActionBlock::NotMatch(_) => {}
            }

            if stmt.resource == ActionBlock::Conflict {
                push(
                    ids::CODE_INVALID_STATEMENT,
                    format!(
                        "statement {} of '{}' has both Resource and NotResource",
                        stmt.index, doc.name
                    ),
                    Some(stmt.index),
                    "Use exactly one of Resource or NotResource.",
                );
            }

            for cond in &stmt.conditions {
                if !is_supported_operator(&cond.operator) {
                    push(
                        ids::CODE_UNSUPPORTED_CONDITION_OPERATOR,
                        format!(
                            "statement {} of '{}' uses unsupported condition operator '{}'",
                            stmt.index, doc.name, cond.operator
                        ),
                        Some(stmt.index),
                        "The statement is treated as never applying; use a string, ARN, Bool or Null operator.",
                    );
                }
            }
        }
    }
}
