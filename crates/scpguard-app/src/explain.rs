//! The `explain` use case: documentation for a check id or finding code.

use scpguard_types::explain::{self, Explanation};
use std::fmt::Write as _;

#[derive(Clone, Debug)]
pub enum ExplainOutput {
    Found(Explanation),
    NotFound { identifier: String },
}

pub fn run_explain(identifier: &str) -> ExplainOutput {
    match explain::lookup_explanation(identifier) {
        Some(exp) => ExplainOutput::Found(exp),
        None => ExplainOutput::NotFound {
            identifier: identifier.to_string(),
        },
    }
}

/// Render an explanation with the failing and passing examples fenced by
/// their format (policy JSON or registry TOML).
pub fn format_explanation(identifier: &str, exp: &Explanation) -> String {
    let mut out = format!("{identifier}: {}\n\n{}\n\n", exp.title, exp.description);
    let _ = writeln!(out, "How to fix:\n{}\n", exp.remediation);
    push_example(&mut out, "Fails", exp.examples.before);
    out.push('\n');
    push_example(&mut out, "Passes", exp.examples.after);
    out
}

fn push_example(out: &mut String, label: &str, example: &str) {
    let lang = if example.trim_start().starts_with('{') {
        "json"
    } else {
        "toml"
    };
    let _ = writeln!(out, "{label}:\n```{lang}\n{example}\n```");
}

/// Message for an identifier the registry does not know, listing what it does.
pub fn format_not_found(identifier: &str) -> String {
    let mut out = format!("unknown check id or code '{identifier}'\n\nchecks:\n");
    for id in explain::all_check_ids() {
        let _ = writeln!(out, "  {id}");
    }
    out.push_str("codes:\n");
    for code in explain::all_codes() {
        let _ = writeln!(out, "  {code}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(identifier: &str) -> Explanation {
        match run_explain(identifier) {
            ExplainOutput::Found(exp) => exp,
            ExplainOutput::NotFound { .. } => panic!("no explanation for {identifier}"),
        }
    }

    #[test]
    fn check_ids_and_codes_resolve() {
        found("scp.protected_actions");
        found("action_not_denied");
        assert!(matches!(
            run_explain("kms.everything"),
            ExplainOutput::NotFound { identifier } if identifier == "kms.everything"
        ));
    }

    #[test]
    fn policy_examples_are_json_fenced() {
        let exp = found("scp.protected_actions");
        let text = format_explanation("scp.protected_actions", &exp);
        assert!(text.starts_with(&format!("scp.protected_actions: {}", exp.title)));
        assert!(text.contains("How to fix:"));
        assert!(text.contains("Fails:\n```json\n{"));
        assert!(text.contains("Passes:\n```json\n{"));
    }

    #[test]
    fn registry_examples_are_toml_fenced() {
        let exp = found("exception_expired");
        let text = format_explanation("exception_expired", &exp);
        assert!(text.contains("```toml\n[[exception]]"));
    }

    #[test]
    fn not_found_lists_every_identifier() {
        let text = format_not_found("kms.everything");
        assert!(text.starts_with("unknown check id or code 'kms.everything'"));
        for id in explain::all_check_ids().iter().chain(explain::all_codes()) {
            assert!(text.contains(&format!("  {id}\n")), "missing {id}");
        }
    }
}
