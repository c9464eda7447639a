//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - IAM wildcard matching
//! - Deny precedence regardless of document order
//! - Findings ordering determinism

use crate::decision::{AccessRequest, decide};
use crate::engine::evaluate;
use crate::exceptions::ExceptionSet;
use crate::matcher::{CaseMode, action_matches, wildcard_match};
use crate::model::PolicyDocumentModel;
use crate::test_support::{allow, config_with_guardrails, deny, doc, set};
use proptest::prelude::*;
use time::macros::date;

// ============================================================================
// Strategies for generating arbitrary values
// ============================================================================

fn arb_service() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9-]{1,11}").unwrap()
}

fn arb_operation() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][A-Za-z]{2,23}").unwrap()
}

fn arb_action() -> impl Strategy<Value = String> {
    (arb_service(), arb_operation()).prop_map(|(s, o)| format!("{s}:{o}"))
}

fn arb_documents() -> impl Strategy<Value = Vec<PolicyDocumentModel>> {
    prop::collection::vec(
        (arb_action(), any::<bool>(), 0u8..20).prop_map(|(action, is_deny, n)| {
            let stmt = if is_deny {
                deny(&[action.as_str()])
            } else {
                allow(&[action.as_str()])
            };
            doc(&format!("scp-{n:02}.json"), vec![stmt])
        }),
        0..8,
    )
}

// ============================================================================
// Matcher properties
// ============================================================================

proptest! {
    #[test]
    fn literal_pattern_matches_itself(value in "[ -~]{0,40}") {
        // Literal text without wildcards matches exactly itself.
        prop_assume!(!value.contains('*') && !value.contains('?'));
        prop_assert!(wildcard_match(&value, &value, CaseMode::Sensitive));
    }

    #[test]
    fn star_matches_everything(value in "[ -~]{0,40}") {
        prop_assert!(wildcard_match("*", &value, CaseMode::Sensitive));
    }

    #[test]
    fn service_wildcard_covers_every_operation(service in arb_service(), op in arb_operation()) {
        let pattern = format!("{service}:*");
        let action = format!("{service}:{op}");
        prop_assert!(action_matches(&pattern, &action));
        prop_assert!(action_matches(&pattern.to_uppercase(), &action));
    }

    #[test]
    fn prefix_star_suffix_matches(prefix in "[a-z]{0,8}", middle in "[a-z:/]{0,12}", suffix in "[a-z]{0,8}") {
        let pattern = format!("{prefix}*{suffix}");
        let value = format!("{prefix}{middle}{suffix}");
        prop_assert!(wildcard_match(&pattern, &value, CaseMode::Sensitive));
    }
}

// ============================================================================
// Evaluation properties
// ============================================================================

proptest! {
    #[test]
    fn deny_wins_regardless_of_document_order(action in arb_action(), deny_first in any::<bool>()) {
        let deny_doc = doc("deny.json", vec![deny(&[action.as_str()])]);
        let allow_doc = doc("allow.json", vec![allow(&["*"])]);
        let docs = if deny_first {
            vec![deny_doc, allow_doc]
        } else {
            vec![allow_doc, deny_doc]
        };
        let decision = decide(&set(docs), &AccessRequest::new(action, "*"));
        prop_assert!(decision.is_explicit_deny());
    }

    #[test]
    fn evaluation_is_deterministic(docs in arb_documents()) {
        let model = set(docs);
        let cfg = config_with_guardrails();
        let today = date!(2026 - 10 - 16);

        let a = evaluate(&model, &cfg, &ExceptionSet::default(), today);
        let b = evaluate(&model, &cfg, &ExceptionSet::default(), today);

        prop_assert_eq!(a.verdict, b.verdict);
        prop_assert_eq!(a.findings, b.findings);
    }

    #[test]
    fn findings_are_sorted(docs in arb_documents()) {
        let model = set(docs);
        let cfg = config_with_guardrails();
        let report = evaluate(&model, &cfg, &ExceptionSet::default(), date!(2026 - 10 - 16));

        for pair in report.findings.windows(2) {
            prop_assert_ne!(
                crate::engine::compare_findings(&pair[0], &pair[1]),
                std::cmp::Ordering::Greater
            );
        }
    }
}
