//! The `decide` use case: evaluate one request against the policy set.

use anyhow::Context;
use camino::Utf8Path;
use scpguard_domain::{AccessRequest, Decision, decide};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
pub struct DecideInput<'a> {
    pub policies_dir: &'a Utf8Path,
    pub action: &'a str,
    pub resource: &'a str,
    pub region: Option<&'a str>,
    /// Extra condition context (`key=value` pairs from the CLI).
    pub context: Vec<(String, String)>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DecideOutput {
    pub action: String,
    pub resource: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
    pub documents_scanned: u32,
    #[serde(flatten)]
    pub decision: Decision,
}

pub fn run_decide(input: DecideInput<'_>) -> anyhow::Result<DecideOutput> {
    anyhow::ensure!(!input.action.trim().is_empty(), "action must not be empty");

    let model =
        scpguard_policies::build_policy_set(input.policies_dir).context("build policy set")?;

    let mut request = AccessRequest::new(input.action, input.resource);
    if let Some(region) = input.region {
        request = request.in_region(region);
    }
    for (key, value) in &input.context {
        request = request.with_context(key, value.as_str());
    }

    let decision = decide(&model, &request);
    tracing::debug!(action = input.action, decision = decision.label(), "decided request");

    Ok(DecideOutput {
        action: request.action,
        resource: request.resource,
        context: request.context,
        documents_scanned: model.documents.len() as u32,
        decision,
    })
}

/// Parse `key=value` into a context pair.
pub fn parse_context_pair(raw: &str) -> anyhow::Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => anyhow::bail!("invalid context {raw:?} (expected key=value)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn policies() -> (TempDir, Utf8PathBuf) {
        let tmp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path");
        std::fs::write(
            root.join("deny.json"),
            r#"{"Version":"2012-10-17","Statement":[
                {"Sid":"DenyKeyDeletion","Effect":"Deny","Action":"kms:ScheduleKeyDeletion","Resource":"*"},
                {"Sid":"DenyInsecure","Effect":"Deny","Action":"s3:*","Resource":"*","Condition":{"Bool":{"aws:SecureTransport":"false"}}}
            ]}"#,
        )
        .expect("write");
        std::fs::write(
            root.join("full-access.json"),
            r#"{"Version":"2012-10-17","Statement":{"Effect":"Allow","Action":"*","Resource":"*"}}"#,
        )
        .expect("write");
        (tmp, root)
    }

    fn input<'a>(dir: &'a Utf8Path, action: &'a str) -> DecideInput<'a> {
        DecideInput {
            policies_dir: dir,
            action,
            resource: "*",
            region: Some("eu-west-2"),
            context: Vec::new(),
        }
    }

    #[test]
    fn explicit_deny_names_the_statement() {
        let (_tmp, dir) = policies();
        let out = run_decide(input(&dir, "kms:ScheduleKeyDeletion")).expect("decide");
        let json = serde_json::to_value(&out).expect("json");
        assert_eq!(json["decision"], "explicit_deny");
        assert_eq!(json["document"], "deny.json");
        assert_eq!(json["sid"], "DenyKeyDeletion");
        assert_eq!(json["statement"], 0);
        assert_eq!(json["context"]["aws:requestedregion"], "eu-west-2");
        assert_eq!(json["documents_scanned"], 2);
    }

    #[test]
    fn allow_when_nothing_denies() {
        let (_tmp, dir) = policies();
        let out = run_decide(input(&dir, "ec2:RunInstances")).expect("decide");
        assert!(matches!(out.decision, Decision::Allow(_)));
    }

    #[test]
    fn context_pairs_feed_conditions() {
        let (_tmp, dir) = policies();
        let mut req = input(&dir, "s3:GetObject");
        req.context = vec![parse_context_pair("aws:SecureTransport=false").expect("pair")];
        let out = run_decide(req).expect("decide");
        assert!(out.decision.is_explicit_deny());

        let mut req = input(&dir, "s3:GetObject");
        req.context = vec![parse_context_pair("aws:SecureTransport=true").expect("pair")];
        let out = run_decide(req).expect("decide");
        assert!(matches!(out.decision, Decision::Allow(_)));
    }

    #[test]
    fn context_pair_requires_key() {
        assert!(parse_context_pair("=x").is_err());
        assert!(parse_context_pair("novalue").is_err());
        assert_eq!(
            parse_context_pair("aws:PrincipalTag/team=platform").expect("pair"),
            ("aws:PrincipalTag/team".to_string(), "platform".to_string())
        );
    }
}
