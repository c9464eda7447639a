use scpguard_domain::model::{
    ActionBlock, ConditionModel, Effect, PolicyDocumentModel, StatementModel,
};
use scpguard_types::RepoPath;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyParseError {
    #[error("invalid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("policy document must be a JSON object")]
    NotAnObject,

    #[error("invalid describe-policy output: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("invalid Content in describe-policy output: {0}")]
    EnvelopeContent(#[source] serde_json::Error),

    #[error("invalid policy document: {0}")]
    Document(#[source] serde_json::Error),

    #[error("policy file is not valid UTF-8: {0}")]
    Utf8(#[source] std::str::Utf8Error),
}

/// `Action`, `Resource` and condition values may be a scalar or a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConditionValue {
    String(String),
    Bool(bool),
    Number(serde_json::Number),
}

impl ConditionValue {
    fn into_string(self) -> String {
        match self {
            ConditionValue::String(s) => s,
            ConditionValue::Bool(b) => b.to_string(),
            ConditionValue::Number(n) => n.to_string(),
        }
    }
}

type RawConditions = BTreeMap<String, BTreeMap<String, OneOrMany<ConditionValue>>>;

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPolicy {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    statement: Option<OneOrMany<RawStatement>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawStatement {
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    effect: Option<String>,
    #[serde(default)]
    action: Option<OneOrMany<String>>,
    #[serde(default)]
    not_action: Option<OneOrMany<String>>,
    #[serde(default)]
    resource: Option<OneOrMany<String>>,
    #[serde(default)]
    not_resource: Option<OneOrMany<String>>,
    #[serde(default)]
    condition: Option<RawConditions>,
}

/// Output of `aws organizations describe-policy`.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawEnvelope {
    policy: RawEnvelopePolicy,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawEnvelopePolicy {
    #[serde(default)]
    policy_summary: Option<RawPolicySummary>,
    content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPolicySummary {
    #[serde(default)]
    name: Option<String>,
}

/// Parse a policy file: a raw SCP document or `describe-policy` output.
pub fn parse_policy(path: &RepoPath, text: &str) -> Result<PolicyDocumentModel, PolicyParseError> {
    let value: Value = serde_json::from_str(text).map_err(PolicyParseError::Json)?;
    let Value::Object(map) = &value else {
        return Err(PolicyParseError::NotAnObject);
    };

    let (name, document) = if map.contains_key("Policy") {
        let envelope: RawEnvelope =
            serde_json::from_value(value).map_err(PolicyParseError::Envelope)?;
        let content = envelope.policy.content;
        let inner: Value =
            serde_json::from_str(&content).map_err(PolicyParseError::EnvelopeContent)?;
        if !inner.is_object() {
            return Err(PolicyParseError::NotAnObject);
        }
        let name = envelope
            .policy
            .policy_summary
            .and_then(|s| s.name)
            .filter(|n| !n.is_empty());
        (name, inner)
    } else {
        (None, value)
    };

    let size_chars = compact_size(&document)?;
    let raw: RawPolicy = serde_json::from_value(document).map_err(PolicyParseError::Document)?;

    let statements = raw
        .statement
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, s)| to_statement(index as u32, s))
        .collect();

    Ok(PolicyDocumentModel {
        path: path.clone(),
        name: name.unwrap_or_else(|| path.stem().to_string()),
        version: raw.version,
        statements,
        size_chars,
        parse_error: None,
    })
}

/// Size as counted by the Organizations quota: characters of the compact JSON
/// rendering, so whitespace between tokens does not count.
fn compact_size(document: &Value) -> Result<usize, PolicyParseError> {
    let compact = serde_json::to_string(document).map_err(PolicyParseError::Json)?;
    Ok(compact.chars().count())
}

/// Placeholder document for a file that failed to parse. `size_chars` is the
/// raw file length since there is no compact rendering.
pub fn unparsed_document(
    path: &RepoPath,
    size_chars: usize,
    err: &PolicyParseError,
) -> PolicyDocumentModel {
    PolicyDocumentModel {
        path: path.clone(),
        name: path.stem().to_string(),
        version: None,
        statements: Vec::new(),
        size_chars,
        parse_error: Some(err.to_string()),
    }
}

fn to_statement(index: u32, raw: RawStatement) -> StatementModel {
    let conditions = raw
        .condition
        .unwrap_or_default()
        .into_iter()
        .flat_map(|(operator, keys)| {
            keys.into_iter().map(move |(key, values)| ConditionModel {
                operator: operator.clone(),
                key,
                values: values
                    .into_vec()
                    .into_iter()
                    .map(ConditionValue::into_string)
                    .collect(),
            })
        })
        .collect();

    StatementModel {
        index,
        sid: raw.sid,
        effect: Effect::parse(raw.effect.as_deref().unwrap_or_default()),
        action: ActionBlock::from_pair(
            raw.action.map(OneOrMany::into_vec),
            raw.not_action.map(OneOrMany::into_vec),
        ),
        resource: ActionBlock::from_pair(
            raw.resource.map(OneOrMany::into_vec),
            raw.not_resource.map(OneOrMany::into_vec),
        ),
        conditions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUARDRAIL_LITERAL: &str = r#"{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Sid": "DenyCloudTrailDisable",
      "Effect": "Deny",
      "Action": ["cloudtrail:StopLogging"],
      "Resource": "*"
    }
  ]
}"#;

    fn parse(text: &str) -> Result<PolicyDocumentModel, PolicyParseError> {
        parse_policy(&RepoPath::new("scps/guardrails.json"), text)
    }

    #[test]
    fn guardrail_literal_parses_with_2012_version() {
        let value: Value = serde_json::from_str(GUARDRAIL_LITERAL).expect("valid JSON");
        assert_eq!(value["Version"], "2012-10-17");

        let doc = parse(GUARDRAIL_LITERAL).expect("parse");
        assert_eq!(doc.version.as_deref(), Some("2012-10-17"));
        assert_eq!(doc.name, "guardrails");
        assert_eq!(doc.statements.len(), 1);

        let stmt = &doc.statements[0];
        assert_eq!(stmt.sid.as_deref(), Some("DenyCloudTrailDisable"));
        assert_eq!(stmt.effect, Effect::Deny);
        assert_eq!(
            stmt.action,
            ActionBlock::Match(vec!["cloudtrail:StopLogging".to_string()])
        );
        assert_eq!(stmt.resource, ActionBlock::Match(vec!["*".to_string()]));
    }

    #[test]
    fn size_ignores_whitespace_between_tokens() {
        let doc = parse(GUARDRAIL_LITERAL).expect("parse");
        let compact = serde_json::to_string(
            &serde_json::from_str::<Value>(GUARDRAIL_LITERAL).expect("json"),
        )
        .expect("serialize");
        assert_eq!(doc.size_chars, compact.len());
    }

    #[test]
    fn size_counts_whitespace_inside_strings() {
        let spaced = parse(r#"{ "Version": "2012-10-17", "Statement": { "Sid": "Deny All" } }"#)
            .expect("parse");
        let tight =
            parse(r#"{"Version":"2012-10-17","Statement":{"Sid":"DenyAll"}}"#).expect("parse");
        assert_eq!(spaced.size_chars, tight.size_chars + 1);
    }

    #[test]
    fn single_statement_object_and_not_action() {
        let doc = parse(
            r#"{"Version":"2012-10-17","Statement":{"Effect":"Deny","NotAction":"iam:*","Resource":["*"]}}"#,
        )
        .expect("parse");
        assert_eq!(doc.statements.len(), 1);
        assert_eq!(
            doc.statements[0].action,
            ActionBlock::NotMatch(vec!["iam:*".to_string()])
        );
    }

    #[test]
    fn conditions_flatten_and_stringify_values() {
        let doc = parse(
            r#"{
  "Version": "2012-10-17",
  "Statement": [{
    "Effect": "Deny",
    "Action": "*",
    "Resource": "*",
    "Condition": {
      "StringNotEquals": {"aws:RequestedRegion": ["eu-west-2", "eu-west-1"]},
      "Bool": {"aws:SecureTransport": false},
      "NumericGreaterThan": {"aws:MultiFactorAuthAge": 3600}
    }
  }]
}"#,
        )
        .expect("parse");
        let conditions = &doc.statements[0].conditions;
        assert_eq!(conditions.len(), 3);
        let bool_cond = conditions
            .iter()
            .find(|c| c.operator == "Bool")
            .expect("bool condition");
        assert_eq!(bool_cond.values, vec!["false"]);
        let numeric = conditions
            .iter()
            .find(|c| c.operator == "NumericGreaterThan")
            .expect("numeric condition");
        assert_eq!(numeric.values, vec!["3600"]);
        let region = conditions
            .iter()
            .find(|c| c.key == "aws:RequestedRegion")
            .expect("region condition");
        assert_eq!(region.values, vec!["eu-west-2", "eu-west-1"]);
    }

    #[test]
    fn describe_policy_envelope_is_unwrapped() {
        let envelope = serde_json::json!({
            "Policy": {
                "PolicySummary": {"Id": "p-abc123", "Name": "DenyKeyDeletion"},
                "Content": "{\"Version\":\"2012-10-17\",\"Statement\":[{\"Effect\":\"Deny\",\"Action\":\"kms:ScheduleKeyDeletion\",\"Resource\":\"*\"}]}"
            }
        });
        let doc = parse(&envelope.to_string()).expect("parse");
        assert_eq!(doc.name, "DenyKeyDeletion");
        assert_eq!(doc.version.as_deref(), Some("2012-10-17"));
        assert_eq!(doc.statements.len(), 1);
        assert_eq!(doc.size_chars, 106);
    }

    #[test]
    fn missing_effect_becomes_other() {
        let doc = parse(r#"{"Version":"2012-10-17","Statement":[{"Action":"*"}]}"#).expect("parse");
        assert_eq!(doc.statements[0].effect, Effect::Other(String::new()));
        assert_eq!(doc.statements[0].resource, ActionBlock::Missing);
    }

    #[test]
    fn errors_are_typed() {
        assert!(matches!(parse("{"), Err(PolicyParseError::Json(_))));
        assert!(matches!(parse("[]"), Err(PolicyParseError::NotAnObject)));
        assert!(matches!(
            parse(r#"{"Policy":{"Content":"not json"}}"#),
            Err(PolicyParseError::EnvelopeContent(_))
        ));
        assert!(matches!(
            parse(r#"{"Policy":{}}"#),
            Err(PolicyParseError::Envelope(_))
        ));
        assert!(matches!(
            parse(r#"{"Version":"2012-10-17","Statement":[{"Action":{"nested":true}}]}"#),
            Err(PolicyParseError::Document(_))
        ));
    }

    #[test]
    fn unparsed_document_keeps_the_error() {
        let path = RepoPath::new("broken.json");
        let err = parse_policy(&path, "{").expect_err("invalid");
        let doc = unparsed_document(&path, 1, &err);
        assert_eq!(doc.name, "broken");
        assert_eq!(doc.size_chars, 1);
        assert!(doc.parse_error.as_deref().is_some_and(|e| e.starts_with("invalid JSON")));
    }
}
