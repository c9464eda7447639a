//! Explain registry for checks and codes.
//!
//! Maps check IDs and codes to human-readable explanations with remediation guidance.

use crate::ids;

/// Explanation entry for a check or code.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Short description of the check/code.
    pub title: &'static str,
    /// What the check does and why it exists.
    pub description: &'static str,
    /// How to fix violations.
    pub remediation: &'static str,
    /// Before/after policy examples.
    pub examples: ExamplePair,
}

/// Before and after policy examples.
#[derive(Debug, Clone)]
pub struct ExamplePair {
    /// Policy that would trigger a finding.
    pub before: &'static str,
    /// Policy that passes the check.
    pub after: &'static str,
}

/// Look up an explanation by check_id or code.
///
/// Returns `None` if the identifier is not recognized.
pub fn lookup_explanation(identifier: &str) -> Option<Explanation> {
    match identifier {
        // Check IDs
        ids::CHECK_SCP_DOCUMENT_VALID => Some(explain_document_valid()),
        ids::CHECK_SCP_SIZE_LIMIT => Some(explain_size_limit()),
        ids::CHECK_SCP_PROTECTED_ACTIONS => Some(explain_protected_actions()),
        ids::CHECK_SCP_REGION_RESTRICTION => Some(explain_region_restriction()),
        ids::CHECK_SCP_EXCEPTIONS => Some(explain_exceptions()),

        // Codes
        ids::CODE_INVALID_DOCUMENT => Some(explain_invalid_document()),
        ids::CODE_UNSUPPORTED_VERSION => Some(explain_unsupported_version()),
        ids::CODE_DUPLICATE_SID => Some(explain_duplicate_sid()),
        ids::CODE_INVALID_STATEMENT => Some(explain_invalid_statement()),
        ids::CODE_UNSUPPORTED_CONDITION_OPERATOR => Some(explain_unsupported_operator()),
        ids::CODE_DOCUMENT_TOO_LARGE => Some(explain_document_too_large()),
        ids::CODE_ACTION_NOT_DENIED => Some(explain_action_not_denied()),
        ids::CODE_REGION_NOT_DENIED => Some(explain_region_not_denied()),
        ids::CODE_ALLOWED_REGION_DENIED => Some(explain_allowed_region_denied()),
        ids::CODE_EXCEPTION_EXPIRED => Some(explain_exception_expired()),

        _ => None,
    }
}

/// List all known check IDs.
pub fn all_check_ids() -> &'static [&'static str] {
    &[
        ids::CHECK_SCP_DOCUMENT_VALID,
        ids::CHECK_SCP_SIZE_LIMIT,
        ids::CHECK_SCP_PROTECTED_ACTIONS,
        ids::CHECK_SCP_REGION_RESTRICTION,
        ids::CHECK_SCP_EXCEPTIONS,
    ]
}

/// List all known codes.
pub fn all_codes() -> &'static [&'static str] {
    &[
        ids::CODE_INVALID_DOCUMENT,
        ids::CODE_UNSUPPORTED_VERSION,
        ids::CODE_DUPLICATE_SID,
        ids::CODE_INVALID_STATEMENT,
        ids::CODE_UNSUPPORTED_CONDITION_OPERATOR,
        ids::CODE_DOCUMENT_TOO_LARGE,
        ids::CODE_ACTION_NOT_DENIED,
        ids::CODE_REGION_NOT_DENIED,
        ids::CODE_ALLOWED_REGION_DENIED,
        ids::CODE_EXCEPTION_EXPIRED,
    ]
}

// --- Check-level explanations ---

fn explain_document_valid() -> Explanation {
    Explanation {
        title: "Valid Policy Document",
        description: "\
Detects SCP documents that AWS Organizations would reject or silently
misinterpret.

The check flags:
- files that are not JSON or have no statements
- a missing or legacy `Version` (only 2012-10-17 is accepted)
- repeated `Sid` values inside one document
- statements with an unknown `Effect`, no `Action`, or both `Action` and `NotAction`
- condition operators the evaluator does not understand",
        remediation: "\
Fix the document so it matches the IAM policy grammar:
- set `\"Version\": \"2012-10-17\"`
- give every statement a unique `Sid`
- use `\"Effect\": \"Allow\"` or `\"Effect\": \"Deny\"`
- use exactly one of `Action` / `NotAction`",
        examples: ExamplePair {
            before: r#"{
  "Statement": [
    { "Sid": "Deny", "Effect": "Block", "Resource": "*" }
  ]
}"#,
            after: r#"{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Sid": "DenyCloudTrailDisable",
      "Effect": "Deny",
      "Action": ["cloudtrail:StopLogging"],
      "Resource": "*"
    }
  ]
}"#,
        },
    }
}

fn explain_size_limit() -> Explanation {
    Explanation {
        title: "SCP Size Limit",
        description: "\
Detects policy documents larger than the Organizations quota (5,120 characters
by default, whitespace excluded).

Oversized policies fail to attach, which means the guardrail they carry is never
enforced even though it is present in source control.",
        remediation: "\
Shrink the document:
- merge statements that share an effect and resource
- replace long action lists with service wildcards such as `kms:Delete*`
- split unrelated guardrails into separate SCPs",
        examples: ExamplePair {
            before: r#"{
  "Version": "2012-10-17",
  "Statement": [
    { "Effect": "Deny", "Action": ["kms:DeleteAlias"], "Resource": "*" },
    { "Effect": "Deny", "Action": ["kms:DeleteCustomKeyStore"], "Resource": "*" }
  ]
}"#,
            after: r#"{
  "Version": "2012-10-17",
  "Statement": [
    { "Effect": "Deny", "Action": ["kms:Delete*"], "Resource": "*" }
  ]
}"#,
        },
    }
}

fn explain_protected_actions() -> Explanation {
    Explanation {
        title: "Protected Actions Denied",
        description: "\
Verifies that every protected action (for example `cloudtrail:StopLogging` or
`kms:ScheduleKeyDeletion`) is explicitly denied for all resources in every
allowed region.

The policy set is evaluated as AWS would: any matching Deny wins. A Deny that
only applies under a positive condition, or only to some resources, does not
count as protection.",
        remediation: "\
Add a Deny statement that covers the action for `\"Resource\": \"*\"`.
Break-glass roles can be carved out with a negated condition such as
`StringNotLike` on `aws:PrincipalArn`.",
        examples: ExamplePair {
            before: r#"{
  "Version": "2012-10-17",
  "Statement": [
    { "Effect": "Allow", "Action": "*", "Resource": "*" }
  ]
}"#,
            after: r#"{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Sid": "DenyKeyDeletion",
      "Effect": "Deny",
      "Action": ["kms:ScheduleKeyDeletion", "kms:DeleteAlias"],
      "Resource": "*"
    }
  ]
}"#,
        },
    }
}

fn explain_region_restriction() -> Explanation {
    Explanation {
        title: "Region Restriction",
        description: "\
Verifies that requests outside the allowed regions are denied and requests
inside them are not.

A probe request (`ec2:RunInstances` by default) is evaluated against the policy
set once per region with `aws:RequestedRegion` set.",
        remediation: "\
Add a region deny using `StringNotEquals` on `aws:RequestedRegion` listing the
allowed regions, and make sure no other Deny statement blocks an allowed region.",
        examples: ExamplePair {
            before: r#"{
  "Version": "2012-10-17",
  "Statement": [
    { "Effect": "Allow", "Action": "*", "Resource": "*" }
  ]
}"#,
            after: r#"{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Sid": "DenyOutsideAllowedRegions",
      "Effect": "Deny",
      "NotAction": ["iam:*", "organizations:*", "sts:*"],
      "Resource": "*",
      "Condition": {
        "StringNotEquals": {
          "aws:RequestedRegion": ["eu-west-2", "eu-west-1", "us-east-1"]
        }
      }
    }
  ]
}"#,
        },
    }
}

fn explain_exceptions() -> Explanation {
    Explanation {
        title: "Guardrail Exceptions",
        description: "\
Reports exceptions in the exception registry whose expiry date has passed.

Expired exceptions no longer suppress findings. Leaving them in the registry
hides the history of why a guardrail was relaxed.",
        remediation: "\
Run `scpguard exceptions cleanup` to drop expired entries, or re-create the
exception with a new expiry if the deviation is still approved.",
        examples: ExamplePair {
            before: r#"[[exception]]
id = "3f2a9c0d41b7"
check_id = "scp.protected_actions"
target = "kms:DeleteAlias"
reason = "migration"
created = "2026-01-01"
expires = "2026-01-31""#,
            after: r#"# registry is empty once expired entries are cleaned up"#,
        },
    }
}

// --- Code-level explanations ---

fn explain_invalid_document() -> Explanation {
    Explanation {
        title: "Invalid Policy Document",
        description: "\
The file could not be parsed as a policy document, or it contains no statements.",
        remediation: "\
Make sure the file is valid JSON with a non-empty `Statement` list.",
        examples: ExamplePair {
            before: r#"{ "Version": "2012-10-17", "Statement": [] }"#,
            after: r#"{
  "Version": "2012-10-17",
  "Statement": [
    { "Effect": "Deny", "Action": "cloudtrail:StopLogging", "Resource": "*" }
  ]
}"#,
        },
    }
}

fn explain_unsupported_version() -> Explanation {
    Explanation {
        title: "Unsupported Policy Version",
        description: "\
`Version` is missing or is not `2012-10-17`. Older versions disable policy
variables and are rejected for SCPs.",
        remediation: "\
Set `\"Version\": \"2012-10-17\"` at the top of the document.",
        examples: ExamplePair {
            before: r#"{ "Version": "2008-10-17", "Statement": [] }"#,
            after: r#"{ "Version": "2012-10-17", "Statement": [] }"#,
        },
    }
}

fn explain_duplicate_sid() -> Explanation {
    let mut exp = explain_document_valid();
    exp.title = "Duplicate Statement Sid";
    exp.description = "\
Two statements in the same document share a `Sid`. Organizations rejects such
documents.";
    exp.remediation = "Rename one of the statements so every `Sid` is unique.";
    exp
}

fn explain_invalid_statement() -> Explanation {
    let mut exp = explain_document_valid();
    exp.title = "Invalid Statement";
    exp
}

fn explain_unsupported_operator() -> Explanation {
    let mut exp = explain_document_valid();
    exp.title = "Unsupported Condition Operator";
    exp.description = "\
A statement uses a condition operator scpguard cannot evaluate. The statement is
treated as never applying, so any guardrail it carries is reported as missing.";
    exp.remediation = "\
Use one of the supported string, ARN, Bool or Null operators, optionally with
`IfExists` or a `ForAnyValue:`/`ForAllValues:` prefix.";
    exp
}

fn explain_document_too_large() -> Explanation {
    let mut exp = explain_size_limit();
    exp.title = "Document Too Large";
    exp
}

fn explain_action_not_denied() -> Explanation {
    let mut exp = explain_protected_actions();
    exp.title = "Protected Action Not Denied";
    exp
}

fn explain_region_not_denied() -> Explanation {
    let mut exp = explain_region_restriction();
    exp.title = "Region Not Denied";
    exp
}

fn explain_allowed_region_denied() -> Explanation {
    let mut exp = explain_region_restriction();
    exp.title = "Allowed Region Denied";
    exp.description = "\
A region on the allow-list is explicitly denied by the policy set, so workloads
cannot run where they are supposed to.";
    exp
}

fn explain_exception_expired() -> Explanation {
    let mut exp = explain_exceptions();
    exp.title = "Exception Expired";
    exp
}
