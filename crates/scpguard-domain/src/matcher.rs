//! IAM wildcard matching and condition operators.
//!
//! Policy patterns only know two wildcards: `*` matches any run of characters
//! (including `:` and `/`) and `?` matches exactly one. Everything else is literal,
//! so `[` and `{` in an ARN carry no special meaning.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaseMode {
    Sensitive,
    Insensitive,
}

/// Match `value` against an IAM wildcard `pattern`.
pub fn wildcard_match(pattern: &str, value: &str, case: CaseMode) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let v: Vec<char> = value.chars().collect();
    let same = |a: char, b: char| match case {
        CaseMode::Sensitive => a == b,
        CaseMode::Insensitive => a.eq_ignore_ascii_case(&b),
    };

    let (mut pi, mut vi) = (0usize, 0usize);
    // Position of the last `*` seen and the value index it is currently absorbing up to.
    let mut star: Option<usize> = None;
    let mut mark = 0usize;

    while vi < v.len() {
        if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = vi;
            pi += 1;
        } else if pi < p.len() && (p[pi] == '?' || same(p[pi], v[vi])) {
            pi += 1;
            vi += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            mark += 1;
            vi = mark;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

/// Action names are case-insensitive (`KMS:delete*` covers `kms:DeleteAlias`).
pub fn action_matches(pattern: &str, action: &str) -> bool {
    wildcard_match(pattern, action, CaseMode::Insensitive)
}

/// Resource ARNs are case-sensitive.
pub fn resource_matches(pattern: &str, resource: &str) -> bool {
    wildcard_match(pattern, resource, CaseMode::Sensitive)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperatorKind {
    Equals { ignore_case: bool },
    Like,
    Bool,
    Null,
}

/// A parsed condition operator such as `ForAnyValue:StringNotLikeIfExists`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Operator {
    pub kind: OperatorKind,
    pub negated: bool,
    pub if_exists: bool,
}

impl Operator {
    pub fn parse(raw: &str) -> Option<Operator> {
        let base = raw
            .strip_prefix("ForAnyValue:")
            .or_else(|| raw.strip_prefix("ForAllValues:"))
            .unwrap_or(raw);
        let (base, if_exists) = match base.strip_suffix("IfExists") {
            Some(b) => (b, true),
            None => (base, false),
        };

        let (kind, negated) = match base {
            "StringEquals" => (OperatorKind::Equals { ignore_case: false }, false),
            "StringNotEquals" => (OperatorKind::Equals { ignore_case: false }, true),
            "StringEqualsIgnoreCase" => (OperatorKind::Equals { ignore_case: true }, false),
            "StringNotEqualsIgnoreCase" => (OperatorKind::Equals { ignore_case: true }, true),
            "StringLike" | "ArnEquals" | "ArnLike" => (OperatorKind::Like, false),
            "StringNotLike" | "ArnNotEquals" | "ArnNotLike" => (OperatorKind::Like, true),
            "Bool" => (OperatorKind::Bool, false),
            "Null" if !if_exists => (OperatorKind::Null, false),
            _ => return None,
        };

        Some(Operator {
            kind,
            negated,
            if_exists,
        })
    }

    /// Evaluate the operator for one context value (`None` when the key is absent).
    pub fn evaluate(&self, expected: &[String], actual: Option<&str>) -> bool {
        if self.kind == OperatorKind::Null {
            return expected
                .iter()
                .any(|e| e.eq_ignore_ascii_case("true") == actual.is_none());
        }

        let Some(actual) = actual else {
            // Negated operators hold vacuously for an absent key.
            return self.if_exists || self.negated;
        };

        let any = expected.iter().any(|e| match self.kind {
            OperatorKind::Equals { ignore_case: false } => e == actual,
            OperatorKind::Equals { ignore_case: true } => e.eq_ignore_ascii_case(actual),
            OperatorKind::Like => wildcard_match(e, actual, CaseMode::Sensitive),
            OperatorKind::Bool => e.eq_ignore_ascii_case(actual),
            OperatorKind::Null => false,
        });
        any != self.negated
    }
}

pub fn is_supported_operator(raw: &str) -> bool {
    Operator::parse(raw).is_some()
}
