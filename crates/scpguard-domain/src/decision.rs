//! Request evaluation against a policy set.
//!
//! Precedence follows the IAM evaluation order: an applicable `Deny` anywhere wins,
//! otherwise an applicable `Allow` permits, otherwise the request is implicitly denied.

use crate::matcher::{Operator, action_matches, resource_matches};
use crate::model::{ActionBlock, ConditionModel, Effect, PolicySetModel, StatementModel};
use scpguard_types::RepoPath;
use scpguard_types::ids::KEY_REQUESTED_REGION;
use serde::Serialize;
use std::collections::BTreeMap;

/// A synthetic API request used to probe the policy set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessRequest {
    pub action: String,
    pub resource: String,
    /// Request context, keyed by lowercased condition key.
    pub context: BTreeMap<String, String>,
}

impl AccessRequest {
    pub fn new(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resource: resource.into(),
            context: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_ascii_lowercase(), value.into());
        self
    }

    pub fn in_region(self, region: &str) -> Self {
        self.with_context(KEY_REQUESTED_REGION, region)
    }
}

/// Which statement produced a decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MatchedStatement {
    pub document: RepoPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub statement: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    ExplicitDeny(MatchedStatement),
    Allow(MatchedStatement),
    ImplicitDeny,
}

impl Decision {
    pub fn is_explicit_deny(&self) -> bool {
        matches!(self, Decision::ExplicitDeny(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::ExplicitDeny(_) => "explicit_deny",
            Decision::Allow(_) => "allow",
            Decision::ImplicitDeny => "implicit_deny",
        }
    }
}

pub fn decide(set: &PolicySetModel, request: &AccessRequest) -> Decision {
    let mut first_allow: Option<MatchedStatement> = None;

    for doc in &set.documents {
        for stmt in &doc.statements {
            if !statement_applies(stmt, request) {
                continue;
            }
            let matched = || MatchedStatement {
                document: doc.path.clone(),
                sid: stmt.sid.clone(),
                statement: stmt.index,
            };
            match stmt.effect {
                Effect::Deny => return Decision::ExplicitDeny(matched()),
                Effect::Allow => {
                    if first_allow.is_none() {
                        first_allow = Some(matched());
                    }
                }
                Effect::Other(_) => {}
            }
        }
    }

    match first_allow {
        Some(m) => Decision::Allow(m),
        None => Decision::ImplicitDeny,
    }
}

pub fn statement_applies(stmt: &StatementModel, request: &AccessRequest) -> bool {
    let action_ok = match &stmt.action {
        ActionBlock::Match(p) => p.iter().any(|p| action_matches(p, &request.action)),
        ActionBlock::NotMatch(p) => !p.iter().any(|p| action_matches(p, &request.action)),
        ActionBlock::Missing | ActionBlock::Conflict => false,
    };
    if !action_ok {
        return false;
    }

    let resource_ok = match &stmt.resource {
        ActionBlock::Match(p) => p.iter().any(|p| resource_matches(p, &request.resource)),
        ActionBlock::NotMatch(p) => !p.iter().any(|p| resource_matches(p, &request.resource)),
        ActionBlock::Missing => true,
        ActionBlock::Conflict => false,
    };
    if !resource_ok {
        return false;
    }

    stmt.conditions.iter().all(|c| condition_holds(c, request))
}

fn condition_holds(cond: &ConditionModel, request: &AccessRequest) -> bool {
    let Some(op) = Operator::parse(&cond.operator) else {
        return false;
    };
    let actual = request
        .context
        .get(&cond.key.to_ascii_lowercase())
        .map(String::as_str);
    op.evaluate(&cond.values, actual)
}
