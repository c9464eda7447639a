use scpguard_types::RepoPath;

/// All policy documents in scope for one evaluation.
#[derive(Clone, Debug, Default)]
pub struct PolicySetModel {
    pub root: RepoPath,
    pub documents: Vec<PolicyDocumentModel>,
}

impl PolicySetModel {
    pub fn statement_count(&self) -> usize {
        self.documents.iter().map(|d| d.statements.len()).sum()
    }
}

#[derive(Clone, Debug, Default)]
pub struct PolicyDocumentModel {
    pub path: RepoPath,
    /// Display name: the `PolicySummary.Name` of an exported policy, else the file stem.
    pub name: String,
    pub version: Option<String>,
    pub statements: Vec<StatementModel>,
    /// Characters in the compact JSON rendering of the document.
    pub size_chars: usize,
    /// Set when the file could not be read as a policy document.
    pub parse_error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
    Other(String),
}

impl Effect {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Allow" => Effect::Allow,
            "Deny" => Effect::Deny,
            other => Effect::Other(other.to_string()),
        }
    }
}

/// `Action`/`NotAction` (or `Resource`/`NotResource`) of a statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionBlock {
    Match(Vec<String>),
    NotMatch(Vec<String>),
    Missing,
    /// Both the positive and the negated element were present.
    Conflict,
}

impl ActionBlock {
    pub fn from_pair(positive: Option<Vec<String>>, negated: Option<Vec<String>>) -> Self {
        match (positive, negated) {
            (Some(p), None) => ActionBlock::Match(p),
            (None, Some(n)) => ActionBlock::NotMatch(n),
            (None, None) => ActionBlock::Missing,
            (Some(_), Some(_)) => ActionBlock::Conflict,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionModel {
    /// Operator as written, e.g. `ForAnyValue:StringNotLikeIfExists`.
    pub operator: String,
    pub key: String,
    pub values: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct StatementModel {
    pub index: u32,
    pub sid: Option<String>,
    pub effect: Effect,
    pub action: ActionBlock,
    pub resource: ActionBlock,
    pub conditions: Vec<ConditionModel>,
}
