//! The exception registry: a TOML file of time-boxed guardrail exceptions.
//!
//! Reads go through `toml` + serde; writes go through `toml_edit` so comments and
//! formatting in the registry survive `add` and `cleanup`.

use camino::{Utf8Path, Utf8PathBuf};
use schemars::JsonSchema;
use scpguard_domain::exceptions::{ExceptionEntry, ExceptionError, ExceptionSet};
use scpguard_types::explain;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::macros::format_description;
use time::{Date, Duration};
use toml_edit::{ArrayOfTables, DocumentMut, Item, Table, value};

/// Default lifetime of a new exception.
pub const DEFAULT_EXCEPTION_DAYS: i64 = 30;
/// Longest lifetime an exception may be created with.
pub const MAX_EXCEPTION_DAYS: i64 = 90;

const TABLE_KEY: &str = "exception";

/// On-disk shape of the registry (`[[exception]]` tables).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExceptionsFileV1 {
    #[serde(default)]
    pub exception: Vec<ExceptionEntry>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("reason must not be empty")]
    EmptyReason,

    #[error("unknown check_id '{0}'")]
    UnknownCheck(String),

    #[error("expiry must be between 1 and 90 days (got {0})")]
    InvalidExpiry(i64),

    #[error("exception {0} already exists")]
    Duplicate(String),

    #[error(transparent)]
    InvalidTarget(#[from] ExceptionError),

    #[error("read {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write {path}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {path}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },

    #[error("invalid exception registry {path}: {message}")]
    Entry { path: Utf8PathBuf, message: String },
}

impl RegistryError {
    /// Errors caused by the caller's input, as opposed to the registry itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RegistryError::InvalidRequest(_)
                | RegistryError::EmptyReason
                | RegistryError::UnknownCheck(_)
                | RegistryError::InvalidExpiry(_)
                | RegistryError::Duplicate(_)
                | RegistryError::InvalidTarget(_)
        )
    }
}

/// Input for creating an exception.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewException {
    pub check_id: String,
    pub target: String,
    pub reason: String,
    /// Lifetime in days; defaults to [`DEFAULT_EXCEPTION_DAYS`].
    pub days: Option<i64>,
}

#[derive(Clone, Debug)]
pub struct ExceptionRegistry {
    path: Utf8PathBuf,
}

impl ExceptionRegistry {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Registry contents; a missing file is an empty registry.
    fn read_text(&self) -> Result<String, RegistryError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(RegistryError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write_text(&self, text: &str) -> Result<(), RegistryError> {
        let write_err = |source| RegistryError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(&self.path, text).map_err(write_err)
    }

    fn parse_document(&self, text: &str) -> Result<DocumentMut, RegistryError> {
        text.parse::<DocumentMut>()
            .map_err(|source| RegistryError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    pub fn list(&self) -> Result<Vec<ExceptionEntry>, RegistryError> {
        let text = self.read_text()?;
        let file: ExceptionsFileV1 =
            toml::from_str(&text).map_err(|err| RegistryError::Entry {
                path: self.path.clone(),
                message: err.to_string(),
            })?;
        Ok(file.exception)
    }

    /// Compiled registry for the engine.
    pub fn load_set(&self) -> Result<ExceptionSet, RegistryError> {
        Ok(ExceptionSet::new(self.list()?)?)
    }

    pub fn create(&self, new: NewException, today: Date) -> Result<ExceptionEntry, RegistryError> {
        let check_id = new.check_id.trim();
        if check_id != "*" && !explain::all_check_ids().contains(&check_id) {
            return Err(RegistryError::UnknownCheck(check_id.to_string()));
        }
        let target = new.target.trim();
        if target.is_empty() {
            return Err(RegistryError::InvalidRequest(
                "target must not be empty".to_string(),
            ));
        }
        let reason = new.reason.trim();
        if reason.is_empty() {
            return Err(RegistryError::EmptyReason);
        }
        let days = new.days.unwrap_or(DEFAULT_EXCEPTION_DAYS);
        if !(1..=MAX_EXCEPTION_DAYS).contains(&days) {
            return Err(RegistryError::InvalidExpiry(days));
        }
        let expires = today
            .checked_add(Duration::days(days))
            .ok_or(RegistryError::InvalidExpiry(days))?;

        let entry = ExceptionEntry {
            id: exception_id(check_id, target, today),
            check_id: check_id.to_string(),
            target: target.to_string(),
            reason: reason.to_string(),
            created: today,
            expires,
        };
        // Compiles the target glob.
        ExceptionSet::new(vec![entry.clone()])?;

        if self.list()?.iter().any(|e| e.id == entry.id) {
            return Err(RegistryError::Duplicate(entry.id));
        }

        let text = self.read_text()?;
        let mut doc = self.parse_document(&text)?;
        let item = doc
            .entry(TABLE_KEY)
            .or_insert(Item::ArrayOfTables(ArrayOfTables::new()));
        let Some(tables) = item.as_array_of_tables_mut() else {
            return Err(RegistryError::Entry {
                path: self.path.clone(),
                message: format!("`{TABLE_KEY}` must be an array of tables"),
            });
        };
        tables.push(entry_table(&entry));
        self.write_text(&doc.to_string())?;

        tracing::info!(
            id = entry.id.as_str(),
            check_id = entry.check_id.as_str(),
            target = entry.target.as_str(),
            expires = %entry.expires,
            "created exception"
        );
        Ok(entry)
    }

    /// Remove exceptions that expired before `today`; returns the removed ids.
    pub fn cleanup_expired(&self, today: Date) -> Result<Vec<String>, RegistryError> {
        let text = self.read_text()?;
        let mut doc = self.parse_document(&text)?;
        let Some(tables) = doc
            .get_mut(TABLE_KEY)
            .and_then(Item::as_array_of_tables_mut)
        else {
            return Ok(Vec::new());
        };

        let mut removed = Vec::new();
        for index in (0..tables.len()).rev() {
            let Some(table) = tables.get(index) else {
                continue;
            };
            let expires = table_date(table, "expires").ok_or_else(|| RegistryError::Entry {
                path: self.path.clone(),
                message: format!("exception #{} has no valid `expires` date", index + 1),
            })?;
            if expires < today {
                let id = table
                    .get("id")
                    .and_then(Item::as_str)
                    .unwrap_or_default()
                    .to_string();
                tables.remove(index);
                removed.push(id);
            }
        }
        removed.reverse();

        if !removed.is_empty() {
            self.write_text(&doc.to_string())?;
        }
        tracing::info!(removed = removed.len(), "cleaned up expired exceptions");
        Ok(removed)
    }
}

/// First 12 hex characters of `sha256(check_id|target|created)`.
pub fn exception_id(check_id: &str, target: &str, created: Date) -> String {
    let mut hasher = Sha256::new();
    hasher.update(check_id.as_bytes());
    hasher.update(b"|");
    hasher.update(target.as_bytes());
    hasher.update(b"|");
    hasher.update(created.to_string().as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(12);
    id
}

fn entry_table(entry: &ExceptionEntry) -> Table {
    let mut table = Table::new();
    table["id"] = value(entry.id.as_str());
    table["check_id"] = value(entry.check_id.as_str());
    table["target"] = value(entry.target.as_str());
    table["reason"] = value(entry.reason.as_str());
    table["created"] = value(entry.created.to_string());
    table["expires"] = value(entry.expires.to_string());
    table
}

fn table_date(table: &Table, key: &str) -> Option<Date> {
    let raw = table.get(key)?.as_str()?;
    Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()
}

/// Response of [`handle_request`], shaped like an HTTP reply.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl HandlerResponse {
    fn ok(body: serde_json::Value) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum HandlerRequest {
    CreateException {
        check_id: String,
        target: String,
        reason: String,
        #[serde(default)]
        days: Option<i64>,
    },
    CleanupExpired,
    HandleComplianceViolation {
        check_id: String,
        target: String,
    },
}

const HANDLER_ACTIONS: &[&str] = &[
    "create_exception",
    "cleanup_expired",
    "handle_compliance_violation",
];

/// Dispatch a JSON request against the registry.
///
/// Status is 200 on success, 400 for an unknown action or invalid input, and 500
/// when the registry itself cannot be read or written.
pub fn handle_request(registry: &ExceptionRegistry, request: &str, today: Date) -> HandlerResponse {
    let value: serde_json::Value = match serde_json::from_str(request) {
        Ok(v) => v,
        Err(err) => return HandlerResponse::error(400, format!("invalid request: {err}")),
    };
    let action = value
        .get("action")
        .and_then(|a| a.as_str())
        .unwrap_or_default();
    if !HANDLER_ACTIONS.contains(&action) {
        tracing::warn!(action, "unknown exception action");
        return HandlerResponse::error(400, "Unknown action");
    }
    let parsed: HandlerRequest = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(err) => return HandlerResponse::error(400, format!("invalid request: {err}")),
    };

    let result = match parsed {
        HandlerRequest::CreateException {
            check_id,
            target,
            reason,
            days,
        } => registry
            .create(
                NewException {
                    check_id,
                    target,
                    reason,
                    days,
                },
                today,
            )
            .map(|entry| json!({ "message": "Exception created", "exception": entry })),
        HandlerRequest::CleanupExpired => registry
            .cleanup_expired(today)
            .map(|removed| json!({ "message": "Cleanup completed", "removed": removed })),
        HandlerRequest::HandleComplianceViolation { check_id, target } => registry
            .load_set()
            .map(|set| match set.covering(&check_id, &target, today) {
                Some(entry) => json!({
                    "message": "Violation handled",
                    "status": "excepted",
                    "exception_id": entry.id,
                    "expires": entry.expires.to_string(),
                }),
                None => json!({
                    "message": "Violation handled",
                    "status": "violation",
                }),
            }),
    };

    match result {
        Ok(body) => HandlerResponse::ok(body),
        Err(err) if err.is_client_error() => HandlerResponse::error(400, err.to_string()),
        Err(err) => {
            tracing::error!(error = %format_chain(&err), "error processing request");
            HandlerResponse::error(500, format_chain(&err))
        }
    }
}

fn format_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
