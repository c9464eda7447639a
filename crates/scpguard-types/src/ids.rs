//! Stable identifiers for checks and finding codes.
//!
//! `check_id` is a dotted namespace. `code` is a short snake_case discriminator.

// Checks
pub const CHECK_SCP_DOCUMENT_VALID: &str = "scp.document_valid";
pub const CHECK_SCP_SIZE_LIMIT: &str = "scp.size_limit";
pub const CHECK_SCP_PROTECTED_ACTIONS: &str = "scp.protected_actions";
pub const CHECK_SCP_REGION_RESTRICTION: &str = "scp.region_restriction";
pub const CHECK_SCP_EXCEPTIONS: &str = "scp.exceptions";

// Codes: scp.document_valid
pub const CODE_INVALID_DOCUMENT: &str = "invalid_document";
pub const CODE_UNSUPPORTED_VERSION: &str = "unsupported_version";
pub const CODE_DUPLICATE_SID: &str = "duplicate_sid";
pub const CODE_INVALID_STATEMENT: &str = "invalid_statement";
pub const CODE_UNSUPPORTED_CONDITION_OPERATOR: &str = "unsupported_condition_operator";

// Codes: scp.size_limit
pub const CODE_DOCUMENT_TOO_LARGE: &str = "document_too_large";

// Codes: scp.protected_actions
pub const CODE_ACTION_NOT_DENIED: &str = "action_not_denied";

// Codes: scp.region_restriction
pub const CODE_REGION_NOT_DENIED: &str = "region_not_denied";
pub const CODE_ALLOWED_REGION_DENIED: &str = "allowed_region_denied";

// Codes: scp.exceptions
pub const CODE_EXCEPTION_EXPIRED: &str = "exception_expired";

// Tool-level
pub const CHECK_TOOL_RUNTIME: &str = "tool.runtime";
pub const CODE_RUNTIME_ERROR: &str = "runtime_error";

/// The only policy language version accepted for SCPs.
pub const POLICY_VERSION_2012: &str = "2012-10-17";

/// Context key carrying the region of a request.
pub const KEY_REQUESTED_REGION: &str = "aws:requestedregion";
