//! Use case orchestration for scpguard.
//!
//! This crate provides the application layer: use cases that coordinate the domain,
//! policy loading, settings, and render layers. The CLI crate depends on this and only
//! handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod check;
mod decide;
mod exceptions;
mod explain;
mod render;
mod report;

pub use check::{CheckInput, CheckOutput, resolve_config_text, run_check, verdict_exit_code};
pub use decide::{DecideInput, DecideOutput, parse_context_pair, run_decide};
pub use exceptions::{
    DEFAULT_EXCEPTION_DAYS, ExceptionRegistry, ExceptionsFileV1, HandlerResponse,
    MAX_EXCEPTION_DAYS, NewException, RegistryError, exception_id, handle_request,
};
pub use explain::{ExplainOutput, format_explanation, format_not_found, run_explain};
pub use render::{render_annotations, render_markdown};
pub use report::{parse_report_json, runtime_error_report, serialize_report, to_renderable};
