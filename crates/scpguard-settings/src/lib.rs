//! Config parsing and profile/preset resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod presets;
mod resolve;

pub use model::{CheckConfig, ProtectedConfig, RegionsConfig, ScpguardConfigV1};
pub use presets::{
    DEFAULT_ALLOWED_REGIONS, DEFAULT_EXCEPTIONS_FILE, DEFAULT_MAX_POLICY_CHARS,
    DEFAULT_PROBE_ACTION, DEFAULT_PROBE_REGIONS, DEFAULT_PROTECTED_ACTIONS,
};
pub use resolve::{Overrides, ResolvedConfig};

/// Parse `scpguard.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<ScpguardConfigV1> {
    let cfg: ScpguardConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective config used by the engine (profiles + overrides + per-check config).
pub fn resolve_config(
    cfg: ScpguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
