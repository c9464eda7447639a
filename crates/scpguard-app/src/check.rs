//! The `check` use case: evaluate the policy set and produce a report.

use crate::exceptions::ExceptionRegistry;
use crate::report::tool_meta;
use anyhow::Context;
use camino::Utf8Path;
use scpguard_settings::{Overrides, ResolvedConfig};
use scpguard_types::{
    Finding, RunMeta, SCHEMA_REPORT_V1, ScpguardReport, Severity, VerdictCounts, VerdictEnvelope,
    VerdictStatus,
};
use std::collections::BTreeSet;
use time::{Date, OffsetDateTime};

/// Input for the check use case.
#[derive(Clone, Debug)]
pub struct CheckInput<'a> {
    /// Root the config's relative paths (exception registry) resolve against.
    pub root: &'a Utf8Path,
    /// Directory holding the policy documents.
    pub policies_dir: &'a Utf8Path,
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    /// CLI overrides.
    pub overrides: Overrides,
    /// Evaluation date for exception expiry; `None` means today (UTC).
    pub today: Option<Date>,
}

/// Output from the check use case.
#[derive(Clone, Debug)]
pub struct CheckOutput {
    /// The generated report.
    pub report: ScpguardReport,
    /// The resolved configuration used.
    pub resolved_config: ResolvedConfig,
}

/// Parse + resolve config text; empty text means all defaults.
pub fn resolve_config_text(
    config_text: &str,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    let cfg = if config_text.trim().is_empty() {
        scpguard_settings::ScpguardConfigV1::default()
    } else {
        scpguard_settings::parse_config_toml(config_text).context("parse config")?
    };
    scpguard_settings::resolve_config(cfg, overrides).context("resolve config")
}

/// Run the check use case: resolve config, load policies and exceptions, evaluate, report.
pub fn run_check(input: CheckInput<'_>) -> anyhow::Result<CheckOutput> {
    let started_at = OffsetDateTime::now_utc();
    let today = input.today.unwrap_or_else(|| started_at.date());

    let resolved = resolve_config_text(input.config_text, input.overrides.clone())?;

    let model =
        scpguard_policies::build_policy_set(input.policies_dir).context("build policy set")?;

    let registry = ExceptionRegistry::new(input.root.join(&resolved.exceptions_path));
    let exceptions = registry
        .load_set()
        .with_context(|| format!("load exceptions from {}", registry.path()))?;

    tracing::debug!(
        profile = resolved.effective.profile.as_str(),
        documents = model.documents.len(),
        exceptions = exceptions.entries().count(),
        %today,
        "evaluating policy set"
    );

    let domain_report = scpguard_domain::evaluate(&model, &resolved.effective, &exceptions, today);
    let scpguard_domain::report::DomainReport {
        verdict: domain_verdict,
        findings,
        data,
        counts,
    } = domain_report;

    let finished_at = OffsetDateTime::now_utc();
    let duration_ms = (finished_at - started_at).whole_milliseconds().max(0) as u64;

    tracing::info!(
        verdict = ?domain_verdict,
        emitted = data.findings_emitted,
        suppressed = data.findings_suppressed,
        "check complete"
    );

    let report = ScpguardReport {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: tool_meta(),
        run: RunMeta {
            started_at,
            ended_at: Some(finished_at),
            duration_ms: Some(duration_ms),
        },
        verdict: VerdictEnvelope {
            status: domain_verdict.into(),
            counts: VerdictCounts {
                info: counts.info,
                warn: counts.warn,
                error: counts.error,
                suppressed: data.findings_suppressed,
            },
            reasons: verdict_reasons(&findings, data.truncated_reason.is_some()),
        },
        findings,
        data,
    };

    Ok(CheckOutput {
        report,
        resolved_config: resolved,
    })
}

/// Check ids that produced warn/error findings, plus `truncated` when the list was cut.
fn verdict_reasons(findings: &[Finding], truncated: bool) -> Vec<String> {
    let mut reasons: BTreeSet<String> = findings
        .iter()
        .filter(|f| f.severity != Severity::Info)
        .map(|f| f.check_id.clone())
        .collect();
    if truncated {
        reasons.insert("truncated".to_string());
    }
    reasons.into_iter().collect()
}

/// Map verdict to exit code: 0 = pass/warn, 2 = fail.
pub fn verdict_exit_code(status: VerdictStatus) -> i32 {
    match status {
        VerdictStatus::Pass | VerdictStatus::Warn => 0,
        VerdictStatus::Fail => 2,
    }
}
