use crate::checks;
use crate::exceptions::{ExceptionSet, apply_exceptions};
use crate::fingerprint::fingerprint_for;
use crate::model::PolicySetModel;
use crate::policy::{EffectiveConfig, FailOn};
use crate::report::{DomainReport, SeverityCounts};
use scpguard_types::{Finding, ScpguardData, Severity, Verdict};
use time::Date;

pub fn evaluate(
    model: &PolicySetModel,
    cfg: &EffectiveConfig,
    exceptions: &ExceptionSet,
    today: Date,
) -> DomainReport {
    let mut findings: Vec<Finding> = Vec::new();

    checks::run_all(model, cfg, exceptions, today, &mut findings);

    let (mut findings, suppressed) = apply_exceptions(findings, exceptions, today);

    for f in &mut findings {
        if f.fingerprint.is_none() {
            let path = f.location.as_ref().map(|l| l.path.as_str());
            f.fingerprint = Some(fingerprint_for(&f.check_id, &f.code, path, f.subject()));
        }
    }

    // Deterministic ordering before truncation.
    findings.sort_by(compare_findings);

    let total = findings.len() as u32;

    let mut emitted = findings;
    let mut truncated_reason: Option<String> = None;
    if emitted.len() > cfg.max_findings {
        emitted.truncate(cfg.max_findings);
        truncated_reason = Some(format!(
            "findings truncated to max_findings={}",
            cfg.max_findings
        ));
    }

    let verdict = compute_verdict(&emitted, cfg.fail_on);
    let counts = SeverityCounts::from_findings(&emitted);

    let data = ScpguardData {
        profile: cfg.profile.clone(),
        documents_scanned: model.documents.len() as u32,
        statements_scanned: model.statement_count() as u32,
        findings_total: total,
        findings_emitted: emitted.len() as u32,
        findings_suppressed: suppressed,
        truncated_reason,
    };

    DomainReport {
        verdict,
        findings: emitted,
        data,
        counts,
    }
}

fn compute_verdict(findings: &[Finding], fail_on: FailOn) -> Verdict {
    let has_error = findings.iter().any(|f| f.severity == Severity::Error);
    if has_error {
        return Verdict::Fail;
    }

    let has_warn = findings.iter().any(|f| f.severity == Severity::Warn);
    if has_warn {
        return match fail_on {
            FailOn::Warn => Verdict::Fail,
            FailOn::Error => Verdict::Warn,
        };
    }

    Verdict::Pass
}

pub(crate) fn compare_findings(a: &Finding, b: &Finding) -> std::cmp::Ordering {
    // Ordering priority:
    // 1) severity (error -> warn -> info)
    // 2) location.path (missing last)
    // 3) location.statement (missing last)
    // 4) check_id
    // 5) code
    // 6) message
    let severity_rank = |sev: Severity| match sev {
        Severity::Error => 0,
        Severity::Warn => 1,
        Severity::Info => 2,
    };
    fn location_key(f: &Finding) -> (bool, &str, bool, Option<u32>) {
        match &f.location {
            Some(l) => (false, l.path.as_str(), l.statement.is_none(), l.statement),
            None => (true, "", true, None),
        }
    }

    severity_rank(a.severity)
        .cmp(&severity_rank(b.severity))
        .then_with(|| location_key(a).cmp(&location_key(b)))
        .then(a.check_id.cmp(&b.check_id))
        .then(a.code.cmp(&b.code))
        .then(a.message.cmp(&b.message))
}
