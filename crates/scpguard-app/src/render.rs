//! Render use cases: markdown and GitHub annotations from in-memory reports.

use scpguard_render::RenderableReport;

pub fn render_markdown(report: &RenderableReport) -> String {
    scpguard_render::render_markdown(report)
}

pub fn render_annotations(report: &RenderableReport, max: usize) -> Vec<String> {
    scpguard_render::render_github_annotations(report, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scpguard_render::{
        RenderableData, RenderableFinding, RenderableLocation, RenderableReport,
        RenderableSeverity, RenderableVerdictStatus,
    };

    fn sample_report() -> RenderableReport {
        RenderableReport {
            verdict: RenderableVerdictStatus::Fail,
            findings: vec![
                RenderableFinding {
                    severity: RenderableSeverity::Error,
                    check_id: Some("scp.protected_actions".to_string()),
                    code: "action_not_denied".to_string(),
                    message: "kms:ScheduleKeyDeletion is not denied".to_string(),
                    location: Some(RenderableLocation {
                        path: "policies/guardrails.json".to_string(),
                        statement: Some(0),
                    }),
                    help: None,
                    url: None,
                },
                RenderableFinding {
                    severity: RenderableSeverity::Info,
                    check_id: Some("scp.exceptions".to_string()),
                    code: "exception_expired".to_string(),
                    message: "exception 0123456789ab expired".to_string(),
                    location: None,
                    help: None,
                    url: None,
                },
            ],
            data: RenderableData {
                profile: "strict".to_string(),
                documents_scanned: 1,
                findings_emitted: 2,
                findings_total: 2,
                findings_suppressed: 0,
                truncated_reason: None,
            },
        }
    }

    #[test]
    fn render_annotations_respects_max() {
        let report = sample_report();
        assert_eq!(render_annotations(&report, 1).len(), 1);
        assert_eq!(render_annotations(&report, 10).len(), 2);
    }

    #[test]
    fn render_markdown_names_the_verdict() {
        let markdown = render_markdown(&sample_report());
        assert!(markdown.contains("FAIL"));
        assert!(markdown.contains("kms:ScheduleKeyDeletion"));
    }
}
