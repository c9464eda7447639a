use crate::{RenderableReport, RenderableSeverity};

/// Render findings as GitHub Actions workflow command annotations.
///
/// Format:
/// `::{level} file={path},title={check_id}::{message}`
///
/// At most `max` annotations are produced.
pub fn render_github_annotations(report: &RenderableReport, max: usize) -> Vec<String> {
    let mut out = Vec::new();

    for f in report.findings.iter().take(max) {
        let level = match f.severity {
            RenderableSeverity::Error => "error",
            RenderableSeverity::Warning => "warning",
            RenderableSeverity::Info => "notice",
        };

        let check_id = f.check_id.as_deref().unwrap_or("scpguard");

        let mut meta = String::new();
        if let Some(loc) = &f.location {
            meta.push_str(&format!("file={}", escape_property(&loc.path)));
            meta.push_str(&format!(",title={}", escape_property(check_id)));
        }

        let mut message = format!("[{}:{}] {}", check_id, f.code, f.message);
        if let Some(statement) = f.location.as_ref().and_then(|l| l.statement) {
            message.push_str(&format!(" (statement {})", statement));
        }
        let message = escape_data(&message);

        if meta.is_empty() {
            out.push(format!("::{}::{}", level, message));
        } else {
            out.push(format!("::{} {}::{}", level, meta, message));
        }
    }

    out
}

fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
