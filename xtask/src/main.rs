//! Developer tasks (schema generation, conformance checks, explain coverage).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};

/// Project root (parent of the xtask directory).
fn project_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .unwrap_or(manifest_dir)
        .to_path_buf()
}

fn schemas_dir() -> PathBuf {
    project_root().join("schemas")
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_report_schema() -> schemars::Schema {
    schema_for!(scpguard_types::ScpguardReport)
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(scpguard_settings::ScpguardConfigV1)
}

fn generate_exceptions_schema() -> schemars::Schema {
    schema_for!(scpguard_app::ExceptionsFileV1)
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "scpguard.report.v1.json",
            generate: generate_report_schema,
        },
        SchemaSpec {
            filename: "scpguard.config.v1.json",
            generate: generate_config_schema,
        },
        SchemaSpec {
            filename: "scpguard.exceptions.v1.json",
            generate: generate_exceptions_schema,
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    fs::create_dir_all(&dir).context("Failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Check that schemas/ matches what would be generated.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }

        let expected = serialize_schema(&(spec.generate)())?;
        let actual = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {name}");
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {name}");
        }
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  conform           Run scpguard on tests/fixtures and validate the reports");
    eprintln!("  explain-coverage  Validate all check IDs and codes have explanations");
}

/// Token pattern for verdict reasons.
fn is_valid_token(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.')
}

/// No absolute paths, no `../`, forward slashes only.
fn is_clean_path(path: &str) -> bool {
    !(path.starts_with('/')
        || path.starts_with('\\')
        || path.contains("..")
        || path.contains('\\')
        || (path.len() >= 2 && path.as_bytes()[1] == b':'))
}

/// Schema, path and token hygiene for one report.
fn report_errors(
    validator: &jsonschema::Validator,
    label: &str,
    report: &serde_json::Value,
) -> Vec<String> {
    let mut errors: Vec<String> = validator
        .iter_errors(report)
        .map(|err| format!("{label}: schema validation: {err}"))
        .collect();

    if let Some(findings) = report.get("findings").and_then(|v| v.as_array()) {
        for (i, finding) in findings.iter().enumerate() {
            let path = finding
                .get("location")
                .and_then(|loc| loc.get("path"))
                .and_then(|v| v.as_str());
            if let Some(path) = path.filter(|p| !is_clean_path(p)) {
                errors.push(format!(
                    "{label}: finding[{i}].location.path '{path}' is not clean"
                ));
            }
        }
    }

    if let Some(reasons) = report
        .get("verdict")
        .and_then(|v| v.get("reasons"))
        .and_then(|v| v.as_array())
    {
        for (i, reason) in reasons.iter().enumerate() {
            if let Some(s) = reason.as_str().filter(|s| !is_valid_token(s)) {
                errors.push(format!(
                    "{label}: verdict.reasons[{i}] '{s}' is not a valid token"
                ));
            }
        }
    }

    errors
}

/// Run the built scpguard binary on every fixture and validate its reports.
fn conform() -> anyhow::Result<()> {
    let schema_path = schemas_dir().join("scpguard.report.v1.json");
    if !schema_path.exists() {
        bail!(
            "{} not found.\n\nRun `cargo xtask emit-schemas` first.",
            schema_path.display()
        );
    }
    let schema_content = fs::read_to_string(&schema_path)
        .with_context(|| format!("Failed to read {}", schema_path.display()))?;
    let schema_value: serde_json::Value =
        serde_json::from_str(&schema_content).context("Failed to parse report schema")?;
    let validator = jsonschema::validator_for(&schema_value)
        .map_err(|e| anyhow::anyhow!("Failed to compile schema: {e}"))?;
    println!("✓ scpguard.report.v1.json schema compiles");

    let scpguard_bin = project_root().join("target").join("debug").join("scpguard");
    #[cfg(target_os = "windows")]
    let scpguard_bin = scpguard_bin.with_extension("exe");
    if !scpguard_bin.exists() {
        bail!(
            "scpguard binary not found at {}.\nRun `cargo build -p scpguard-cli` first.",
            scpguard_bin.display()
        );
    }

    let fixtures_dir = project_root().join("tests").join("fixtures");
    let mut errors = Vec::new();
    let mut fixture_count = 0;

    let mut fixtures: Vec<PathBuf> = fs::read_dir(&fixtures_dir)
        .context("Failed to read tests/fixtures/")?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.join("policies").is_dir())
        .collect();
    fixtures.sort();

    for fixture_dir in fixtures {
        let name = fixture_dir
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let temp_dir = tempfile::tempdir().context("Failed to create temp dir")?;
        let report_out = temp_dir.path().join("report.json");

        let output = std::process::Command::new(&scpguard_bin)
            .arg("--root")
            .arg(&fixture_dir)
            .arg("check")
            .arg("--report-out")
            .arg(&report_out)
            .output()
            .with_context(|| format!("Failed to run scpguard on fixture '{name}'"))?;

        // 0 and 2 are verdicts; anything else is a tool failure.
        if !matches!(output.status.code(), Some(0) | Some(2)) {
            errors.push(format!(
                "fixture '{name}': scpguard exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            ));
            continue;
        }

        let report_content = fs::read_to_string(&report_out)
            .with_context(|| format!("fixture '{name}': no report output generated"))?;
        let report: serde_json::Value = serde_json::from_str(&report_content)
            .with_context(|| format!("Failed to parse report for fixture '{name}'"))?;

        let fixture_errors = report_errors(&validator, &name, &report);
        if fixture_errors.is_empty() {
            println!("  ✓ fixture '{name}' produces a valid report");
        }
        errors.extend(fixture_errors);
        fixture_count += 1;
    }

    if fixture_count == 0 {
        bail!("No fixtures found in {}", fixtures_dir.display());
    }
    if !errors.is_empty() {
        eprintln!("\nConformance errors:");
        for err in &errors {
            eprintln!("  - {err}");
        }
        bail!("Conformance validation failed with {} errors", errors.len());
    }

    println!("\n✓ All {fixture_count} fixtures pass conformance checks!");
    Ok(())
}

/// Validate that all check IDs and codes have explanations.
fn explain_coverage() -> anyhow::Result<()> {
    use scpguard_types::explain::{all_check_ids, all_codes, lookup_explanation};

    let check_ids = all_check_ids();
    let codes = all_codes();
    let mut errors = Vec::new();

    let ids = check_ids
        .iter()
        .map(|id| ("Check ID", *id))
        .chain(codes.iter().map(|code| ("Code", *code)));
    for (kind, id) in ids {
        match lookup_explanation(id) {
            Some(exp) => {
                if exp.title.is_empty() {
                    errors.push(format!("{kind} '{id}' has empty title"));
                }
                if exp.description.is_empty() {
                    errors.push(format!("{kind} '{id}' has empty description"));
                }
                if exp.remediation.is_empty() {
                    errors.push(format!("{kind} '{id}' has empty remediation"));
                }
                if exp.examples.before.trim().is_empty() {
                    errors.push(format!("{kind} '{id}' has no `before` example"));
                }
            }
            None => errors.push(format!("{kind} '{id}' has no explanation")),
        }
    }

    if errors.is_empty() {
        println!("✓ {} check IDs have explanations", check_ids.len());
        println!("✓ {} codes have explanations", codes.len());
        println!("\n✓ All explain coverage checks passed!");
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  - {error}");
        }
        bail!(
            "Explain coverage validation failed with {} errors",
            errors.len()
        )
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "conform" => conform(),
        "explain-coverage" => explain_coverage(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
