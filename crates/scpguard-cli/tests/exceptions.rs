//! `scpguard exceptions` against a scratch root.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

#[allow(deprecated)]
fn scpguard_cmd() -> Command {
    Command::cargo_bin("scpguard").expect("scpguard binary not found - run `cargo build` first")
}

fn exceptions_cmd(root: &Path, today: &str) -> Command {
    let mut cmd = scpguard_cmd();
    cmd.arg("--root")
        .arg(root)
        .arg("--today")
        .arg(today)
        .arg("exceptions");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("run scpguard");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout json")
}

#[test]
fn add_list_and_cleanup() {
    let tmp = TempDir::new().expect("temp dir");

    let mut add = exceptions_cmd(tmp.path(), "2026-10-16");
    add.args([
        "add",
        "--check-id",
        "scp.region_restriction",
        "--target",
        "ap-south-1",
        "--reason",
        "Mumbai pilot",
        "--days",
        "7",
    ]);
    let entry = stdout_json(&mut add);
    assert_eq!(entry["created"], "2026-10-16");
    assert_eq!(entry["expires"], "2026-10-23");
    let id = entry["id"].as_str().expect("id").to_string();
    assert_eq!(id.len(), 12);

    let registry = std::fs::read_to_string(tmp.path().join("scpguard-exceptions.toml"))
        .expect("registry written");
    assert!(registry.contains("[[exception]]"));
    assert!(registry.contains(&id));

    let listed = stdout_json(exceptions_cmd(tmp.path(), "2026-10-16").arg("list"));
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    // Still active on its last day.
    let removed = stdout_json(exceptions_cmd(tmp.path(), "2026-10-23").arg("cleanup"));
    assert_eq!(removed, serde_json::json!([]));

    let removed = stdout_json(exceptions_cmd(tmp.path(), "2026-10-24").arg("cleanup"));
    assert_eq!(removed, serde_json::json!([id]));
    let listed = stdout_json(exceptions_cmd(tmp.path(), "2026-10-24").arg("list"));
    assert_eq!(listed, serde_json::json!([]));
}

#[test]
fn add_rejects_long_lived_exceptions() {
    let tmp = TempDir::new().expect("temp dir");
    exceptions_cmd(tmp.path(), "2026-10-16")
        .args([
            "add",
            "--check-id",
            "scp.protected_actions",
            "--target",
            "kms:*",
            "--reason",
            "forever",
            "--days",
            "365",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 1 and 90 days"));
    assert!(!tmp.path().join("scpguard-exceptions.toml").exists());
}

#[test]
fn handle_reads_request_from_stdin() {
    let tmp = TempDir::new().expect("temp dir");
    let request = r#"{"action":"create_exception","check_id":"scp.protected_actions","target":"kms:*","reason":"rotation"}"#;

    let mut create = exceptions_cmd(tmp.path(), "2026-10-16");
    let response = stdout_json(create.arg("handle").write_stdin(request));
    assert_eq!(response["status"], 200);
    assert_eq!(response["body"]["exception"]["expires"], "2026-11-15");

    let violation = r#"{"action":"handle_compliance_violation","check_id":"scp.protected_actions","target":"kms:DeleteAlias"}"#;
    let mut check = exceptions_cmd(tmp.path(), "2026-10-16");
    let response = stdout_json(check.args(["handle", violation]));
    assert_eq!(response["body"]["status"], "excepted");
}

#[test]
fn handle_unknown_action_exits_nonzero() {
    let tmp = TempDir::new().expect("temp dir");
    let output = exceptions_cmd(tmp.path(), "2026-10-16")
        .args(["handle", r#"{"action":"delete_everything"}"#])
        .output()
        .expect("run scpguard");
    assert_eq!(output.status.code(), Some(1));
    let response: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(response["status"], 400);
    assert_eq!(response["body"]["error"], "Unknown action");
}

#[test]
fn exception_suppresses_check_findings() {
    let tmp = TempDir::new().expect("temp dir");
    let policies = tmp.path().join("policies");
    std::fs::create_dir_all(&policies).expect("mkdir");
    std::fs::write(
        policies.join("full-access.json"),
        r#"{"Version":"2012-10-17","Statement":{"Effect":"Allow","Action":"*","Resource":"*"}}"#,
    )
    .expect("write policy");
    std::fs::write(
        tmp.path().join("scpguard.toml"),
        "[protected]\nactions = [\"kms:ScheduleKeyDeletion\"]\n\n[regions]\nprobe = [\"eu-west-2\"]\n",
    )
    .expect("write config");
    let report_path = tmp.path().join("report.json");

    let mut check = scpguard_cmd();
    check
        .arg("--root")
        .arg(tmp.path())
        .args(["--today", "2026-10-16", "check", "--report-out"])
        .arg(&report_path);
    check.assert().code(2);

    exceptions_cmd(tmp.path(), "2026-10-16")
        .args([
            "add",
            "--check-id",
            "scp.protected_actions",
            "--target",
            "kms:*",
            "--reason",
            "key rotation",
        ])
        .assert()
        .success();

    let mut check = scpguard_cmd();
    check
        .arg("--root")
        .arg(tmp.path())
        .args(["--today", "2026-10-16", "check", "--report-out"])
        .arg(&report_path);
    check.assert().success();

    let report: Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).expect("read report"))
            .expect("parse report");
    assert_eq!(report["verdict"]["counts"]["suppressed"], 1);
}
