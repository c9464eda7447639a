//! CLI entry point for scpguard.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, logging setup
//! and exit codes. All business logic lives in the `scpguard-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use scpguard_app::{
    CheckInput, DecideInput, ExceptionRegistry, ExplainOutput, NewException, format_explanation,
    format_not_found, handle_request, parse_context_pair, parse_report_json, render_annotations,
    render_markdown, resolve_config_text, run_check, run_decide, run_explain, runtime_error_report,
    serialize_report, to_renderable, verdict_exit_code,
};
use scpguard_settings::Overrides;
use scpguard_types::ScpguardReport;
use std::io::Read;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SCPGUARD_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "scpguard",
    version,
    about = "Guardrail compliance sensor for AWS Service Control Policies"
)]
struct Cli {
    /// Root directory (config, exception registry and default policies resolve against it).
    #[arg(long, default_value = ".")]
    root: Utf8PathBuf,

    /// Path to scpguard config TOML, relative to the root.
    #[arg(long, default_value = "scpguard.toml")]
    config: Utf8PathBuf,

    /// Override profile (strict|warn|compat).
    #[arg(long)]
    profile: Option<String>,

    /// Override maximum findings to emit.
    #[arg(long)]
    max_findings: Option<u32>,

    /// Evaluation date (YYYY-MM-DD) for exception expiry; defaults to today (UTC).
    #[arg(long, value_parser = parse_date)]
    today: Option<Date>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate the policy set and write artifacts.
    Check {
        /// Directory holding the policy documents (default: <root>/policies).
        #[arg(long)]
        policies: Option<Utf8PathBuf>,

        /// Where to write the JSON report.
        #[arg(long, default_value = "artifacts/scpguard/report.json")]
        report_out: Utf8PathBuf,

        /// Write a Markdown report alongside the JSON.
        #[arg(long)]
        write_markdown: bool,

        /// Where to write the Markdown report (if enabled).
        #[arg(long, default_value = "artifacts/scpguard/comment.md")]
        markdown_out: Utf8PathBuf,
    },

    /// Evaluate a single request against the policy set and print the decision.
    Decide {
        /// Directory holding the policy documents (default: <root>/policies).
        #[arg(long)]
        policies: Option<Utf8PathBuf>,

        /// Action to evaluate, e.g. "kms:ScheduleKeyDeletion".
        #[arg(long)]
        action: String,

        /// Resource ARN.
        #[arg(long, default_value = "*")]
        resource: String,

        /// Requested region (sets aws:RequestedRegion).
        #[arg(long)]
        region: Option<String>,

        /// Extra condition context as key=value; repeatable.
        #[arg(long = "context", value_parser = parse_context_pair)]
        context: Vec<(String, String)>,
    },

    /// Render markdown from an existing JSON report.
    Md {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/scpguard/report.json")]
        report: Utf8PathBuf,

        /// Where to write the Markdown output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Render GitHub Actions annotations from an existing JSON report.
    Annotations {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/scpguard/report.json")]
        report: Utf8PathBuf,

        /// Maximum number of annotations to emit.
        #[arg(long, default_value = "10")]
        max: usize,
    },

    /// Explain a check_id or code with remediation guidance.
    Explain {
        /// The check_id (e.g., "scp.protected_actions") or code (e.g., "action_not_denied").
        identifier: String,
    },

    /// Manage the exception registry.
    Exceptions {
        #[command(subcommand)]
        cmd: ExceptionsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ExceptionsCommand {
    /// Add a time-boxed exception.
    Add {
        #[arg(long)]
        check_id: String,
        /// Glob matched against finding subjects (actions, regions, document paths).
        #[arg(long)]
        target: String,
        #[arg(long)]
        reason: String,
        /// Lifetime in days (1..=90, default 30).
        #[arg(long)]
        days: Option<i64>,
    },
    /// Remove expired exceptions.
    Cleanup,
    /// Print the registry as JSON.
    List,
    /// Dispatch a JSON request (argument or stdin) and print the response.
    Handle {
        request: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match &cli.cmd {
        Commands::Check {
            policies,
            report_out,
            write_markdown,
            markdown_out,
        } => cmd_check(
            &cli,
            policies.as_deref(),
            report_out,
            *write_markdown,
            markdown_out,
        ),
        Commands::Decide {
            policies,
            action,
            resource,
            region,
            context,
        } => cmd_decide(
            &cli,
            policies.as_deref(),
            action,
            resource,
            region.as_deref(),
            context.clone(),
        ),
        Commands::Md { report, output } => cmd_md(report, output.as_deref()),
        Commands::Annotations { report, max } => cmd_annotations(report, *max),
        Commands::Explain { identifier } => cmd_explain(identifier),
        Commands::Exceptions { cmd } => cmd_exceptions(&cli, cmd),
    }
}

/// Logs go to stderr so JSON on stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn parse_date(raw: &str) -> Result<Date, String> {
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}

fn today(cli: &Cli) -> Date {
    cli.today
        .unwrap_or_else(|| OffsetDateTime::now_utc().date())
}

fn overrides(cli: &Cli) -> Overrides {
    Overrides {
        profile: cli.profile.clone(),
        max_findings: cli.max_findings,
    }
}

fn read_config_text(root: &Utf8Path, config: &Utf8Path) -> String {
    // A missing config file is allowed; defaults apply.
    let path = root.join(config);
    match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(_) => {
            tracing::debug!(path = path.as_str(), "no config file, using defaults");
            String::new()
        }
    }
}

fn policies_dir(root: &Utf8Path, policies: Option<&Utf8Path>) -> Utf8PathBuf {
    policies
        .map(Utf8Path::to_path_buf)
        .unwrap_or_else(|| root.join("policies"))
}

fn cmd_check(
    cli: &Cli,
    policies: Option<&Utf8Path>,
    report_out: &Utf8Path,
    write_markdown: bool,
    markdown_out: &Utf8Path,
) -> anyhow::Result<()> {
    let root = cli.root.clone();

    let result = (|| -> anyhow::Result<i32> {
        if !root.exists() {
            anyhow::bail!("root does not exist: {root}");
        }
        let policies_dir = policies_dir(&root, policies);
        let cfg_text = read_config_text(&root, &cli.config);

        let output = run_check(CheckInput {
            root: &root,
            policies_dir: &policies_dir,
            config_text: &cfg_text,
            overrides: overrides(cli),
            today: cli.today,
        })?;

        write_report_file(report_out, &output.report).context("write report json")?;

        if write_markdown {
            let md = render_markdown(&to_renderable(&output.report));
            write_text_file(markdown_out, &md).context("write markdown")?;
        }

        Ok(verdict_exit_code(output.report.verdict.status))
    })();

    match result {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(err) => {
            let report = runtime_error_report(&format!("{err:#}"));
            if let Err(write_err) = write_report_file(report_out, &report) {
                tracing::error!(error = %format!("{write_err:#}"), "could not write error report");
            }
            eprintln!("scpguard error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn cmd_decide(
    cli: &Cli,
    policies: Option<&Utf8Path>,
    action: &str,
    resource: &str,
    region: Option<&str>,
    context: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let policies_dir = policies_dir(&cli.root, policies);
    let output = run_decide(DecideInput {
        policies_dir: &policies_dir,
        action,
        resource,
        region,
        context,
    })?;
    let json = serde_json::to_string_pretty(&output).context("serialize decision")?;
    println!("{json}");
    Ok(())
}

fn write_report_file(path: &Utf8Path, report: &ScpguardReport) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    let data = serialize_report(report)?;
    std::fs::write(path, data).with_context(|| format!("write report: {path}"))?;
    Ok(())
}

fn write_text_file(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    std::fs::write(path, text).with_context(|| format!("write text: {path}"))?;
    Ok(())
}

fn cmd_md(report_path: &Utf8Path, output: Option<&Utf8Path>) -> anyhow::Result<()> {
    let report_text = std::fs::read_to_string(report_path)
        .with_context(|| format!("read report: {report_path}"))?;
    let report = parse_report_json(&report_text)?;
    let md = render_markdown(&to_renderable(&report));

    if let Some(out_path) = output {
        write_text_file(out_path, &md).context("write markdown output")?;
    } else {
        print!("{md}");
    }

    Ok(())
}

fn cmd_annotations(report_path: &Utf8Path, max: usize) -> anyhow::Result<()> {
    let report_text = std::fs::read_to_string(report_path)
        .with_context(|| format!("read report: {report_path}"))?;
    let report = parse_report_json(&report_text)?;

    for annotation in render_annotations(&to_renderable(&report), max) {
        println!("{annotation}");
    }

    Ok(())
}

fn cmd_explain(identifier: &str) -> anyhow::Result<()> {
    match run_explain(identifier) {
        ExplainOutput::Found(exp) => {
            print!("{}", format_explanation(identifier, &exp));
            Ok(())
        }
        ExplainOutput::NotFound { identifier } => {
            eprint!("{}", format_not_found(&identifier));
            std::process::exit(1);
        }
    }
}

fn cmd_exceptions(cli: &Cli, cmd: &ExceptionsCommand) -> anyhow::Result<()> {
    let cfg_text = read_config_text(&cli.root, &cli.config);
    let resolved = resolve_config_text(&cfg_text, overrides(cli))?;
    let registry = ExceptionRegistry::new(cli.root.join(&resolved.exceptions_path));
    let today = today(cli);

    match cmd {
        ExceptionsCommand::Add {
            check_id,
            target,
            reason,
            days,
        } => {
            let entry = registry
                .create(
                    NewException {
                        check_id: check_id.clone(),
                        target: target.clone(),
                        reason: reason.clone(),
                        days: *days,
                    },
                    today,
                )
                .with_context(|| format!("add exception to {}", registry.path()))?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        ExceptionsCommand::Cleanup => {
            let removed = registry
                .cleanup_expired(today)
                .with_context(|| format!("clean up {}", registry.path()))?;
            println!("{}", serde_json::to_string_pretty(&removed)?);
        }
        ExceptionsCommand::List => {
            let entries = registry
                .list()
                .with_context(|| format!("list {}", registry.path()))?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        ExceptionsCommand::Handle { request } => {
            let request = match request {
                Some(text) => text.clone(),
                None => {
                    let mut text = String::new();
                    std::io::stdin()
                        .read_to_string(&mut text)
                        .context("read request from stdin")?;
                    text
                }
            };
            let response = handle_request(&registry, &request, today);
            println!("{}", serde_json::to_string_pretty(&response)?);
            if response.status != 200 {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
