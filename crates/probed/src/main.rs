use anyhow::Context as _;
use clap::{Parser, Subcommand};
use probe_core::config::{load_probe_config, ProbeConfig};
use probe_core::validation::{Validate, ValidationIssue, ValidationLevel};
use probed::{logging, render_batch_summary, run_demo};
use std::path::PathBuf;

const DEMO_TARGET: &str = "pingbot";
const DEMO_RESPONSE_SECS: u64 = 3;

#[derive(Debug, Parser)]
#[command(name = "probe", about = "Black-box test harness for chat agents")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Load a config file and report validation issues.
    CheckConfig { path: PathBuf },
    /// Run the built-in suite against an in-process scripted target.
    Demo {
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the response timeout, in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Print the batch report as JSON instead of the transcript.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, thiserror::Error)]
enum MainError {
    #[error("config validation failed ({0})")]
    InvalidConfig(String),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("probe failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        CliCommand::CheckConfig { path } => check_config(path),
        CliCommand::Demo {
            config,
            timeout_secs,
            json,
        } => demo(config, timeout_secs, json).await,
    }
}

fn check_config(path: PathBuf) -> anyhow::Result<()> {
    let config = load_probe_config(&path)?;
    let issues = config.validate();
    for issue in &issues {
        println!("{}", render_issue(issue));
    }
    ensure_valid(&issues)?;
    println!("{} is valid", path.display());
    Ok(())
}

fn render_issue(issue: &ValidationIssue) -> String {
    let level = match issue.level {
        ValidationLevel::Error => "error",
        ValidationLevel::Warning => "warning",
    };
    format!("{level} {}: {}", issue.code, issue.message)
}

fn ensure_valid(issues: &[ValidationIssue]) -> Result<(), MainError> {
    let errors = issues
        .iter()
        .filter(|issue| issue.level == ValidationLevel::Error)
        .map(|issue| issue.code)
        .collect::<Vec<_>>();
    if errors.is_empty() {
        return Ok(());
    }
    Err(MainError::InvalidConfig(errors.join("; ")))
}

async fn demo(
    config_path: Option<PathBuf>,
    timeout_secs: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = match config_path {
        Some(path) => load_probe_config(&path)?,
        None => {
            let mut config = ProbeConfig::for_target(DEMO_TARGET);
            config.timeouts.response_secs = DEMO_RESPONSE_SECS;
            config
        }
    };
    if let Some(secs) = timeout_secs {
        config.timeouts.response_secs = secs;
    }
    ensure_valid(&config.validate())?;

    let _logging = logging::init(&config.logging)?;
    let outcome = run_demo(&config).await.context("demo run failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
        return Ok(());
    }
    for message in &outcome.transcript {
        println!("[{}] {}", message.author_id, message.content);
    }
    println!();
    println!("{}", render_batch_summary(&outcome.report));
    Ok(())
}
