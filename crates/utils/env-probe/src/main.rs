//! # Env Probe Utility
//!
//! Resolves environment variables the way services built on `lib-env` do and
//! reports what they would see, plus a few timestamp conversions.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --package env-probe -- check DATABASE_URL PORT:uint PEERS:list
//! cargo run --package env-probe -- --env-file deploy/.env check API_KEY --redact --json
//! cargo run --package env-probe -- now
//! cargo run --package env-probe -- nanos 1704164645000000006
//! cargo run --package env-probe -- parse 2024-01-02T03:04:05.5Z
//! ```
//!
//! `check` exits non-zero when any required variable is missing or malformed.
//! Logs go to stderr and are filtered with `RUST_LOG`.

mod probe;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use lib_env::{
    format_nanos_string, from_epoch_text, get_env_or, load_dotenv, load_dotenv_from,
    millis_since_epoch, nanos_from, nanos_since_epoch, now, secs_since_epoch, to_epoch_text, Env,
};
use serde_json::json;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::probe::{parse_var_spec, run_checks, Report, VarSpec};

const DEFAULT_LOG_FILTER: &str = "env_probe=info,warn";

#[derive(Debug, Parser)]
#[command(name = "env-probe", version, about = "Inspect environment configuration")]
struct Cli {
    /// Load variables from this file first. Without it, `.env` is looked up
    /// in the current directory and its parents.
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve variables given as NAME or NAME:KIND (str, opt, bool, uint, list).
    Check(CheckArgs),
    /// Print the current time in every supported representation.
    Now {
        #[arg(long)]
        json: bool,
    },
    /// Format a nanosecond epoch value as RFC3339.
    Nanos { value: String },
    /// Parse RFC3339 text and print it normalized to UTC.
    Parse { text: String },
}

#[derive(Debug, Args)]
struct CheckArgs {
    #[arg(required = true, value_name = "SPEC", value_parser = parse_var_spec)]
    specs: Vec<VarSpec>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// Mask string values in the output.
    #[arg(long)]
    redact: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Load before logging starts so RUST_LOG from the file applies.
    let loaded = match &cli.env_file {
        Some(path) => {
            load_dotenv_from(path)?;
            Some(path.clone())
        }
        None => load_dotenv(),
    };

    init_tracing();
    match &loaded {
        Some(path) => debug!(path = %path.display(), "loaded env file"),
        None => debug!("no env file loaded"),
    }

    match cli.command {
        Command::Check(args) => check(args),
        Command::Now { json } => print_now(json),
        Command::Nanos { value } => print_nanos(&value),
        Command::Parse { text } => print_parsed(&text),
    }
}

fn init_tracing() {
    let filter = get_env_or("RUST_LOG", DEFAULT_LOG_FILTER);
    let env_filter =
        EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn check(args: CheckArgs) -> anyhow::Result<ExitCode> {
    let env = Env::system();
    let report = run_checks(&env, &args.specs, args.redact);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    for check in report.checks.iter().filter(|check| !check.is_ok()) {
        if let Some(err) = &check.error {
            error!(var = %check.name, kind = %check.kind, "{err}");
        }
    }

    if report.failed > 0 {
        error!(failed = report.failed, "configuration check failed");
        return Ok(ExitCode::FAILURE);
    }

    info!(checked = report.checks.len(), "configuration check passed");
    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &Report) {
    let width = report
        .checks
        .iter()
        .map(|check| check.name.len())
        .max()
        .unwrap_or(0);

    for check in &report.checks {
        let name = &check.name;
        let kind = check.kind.to_string();
        match (&check.value, &check.error) {
            (_, Some(err)) => println!("{name:<width$}  {kind:<4}  FAIL  {err}"),
            (Some(value), None) => println!("{name:<width$}  {kind:<4}  ok    {value}"),
            (None, None) => println!("{name:<width$}  {kind:<4}  ok"),
        }
    }
}

fn print_now(json: bool) -> anyhow::Result<ExitCode> {
    let current = now();
    let rfc3339 = to_epoch_text(&current);
    let nanos = nanos_since_epoch();
    let millis = millis_since_epoch();
    let secs = secs_since_epoch();

    if json {
        let body = json!({
            "rfc3339": rfc3339,
            "nanos": nanos,
            "millis": millis,
            "secs": secs,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("rfc3339  {rfc3339}");
        println!("nanos    {nanos}");
        println!("millis   {millis}");
        println!("secs     {secs}");
    }

    Ok(ExitCode::SUCCESS)
}

fn print_nanos(value: &str) -> anyhow::Result<ExitCode> {
    let text = format_nanos_string(value);
    if text.is_empty() {
        error!(value, "not a nanosecond epoch value");
        return Ok(ExitCode::FAILURE);
    }

    println!("{text}");
    Ok(ExitCode::SUCCESS)
}

fn print_parsed(text: &str) -> anyhow::Result<ExitCode> {
    let time = from_epoch_text(text)?;

    println!("rfc3339  {}", to_epoch_text(&time));
    println!("nanos    {}", nanos_from(&time));
    Ok(ExitCode::SUCCESS)
}
