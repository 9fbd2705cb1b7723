//! buildplan - resolve dependencies and run the build plan of a Gradle project
//!
//! Exit codes:
//! - 0: success
//! - 1: aborted before any phase ran (parse, resolution, config or I/O error)
//! - 2: a phase failed or was blocked

use buildplan::cli::CliArgs;
use buildplan::orchestrator::Orchestrator;
use buildplan::output::{create_formatter, OutputConfig};
use clap::Parser;
use colored::Colorize;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Env var overriding the log filter
const LOG_ENV: &str = "BUILDPLAN_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose, args.quiet);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level_filter = match (quiet, verbose) {
        (true, _) => LevelFilter::WARN,
        (false, 0) => LevelFilter::INFO,
        (false, 1) => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        path = %args.path.display(),
        "starting buildplan"
    );

    let orchestrator = Orchestrator::new(args.clone())?;
    let report = orchestrator.run().await?;

    let formatter = create_formatter(OutputConfig::from_cli(args.json, args.verbose, args.quiet));
    let mut stdout = io::stdout().lock();
    formatter.format(&report, &mut stdout)?;
    stdout.flush()?;

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(2))
    }
}
