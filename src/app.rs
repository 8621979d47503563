//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs the stderr log subscriber
//! - runs the fit pipeline
//! - prints the text report or the JSON bundle to stdout

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, FitArgs};
use crate::domain::RunConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `nlfit` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is fine; flags and the real environment still apply.
    let _ = dotenvy::dotenv();
    let cli = crate::cli::Cli::parse();
    init_tracing();

    match cli.command {
        Command::Fit(args) => handle_fit(&args),
        Command::Json(args) => handle_json(&args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nongli_fit=info"));
    // Logs go to stderr so stdout carries only the report.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_fit(args: &FitArgs) -> Result<(), AppError> {
    let config = run_config_from_args(args);
    let run = pipeline::run_fit(&config)?;
    println!("{}", crate::report::format_run_summary(&run, &config));
    Ok(())
}

fn handle_json(args: &FitArgs) -> Result<(), AppError> {
    let config = run_config_from_args(args);
    let run = pipeline::run_fit(&config)?;
    println!("{}", crate::report::bundle_json(&run.bundle)?);
    Ok(())
}

pub fn run_config_from_args(args: &FitArgs) -> RunConfig {
    RunConfig {
        lunar_path: args.lunar.clone(),
        solar_path: args.solar.clone(),
        year_min: args.year_min,
        year_max: args.year_max,
        tz_hours: args.tz_hours,
        bytes_per_line: args.bytes_per_line,
        lines_per_array: args.lines_per_array,
    }
}
