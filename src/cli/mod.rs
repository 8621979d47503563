//! Command-line parsing for the calendar table fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting code. Every flag can also be supplied through an
//! `NLFIT_*` environment variable (or a `.env` file).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "nlfit", version, about = "Fixed-point calendar table fitter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit every table and print the constants, table sizes and byte tally.
    Fit(FitArgs),
    /// Fit every table and print the full export bundle as JSON.
    Json(FitArgs),
}

/// Common options for both subcommands.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Lunar event table (`cyue,nian,ryue,usec`).
    #[arg(long, env = "NLFIT_LUNAR", value_name = "CSV", default_value = "build/lunar.csv")]
    pub lunar: PathBuf,

    /// Solar event table (`cjie,sui,jie,usec`).
    #[arg(long, env = "NLFIT_SOLAR", value_name = "CSV", default_value = "build/solar.csv")]
    pub solar: PathBuf,

    /// First year (nian / sui) of the export window.
    #[arg(long, env = "NLFIT_YEAR_MIN", default_value_t = 1900, allow_negative_numbers = true)]
    pub year_min: i64,

    /// Last year (inclusive) of the export window.
    #[arg(long, env = "NLFIT_YEAR_MAX", default_value_t = 2199, allow_negative_numbers = true)]
    pub year_max: i64,

    /// Offset east of UTC (hours) at which a calendar day starts.
    #[arg(long, env = "NLFIT_TZ_HOURS", default_value_t = 8, allow_negative_numbers = true)]
    pub tz_hours: i64,

    /// Bytes per line of an exported table (multiple of 3).
    #[arg(long, env = "NLFIT_BYTES_PER_LINE", default_value_t = 12)]
    pub bytes_per_line: usize,

    /// Lines per exported array (page).
    #[arg(long, env = "NLFIT_LINES_PER_ARRAY", default_value_t = 315)]
    pub lines_per_array: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_layout() {
        let cli = Cli::parse_from(["nlfit", "fit"]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!((args.year_min, args.year_max), (1900, 2199));
        assert_eq!(args.tz_hours, 8);
        assert_eq!((args.bytes_per_line, args.lines_per_array), (12, 315));
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "nlfit",
            "json",
            "--lunar",
            "a.csv",
            "--year-min",
            "-200",
            "--tz-hours",
            "-5",
        ]);
        let Command::Json(args) = cli.command else {
            panic!("expected json");
        };
        assert_eq!(args.lunar, PathBuf::from("a.csv"));
        assert_eq!(args.year_min, -200);
        assert_eq!(args.tz_hours, -5);
    }
}
