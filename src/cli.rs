//! CLI argument parsing for Interim Power

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for power estimates
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report (default)
    Text,
    /// JSON result for persistence or machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "interim-power")]
#[command(version)]
#[command(about = "Mid-experiment statistical power estimation for A/B tests", long_about = None)]
pub struct Cli {
    /// Experiment power request (traffic health, analysis, goal metrics, weights) as JSON
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Override the request's target days remaining
    #[arg(short = 'd', long = "days-remaining", value_name = "DAYS", allow_hyphen_values = true)]
    pub days_remaining: Option<i64>,

    /// Reference date (YYYY-MM-DD) for the exposure window; defaults to today (UTC)
    #[arg(long = "today", value_name = "DATE")]
    pub today: Option<chrono::NaiveDate>,

    /// TOML file overriding default alpha, tuning parameter and exposure window
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
