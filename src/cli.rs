//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// TrafficLens - web-analytics report generator
///
/// Fetch a CSV export of session records and render the derived views:
/// top referral sources, channel contribution, content quality, and the
/// bounce-rate trend with outlier flags. Markdown/JSON reports.
///
/// Examples:
///   trafficlens --data-url https://example.com/sessions.csv
///   trafficlens --data-url https://example.com/sessions.csv --format json -o report.json
///   trafficlens --data-url https://example.com/sessions.csv --dry-run
///   trafficlens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// URL of the analytics CSV export
    ///
    /// Can also be set via TRAFFICLENS_DATA_URL env var or the
    /// fetch.url key in .trafficlens.toml.
    #[arg(short = 'u', long, value_name = "URL", env = "TRAFFICLENS_DATA_URL")]
    pub data_url: Option<String>,

    /// Output file path for the report
    #[arg(
        short,
        long,
        default_value = "traffic_report.md",
        value_name = "FILE"
    )]
    pub output: PathBuf,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .trafficlens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Fetch timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of fetch retries after the first failed attempt
    #[arg(long, value_name = "COUNT")]
    pub retries: Option<usize>,

    /// How many referral sources the report lists
    #[arg(long, value_name = "COUNT")]
    pub top_referrals: Option<usize>,

    /// Include the derived weekly bounce-rate trend
    ///
    /// Overrides the config file setting.
    #[arg(long, conflicts_with = "no_weekly")]
    pub weekly: bool,

    /// Skip the weekly bounce-rate trend
    ///
    /// Overrides the config file setting.
    #[arg(long, conflicts_with = "weekly")]
    pub no_weekly: bool,

    /// Limit the weekly trend to the trailing N weeks
    #[arg(long, value_name = "COUNT")]
    pub weeks: Option<usize>,

    /// Fail with exit code 2 when any bounce-rate outlier day is found
    ///
    /// Useful for CI-style traffic monitoring.
    #[arg(long)]
    pub fail_on_outliers: bool,

    /// Dry run: fetch and validate the dataset without writing a report
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .trafficlens.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.data_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Data URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(top) = self.top_referrals {
            if top == 0 {
                return Err("Top referral count must be at least 1".to_string());
            }
        }

        if let Some(weeks) = self.weeks {
            if weeks == 0 {
                return Err("Week window must be at least 1".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
