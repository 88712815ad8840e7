//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.trafficlens.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset fetch settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "traffic_report.md".to_string()
}

/// Dataset fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// URL of the CSV export. Can also come from the CLI or the
    /// TRAFFICLENS_DATA_URL environment variable.
    #[serde(default)]
    pub url: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Number of retries after the first failed attempt.
    #[serde(default = "default_retries")]
    pub retries: usize,

    /// Delay between attempts in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Custom user agent header.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_seconds: default_timeout(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            user_agent: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> usize {
    2
}

fn default_retry_delay() -> u64 {
    500
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// How many referral sources the Markdown report lists.
    #[serde(default = "default_top_referrals")]
    pub top_referrals: usize,

    /// Include the derived weekly bounce-rate trend.
    #[serde(default = "default_true")]
    pub include_weekly: bool,

    /// Time-on-page benchmark the content quality table compares against.
    #[serde(default = "default_benchmark")]
    pub benchmark_seconds: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_referrals: default_top_referrals(),
            include_weekly: true,
            benchmark_seconds: default_benchmark(),
        }
    }
}

fn default_top_referrals() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_benchmark() -> f64 {
    25.0
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".trafficlens.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.data_url {
            self.fetch.url = Some(url.clone());
        }
        if let Some(timeout) = args.timeout {
            self.fetch.timeout_seconds = timeout;
        }
        if let Some(retries) = args.retries {
            self.fetch.retries = retries;
        }
        if let Some(top) = args.top_referrals {
            self.report.top_referrals = top;
        }

        // Weekly trend - only override if explicitly provided via CLI flags
        if args.weekly {
            self.report.include_weekly = true;
        } else if args.no_weekly {
            self.report.include_weekly = false;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
