//! TrafficLens - web-analytics report generator
//!
//! A CLI tool that fetches a CSV export of session records and renders
//! the derived views: top referral sources, channel contribution,
//! content quality, and the bounce-rate trend with outlier flags.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (fetch, parse, config, I/O)
//!   2 - Outlier days found with --fail-on-outliers set

mod analysis;
mod cli;
mod config;
mod loader;
mod models;
mod report;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use loader::{FetchOptions, ParsedRows};
use models::{Report, ReportMetadata};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("TrafficLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the report pipeline
    match run_report(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Report failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .trafficlens.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".trafficlens.toml");

    if path.exists() {
        eprintln!("⚠️  .trafficlens.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .trafficlens.toml")?;

    println!("✅ Created .trafficlens.toml with default settings.");
    println!("   Edit it to set the data URL, fetch policy, and report options.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete report workflow. Returns exit code (0 or 2).
async fn run_report(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let url = config.fetch.url.clone().ok_or_else(|| {
        anyhow!(
            "No data URL configured. Pass --data-url, set TRAFFICLENS_DATA_URL, \
             or add fetch.url to .trafficlens.toml"
        )
    })?;

    // Step 1: One load - fetch, then parse. Both failures are terminal.
    println!("📥 Fetching dataset: {}", url);
    let fetch_options = FetchOptions {
        timeout_seconds: config.fetch.timeout_seconds,
        retries: config.fetch.retries,
        retry_delay_ms: config.fetch.retry_delay_ms,
        user_agent: config.fetch.user_agent.clone(),
    };

    let spinner = fetch_spinner(args.quiet);
    let csv_text = loader::fetch_csv(&url, &fetch_options).await?;
    spinner.set_message("Parsing rows...");
    let parsed = loader::parse_records(&csv_text)?;
    spinner.finish_and_clear();

    info!(
        "Parsed {} rows, kept {} valid",
        parsed.rows_total,
        parsed.records.len()
    );
    if parsed.rows_dropped > 0 {
        warn!("Dropped {} rows with missing fields", parsed.rows_dropped);
    }

    // Handle --dry-run: fetch and validate only
    if args.dry_run {
        return handle_dry_run(&parsed);
    }

    // Step 2: The four aggregations over the same filtered row set
    println!("🔬 Aggregating {} session records...", parsed.records.len());
    let summary = analysis::summarize(&parsed.records);

    let weekly_trend = config.report.include_weekly.then(|| {
        let weeks = analysis::trend::weekly_trend(&summary.bounce_trend);
        match args.weeks {
            Some(n) => analysis::trend::last_weeks(&weeks, n).to_vec(),
            None => weeks,
        }
    });

    // Step 3: Build the report
    let metadata = ReportMetadata {
        source_url: url,
        fetched_at: Utc::now(),
        rows_total: parsed.rows_total,
        rows_valid: parsed.records.len(),
        rows_dropped: parsed.rows_dropped,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let report = Report {
        metadata,
        summary,
        weekly_trend,
    };

    // Step 4: Render and save
    let output = match args.format {
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
        OutputFormat::Json => report::generate_json_report(&report)?,
    };

    std::fs::write(&args.output, &output)
        .with_context(|| format!("Failed to write report to {}", args.output.display()))?;

    // Print summary
    let outlier_days = report
        .summary
        .bounce_trend
        .iter()
        .filter(|p| p.is_outlier)
        .count();

    println!("\n📊 Summary:");
    println!("   Referral sources: {}", report.summary.referrals.len());
    println!("   Channels: {}", report.summary.channels.len());
    println!("   Pages ranked: {}", report.summary.content_quality.len());
    println!(
        "   Bounce-rate days: {} ({} outliers)",
        report.summary.bounce_trend.len(),
        outlier_days
    );
    println!(
        "\n✅ Report saved to: {} ({:.1}s)",
        args.output.display(),
        report.metadata.duration_seconds
    );

    // Check --fail-on-outliers threshold
    if args.fail_on_outliers && outlier_days > 0 {
        eprintln!(
            "\n⛔ {} bounce-rate outlier day(s) found. Failing (exit code 2).",
            outlier_days
        );
        return Ok(2);
    }

    Ok(0)
}

/// Handle --dry-run: report row statistics, write nothing.
fn handle_dry_run(parsed: &ParsedRows) -> Result<i32> {
    println!("\n🔍 Dry run: dataset fetched and validated (no report written).\n");
    println!("   Rows in file: {}", parsed.rows_total);
    println!("   Valid rows: {}", parsed.records.len());
    println!("   Dropped rows: {}", parsed.rows_dropped);
    println!("\n✅ Dry run complete.");
    Ok(0)
}

/// A spinner for the fetch/parse step, hidden in quiet mode.
fn fetch_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("valid spinner template"),
    );
    spinner.set_message("Downloading CSV...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .trafficlens.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
