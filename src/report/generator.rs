//! Markdown report generation.
//!
//! This module renders the aggregate views into a Markdown report for
//! human consumption, or a JSON document for downstream tooling. The
//! aggregators hand over raw collections; any display ordering (such as
//! sorting channels by sessions) happens here.

use crate::config::ReportConfig;
use crate::models::{
    BouncePoint, ChannelShare, PageQuality, ReferralSummary, Report, ReportMetadata,
    WeeklyBouncePoint,
};
use anyhow::Result;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, settings: &ReportConfig) -> String {
    let mut output = String::new();

    output.push_str("# TrafficLens Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_referrals_section(
        &report.summary.referrals,
        settings.top_referrals,
    ));
    output.push_str(&generate_channels_section(&report.summary.channels));
    output.push_str(&generate_content_quality_section(
        &report.summary.content_quality,
        settings.benchmark_seconds,
    ));
    output.push_str(&generate_bounce_section(&report.summary.bounce_trend));

    if let Some(ref weeks) = report.weekly_trend {
        output.push_str(&generate_weekly_section(weeks));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Data Source:** {}\n", metadata.source_url));
    section.push_str(&format!(
        "- **Fetched:** {}\n",
        metadata.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Rows:** {} valid of {} total",
        metadata.rows_valid, metadata.rows_total
    ));
    if metadata.rows_dropped > 0 {
        section.push_str(&format!(" ({} dropped)", metadata.rows_dropped));
    }
    section.push('\n');
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the top referral sources section.
fn generate_referrals_section(referrals: &[ReferralSummary], top_n: usize) -> String {
    let mut section = String::new();

    section.push_str("## Top Referral Sources\n\n");

    if referrals.is_empty() {
        section.push_str("No referral traffic in this dataset.\n\n");
        return section;
    }

    section.push_str(&format!(
        "Showing top {} of {} sources.\n\n",
        top_n.min(referrals.len()),
        referrals.len()
    ));
    section.push_str("| # | Source | Sessions |\n");
    section.push_str("|:---:|:---|---:|\n");

    for (i, referral) in referrals.iter().take(top_n).enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            i + 1,
            referral.source,
            referral.sessions
        ));
    }
    section.push('\n');

    section
}

/// Generate the channel contribution section.
///
/// The aggregator emits channels in first-seen order; the report sorts
/// by sessions descending for display.
fn generate_channels_section(channels: &[ChannelShare]) -> String {
    let mut section = String::new();

    section.push_str("## Channel Contribution\n\n");

    if channels.is_empty() {
        section.push_str("No channel traffic in this dataset.\n\n");
        return section;
    }

    let mut sorted: Vec<&ChannelShare> = channels.iter().collect();
    sorted.sort_by(|a, b| b.sessions.cmp(&a.sessions));

    section.push_str("| Channel | Sessions | Share |\n");
    section.push_str("|:---|---:|---:|\n");

    for channel in sorted {
        section.push_str(&format!(
            "| {} | {} | {:.2}% |\n",
            channel.channel, channel.sessions, channel.percentage
        ));
    }
    section.push('\n');

    section
}

/// Generate the content quality section.
fn generate_content_quality_section(pages: &[PageQuality], benchmark_seconds: f64) -> String {
    let mut section = String::new();

    section.push_str("## Content Quality\n\n");

    if pages.is_empty() {
        section.push_str("No pages with positive view counts in this dataset.\n\n");
        return section;
    }

    section.push_str(&format!(
        "Average time on page, best first, against a {benchmark_seconds:.0}s benchmark.\n\n"
    ));
    section.push_str("| Page | Avg Time (s) | Benchmark |\n");
    section.push_str("|:---|---:|:---:|\n");

    for page in pages {
        let marker = if page.avg_time_on_page >= benchmark_seconds {
            "🟢 above"
        } else {
            "🔴 below"
        };
        section.push_str(&format!(
            "| {} | {:.2} | {} |\n",
            page.page_title, page.avg_time_on_page, marker
        ));
    }
    section.push('\n');

    section
}

/// Generate the daily bounce-rate section.
fn generate_bounce_section(points: &[BouncePoint]) -> String {
    let mut section = String::new();

    section.push_str("## Bounce Rate Trend (Daily)\n\n");

    if points.is_empty() {
        section.push_str("No dates with session traffic in this dataset.\n\n");
        return section;
    }

    let mean = points.iter().map(|p| p.bounce_rate).sum::<f64>() / points.len() as f64;
    let outliers = points.iter().filter(|p| p.is_outlier).count();
    section.push_str(&format!(
        "{} days, series mean {:.2}%, {} outlier day(s).\n\n",
        points.len(),
        mean,
        outliers
    ));

    section.push_str("| Date | Bounce Rate | Bounces | Sessions | |\n");
    section.push_str("|:---|---:|---:|---:|:---:|\n");

    for point in points {
        let flag = if point.is_outlier { "⚠️ outlier" } else { "" };
        section.push_str(&format!(
            "| {} | {:.2}% | {} | {} | {} |\n",
            point.date, point.bounce_rate, point.bounces, point.sessions, flag
        ));
    }
    section.push('\n');

    section
}

/// Generate the weekly bounce-rate section.
fn generate_weekly_section(weeks: &[WeeklyBouncePoint]) -> String {
    let mut section = String::new();

    section.push_str("## Bounce Rate Trend (Weekly)\n\n");

    if weeks.is_empty() {
        section.push_str("No weekly buckets could be derived.\n\n");
        return section;
    }

    section.push_str("| Week | Span | Bounce Rate | Bounces | Sessions | Days |\n");
    section.push_str("|:---|:---|---:|---:|---:|---:|\n");

    for week in weeks {
        section.push_str(&format!(
            "| {} | {} | {:.2}% | {} | {} | {} |\n",
            week.week_id, week.label, week.bounce_rate, week.bounces, week.sessions, week.days
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by TrafficLens*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a Markdown report to a file.
#[allow(dead_code)] // Convenience wrapper
pub fn write_report(report: &Report, settings: &ReportConfig, path: &Path) -> Result<()> {
    let content = generate_markdown_report(report, settings);
    std::fs::write(path, content)?;
    Ok(())
}
