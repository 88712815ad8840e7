//! Data models for the analytics pipeline.
//!
//! This module contains all the core data structures used throughout
//! the application: the raw session record produced by the loader and
//! the summary shapes produced by the aggregation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One validated row from the analytics CSV export.
///
/// All fields are kept as the raw strings found in the file. The loader
/// guarantees every field is present and non-empty; numeric interpretation
/// happens lazily through the accessor methods, where a value that does not
/// parse as a number counts as 0. That coercion mirrors the upstream export
/// pipeline and is relied on by the aggregators.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Marketing channel grouping (e.g. "Organic Search", "Referral").
    pub channel_grouping: String,
    /// Session date as exported, `MM/DD/YY`.
    pub date: String,
    /// Traffic source (e.g. "google", "(direct)").
    pub source: String,
    /// Bounce count for the row.
    pub bounces: String,
    /// Session count for the row.
    pub sessions: String,
    /// Total time on page in seconds.
    pub time_on_page: String,
    /// Page view count for the row.
    pub page_views: String,
    /// Title of the page the sessions landed on.
    pub page_title: String,
}

impl SessionRecord {
    /// Session count, or 0 when the field is not a valid integer.
    pub fn sessions(&self) -> u64 {
        self.sessions.trim().parse().unwrap_or(0)
    }

    /// Bounce count, or 0 when the field is not a valid integer.
    pub fn bounces(&self) -> u64 {
        self.bounces.trim().parse().unwrap_or(0)
    }

    /// Page view count, or 0 when the field is not a valid integer.
    pub fn page_views(&self) -> u64 {
        self.page_views.trim().parse().unwrap_or(0)
    }

    /// Time on page in seconds, or 0.0 when the field is not a valid number.
    pub fn time_on_page_secs(&self) -> f64 {
        self.time_on_page.trim().parse().unwrap_or(0.0)
    }
}

/// Sessions aggregated per traffic source, ordered by sessions descending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralSummary {
    /// Traffic source.
    pub source: String,
    /// Total sessions attributed to the source.
    pub sessions: u64,
}

/// Sessions and share of total per channel grouping.
///
/// Entries keep the order in which each channel was first seen; any
/// display ordering is a concern of the consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelShare {
    /// Channel grouping name.
    pub channel: String,
    /// Total sessions attributed to the channel.
    pub sessions: u64,
    /// Share of all sessions, in percent. 0 when there are no sessions.
    pub percentage: f64,
}

/// Average time on page per page title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageQuality {
    /// Page title.
    pub page_title: String,
    /// Total time on page divided by total page views, in seconds.
    pub avg_time_on_page: f64,
}

/// One day of the bounce-rate time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BouncePoint {
    /// Date as found in the export, `MM/DD/YY`.
    pub date: String,
    /// Bounces / sessions x 100, rounded to 2 decimal places.
    pub bounce_rate: f64,
    /// Total bounces on the date.
    pub bounces: u64,
    /// Total sessions on the date.
    pub sessions: u64,
    /// True when the rate deviates from the series mean by more than
    /// the outlier threshold.
    pub is_outlier: bool,
}

/// One week of the derived bounce-rate trend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyBouncePoint {
    /// Week identifier, `YYYY-Wnn`.
    pub week_id: String,
    /// Sunday-to-Saturday span containing the week, `MM/DD-MM/DD`.
    pub label: String,
    /// Bounces / sessions x 100 over the whole week, rounded to 2 decimals.
    pub bounce_rate: f64,
    /// Total bounces across the week.
    pub bounces: u64,
    /// Total sessions across the week.
    pub sessions: u64,
    /// Number of daily points folded into the week.
    pub days: usize,
}

/// The composite result of one load: all four aggregate views.
///
/// This is the entire contract surface the aggregation core exposes to
/// its caller. It is produced once per load and handed off wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    /// Sessions per source, descending.
    pub referrals: Vec<ReferralSummary>,
    /// Sessions and share per channel, in first-seen order.
    pub channels: Vec<ChannelShare>,
    /// Top pages by average time on page.
    pub content_quality: Vec<PageQuality>,
    /// Daily bounce-rate series with outlier flags, chronological.
    pub bounce_trend: Vec<BouncePoint>,
}

/// Metadata about one report run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// URL the dataset was fetched from.
    pub source_url: String,
    /// Date and time of the fetch.
    pub fetched_at: DateTime<Utc>,
    /// Number of data rows in the CSV.
    pub rows_total: usize,
    /// Number of rows that passed the presence filter.
    pub rows_valid: usize,
    /// Number of rows dropped for missing or empty fields.
    pub rows_dropped: usize,
    /// Duration of the whole run in seconds.
    pub duration_seconds: f64,
}

/// The complete analytics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Metadata about the run.
    pub metadata: ReportMetadata,
    /// The four aggregate views.
    pub summary: AnalyticsSummary,
    /// Optional weekly bounce-rate trend derived from the daily series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_trend: Option<Vec<WeeklyBouncePoint>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_numbers(sessions: &str, bounces: &str, views: &str, time: &str) -> SessionRecord {
        SessionRecord {
            channel_grouping: "Referral".to_string(),
            date: "01/01/18".to_string(),
            source: "google".to_string(),
            bounces: bounces.to_string(),
            sessions: sessions.to_string(),
            time_on_page: time.to_string(),
            page_views: views.to_string(),
            page_title: "Home".to_string(),
        }
    }

    #[test]
    fn test_numeric_accessors() {
        let record = record_with_numbers("12", "3", "7", "45.5");
        assert_eq!(record.sessions(), 12);
        assert_eq!(record.bounces(), 3);
        assert_eq!(record.page_views(), 7);
        assert_eq!(record.time_on_page_secs(), 45.5);
    }

    #[test]
    fn test_malformed_numbers_coerce_to_zero() {
        let record = record_with_numbers("n/a", "-", "??", "fast");
        assert_eq!(record.sessions(), 0);
        assert_eq!(record.bounces(), 0);
        assert_eq!(record.page_views(), 0);
        assert_eq!(record.time_on_page_secs(), 0.0);
    }

    #[test]
    fn test_accessors_tolerate_surrounding_whitespace() {
        let record = record_with_numbers(" 10 ", "2", " 4", "30.0 ");
        assert_eq!(record.sessions(), 10);
        assert_eq!(record.page_views(), 4);
        assert_eq!(record.time_on_page_secs(), 30.0);
    }

    #[test]
    fn test_negative_counts_coerce_to_zero() {
        // Counts are unsigned by contract, so a negative export value
        // fails the parse and counts as 0. Time on page stays signed.
        let record = record_with_numbers("-5", "-1", "-2", "-3.5");
        assert_eq!(record.sessions(), 0);
        assert_eq!(record.bounces(), 0);
        assert_eq!(record.page_views(), 0);
        assert_eq!(record.time_on_page_secs(), -3.5);
    }
}
