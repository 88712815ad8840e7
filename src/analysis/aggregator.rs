//! Session aggregation.
//!
//! Four independent, pure folds over the validated row set, one per
//! report view. Each consumes the same records and produces its own
//! collection; none of them shares state with another, so grouping
//! order never affects the totals.

use crate::models::{
    AnalyticsSummary, BouncePoint, ChannelShare, PageQuality, ReferralSummary, SessionRecord,
};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Cap on the content-quality ranking. A fixed presentation size, not a
/// statistical selection.
pub const MAX_QUALITY_PAGES: usize = 20;

/// Relative deviation from the series mean above which a bounce-rate
/// point is flagged as an outlier.
pub const OUTLIER_DEVIATION: f64 = 0.5;

/// Run all four aggregations over the same row set.
pub fn summarize(rows: &[SessionRecord]) -> AnalyticsSummary {
    AnalyticsSummary {
        referrals: referral_summary(rows),
        channels: channel_shares(rows),
        content_quality: content_quality(rows),
        bounce_trend: bounce_rate_series(rows),
    }
}

/// Sessions per traffic source, descending.
///
/// Ties keep first-encountered order: groups are built in row order and
/// the sort is stable.
pub fn referral_summary(rows: &[SessionRecord]) -> Vec<ReferralSummary> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut summaries: Vec<ReferralSummary> = Vec::new();

    for row in rows {
        let sessions = row.sessions();
        match index.get(&row.source) {
            Some(&i) => summaries[i].sessions += sessions,
            None => {
                index.insert(row.source.clone(), summaries.len());
                summaries.push(ReferralSummary {
                    source: row.source.clone(),
                    sessions,
                });
            }
        }
    }

    summaries.sort_by(|a, b| b.sessions.cmp(&a.sessions));
    summaries
}

/// Sessions and share of the grand total per channel grouping.
///
/// Output keeps insertion order; consumers apply their own display sort.
/// When the grand total is 0 every share stays 0.
pub fn channel_shares(rows: &[SessionRecord]) -> Vec<ChannelShare> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut shares: Vec<ChannelShare> = Vec::new();
    let mut total_sessions: u64 = 0;

    for row in rows {
        let sessions = row.sessions();
        total_sessions += sessions;
        match index.get(&row.channel_grouping) {
            Some(&i) => shares[i].sessions += sessions,
            None => {
                index.insert(row.channel_grouping.clone(), shares.len());
                shares.push(ChannelShare {
                    channel: row.channel_grouping.clone(),
                    sessions,
                    percentage: 0.0,
                });
            }
        }
    }

    if total_sessions > 0 {
        for share in &mut shares {
            share.percentage = share.sessions as f64 / total_sessions as f64 * 100.0;
        }
    }

    shares
}

/// Average time on page per page title, best first, capped at
/// [`MAX_QUALITY_PAGES`].
///
/// A row only contributes when its page-view count parses to a positive
/// integer; entries whose average ends up non-positive are dropped.
pub fn content_quality(rows: &[SessionRecord]) -> Vec<PageQuality> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, f64, u64)> = Vec::new();

    for row in rows {
        let views = row.page_views();
        if views == 0 {
            continue;
        }
        let time = row.time_on_page_secs();
        match index.get(&row.page_title) {
            Some(&i) => {
                groups[i].1 += time;
                groups[i].2 += views;
            }
            None => {
                index.insert(row.page_title.clone(), groups.len());
                groups.push((row.page_title.clone(), time, views));
            }
        }
    }

    let mut pages: Vec<PageQuality> = groups
        .into_iter()
        .map(|(page_title, total_time, total_views)| PageQuality {
            page_title,
            avg_time_on_page: total_time / total_views as f64,
        })
        .filter(|page| page.avg_time_on_page > 0.0)
        .collect();

    pages.sort_by(|a, b| {
        b.avg_time_on_page
            .partial_cmp(&a.avg_time_on_page)
            .unwrap_or(Ordering::Equal)
    });
    pages.truncate(MAX_QUALITY_PAGES);
    pages
}

/// Daily bounce-rate series with outlier flags, chronological.
///
/// Two passes: fold rows into per-date bounce/session totals (keeping
/// only dates whose summed sessions are positive), then flag each point
/// whose rounded rate deviates from the series mean by more than
/// [`OUTLIER_DEVIATION`]. The second pass needs the whole series
/// buffered since the threshold depends on the global mean.
pub fn bounce_rate_series(rows: &[SessionRecord]) -> Vec<BouncePoint> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, u64, u64)> = Vec::new();

    for row in rows {
        match index.get(&row.date) {
            Some(&i) => {
                groups[i].1 += row.bounces();
                groups[i].2 += row.sessions();
            }
            None => {
                index.insert(row.date.clone(), groups.len());
                groups.push((row.date.clone(), row.bounces(), row.sessions()));
            }
        }
    }

    let mut points: Vec<BouncePoint> = groups
        .into_iter()
        .filter(|(_, _, sessions)| *sessions > 0)
        .map(|(date, bounces, sessions)| BouncePoint {
            bounce_rate: round2(bounces as f64 / sessions as f64 * 100.0),
            date,
            bounces,
            sessions,
            is_outlier: false,
        })
        .collect();

    points.sort_by_key(|point| date_key(&point.date));

    if points.is_empty() {
        return points;
    }

    let mean = points.iter().map(|p| p.bounce_rate).sum::<f64>() / points.len() as f64;
    // A zero mean means a flat all-zero series; nothing can be an outlier.
    if mean > 0.0 {
        for point in &mut points {
            point.is_outlier = (point.bounce_rate - mean).abs() / mean > OUTLIER_DEVIATION;
        }
    }

    points
}

/// Chronological sort key for an `MM/DD/YY` date string. The two-digit
/// year always means 2000 + YY. Unparseable components sort as 0.
pub(crate) fn date_key(date: &str) -> (i32, u32, u32) {
    let mut parts = date.splitn(3, '/');
    let month: u32 = parse_part(parts.next());
    let day: u32 = parse_part(parts.next());
    let year: i32 = parse_part(parts.next());
    (2000 + year, month, day)
}

fn parse_part<T: std::str::FromStr + Default>(part: Option<&str>) -> T {
    part.and_then(|value| value.trim().parse().ok())
        .unwrap_or_default()
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
