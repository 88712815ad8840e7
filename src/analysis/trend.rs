//! Weekly bounce-rate trend.
//!
//! A derived view over the daily series for trend display: daily points
//! are folded into week buckets keyed by calendar year plus
//! floor(day-of-year / 7), and the weekly rate is recomputed from the
//! summed bounces and sessions. This stays out of the core aggregation;
//! only the report layer consumes it.

use crate::analysis::aggregator::{date_key, round2};
use crate::models::{BouncePoint, WeeklyBouncePoint};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::HashMap;
use tracing::debug;

struct WeekBucket {
    week_id: String,
    label: String,
    bounces: u64,
    sessions: u64,
    days: usize,
    first_date: NaiveDate,
}

/// Fold the daily series into chronological week buckets.
///
/// Points whose date string is not a real calendar date are skipped;
/// the daily series is the source of truth for them.
pub fn weekly_trend(points: &[BouncePoint]) -> Vec<WeeklyBouncePoint> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<WeekBucket> = Vec::new();

    for point in points {
        let (year, month, day) = date_key(&point.date);
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            debug!("skipping non-calendar date {:?} in weekly trend", point.date);
            continue;
        };

        let week_num = date.ordinal() / 7;
        let week_id = format!("{}-W{:02}", date.year(), week_num);

        match index.get(&week_id) {
            Some(&i) => {
                let bucket = &mut buckets[i];
                bucket.bounces += point.bounces;
                bucket.sessions += point.sessions;
                bucket.days += 1;
                bucket.first_date = bucket.first_date.min(date);
            }
            None => {
                index.insert(week_id.clone(), buckets.len());
                buckets.push(WeekBucket {
                    week_id,
                    label: week_label(date),
                    bounces: point.bounces,
                    sessions: point.sessions,
                    days: 1,
                    first_date: date,
                });
            }
        }
    }

    buckets.sort_by_key(|bucket| bucket.first_date);
    buckets
        .into_iter()
        .map(|bucket| WeeklyBouncePoint {
            week_id: bucket.week_id,
            label: bucket.label,
            bounce_rate: if bucket.sessions > 0 {
                round2(bucket.bounces as f64 / bucket.sessions as f64 * 100.0)
            } else {
                0.0
            },
            bounces: bucket.bounces,
            sessions: bucket.sessions,
            days: bucket.days,
        })
        .collect()
}

/// The trailing `n` weeks of the trend (the whole trend when it is
/// shorter than `n`).
pub fn last_weeks(weeks: &[WeeklyBouncePoint], n: usize) -> &[WeeklyBouncePoint] {
    &weeks[weeks.len().saturating_sub(n)..]
}

/// `MM/DD-MM/DD` label for the Sunday-to-Saturday span containing `date`.
fn week_label(date: NaiveDate) -> String {
    let start = date - Duration::days(date.weekday().num_days_from_sunday() as i64);
    let end = start + Duration::days(6);
    format!("{}-{}", start.format("%m/%d"), end.format("%m/%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(date: &str, bounces: u64, sessions: u64) -> BouncePoint {
        BouncePoint {
            date: date.to_string(),
            bounce_rate: if sessions > 0 {
                round2(bounces as f64 / sessions as f64 * 100.0)
            } else {
                0.0
            },
            bounces,
            sessions,
            is_outlier: false,
        }
    }

    #[test]
    fn test_days_in_same_week_share_a_bucket() {
        // Jan 1 2018 (ordinal 1) through Jan 6 (ordinal 6) are all week 0.
        let points = vec![
            point("01/01/18", 2, 10),
            point("01/02/18", 3, 10),
            point("01/06/18", 0, 10),
        ];

        let weeks = weekly_trend(&points);

        assert_eq!(weeks.len(), 1);
        let week = &weeks[0];
        assert_eq!(week.week_id, "2018-W00");
        assert_eq!(week.bounces, 5);
        assert_eq!(week.sessions, 30);
        assert_eq!(week.days, 3);
        assert_eq!(week.bounce_rate, 16.67);
    }

    #[test]
    fn test_week_boundary_at_day_seven() {
        // Jan 7 2018 has ordinal 7, the first day of week 1.
        let points = vec![point("01/06/18", 1, 10), point("01/07/18", 1, 10)];

        let weeks = weekly_trend(&points);

        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].week_id, "2018-W00");
        assert_eq!(weeks[1].week_id, "2018-W01");
    }

    #[test]
    fn test_label_spans_sunday_to_saturday() {
        // Jan 3 2018 is a Wednesday; its week runs Dec 31 2017 - Jan 6 2018.
        let points = vec![point("01/03/18", 1, 10)];

        let weeks = weekly_trend(&points);

        assert_eq!(weeks[0].label, "12/31-01/06");
    }

    #[test]
    fn test_weeks_sort_chronologically_across_years() {
        let points = vec![
            point("01/01/18", 1, 10),
            point("12/30/17", 1, 10),
            point("02/01/18", 1, 10),
        ];

        let weeks = weekly_trend(&points);

        let ids: Vec<&str> = weeks.iter().map(|w| w.week_id.as_str()).collect();
        assert_eq!(ids, vec!["2017-W52", "2018-W00", "2018-W04"]);
    }

    #[test]
    fn test_non_calendar_dates_are_skipped() {
        let points = vec![point("02/30/18", 1, 10), point("01/01/18", 1, 10)];

        let weeks = weekly_trend(&points);

        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].week_id, "2018-W00");
    }

    #[test]
    fn test_last_weeks_window() {
        let points = vec![
            point("01/01/18", 1, 10),
            point("01/08/18", 1, 10),
            point("01/15/18", 1, 10),
        ];
        let weeks = weekly_trend(&points);

        assert_eq!(last_weeks(&weeks, 2).len(), 2);
        assert_eq!(last_weeks(&weeks, 2)[0].week_id, "2018-W01");
        assert_eq!(last_weeks(&weeks, 10).len(), 3);
        assert!(last_weeks(&weeks, 0).is_empty());
    }
}
