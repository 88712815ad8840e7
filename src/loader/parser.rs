//! CSV parsing and row validation.
//!
//! The first line is the header row; every following line maps
//! positionally to the named columns. A row missing any of the eight
//! required fields (or carrying an empty value) is dropped entirely —
//! fields are never defaulted. Structural CSV errors are terminal.

use crate::loader::LoadError;
use crate::models::SessionRecord;
use serde::Deserialize;
use tracing::debug;

/// Column headers the export must carry, matched exactly.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "Channel Grouping",
    "Date",
    "Source",
    "Bounces",
    "Sessions",
    "Time on Page",
    "PageViews",
    "Page Title",
];

/// A row as it appears in the file, before the presence check.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Channel Grouping", default)]
    channel_grouping: Option<String>,
    #[serde(rename = "Date", default)]
    date: Option<String>,
    #[serde(rename = "Source", default)]
    source: Option<String>,
    #[serde(rename = "Bounces", default)]
    bounces: Option<String>,
    #[serde(rename = "Sessions", default)]
    sessions: Option<String>,
    #[serde(rename = "Time on Page", default)]
    time_on_page: Option<String>,
    #[serde(rename = "PageViews", default)]
    page_views: Option<String>,
    #[serde(rename = "Page Title", default)]
    page_title: Option<String>,
}

/// Outcome of parsing one CSV payload.
#[derive(Debug)]
pub struct ParsedRows {
    /// Rows that passed the presence filter.
    pub records: Vec<SessionRecord>,
    /// Total data rows seen in the file.
    pub rows_total: usize,
    /// Rows dropped for missing or empty required fields.
    pub rows_dropped: usize,
}

/// Parse CSV text into validated session records.
pub fn parse_records(csv_text: &str) -> Result<ParsedRows, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(LoadError::MissingColumn(column));
        }
    }

    let mut records = Vec::new();
    let mut rows_total = 0;
    for result in reader.deserialize::<RawRow>() {
        let raw = result?;
        rows_total += 1;
        match to_record(raw) {
            Some(record) => records.push(record),
            None => debug!("dropping row {} with missing fields", rows_total),
        }
    }

    let rows_dropped = rows_total - records.len();
    if rows_dropped > 0 {
        debug!("dropped {} of {} rows", rows_dropped, rows_total);
    }

    Ok(ParsedRows {
        records,
        rows_total,
        rows_dropped,
    })
}

/// Promote a raw row to a session record if all eight fields are present
/// and non-empty. The check runs on the raw string values; numeric
/// validity is not part of it.
fn to_record(raw: RawRow) -> Option<SessionRecord> {
    Some(SessionRecord {
        channel_grouping: present(raw.channel_grouping)?,
        date: present(raw.date)?,
        source: present(raw.source)?,
        bounces: present(raw.bounces)?,
        sessions: present(raw.sessions)?,
        time_on_page: present(raw.time_on_page)?,
        page_views: present(raw.page_views)?,
        page_title: present(raw.page_title)?,
    })
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Channel Grouping,Date,Source,Bounces,Sessions,Time on Page,PageViews,Page Title";

    fn csv_with_rows(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text.push('\n');
        text
    }

    #[test]
    fn test_parses_complete_rows() {
        let text = csv_with_rows(&[
            "Organic Search,01/01/18,google,5,10,120.5,8,Home",
            "Referral,01/02/18,bing,0,3,60,2,Pricing",
        ]);

        let parsed = parse_records(&text).unwrap();

        assert_eq!(parsed.rows_total, 2);
        assert_eq!(parsed.rows_dropped, 0);
        assert_eq!(parsed.records.len(), 2);
        let first = &parsed.records[0];
        assert_eq!(first.channel_grouping, "Organic Search");
        assert_eq!(first.date, "01/01/18");
        assert_eq!(first.source, "google");
        assert_eq!(first.sessions(), 10);
        assert_eq!(first.time_on_page_secs(), 120.5);
    }

    #[test]
    fn test_drops_rows_with_empty_fields() {
        let text = csv_with_rows(&[
            "Organic Search,01/01/18,google,5,10,120.5,8,Home",
            "Referral,01/02/18,,0,3,60,2,Pricing",
            "Direct,01/03/18,(direct),1,4,30,3,",
        ]);

        let parsed = parse_records(&text).unwrap();

        assert_eq!(parsed.rows_total, 3);
        assert_eq!(parsed.rows_dropped, 2);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].source, "google");
    }

    #[test]
    fn test_drops_short_rows() {
        let text = csv_with_rows(&[
            "Organic Search,01/01/18,google,5,10,120.5,8,Home",
            "Referral,01/02/18,bing",
        ]);

        let parsed = parse_records(&text).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.rows_dropped, 1);
    }

    #[test]
    fn test_keeps_rows_with_malformed_numbers() {
        // Numeric validity is an aggregation concern, not a presence one.
        let text = csv_with_rows(&["Referral,01/02/18,bing,oops,not-a-number,60,2,Pricing"]);

        let parsed = parse_records(&text).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].sessions(), 0);
        assert_eq!(parsed.records[0].bounces(), 0);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let text = "Channel Grouping,Date,Source,Bounces,Sessions,Time on Page,PageViews\n\
                    Referral,01/02/18,bing,0,3,60,2\n";

        let err = parse_records(text).unwrap_err();

        match err {
            LoadError::MissingColumn(column) => assert_eq!(column, "Page Title"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let text = format!(
            "{HEADER},Extra\nReferral,01/02/18,bing,0,3,60,2,Pricing,whatever\n"
        );

        let parsed = parse_records(&text).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].page_title, "Pricing");
    }

    #[test]
    fn test_quoted_fields_with_commas() {
        let text = csv_with_rows(&[
            "Referral,01/02/18,bing,0,3,60,2,\"Pricing, Plans & More\"",
        ]);

        let parsed = parse_records(&text).unwrap();

        assert_eq!(parsed.records[0].page_title, "Pricing, Plans & More");
    }

    #[test]
    fn test_empty_file_has_no_rows() {
        let parsed = parse_records(&csv_with_rows(&[])).unwrap();
        assert_eq!(parsed.rows_total, 0);
        assert!(parsed.records.is_empty());
    }
}
