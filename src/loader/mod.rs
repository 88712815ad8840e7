//! Record loading: fetch the CSV export over HTTP and parse it into
//! validated session records.

pub mod fetcher;
pub mod parser;

pub use fetcher::{fetch_csv, FetchOptions};
pub use parser::{parse_records, ParsedRows};

use thiserror::Error;

/// Errors raised while loading the dataset.
///
/// Both kinds are terminal for the load attempt: there is no partial
/// success, and the caller retries by re-running the whole load.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Transport-level fetch failure (connect, timeout, body read).
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("failed to fetch {url}: HTTP {status}")]
    FetchStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The CSV payload is structurally unparseable.
    #[error("failed to parse CSV data: {0}")]
    Parse(#[from] csv::Error),

    /// The header row is missing one of the required columns.
    #[error("CSV is missing required column {0:?}")]
    MissingColumn(&'static str),
}
