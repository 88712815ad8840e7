//! HTTP retrieval of the analytics CSV export.
//!
//! One dataset, one GET. The fetch carries an explicit timeout and a
//! bounded fixed-delay retry policy; a non-success status after the last
//! attempt surfaces as a terminal fetch error.

use crate::loader::LoadError;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Options controlling the dataset fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Number of retries after the first failed attempt.
    pub retries: usize,
    /// Delay between attempts in milliseconds.
    pub retry_delay_ms: u64,
    /// User agent header; defaults to the crate name and version.
    pub user_agent: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            retries: 2,
            retry_delay_ms: 500,
            user_agent: None,
        }
    }
}

/// Fetch the CSV text from `url`.
///
/// Retries transport failures and 5xx responses up to `options.retries`
/// times; 4xx responses fail immediately since a retry cannot change them.
pub async fn fetch_csv(url: &str, options: &FetchOptions) -> Result<String, LoadError> {
    let user_agent = options.user_agent.clone().unwrap_or_else(|| {
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
    });

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(options.timeout_seconds))
        .user_agent(user_agent)
        .build()
        .map_err(|source| LoadError::Fetch {
            url: url.to_string(),
            source,
        })?;

    let mut attempt = 0;
    loop {
        match request(&client, url).await {
            Ok(body) => {
                debug!("fetched {} bytes from {}", body.len(), url);
                return Ok(body);
            }
            Err(err) if attempt < options.retries && is_retryable(&err) => {
                attempt += 1;
                warn!(
                    "fetch attempt {}/{} failed: {}; retrying in {}ms",
                    attempt,
                    options.retries + 1,
                    err,
                    options.retry_delay_ms
                );
                sleep(Duration::from_millis(options.retry_delay_ms)).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Perform a single GET and return the body text.
async fn request(client: &reqwest::Client, url: &str) -> Result<String, LoadError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| LoadError::Fetch {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::FetchStatus {
            url: url.to_string(),
            status,
        });
    }

    response.text().await.map_err(|source| LoadError::Fetch {
        url: url.to_string(),
        source,
    })
}

fn is_retryable(err: &LoadError) -> bool {
    match err {
        LoadError::Fetch { .. } => true,
        LoadError::FetchStatus { status, .. } => status.is_server_error(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_options() -> FetchOptions {
        FetchOptions {
            timeout_seconds: 5,
            retries: 0,
            retry_delay_ms: 10,
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_csv_returns_body_on_success() {
        let mut server = mockito::Server::new_async().await;
        let body = "Source,Sessions\ngoogle,10\n";
        let mock = server
            .mock("GET", "/data.csv")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let url = format!("{}/data.csv", server.url());
        let fetched = fetch_csv(&url, &fast_options()).await.unwrap();

        assert_eq!(fetched, body);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_csv_surfaces_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/data.csv")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/data.csv", server.url());
        let err = fetch_csv(&url, &fast_options()).await.unwrap_err();

        match err {
            LoadError::FetchStatus { status, .. } => assert_eq!(status.as_u16(), 404),
            other => panic!("expected FetchStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_csv_does_not_retry_client_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/data.csv")
            .with_status(403)
            .expect(1)
            .create_async()
            .await;

        let url = format!("{}/data.csv", server.url());
        let options = FetchOptions {
            retries: 3,
            ..fast_options()
        };
        let err = fetch_csv(&url, &options).await.unwrap_err();

        assert!(matches!(err, LoadError::FetchStatus { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_csv_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/data.csv")
            .with_status(500)
            .expect(4)
            .create_async()
            .await;

        let url = format!("{}/data.csv", server.url());
        let options = FetchOptions {
            retries: 3,
            ..fast_options()
        };
        let err = fetch_csv(&url, &options).await.unwrap_err();

        assert!(matches!(err, LoadError::FetchStatus { .. }));
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_csv_sends_default_user_agent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/data.csv")
            .match_header(
                "user-agent",
                concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            )
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let url = format!("{}/data.csv", server.url());
        fetch_csv(&url, &fast_options()).await.unwrap();

        mock.assert_async().await;
    }
}
