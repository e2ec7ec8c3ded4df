//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests of a sync run:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests for listing pages
//! - Error classification into [`TransportError`]

use crate::config::HttpConfig;
use crate::TransportError;
use reqwest::Client;
use std::future::Future;

/// Source of page markup
///
/// Implemented by [`HttpFetcher`] for real runs; tests drive the workflows
/// with in-memory implementations.
pub trait PageFetcher: Send + Sync {
    /// Fetches the markup at `url`, failing on network errors and non-2xx responses
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, TransportError>> + Send;
}

/// [`PageFetcher`] backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher from the HTTP configuration
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, TransportError>> + Send {
        let client = self.client.clone();
        let url = url.to_string();
        async move { fetch_page(&client, &url).await }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use catalog_sync::config::HttpConfig;
/// use catalog_sync::scrape::build_http_client;
///
/// let config = HttpConfig {
///     user_agent: "catalog-sync/1.0".to_string(),
///     request_timeout_secs: 30,
///     connect_timeout_secs: 10,
///     fetch_timeout_secs: 60,
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page body with a single GET request
///
/// No retries are attempted.
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 2xx | body text |
/// | Other HTTP status | `TransportError::Status` |
/// | Timeout | `TransportError::Timeout` |
/// | Connection refused / DNS | `TransportError::Connect` |
/// | Body decoding failure | `TransportError::Body` |
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, TransportError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| TransportError::Body {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Maps a request error onto the transport taxonomy
fn classify_error(url: &str, e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        TransportError::Connect {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        TransportError::Request {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
