//! # fetch: transport capability
//!
//! The pipeline only ever issues authenticated JSON `GET`s. [`Fetcher`] is that narrow
//! interface; [`HttpFetcher`] implements it on top of `reqwest`, and tests substitute
//! `MockFetcher` or a fixture implementation.
//!
//! Status handling is left to the callers: a non-2xx response is still `Ok` here, so the
//! caller decides whether it is fatal to the run or scoped to one file. Only transport
//! failures (timeouts, connection errors) are `Err`.

use async_trait::async_trait;
use std::time::Duration;

use mockall::automock;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};

use crate::config::GithubConfig;

/// Status and decoded JSON body of a `GET`.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    /// Parsed JSON body, or `Value::Null` when the body was empty or not JSON.
    pub body: serde_json::Value,
}

impl FetchResponse {
    pub fn ok(body: serde_json::Value) -> Self {
        FetchResponse { status: 200, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 403 || self.status == 429
    }
}

/// Error type for transport failures (simple boxed error).
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Issues `GET` requests against the hosting API.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchResponse, TransportError>;
}

/// `reqwest`-backed fetcher with a fixed per-request timeout and the GitHub headers.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &GithubConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("repo-ingest/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        match &config.token {
            Some(token) => {
                let mut value = HeaderValue::from_str(&format!("token {token}"))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
                tracing::info!("[FETCH] Using authenticated GitHub access");
            }
            None => {
                tracing::info!("[FETCH] No GitHub token configured, requests are unauthenticated (rate-limited)");
            }
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, TransportError> {
        tracing::debug!(url = %url, "[FETCH] GET");
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                tracing::error!(url = %url, "[FETCH][ERROR] Request timed out");
            } else {
                tracing::error!(url = %url, error = ?e, "[FETCH][ERROR] Request failed");
            }
            e
        })?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        tracing::debug!(url = %url, status, bytes = bytes.len(), "[FETCH] Response received");

        Ok(FetchResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_and_rate_limit_ranges() {
        let mut response = FetchResponse::ok(serde_json::Value::Null);
        assert!(response.is_success());
        response.status = 204;
        assert!(response.is_success());
        response.status = 404;
        assert!(!response.is_success());
        assert!(!response.is_rate_limited());
        response.status = 429;
        assert!(response.is_rate_limited());
    }

    #[test]
    fn http_fetcher_builds_with_and_without_token() {
        let mut config = GithubConfig::default();
        assert!(HttpFetcher::new(&config).is_ok());
        config.token = Some("ghp_example".to_string());
        assert!(HttpFetcher::new(&config).is_ok());
        config.token = Some("bad\ntoken".to_string());
        assert!(HttpFetcher::new(&config).is_err());
    }
}
