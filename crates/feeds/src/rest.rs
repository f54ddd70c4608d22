//! Shared HTTP client for the exchange REST adapters.

use crate::error::FeedError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Thin wrapper around a pooled `reqwest::Client`.
///
/// Cheap to clone; every adapter holds its own handle to the same pool.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
}

impl RestClient {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Build a client whose requests fail after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("spread-monitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::ConnectionFailed(e.to_string()))?;
        Ok(Self { http })
    }

    /// GET `url` with `query` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FeedError> {
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FeedError::RateLimitExceeded);
        }
        if !status.is_success() {
            debug!("GET {} returned HTTP {}", url, status);
            return Err(FeedError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
