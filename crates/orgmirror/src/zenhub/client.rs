//! ZenHub REST client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;

use super::types::ZhIssueData;
use crate::platform::{PlatformError, Result, ZenHubApi};
use crate::retry::{RetryConfig, with_retry_config};

/// Public ZenHub API host.
pub const ZENHUB_API_URL: &str = "https://api.zenhub.com";

const TOKEN_HEADER: &str = "X-Authentication-Token";

/// Client for the ZenHub v1 REST API.
///
/// Rate-limit responses are retried with backoff; wrap the client in
/// [`RateLimitedClient`](crate::platform::RateLimitedClient) to pace requests
/// below the quota in the first place.
#[derive(Clone)]
pub struct ZenHubClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
    retry: RetryConfig,
}

impl ZenHubClient {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(token, ZENHUB_API_URL)
    }

    /// Point the client at another host, e.g. a local fake in tests.
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("orgmirror/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlatformError::internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            retry: RetryConfig::default(),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_issue_data(&self, url: &str, resource: &str) -> Result<ZhIssueData> {
        let response = self
            .http_client
            .get(url)
            .header(TOKEN_HEADER, &self.token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let exhausted_until = quota_reset(response.headers());
        let body = response.text().await.unwrap_or_default();
        Err(PlatformError::from_status(
            status,
            resource,
            exhausted_until,
            &body,
        ))
    }
}

/// ZenHub reports the reset as epoch seconds once the quota is spent.
fn quota_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let epoch = headers
        .get("x-ratelimit-reset")?
        .to_str()
        .ok()?
        .parse::<i64>()
        .ok()?;
    DateTime::from_timestamp(epoch, 0)
}

#[async_trait]
impl ZenHubApi for ZenHubClient {
    #[tracing::instrument(skip(self), level = "debug")]
    async fn get_issue_data(&self, repo_id: i64, issue_number: i64) -> Result<ZhIssueData> {
        let route = format!("/p1/repositories/{repo_id}/issues/{issue_number}");
        let url = format!("{}{route}", self.base_url);

        with_retry_config(
            self.retry.clone(),
            || self.fetch_issue_data(&url, &route),
            PlatformError::is_rate_limited,
            &route,
        )
        .await
    }
}
