//! HTTP client for the statistics API

use async_trait::async_trait;
use netstat_core::{DateRange, UsageStats};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Path of the aggregated usage endpoint, relative to the API base URL
pub const NETWORK_USAGE_PATH: &str = "/2/chart/network-usage";

/// Why usage statistics could not be obtained
///
/// Every failure collapses into a single user facing state; the reason is
/// only kept for logs.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The statistics service did not return usable data
    #[error("usage data unavailable: {reason}")]
    DataUnavailable {
        /// Underlying cause
        reason: String,
    },
}

impl FetchError {
    fn unavailable(reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            reason: reason.into(),
        }
    }
}

/// Source of aggregated usage for a date range
#[async_trait]
pub trait UsageFetcher: Send + Sync {
    /// Fetch global and 4G usage over `range`
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::DataUnavailable`] on any failure.
    async fn fetch(&self, range: DateRange) -> Result<UsageStats, FetchError>;
}

/// [`UsageFetcher`] backed by the statistics HTTP API
#[derive(Debug, Clone)]
pub struct HttpUsageFetcher {
    client: Client,
    base_url: String,
}

impl HttpUsageFetcher {
    /// Create a fetcher for the API rooted at `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::unavailable(format!("HTTP client setup failed: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a fetcher around an existing client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL for `range`
    #[must_use]
    pub fn url_for(&self, range: &DateRange) -> String {
        format!(
            "{}{NETWORK_USAGE_PATH}?{}",
            self.base_url,
            range.to_query_string()
        )
    }
}

#[async_trait]
impl UsageFetcher for HttpUsageFetcher {
    async fn fetch(&self, range: DateRange) -> Result<UsageStats, FetchError> {
        let url = self.url_for(&range);
        debug!(%url, "Fetching network usage");

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(%url, error = %e, "Network usage request failed");
            FetchError::unavailable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "Statistics API returned an error");
            return Err(FetchError::unavailable(format!("HTTP {status}")));
        }

        response.json::<UsageStats>().await.map_err(|e| {
            warn!(%url, error = %e, "Malformed network usage response");
            FetchError::unavailable(e.to_string())
        })
    }
}
