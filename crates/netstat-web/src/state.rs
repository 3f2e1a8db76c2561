//! Application state management

use crate::api_client::HttpUsageFetcher;
use chrono::NaiveDate;
use chrono_tz::Tz;
use netstat_core::{
    Config,
    context_error::{Result, ResultExt},
    utils::today_in,
};
use std::{sync::Arc, time::Duration};

/// State shared by every web request
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Client for the statistics API
    pub fetcher: Arc<HttpUsageFetcher>,
    /// Timezone deciding the current day
    pub tz: Tz,
}

impl AppState {
    /// Create new application state
    ///
    /// # Errors
    ///
    /// Returns an error if the timezone is unknown or the HTTP client cannot
    /// be built.
    pub fn new(config: Config) -> Result<Self> {
        let tz = config.stats.tz()?;
        let fetcher = HttpUsageFetcher::new(
            config.webserver.api_base_url.clone(),
            Duration::from_secs(config.webserver.fetch_timeout),
        )
        .with_context(|| "Failed to create API client")?;

        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
            tz,
        })
    }

    /// Current day in the configured timezone
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        today_in(&self.tz)
    }
}
