//! Application state management

use crate::cache::UsageCache;
use chrono::NaiveDate;
use chrono_tz::Tz;
use netstat_core::{Config, context_error::Result, utils::today_in};
use netstat_database::PgPool;

/// Shared application state
#[derive(Debug)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Database connection pool
    pub pool: PgPool,
    /// Aggregated usage cache
    pub cache: UsageCache,
    /// Timezone deciding the current day
    pub tz: Tz,
}

impl AppState {
    /// Create new application state
    ///
    /// # Errors
    ///
    /// Returns an error if the configured timezone is unknown.
    pub fn new(config: Config, pool: PgPool) -> Result<Self> {
        let tz = config.stats.tz()?;
        let cache = UsageCache::new(&config.cache);
        Ok(Self {
            config,
            pool,
            cache,
            tz,
        })
    }

    /// Current day in the configured timezone
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        today_in(&self.tz)
    }
}
