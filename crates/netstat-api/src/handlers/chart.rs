//! Aggregated network usage endpoints consumed by the dashboard

use crate::{error::ApiError, state::AppState};
use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::NaiveDate;
use netstat_core::{
    DateRange, UsageStats,
    types::DailyUsageSeries,
    utils::{check_max_range, check_valid_date_range, parse_compact_date},
};
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

/// Query string of the chart endpoints, dates as `YYYYMMDD`
#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    /// First day, defaults to six days before today
    pub start_date: Option<String>,
    /// Last day, defaults to today
    pub end_date: Option<String>,
}

impl ChartQuery {
    /// Resolve the requested range, filling in the default week ending `today`
    ///
    /// # Errors
    ///
    /// Returns an error for malformed dates, reversed ranges, ranges ending
    /// after `today` and ranges of `max_days` or more.
    pub fn resolve(&self, today: NaiveDate, max_days: i64) -> netstat_core::Result<DateRange> {
        let default = DateRange::ending_at(today, 7);
        let start = self
            .start_date
            .as_deref()
            .map_or(Ok(default.start), parse_compact_date)?;
        let end = self
            .end_date
            .as_deref()
            .map_or(Ok(default.end), parse_compact_date)?;

        let range = DateRange::new(start, end);
        check_valid_date_range(&range, today)?;
        check_max_range(&range, max_days)?;
        Ok(range)
    }
}

/// Cache lifetime of a range: bounded while it overlaps the last week, unbounded otherwise
#[must_use]
pub fn cache_ttl(range: &DateRange, today: NaiveDate, recent_ttl: Duration) -> Option<Duration> {
    let default_start = DateRange::ending_at(today, 7).start;
    (default_start <= range.end).then_some(recent_ttl)
}

/// `GET /chart/network-usage`
///
/// # Errors
///
/// 400 for an invalid range, 500 when the store cannot be queried.
pub async fn network_usage(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<UsageStats>, ApiError> {
    let today = state.today();
    let range = query.resolve(today, state.config.stats.max_range_days)?;
    let key = range.cache_key();

    if let Some(stats) = state.cache.get(&key) {
        debug!(range = %key, "Network usage served from cache");
        return Ok(Json(stats));
    }

    let stats = netstat_database::network_usage(&state.pool, &range).await?;
    let ttl = cache_ttl(
        &range,
        today,
        Duration::from_secs(state.config.cache.recent_ttl_seconds),
    );
    state.cache.insert(key.clone(), stats, ttl);

    info!(
        range = %key,
        users = stats.stats_global.users,
        users_4g = stats.stats_4g.users,
        "Network usage computed"
    );
    Ok(Json(stats))
}

/// `GET /chart/daily-network-usage`
///
/// # Errors
///
/// 400 for an invalid range, 500 when the store cannot be queried.
pub async fn daily_network_usage(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<DailyUsageSeries>, ApiError> {
    let range = query.resolve(state.today(), state.config.stats.max_range_days)?;
    let series = netstat_database::daily_network_usage(&state.pool, &range).await?;
    debug!(range = %range.cache_key(), days = series.stats_global.len(), "Daily network usage computed");
    Ok(Json(series))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use netstat_core::Error;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn query(start: Option<&str>, end: Option<&str>) -> ChartQuery {
        ChartQuery {
            start_date: start.map(ToString::to_string),
            end_date: end.map(ToString::to_string),
        }
    }

    #[test]
    fn test_defaults_to_last_seven_days() {
        let range = ChartQuery::default().resolve(day(2024, 3, 10), 31).unwrap();
        assert_eq!(range, DateRange::new(day(2024, 3, 4), day(2024, 3, 10)));
    }

    #[test]
    fn test_explicit_range() {
        let range = query(Some("20240101"), Some("20240131"))
            .resolve(day(2024, 3, 10), 31)
            .unwrap();
        assert_eq!(range.day_count(), 31);
    }

    #[test]
    fn test_rejects_bad_ranges() {
        let today = day(2024, 3, 10);
        assert!(matches!(
            query(Some("2024-01-01"), None).resolve(today, 31),
            Err(Error::InvalidDate { .. })
        ));
        assert!(matches!(
            query(Some("20240105"), Some("20240101")).resolve(today, 31),
            Err(Error::InvalidDateRange { .. })
        ));
        assert!(matches!(
            query(Some("20240301"), Some("20240311")).resolve(today, 31),
            Err(Error::InvalidDateRange { .. })
        ));
        assert!(matches!(
            query(Some("20240101"), Some("20240201")).resolve(today, 31),
            Err(Error::DateRangeTooLong { max_days: 31 })
        ));
    }

    #[test]
    fn test_cache_ttl_depends_on_recency() {
        let today = day(2024, 3, 10);
        let hour = Duration::from_secs(3600);

        let recent = DateRange::new(day(2024, 3, 1), day(2024, 3, 4));
        assert_eq!(cache_ttl(&recent, today, hour), Some(hour));

        let settled = DateRange::new(day(2024, 2, 1), day(2024, 3, 3));
        assert_eq!(cache_ttl(&settled, today, hour), None);
    }
}
