//! Core types shared by the API, the store and the dashboard

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::format_compact_date;

/// Milliseconds in one day, the upper bound of any per-day usage counter
pub const MS_PER_DAY: i64 = 86_400_000;

/// Inclusive calendar date interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First day of the range
    pub start: NaiveDate,
    /// Last day of the range (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range from its two bounds; no ordering check is done
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Range of `window_days` days ending on `today`
    ///
    /// A window of 7 yields `[today - 6, today]`.
    #[must_use]
    pub fn ending_at(today: NaiveDate, window_days: i64) -> Self {
        let span = (window_days - 1).max(0);
        Self {
            start: today - Duration::days(span),
            end: today,
        }
    }

    /// Inclusive number of days covered, `(end - start) + 1`
    #[must_use]
    pub fn day_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Whether `start <= end`
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    /// `start_date=YYYYMMDD&end_date=YYYYMMDD`
    #[must_use]
    pub fn to_query_string(&self) -> String {
        format!(
            "start_date={}&end_date={}",
            format_compact_date(self.start),
            format_compact_date(self.end)
        )
    }

    /// Key identifying this range in the aggregation cache
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "{}-{}",
            format_compact_date(self.start),
            format_compact_date(self.end)
        )
    }
}

/// Aggregated usage over every device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalUsage {
    /// Distinct devices that uploaded statistics in the range
    pub users: i64,
    /// Time spent on the Orange roaming network, in ms
    pub time_on_orange: i64,
    /// Time spent on Free Mobile antennas, femtocells excluded, in ms
    pub time_on_free_mobile: i64,
    /// Time spent on Free Mobile femtocells, in ms
    pub time_on_free_mobile_femtocell: i64,
}

/// Aggregated usage over 4G capable devices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FourGUsage {
    /// Distinct 4G devices that uploaded statistics in the range
    pub users: i64,
    /// Time spent on the Orange roaming network, in ms
    pub time_on_orange: i64,
    /// Time spent on Free Mobile 3G, in ms
    pub time_on_free_mobile_3g: i64,
    /// Time spent on Free Mobile 4G, in ms
    pub time_on_free_mobile_4g: i64,
    /// Time spent on Free Mobile femtocells, in ms
    pub time_on_free_mobile_femtocell: i64,
}

/// Payload of `GET /2/chart/network-usage`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    /// Statistics over every device
    pub stats_global: GlobalUsage,
    /// Statistics over 4G devices
    pub stats_4g: FourGUsage,
}

/// One day of global usage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyGlobalUsage {
    /// Day, `YYYYMMDD`
    pub date: String,
    /// Time on Orange, in ms
    pub time_on_orange: i64,
    /// Time on Free Mobile, femtocells excluded, in ms
    pub time_on_free_mobile: i64,
    /// Time on femtocells, in ms
    pub time_on_free_mobile_femtocell: i64,
}

/// One day of 4G usage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyFourGUsage {
    /// Day, `YYYYMMDD`
    pub date: String,
    /// Time on Orange, in ms
    pub time_on_orange: i64,
    /// Time on Free Mobile 3G, in ms
    pub time_on_free_mobile_3g: i64,
    /// Time on Free Mobile 4G, in ms
    pub time_on_free_mobile_4g: i64,
    /// Time on femtocells, in ms
    pub time_on_free_mobile_femtocell: i64,
}

/// Payload of `GET /2/chart/daily-network-usage`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsageSeries {
    /// Per-day global usage, ordered by date
    pub stats_global: Vec<DailyGlobalUsage>,
    /// Per-day 4G usage, ordered by date
    pub stats_4g: Vec<DailyFourGUsage>,
}

/// Body of `PUT /2/device/:device_id`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DeviceRegistration {
    /// Manufacturer, as reported by Android
    #[validate(length(min = 1, max = 128))]
    pub brand: String,
    /// Model name, as reported by Android
    #[validate(length(min = 1, max = 128))]
    pub model: String,
}

/// Body of `POST /2/device/:device_id/daily/:date`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DailyStatUpload {
    /// Time on Orange, in ms
    #[validate(range(min = 0, max = 86_400_000))]
    pub time_on_orange: i64,
    /// Time on Free Mobile, femtocells included, in ms
    #[validate(range(min = 0, max = 86_400_000))]
    pub time_on_free_mobile: i64,
    /// Time on Free Mobile 3G, in ms
    #[validate(range(min = 0, max = 86_400_000))]
    pub time_on_free_mobile_3g: i64,
    /// Time on Free Mobile 4G, in ms
    #[validate(range(min = 0, max = 86_400_000))]
    pub time_on_free_mobile_4g: i64,
    /// Time on Free Mobile femtocells, in ms
    #[validate(range(min = 0, max = 86_400_000))]
    pub time_on_free_mobile_femtocell: i64,
}

impl DailyStatUpload {
    /// Time on Free Mobile split by radio technology
    #[must_use]
    pub const fn detailed_free_mobile_time(&self) -> i64 {
        self.time_on_free_mobile_3g
            + self.time_on_free_mobile_4g
            + self.time_on_free_mobile_femtocell
    }

    /// Check the breakdown never exceeds the totals it belongs to
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidStatistics`] when 3G + 4G + femtocell
    /// exceeds the Free Mobile time or the overall time.
    pub fn check_consistency(&self) -> crate::Result<()> {
        let detailed = self.detailed_free_mobile_time();
        if detailed > self.time_on_free_mobile {
            return Err(crate::Error::InvalidStatistics {
                reason: "detailed Free Mobile time exceeds Free Mobile time".to_string(),
            });
        }
        if detailed > self.time_on_orange + self.time_on_free_mobile {
            return Err(crate::Error::InvalidStatistics {
                reason: "detailed Free Mobile time exceeds total time".to_string(),
            });
        }
        Ok(())
    }
}

/// Device resource returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceResource {
    /// Android device identifier
    pub device_identifier: String,
    /// Manufacturer
    pub brand: String,
    /// Model name
    pub model: String,
    /// Creation time
    pub added: DateTime<Utc>,
    /// Last modification time
    pub modified: DateTime<Utc>,
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Error code
    pub code: String,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}
