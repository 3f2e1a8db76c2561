//! Database models for FreeMobile Netstat

use chrono::{DateTime, Utc};
use netstat_core::types::{
    DailyFourGUsage, DailyGlobalUsage, DailyStatUpload, DeviceResource,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for registered devices
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeviceDb {
    /// Unique identifier
    pub id: Uuid,

    /// Android device identifier, unique
    pub device_identifier: String,

    /// Manufacturer
    pub brand: String,

    /// Model name
    pub model: String,

    /// Creation timestamp
    pub added: DateTime<Utc>,

    /// Last modification timestamp
    pub modified: DateTime<Utc>,
}

impl From<DeviceDb> for DeviceResource {
    fn from(device: DeviceDb) -> Self {
        Self {
            device_identifier: device.device_identifier,
            brand: device.brand,
            model: device.model,
            added: device.added,
            modified: device.modified,
        }
    }
}

/// Database model for one device's statistics on one day
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyDeviceStatDb {
    /// Unique identifier
    pub id: Uuid,

    /// Android device identifier
    pub device_identifier: String,

    /// Device manufacturer at upload time
    pub device_brand: String,

    /// Device model at upload time
    pub device_model: String,

    /// Whether the device model was considered 4G capable at upload time
    pub is_4g: bool,

    /// Time on Orange, in ms
    pub time_on_orange: i64,

    /// Time on Free Mobile, femtocells included, in ms
    pub time_on_free_mobile: i64,

    /// Time on Free Mobile 3G, in ms
    pub time_on_free_mobile_3g: i64,

    /// Time on Free Mobile 4G, in ms
    pub time_on_free_mobile_4g: i64,

    /// Time on femtocells, in ms
    pub time_on_free_mobile_femtocell: i64,

    /// Day, `YYYYMMDD`
    pub date: String,

    /// Creation timestamp
    pub added: DateTime<Utc>,

    /// Last modification timestamp
    pub modified: DateTime<Utc>,
}

/// Per-day running totals
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyStatSummaryDb {
    /// Day, `YYYYMMDD`
    pub date: String,
    /// Global time on Orange
    pub global_time_on_orange: i64,
    /// Global time on Free Mobile, femtocells excluded
    pub global_time_on_free_mobile: i64,
    /// Global time on femtocells
    pub global_time_on_free_mobile_femtocell: i64,
    /// 4G devices time on Orange
    pub g4_time_on_orange: i64,
    /// 4G devices time on Free Mobile 3G
    pub g4_time_on_free_mobile_3g: i64,
    /// 4G devices time on Free Mobile 4G
    pub g4_time_on_free_mobile_4g: i64,
    /// 4G devices time on femtocells
    pub g4_time_on_free_mobile_femtocell: i64,
    /// Creation timestamp
    pub added: DateTime<Utc>,
    /// Last modification timestamp
    pub modified: DateTime<Utc>,
}

impl DailyStatSummaryDb {
    /// Split into the global and 4G views of the day
    #[must_use]
    pub fn into_usage(self) -> (DailyGlobalUsage, DailyFourGUsage) {
        (
            DailyGlobalUsage {
                date: self.date.clone(),
                time_on_orange: self.global_time_on_orange,
                time_on_free_mobile: self.global_time_on_free_mobile,
                time_on_free_mobile_femtocell: self.global_time_on_free_mobile_femtocell,
            },
            DailyFourGUsage {
                date: self.date,
                time_on_orange: self.g4_time_on_orange,
                time_on_free_mobile_3g: self.g4_time_on_free_mobile_3g,
                time_on_free_mobile_4g: self.g4_time_on_free_mobile_4g,
                time_on_free_mobile_femtocell: self.g4_time_on_free_mobile_femtocell,
            },
        )
    }
}

/// A statistics row about to be inserted
#[derive(Debug, Clone)]
pub struct NewDailyDeviceStat {
    /// Android device identifier
    pub device_identifier: String,
    /// Device manufacturer
    pub device_brand: String,
    /// Device model
    pub device_model: String,
    /// Whether the model counts as 4G capable
    pub is_4g: bool,
    /// Day, `YYYYMMDD`
    pub date: String,
    /// Uploaded counters
    pub upload: DailyStatUpload,
}

/// Amounts added to a day's summary for one accepted upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SummaryIncrement {
    /// Global time on Orange
    pub global_time_on_orange: i64,
    /// Global time on Free Mobile; femtocell time is moved to its own counter
    pub global_time_on_free_mobile: i64,
    /// Global time on femtocells
    pub global_time_on_free_mobile_femtocell: i64,
    /// 4G time on Orange
    pub g4_time_on_orange: i64,
    /// 4G time on Free Mobile 3G
    pub g4_time_on_free_mobile_3g: i64,
    /// 4G time on Free Mobile 4G
    pub g4_time_on_free_mobile_4g: i64,
    /// 4G time on femtocells
    pub g4_time_on_free_mobile_femtocell: i64,
}

impl From<&DailyStatUpload> for SummaryIncrement {
    fn from(upload: &DailyStatUpload) -> Self {
        Self {
            global_time_on_orange: upload.time_on_orange,
            global_time_on_free_mobile: upload.time_on_free_mobile
                - upload.time_on_free_mobile_femtocell,
            global_time_on_free_mobile_femtocell: upload.time_on_free_mobile_femtocell,
            g4_time_on_orange: upload.time_on_orange,
            g4_time_on_free_mobile_3g: upload.time_on_free_mobile_3g,
            g4_time_on_free_mobile_4g: upload.time_on_free_mobile_4g,
            g4_time_on_free_mobile_femtocell: upload.time_on_free_mobile_femtocell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary_increment_moves_femtocell_out_of_free_mobile() {
        let upload = DailyStatUpload {
            time_on_orange: 1_000,
            time_on_free_mobile: 5_000,
            time_on_free_mobile_3g: 2_000,
            time_on_free_mobile_4g: 2_500,
            time_on_free_mobile_femtocell: 500,
        };

        let increment = SummaryIncrement::from(&upload);

        assert_eq!(increment.global_time_on_orange, 1_000);
        assert_eq!(increment.global_time_on_free_mobile, 4_500);
        assert_eq!(increment.global_time_on_free_mobile_femtocell, 500);
        assert_eq!(increment.g4_time_on_orange, 1_000);
        assert_eq!(increment.g4_time_on_free_mobile_3g, 2_000);
        assert_eq!(increment.g4_time_on_free_mobile_4g, 2_500);
        assert_eq!(increment.g4_time_on_free_mobile_femtocell, 500);
    }

    #[test]
    fn test_summary_splits_into_usage() {
        let now = Utc::now();
        let summary = DailyStatSummaryDb {
            date: "20240107".to_string(),
            global_time_on_orange: 1,
            global_time_on_free_mobile: 2,
            global_time_on_free_mobile_femtocell: 3,
            g4_time_on_orange: 4,
            g4_time_on_free_mobile_3g: 5,
            g4_time_on_free_mobile_4g: 6,
            g4_time_on_free_mobile_femtocell: 7,
            added: now,
            modified: now,
        };

        let (global, four_g) = summary.into_usage();
        assert_eq!(global.date, "20240107");
        assert_eq!(global.time_on_free_mobile_femtocell, 3);
        assert_eq!(four_g.date, "20240107");
        assert_eq!(four_g.time_on_free_mobile_4g, 6);
    }
}
