//! Device registration and daily statistics upload

use crate::{error::ApiError, extractors::ValidatedJson, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{Duration, NaiveDate};
use netstat_core::{
    Error,
    types::{DailyStatUpload, DeviceRegistration, DeviceResource},
    utils::parse_compact_date,
};
use netstat_database::{
    DailyDeviceStatQueries, DeviceQueries, is_model_4g, models::NewDailyDeviceStat,
    record_daily_stat,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

/// What to do with an upload once its date and counters are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDisposition {
    /// Store it
    Accept,
    /// Too old to be counted; acknowledged without storing
    TooOld,
}

/// Decide whether an upload dated `stat_date` may be stored on `today`
///
/// # Errors
///
/// Returns [`Error::InvalidStatistics`] for a date after `today` or counters
/// whose breakdown exceeds their totals.
pub fn classify_upload(
    stat_date: NaiveDate,
    today: NaiveDate,
    window_days: i64,
    upload: &DailyStatUpload,
) -> netstat_core::Result<UploadDisposition> {
    if stat_date < today - Duration::days(window_days) {
        return Ok(UploadDisposition::TooOld);
    }
    if stat_date > today {
        return Err(Error::InvalidStatistics {
            reason: format!("statistics dated {stat_date} are in the future"),
        });
    }
    upload.check_consistency()?;
    Ok(UploadDisposition::Accept)
}

fn already_uploaded() -> Json<Value> {
    Json(json!({ "status": "Statistics already uploaded." }))
}

/// `PUT /device/:device_id`
///
/// # Errors
///
/// 409 when the identifier is already registered, 400 for a bad body.
pub async fn register_device(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    ValidatedJson(registration): ValidatedJson<DeviceRegistration>,
) -> Result<(StatusCode, Json<DeviceResource>), ApiError> {
    let device = DeviceQueries::insert(
        &state.pool,
        &device_id,
        &registration.brand,
        &registration.model,
    )
    .await
    .inspect_err(|e| warn!(device = %device_id, "Device registration refused: {e}"))?;

    info!(device = %device_id, brand = %device.brand, model = %device.model, "Device registered");
    Ok((StatusCode::CREATED, Json(device.into())))
}

/// `POST /device/:device_id/daily/:date`
///
/// # Errors
///
/// 400 for a malformed date or inconsistent counters, 404 for an unknown device.
pub async fn upload_daily_stat(
    State(state): State<Arc<AppState>>,
    Path((device_id, date)): Path<(String, String)>,
    ValidatedJson(upload): ValidatedJson<DailyStatUpload>,
) -> Result<Json<Value>, ApiError> {
    let stat_date = parse_compact_date(&date)?;

    let disposition = classify_upload(
        stat_date,
        state.today(),
        state.config.stats.upload_window_days,
        &upload,
    )
    .inspect_err(|e| warn!(device = %device_id, date = %date, "Statistics rejected: {e}"))?;
    if disposition == UploadDisposition::TooOld {
        info!(device = %device_id, date = %date, "Ignoring outdated statistics");
        return Ok(Json(
            json!({ "status": "Ignored.", "reason": "too_old_statistics" }),
        ));
    }

    let device = DeviceQueries::find_by_identifier(&state.pool, &device_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: format!("device {device_id}"),
        })?;

    if DailyDeviceStatQueries::exists(&state.pool, &device_id, &date).await? {
        return Ok(already_uploaded());
    }

    let is_4g = is_model_4g(
        &state.pool,
        &device.brand,
        &device.model,
        state.config.stats.is_4g_threshold_ms,
    )
    .await?;

    let stat = NewDailyDeviceStat {
        device_identifier: device.device_identifier,
        device_brand: device.brand,
        device_model: device.model,
        is_4g,
        date,
        upload,
    };

    match record_daily_stat(&state.pool, &stat).await? {
        Some(stored) => {
            info!(device = %stat.device_identifier, date = %stat.date, is_4g, "Statistics stored");
            serde_json::to_value(stored)
                .map(Json)
                .map_err(ApiError::internal)
        }
        None => Ok(already_uploaded()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn upload() -> DailyStatUpload {
        DailyStatUpload {
            time_on_orange: 1_000,
            time_on_free_mobile: 3_000,
            time_on_free_mobile_3g: 1_000,
            time_on_free_mobile_4g: 1_500,
            time_on_free_mobile_femtocell: 500,
        }
    }

    #[test]
    fn test_upload_within_window_is_accepted() {
        let today = day(2024, 3, 10);
        for stat_date in [today, day(2024, 3, 3), day(2024, 3, 9)] {
            assert_eq!(
                classify_upload(stat_date, today, 7, &upload()).unwrap(),
                UploadDisposition::Accept
            );
        }
    }

    #[test]
    fn test_upload_older_than_window_is_ignored() {
        let today = day(2024, 3, 10);
        assert_eq!(
            classify_upload(day(2024, 3, 2), today, 7, &upload()).unwrap(),
            UploadDisposition::TooOld
        );
    }

    #[test]
    fn test_old_upload_is_ignored_before_consistency_checks() {
        let broken = DailyStatUpload {
            time_on_free_mobile: 0,
            ..upload()
        };
        assert_eq!(
            classify_upload(day(2020, 1, 1), day(2024, 3, 10), 7, &broken).unwrap(),
            UploadDisposition::TooOld
        );
    }

    #[test]
    fn test_future_upload_is_invalid() {
        let result = classify_upload(day(2024, 3, 11), day(2024, 3, 10), 7, &upload());
        assert!(matches!(result, Err(Error::InvalidStatistics { .. })));
    }

    #[test]
    fn test_inconsistent_upload_is_invalid() {
        let broken = DailyStatUpload {
            time_on_free_mobile: 2_000,
            ..upload()
        };
        let result = classify_upload(day(2024, 3, 10), day(2024, 3, 10), 7, &broken);
        assert!(matches!(result, Err(Error::InvalidStatistics { .. })));
    }
}
