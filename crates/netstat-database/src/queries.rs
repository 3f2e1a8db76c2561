//! Database query operations for FreeMobile Netstat

use crate::models::{
    DailyDeviceStatDb, DailyStatSummaryDb, DeviceDb, NewDailyDeviceStat, SummaryIncrement,
};
use netstat_core::{
    Error, Result,
    types::{DailyUsageSeries, DateRange, FourGUsage, GlobalUsage, UsageStats},
    utils::format_compact_date,
};
use sqlx::{PgPool, Postgres, Row, Transaction};

fn database_error(e: sqlx::Error) -> Error {
    Error::Database(e.to_string())
}

/// Device database operations
pub struct DeviceQueries;

impl DeviceQueries {
    /// Register a new device
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if the identifier is already registered,
    /// or a database error if the query fails.
    pub async fn insert(
        pool: &PgPool,
        device_identifier: &str,
        brand: &str,
        model: &str,
    ) -> Result<DeviceDb> {
        let query = r"
            INSERT INTO devices (device_identifier, brand, model, added, modified)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING *
        ";

        sqlx::query_as::<_, DeviceDb>(query)
            .bind(device_identifier)
            .bind(brand)
            .bind(model)
            .fetch_one(pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => Error::Conflict {
                    resource: format!("device {device_identifier}"),
                },
                _ => database_error(e),
            })
    }

    /// Find a device by its identifier
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_identifier(
        pool: &PgPool,
        device_identifier: &str,
    ) -> Result<Option<DeviceDb>> {
        sqlx::query_as::<_, DeviceDb>("SELECT * FROM devices WHERE device_identifier = $1")
            .bind(device_identifier)
            .fetch_optional(pool)
            .await
            .map_err(database_error)
    }
}

/// Daily device statistics database operations
pub struct DailyDeviceStatQueries;

impl DailyDeviceStatQueries {
    /// Whether statistics were already stored for this device and day
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn exists(pool: &PgPool, device_identifier: &str, date: &str) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM daily_device_stats WHERE device_identifier = $1 AND date = $2) AS found",
        )
        .bind(device_identifier)
        .bind(date)
        .fetch_one(pool)
        .await
        .map_err(database_error)?;

        Ok(row.get("found"))
    }

    /// Total 4G time ever uploaded by devices of this brand and model
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn total_4g_time_for_model(pool: &PgPool, brand: &str, model: &str) -> Result<i64> {
        let row = sqlx::query(
            r"
            SELECT COALESCE(SUM(time_on_free_mobile_4g), 0)::BIGINT AS total
            FROM daily_device_stats
            WHERE device_brand = $1 AND device_model = $2
            ",
        )
        .bind(brand)
        .bind(model)
        .fetch_one(pool)
        .await
        .map_err(database_error)?;

        Ok(row.get("total"))
    }

    /// Insert a row inside an open transaction
    ///
    /// Returns `None` when a row already exists for the same device and day.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        stat: &NewDailyDeviceStat,
    ) -> Result<Option<DailyDeviceStatDb>> {
        let query = r"
            INSERT INTO daily_device_stats (
                device_identifier, device_brand, device_model, is_4g,
                time_on_orange, time_on_free_mobile, time_on_free_mobile_3g,
                time_on_free_mobile_4g, time_on_free_mobile_femtocell,
                date, added, modified
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW()
            )
            ON CONFLICT (device_identifier, date) DO NOTHING
            RETURNING *
        ";

        sqlx::query_as::<_, DailyDeviceStatDb>(query)
            .bind(&stat.device_identifier)
            .bind(&stat.device_brand)
            .bind(&stat.device_model)
            .bind(stat.is_4g)
            .bind(stat.upload.time_on_orange)
            .bind(stat.upload.time_on_free_mobile)
            .bind(stat.upload.time_on_free_mobile_3g)
            .bind(stat.upload.time_on_free_mobile_4g)
            .bind(stat.upload.time_on_free_mobile_femtocell)
            .bind(&stat.date)
            .fetch_optional(&mut **tx)
            .await
            .map_err(database_error)
    }

    /// Count distinct devices with statistics in the range
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_distinct_devices(
        pool: &PgPool,
        range: &DateRange,
        only_4g: bool,
    ) -> Result<i64> {
        let row = sqlx::query(
            r"
            SELECT COUNT(DISTINCT device_identifier) AS count
            FROM daily_device_stats
            WHERE date >= $1 AND date <= $2 AND (NOT $3 OR is_4g)
            ",
        )
        .bind(format_compact_date(range.start))
        .bind(format_compact_date(range.end))
        .bind(only_4g)
        .fetch_one(pool)
        .await
        .map_err(database_error)?;

        Ok(row.get("count"))
    }
}

/// Daily summary database operations
pub struct DailyStatSummaryQueries;

impl DailyStatSummaryQueries {
    /// Add an upload's counters to the day's summary, creating it if needed
    ///
    /// A single upsert, so concurrent uploads for the same day never lose
    /// an increment.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn increment(
        tx: &mut Transaction<'_, Postgres>,
        date: &str,
        inc: &SummaryIncrement,
    ) -> Result<()> {
        let query = r"
            INSERT INTO daily_stat_summaries (
                date,
                global_time_on_orange, global_time_on_free_mobile, global_time_on_free_mobile_femtocell,
                g4_time_on_orange, g4_time_on_free_mobile_3g, g4_time_on_free_mobile_4g,
                g4_time_on_free_mobile_femtocell, added, modified
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW()
            )
            ON CONFLICT (date) DO UPDATE SET
                global_time_on_orange = daily_stat_summaries.global_time_on_orange + EXCLUDED.global_time_on_orange,
                global_time_on_free_mobile = daily_stat_summaries.global_time_on_free_mobile + EXCLUDED.global_time_on_free_mobile,
                global_time_on_free_mobile_femtocell = daily_stat_summaries.global_time_on_free_mobile_femtocell + EXCLUDED.global_time_on_free_mobile_femtocell,
                g4_time_on_orange = daily_stat_summaries.g4_time_on_orange + EXCLUDED.g4_time_on_orange,
                g4_time_on_free_mobile_3g = daily_stat_summaries.g4_time_on_free_mobile_3g + EXCLUDED.g4_time_on_free_mobile_3g,
                g4_time_on_free_mobile_4g = daily_stat_summaries.g4_time_on_free_mobile_4g + EXCLUDED.g4_time_on_free_mobile_4g,
                g4_time_on_free_mobile_femtocell = daily_stat_summaries.g4_time_on_free_mobile_femtocell + EXCLUDED.g4_time_on_free_mobile_femtocell,
                modified = NOW()
        ";

        sqlx::query(query)
            .bind(date)
            .bind(inc.global_time_on_orange)
            .bind(inc.global_time_on_free_mobile)
            .bind(inc.global_time_on_free_mobile_femtocell)
            .bind(inc.g4_time_on_orange)
            .bind(inc.g4_time_on_free_mobile_3g)
            .bind(inc.g4_time_on_free_mobile_4g)
            .bind(inc.g4_time_on_free_mobile_femtocell)
            .execute(&mut **tx)
            .await
            .map_err(database_error)?;

        Ok(())
    }

    /// Sum every summary counter over the range
    ///
    /// `users` is left at zero; see [`network_usage`] for the full payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn sum_range(pool: &PgPool, range: &DateRange) -> Result<UsageStats> {
        let row = sqlx::query(
            r"
            SELECT
                COALESCE(SUM(global_time_on_orange), 0)::BIGINT AS global_orange,
                COALESCE(SUM(global_time_on_free_mobile), 0)::BIGINT AS global_free_mobile,
                COALESCE(SUM(global_time_on_free_mobile_femtocell), 0)::BIGINT AS global_femtocell,
                COALESCE(SUM(g4_time_on_orange), 0)::BIGINT AS g4_orange,
                COALESCE(SUM(g4_time_on_free_mobile_3g), 0)::BIGINT AS g4_3g,
                COALESCE(SUM(g4_time_on_free_mobile_4g), 0)::BIGINT AS g4_4g,
                COALESCE(SUM(g4_time_on_free_mobile_femtocell), 0)::BIGINT AS g4_femtocell
            FROM daily_stat_summaries
            WHERE date >= $1 AND date <= $2
            ",
        )
        .bind(format_compact_date(range.start))
        .bind(format_compact_date(range.end))
        .fetch_one(pool)
        .await
        .map_err(database_error)?;

        Ok(UsageStats {
            stats_global: GlobalUsage {
                users: 0,
                time_on_orange: row.get("global_orange"),
                time_on_free_mobile: row.get("global_free_mobile"),
                time_on_free_mobile_femtocell: row.get("global_femtocell"),
            },
            stats_4g: FourGUsage {
                users: 0,
                time_on_orange: row.get("g4_orange"),
                time_on_free_mobile_3g: row.get("g4_3g"),
                time_on_free_mobile_4g: row.get("g4_4g"),
                time_on_free_mobile_femtocell: row.get("g4_femtocell"),
            },
        })
    }

    /// Summaries of every day in the range, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_range(pool: &PgPool, range: &DateRange) -> Result<Vec<DailyStatSummaryDb>> {
        sqlx::query_as::<_, DailyStatSummaryDb>(
            "SELECT * FROM daily_stat_summaries WHERE date >= $1 AND date <= $2 ORDER BY date",
        )
        .bind(format_compact_date(range.start))
        .bind(format_compact_date(range.end))
        .fetch_all(pool)
        .await
        .map_err(database_error)
    }
}

// Convenience wrapper functions

/// Store one day of statistics and add it to the day's summary
///
/// Both writes share a transaction. Returns `None`, with nothing written,
/// when statistics already exist for that device and day.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn record_daily_stat(
    pool: &PgPool,
    stat: &NewDailyDeviceStat,
) -> Result<Option<DailyDeviceStatDb>> {
    let mut tx = pool.begin().await.map_err(database_error)?;

    let Some(stored) = DailyDeviceStatQueries::insert(&mut tx, stat).await? else {
        tx.rollback().await.map_err(database_error)?;
        return Ok(None);
    };

    DailyStatSummaryQueries::increment(&mut tx, &stat.date, &SummaryIncrement::from(&stat.upload))
        .await?;
    tx.commit().await.map_err(database_error)?;

    tracing::debug!(
        device = %stat.device_identifier,
        date = %stat.date,
        is_4g = stat.is_4g,
        "daily statistics recorded"
    );
    Ok(Some(stored))
}

/// Whether this brand and model has accumulated more 4G time than `threshold_ms`
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn is_model_4g(pool: &PgPool, brand: &str, model: &str, threshold_ms: i64) -> Result<bool> {
    Ok(DailyDeviceStatQueries::total_4g_time_for_model(pool, brand, model).await? > threshold_ms)
}

/// Aggregated usage and distinct users over the range
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn network_usage(pool: &PgPool, range: &DateRange) -> Result<UsageStats> {
    let mut stats = DailyStatSummaryQueries::sum_range(pool, range).await?;
    stats.stats_global.users =
        DailyDeviceStatQueries::count_distinct_devices(pool, range, false).await?;
    stats.stats_4g.users = DailyDeviceStatQueries::count_distinct_devices(pool, range, true).await?;
    Ok(stats)
}

/// Per-day usage over the range
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn daily_network_usage(pool: &PgPool, range: &DateRange) -> Result<DailyUsageSeries> {
    let summaries = DailyStatSummaryQueries::list_range(pool, range).await?;
    let mut series = DailyUsageSeries::default();
    for summary in summaries {
        let (global, four_g) = summary.into_usage();
        series.stats_global.push(global);
        series.stats_4g.push(four_g);
    }
    Ok(series)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::missing_panics_doc, clippy::missing_errors_doc)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use netstat_core::types::DailyStatUpload;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    async fn create_test_pool() -> Option<PgPool> {
        let database_url = std::env::var("TEST_DATABASE_URL").ok()?;
        match PgPool::connect(&database_url).await {
            Ok(pool) => {
                if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                    eprintln!("Failed to migrate test database: {e}");
                    return None;
                }
                Some(pool)
            }
            Err(e) => {
                eprintln!("Failed to connect to database: {e}");
                None
            }
        }
    }

    fn unique_identifier() -> String {
        format!("test-{}", Uuid::new_v4().simple())
    }

    fn upload(orange: i64, free_mobile: i64, g3: i64, g4: i64, femto: i64) -> DailyStatUpload {
        DailyStatUpload {
            time_on_orange: orange,
            time_on_free_mobile: free_mobile,
            time_on_free_mobile_3g: g3,
            time_on_free_mobile_4g: g4,
            time_on_free_mobile_femtocell: femto,
        }
    }

    #[tokio::test]
    async fn test_device_insert_conflict() -> Result<()> {
        let Some(pool) = create_test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set or database not available");
            return Ok(());
        };

        let identifier = unique_identifier();
        let device = DeviceQueries::insert(&pool, &identifier, "Google", "Pixel 8").await?;
        assert_eq!(device.device_identifier, identifier);

        let again = DeviceQueries::insert(&pool, &identifier, "Google", "Pixel 8").await;
        assert!(matches!(again, Err(Error::Conflict { .. })));

        let found = DeviceQueries::find_by_identifier(&pool, &identifier).await?;
        assert_eq!(found.map(|d| d.model), Some("Pixel 8".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_daily_stat_is_idempotent_per_day() -> Result<()> {
        let Some(pool) = create_test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set or database not available");
            return Ok(());
        };

        // Far past day so the summary only holds this test's rows
        let day = NaiveDate::from_ymd_opt(1999, 1, 1).unwrap();
        let date = format_compact_date(day);
        let range = DateRange::new(day, day);
        let before = network_usage(&pool, &range).await?;

        let identifier = unique_identifier();
        let stat = NewDailyDeviceStat {
            device_identifier: identifier.clone(),
            device_brand: "Google".to_string(),
            device_model: format!("model-{identifier}"),
            is_4g: false,
            date: date.clone(),
            upload: upload(100, 1_000, 400, 500, 100),
        };

        assert!(record_daily_stat(&pool, &stat).await?.is_some());
        assert!(record_daily_stat(&pool, &stat).await?.is_none());
        assert!(DailyDeviceStatQueries::exists(&pool, &identifier, &date).await?);

        let after = network_usage(&pool, &range).await?;
        assert_eq!(
            after.stats_global.time_on_orange - before.stats_global.time_on_orange,
            100
        );
        assert_eq!(
            after.stats_global.time_on_free_mobile - before.stats_global.time_on_free_mobile,
            900
        );
        assert_eq!(after.stats_global.users - before.stats_global.users, 1);
        assert_eq!(after.stats_4g.users, before.stats_4g.users);
        Ok(())
    }

    #[tokio::test]
    async fn test_is_model_4g_threshold() -> Result<()> {
        let Some(pool) = create_test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set or database not available");
            return Ok(());
        };

        let model = format!("model-{}", Uuid::new_v4().simple());
        assert!(!is_model_4g(&pool, "Acme", &model, 1_000).await?);

        let stat = NewDailyDeviceStat {
            device_identifier: unique_identifier(),
            device_brand: "Acme".to_string(),
            device_model: model.clone(),
            is_4g: false,
            date: "19990102".to_string(),
            upload: upload(0, 2_000, 0, 1_500, 0),
        };
        record_daily_stat(&pool, &stat).await?;

        assert!(is_model_4g(&pool, "Acme", &model, 1_000).await?);
        assert!(!is_model_4g(&pool, "Acme", &model, 1_500).await?);
        Ok(())
    }
}
