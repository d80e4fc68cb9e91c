//! 15-minute telemetry repository

use crate::domain::TelemetryReading;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

/// One point of a per-customer chronological series.
#[derive(Debug, Clone)]
pub struct SeriesPoint {
    pub ts: DateTime<Utc>,
    pub watts: f64,
    pub temp_c: Option<f64>,
}

/// Peak and average demand over a trailing window.
#[derive(Debug, Clone, Copy)]
pub struct WindowStats {
    pub peak_watts: f64,
    pub avg_watts: f64,
}

/// Repository for the `customer_telemetry_15m` table
pub struct TelemetryRepository {
    pool: SqlitePool,
}

impl TelemetryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist one simulation tick atomically. Either every reading of
    /// the tick lands or none does.
    pub async fn insert_tick(&self, readings: &[TelemetryReading]) -> Result<()> {
        if readings.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.context("failed to start transaction")?;

        for reading in readings {
            sqlx::query(
                "INSERT INTO customer_telemetry_15m \
                 (customer_id, ts, watts, cost_eur, temp_c, is_estimated) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&reading.customer_id)
            .bind(reading.ts)
            .bind(reading.watts)
            .bind(reading.cost_eur)
            .bind(reading.temp_c)
            .bind(reading.is_estimated)
            .execute(&mut *tx)
            .await
            .with_context(|| {
                format!("failed to insert reading for {}", reading.customer_id)
            })?;
        }

        tx.commit().await.context("failed to commit telemetry tick")?;
        debug!("inserted {} readings", readings.len());
        Ok(())
    }

    /// Timestamp of the newest reading across all customers.
    pub async fn latest_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT MAX(ts) AS latest FROM customer_telemetry_15m")
            .fetch_one(&self.pool)
            .await
            .context("failed to query latest timestamp")?;
        Ok(row.try_get("latest")?)
    }

    /// Timestamp of the newest reading for one customer.
    pub async fn latest_timestamp_for(
        &self,
        customer_id: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query(
            "SELECT MAX(ts) AS latest FROM customer_telemetry_15m WHERE customer_id = ?",
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await
        .context("failed to query latest timestamp for customer")?;
        Ok(row.try_get("latest")?)
    }

    /// Most recent watts per customer, for warm-starting the simulator
    /// after a restart.
    pub async fn latest_watts_by_customer(&self) -> Result<HashMap<String, f64>> {
        let rows = sqlx::query(
            "SELECT t.customer_id, t.watts \
             FROM customer_telemetry_15m t \
             JOIN (SELECT customer_id, MAX(ts) AS max_ts \
                   FROM customer_telemetry_15m GROUP BY customer_id) last \
             ON t.customer_id = last.customer_id AND t.ts = last.max_ts",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to query latest watts")?;

        let mut latest = HashMap::with_capacity(rows.len());
        for row in rows {
            let customer_id: String = row.try_get("customer_id")?;
            let watts: f64 = row.try_get("watts")?;
            latest.insert(customer_id, watts);
        }
        Ok(latest)
    }

    /// Chronological series for one customer from `since` onward.
    pub async fn series_for(
        &self,
        customer_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SeriesPoint>> {
        let rows = sqlx::query(
            "SELECT ts, watts, temp_c FROM customer_telemetry_15m \
             WHERE customer_id = ? AND ts >= ? ORDER BY ts ASC",
        )
        .bind(customer_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to load series for {customer_id}"))?;

        rows.iter()
            .map(|row| {
                Ok(SeriesPoint {
                    ts: row.try_get("ts")?,
                    watts: row.try_get("watts")?,
                    temp_c: row.try_get("temp_c")?,
                })
            })
            .collect()
    }

    /// Peak and average demand for a customer over [`start`, `end`].
    /// Returns `None` when the window holds no readings.
    pub async fn window_stats(
        &self,
        customer_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<WindowStats>> {
        let row = sqlx::query(
            "SELECT MAX(watts) AS peak, AVG(watts) AS avg \
             FROM customer_telemetry_15m \
             WHERE customer_id = ? AND ts >= ? AND ts <= ?",
        )
        .bind(customer_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to load window stats for {customer_id}"))?;

        let peak: Option<f64> = row.try_get("peak")?;
        let avg: Option<f64> = row.try_get("avg")?;
        match (peak, avg) {
            (Some(peak_watts), Some(avg_watts)) => Ok(Some(WindowStats { peak_watts, avg_watts })),
            _ => Ok(None),
        }
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM customer_telemetry_15m")
            .fetch_one(&self.pool)
            .await
            .context("failed to count readings")?;
        Ok(row.try_get("n")?)
    }

    /// Wipe all readings (reset mode only).
    pub async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM customer_telemetry_15m")
            .execute(&self.pool)
            .await
            .context("failed to delete readings")?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::domain::{
        AlertSensitivity, CustomerProfile, DwellingType, LocalityType, Segment, Tariff,
    };
    use chrono::{Duration, TimeZone};

    fn customer(id: &str) -> CustomerProfile {
        CustomerProfile {
            id: id.to_string(),
            name: "Test Customer".to_string(),
            segment: Segment::Residential,
            city: "Porto".to_string(),
            contracted_power_kva: 6.9,
            tariff: Tariff::Flat,
            utility: "EDP".to_string(),
            price_eur_per_kwh: 0.20,
            fixed_daily_fee_eur: 0.25,
            has_smart_meter: true,
            home_area_m2: 95.0,
            household_size: 3,
            locality_type: LocalityType::Urban,
            dwelling_type: DwellingType::Apartment,
            build_year_band: "2000-2014".to_string(),
            heating_sources: vec!["electric".to_string()],
            has_solar: false,
            ev_count: 0,
            alert_sensitivity: AlertSensitivity::Medium,
            main_appliances: vec![],
        }
    }

    /// Readings reference `customers` rows, so fixtures must insert the
    /// profiles first.
    async fn seed_customers(db: &Database, ids: &[&str]) {
        let profiles: Vec<CustomerProfile> = ids.iter().map(|id| customer(id)).collect();
        db.customers().insert_batch(&profiles).await.unwrap();
    }

    fn reading(customer_id: &str, ts: DateTime<Utc>, watts: f64) -> TelemetryReading {
        TelemetryReading {
            customer_id: customer_id.to_string(),
            ts,
            watts,
            cost_eur: watts / 1000.0 * 0.2 * 0.25,
            temp_c: Some(17.5),
            is_estimated: false,
        }
    }

    #[tokio::test]
    async fn test_insert_tick_and_latest_timestamp() {
        let db = Database::in_memory().await.unwrap();
        seed_customers(&db, &["C_A", "C_B"]).await;
        let repo = db.telemetry();

        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let t1 = t0 + Duration::minutes(15);

        repo.insert_tick(&[reading("C_A", t0, 500.0), reading("C_B", t0, 700.0)])
            .await
            .unwrap();
        repo.insert_tick(&[reading("C_A", t1, 520.0)]).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 3);
        assert_eq!(repo.latest_timestamp().await.unwrap(), Some(t1));
        assert_eq!(repo.latest_timestamp_for("C_B").await.unwrap(), Some(t0));
        assert_eq!(repo.latest_timestamp_for("C_MISSING").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_latest_watts_by_customer() {
        let db = Database::in_memory().await.unwrap();
        seed_customers(&db, &["C_A", "C_B"]).await;
        let repo = db.telemetry();

        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let t1 = t0 + Duration::minutes(15);

        repo.insert_tick(&[reading("C_A", t0, 500.0), reading("C_B", t0, 700.0)])
            .await
            .unwrap();
        repo.insert_tick(&[reading("C_A", t1, 520.0)]).await.unwrap();

        let latest = repo.latest_watts_by_customer().await.unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest["C_A"], 520.0);
        assert_eq!(latest["C_B"], 700.0);
    }

    #[tokio::test]
    async fn test_series_is_chronological_and_filtered() {
        let db = Database::in_memory().await.unwrap();
        seed_customers(&db, &["C_A"]).await;
        let repo = db.telemetry();

        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        for step in 0..10 {
            let ts = t0 + Duration::minutes(15 * step);
            repo.insert_tick(&[reading("C_A", ts, 100.0 + step as f64)])
                .await
                .unwrap();
        }

        let since = t0 + Duration::minutes(15 * 4);
        let series = repo.series_for("C_A", since).await.unwrap();
        assert_eq!(series.len(), 6);
        assert_eq!(series[0].watts, 104.0);
        for pair in series.windows(2) {
            assert!(pair[0].ts < pair[1].ts);
        }
    }

    #[tokio::test]
    async fn test_window_stats() {
        let db = Database::in_memory().await.unwrap();
        seed_customers(&db, &["C_A"]).await;
        let repo = db.telemetry();

        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        repo.insert_tick(&[reading("C_A", t0, 100.0)]).await.unwrap();
        repo.insert_tick(&[reading("C_A", t0 + Duration::minutes(15), 300.0)])
            .await
            .unwrap();
        repo.insert_tick(&[reading("C_A", t0 + Duration::minutes(30), 200.0)])
            .await
            .unwrap();

        let stats = repo
            .window_stats("C_A", t0, t0 + Duration::hours(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.peak_watts, 300.0);
        assert_eq!(stats.avg_watts, 200.0);

        let empty = repo
            .window_stats("C_MISSING", t0, t0 + Duration::hours(1))
            .await
            .unwrap();
        assert!(empty.is_none());
    }
}
