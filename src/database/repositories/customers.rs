//! Customer profile repository

use crate::domain::{
    AlertSensitivity, CustomerProfile, DwellingType, LocalityType, Segment, Tariff,
};
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

const SELECT_COLUMNS: &str = "id, name, segment, city, contracted_power_kva, tariff, utility, \
     price_eur_per_kwh, fixed_daily_fee_eur, has_smart_meter, home_area_m2, household_size, \
     locality_type, dwelling_type, build_year_band, heating_sources, has_solar, ev_count, \
     alert_sensitivity, main_appliances";

/// Repository for the `customers` table
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a freshly generated population in one transaction.
    pub async fn insert_batch(&self, profiles: &[CustomerProfile]) -> Result<()> {
        if profiles.is_empty() {
            return Ok(());
        }

        let created_at = Utc::now();
        let mut tx = self.pool.begin().await.context("failed to start transaction")?;

        for profile in profiles {
            sqlx::query(
                "INSERT INTO customers (id, name, segment, city, contracted_power_kva, tariff, \
                 utility, price_eur_per_kwh, fixed_daily_fee_eur, has_smart_meter, home_area_m2, \
                 household_size, locality_type, dwelling_type, build_year_band, heating_sources, \
                 has_solar, ev_count, alert_sensitivity, main_appliances, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&profile.id)
            .bind(&profile.name)
            .bind(profile.segment.to_string())
            .bind(&profile.city)
            .bind(profile.contracted_power_kva)
            .bind(profile.tariff.to_string())
            .bind(&profile.utility)
            .bind(profile.price_eur_per_kwh)
            .bind(profile.fixed_daily_fee_eur)
            .bind(profile.has_smart_meter)
            .bind(profile.home_area_m2)
            .bind(profile.household_size as i64)
            .bind(profile.locality_type.to_string())
            .bind(profile.dwelling_type.to_string())
            .bind(&profile.build_year_band)
            .bind(profile.heating_sources.join(","))
            .bind(profile.has_solar)
            .bind(profile.ev_count as i64)
            .bind(profile.alert_sensitivity.to_string())
            .bind(profile.main_appliances.join(","))
            .bind(created_at)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to insert customer {}", profile.id))?;
        }

        tx.commit().await.context("failed to commit customer batch")?;
        info!("inserted {} customers", profiles.len());
        Ok(())
    }

    /// Load the whole population in id order.
    pub async fn load_all(&self) -> Result<Vec<CustomerProfile>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM customers ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to load customers")?;

        let profiles = rows
            .iter()
            .map(row_to_profile)
            .collect::<Result<Vec<_>>>()?;

        debug!("loaded {} customers", profiles.len());
        Ok(profiles)
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM customers")
            .fetch_one(&self.pool)
            .await
            .context("failed to count customers")?;
        Ok(row.try_get("n")?)
    }

    /// Wipe the population (reset mode only).
    pub async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM customers")
            .execute(&self.pool)
            .await
            .context("failed to delete customers")?;
        Ok(result.rows_affected())
    }
}

fn split_csv(raw: String) -> Vec<String> {
    raw.split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn row_to_profile(row: &sqlx::sqlite::SqliteRow) -> Result<CustomerProfile> {
    let id: String = row.try_get("id")?;
    let segment_raw: String = row.try_get("segment")?;
    let tariff_raw: String = row.try_get("tariff")?;
    let locality_raw: String = row.try_get("locality_type")?;
    let dwelling_raw: String = row.try_get("dwelling_type")?;
    let alert_raw: String = row.try_get("alert_sensitivity")?;

    Ok(CustomerProfile {
        name: row.try_get("name")?,
        segment: Segment::from_str(&segment_raw)
            .with_context(|| format!("customer {id}: unknown segment '{segment_raw}'"))?,
        city: row.try_get("city")?,
        contracted_power_kva: row.try_get("contracted_power_kva")?,
        tariff: Tariff::from_str(&tariff_raw)
            .with_context(|| format!("customer {id}: unknown tariff '{tariff_raw}'"))?,
        utility: row.try_get("utility")?,
        price_eur_per_kwh: row.try_get("price_eur_per_kwh")?,
        fixed_daily_fee_eur: row.try_get("fixed_daily_fee_eur")?,
        has_smart_meter: row.try_get("has_smart_meter")?,
        home_area_m2: row.try_get("home_area_m2")?,
        household_size: row.try_get::<i64, _>("household_size")? as u32,
        locality_type: LocalityType::from_str(&locality_raw)
            .with_context(|| format!("customer {id}: unknown locality '{locality_raw}'"))?,
        dwelling_type: DwellingType::from_str(&dwelling_raw)
            .with_context(|| format!("customer {id}: unknown dwelling '{dwelling_raw}'"))?,
        build_year_band: row.try_get("build_year_band")?,
        heating_sources: split_csv(row.try_get("heating_sources")?),
        has_solar: row.try_get("has_solar")?,
        ev_count: row.try_get::<i64, _>("ev_count")? as u32,
        alert_sensitivity: AlertSensitivity::from_str(&alert_raw)
            .with_context(|| format!("customer {id}: unknown sensitivity '{alert_raw}'"))?,
        main_appliances: split_csv(row.try_get("main_appliances")?),
        id,
    })
}

#[cfg(test)]
mod tests {
    use crate::database::Database;
    use crate::simulation::population::PopulationGenerator;

    #[tokio::test]
    async fn test_insert_and_load_round_trip() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.customers();

        let profiles = PopulationGenerator::new(42).generate(10).unwrap();
        repo.insert_batch(&profiles).await.unwrap();

        let loaded = repo.load_all().await.unwrap();
        assert_eq!(loaded.len(), 10);

        let mut expected = profiles.clone();
        expected.sort_by(|a, b| a.id.cmp(&b.id));
        for (original, stored) in expected.iter().zip(loaded.iter()) {
            assert_eq!(original.id, stored.id);
            assert_eq!(original.segment, stored.segment);
            assert_eq!(original.tariff, stored.tariff);
            assert_eq!(original.contracted_power_kva, stored.contracted_power_kva);
            assert_eq!(original.heating_sources, stored.heating_sources);
            assert_eq!(original.ev_count, stored.ev_count);
        }
    }

    #[tokio::test]
    async fn test_count_and_delete_all() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.customers();

        let profiles = PopulationGenerator::new(7).generate(5).unwrap();
        repo.insert_batch(&profiles).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 5);

        assert_eq!(repo.delete_all().await.unwrap(), 5);
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
