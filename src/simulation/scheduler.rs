//! Generation scheduling
//!
//! Two modes share the engine: `backfill` synthesizes every missing
//! 15-minute interval up to the current one and exits; `run_continuous`
//! waits for each wall-clock boundary and emits exactly one tick for
//! it. Sleep duration is recomputed from the live clock every cycle so
//! the loop does not drift.

use crate::database::Database;
use crate::domain::reading::{floor_to_interval, INTERVAL_MINUTES};
use crate::domain::CustomerProfile;
use crate::simulation::engine::SimulationEngine;
use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::{debug, info};

/// Generate readings for every complete interval missing from the
/// store and return how many readings were written.
///
/// On an empty store generation starts `days` back from the current
/// interval; otherwise it resumes one interval after the newest stored
/// timestamp. The interval containing "now" is left for the continuous
/// loop, so each backfilled tick covers a finished interval.
pub async fn backfill(
    db: &Database,
    engine: &mut SimulationEngine,
    profiles: &[CustomerProfile],
    days: i64,
) -> Result<u64> {
    let telemetry = db.telemetry();
    let end = floor_to_interval(Utc::now());

    let mut ts = match telemetry.latest_timestamp().await? {
        Some(latest) => latest + Duration::minutes(INTERVAL_MINUTES as i64),
        None => end - Duration::days(days),
    };

    let mut written = 0u64;
    while ts < end {
        let readings = engine.tick(ts, profiles);
        written += readings.len() as u64;
        telemetry.insert_tick(&readings).await?;
        ts += Duration::minutes(INTERVAL_MINUTES as i64);
    }

    info!(readings = written, "backfill complete");
    Ok(written)
}

/// Emit one tick per wall-clock 15-minute boundary, forever.
///
/// Runs until the surrounding task is cancelled. Each tick is one
/// atomic batch write, so external termination cannot leave a partial
/// tick behind.
pub async fn run_continuous(
    db: &Database,
    engine: &mut SimulationEngine,
    profiles: &[CustomerProfile],
) -> Result<()> {
    let telemetry = db.telemetry();

    loop {
        // Strictly after "now", so a tick landing exactly on the grid
        // cannot be emitted twice.
        let boundary = floor_to_interval(Utc::now()) + Duration::minutes(INTERVAL_MINUTES as i64);
        let wait = (boundary - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        debug!(?wait, %boundary, "sleeping until next interval");
        tokio::time::sleep(wait).await;

        let readings = engine.tick(boundary, profiles);
        telemetry.insert_tick(&readings).await?;
        info!(readings = readings.len(), %boundary, "tick committed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::population::PopulationGenerator;

    #[tokio::test]
    async fn test_backfill_fills_one_day() {
        let db = Database::in_memory().await.unwrap();
        let profiles = PopulationGenerator::new(42).generate(5).unwrap();
        db.customers().insert_batch(&profiles).await.unwrap();

        let mut engine = SimulationEngine::new(42);
        let written = backfill(&db, &mut engine, &profiles, 1).await.unwrap();

        assert_eq!(written, 5 * 96);
        assert_eq!(db.telemetry().count().await.unwrap(), 5 * 96);
    }

    #[tokio::test]
    async fn test_backfill_resumes_without_duplicates() {
        let db = Database::in_memory().await.unwrap();
        let profiles = PopulationGenerator::new(42).generate(3).unwrap();
        db.customers().insert_batch(&profiles).await.unwrap();

        let mut engine = SimulationEngine::new(42);
        backfill(&db, &mut engine, &profiles, 1).await.unwrap();
        let latest = db.telemetry().latest_timestamp().await.unwrap();

        // Immediately rerunning finds nothing missing.
        let written = backfill(&db, &mut engine, &profiles, 1).await.unwrap();
        assert_eq!(written, 0);
        assert_eq!(db.telemetry().latest_timestamp().await.unwrap(), latest);
    }

    #[tokio::test]
    async fn test_backfilled_readings_stay_within_bounds() {
        let db = Database::in_memory().await.unwrap();
        let profiles = PopulationGenerator::new(7).generate(4).unwrap();
        db.customers().insert_batch(&profiles).await.unwrap();

        let mut engine = SimulationEngine::new(7);
        backfill(&db, &mut engine, &profiles, 1).await.unwrap();

        for profile in &profiles {
            let since = Utc::now() - Duration::days(2);
            let series = db.telemetry().series_for(&profile.id, since).await.unwrap();
            assert_eq!(series.len(), 96);
            for point in &series {
                assert!(point.watts >= 40.0);
                assert!(point.watts <= profile.power_cap_watts());
            }
        }
    }
}
