//! Next-interval demand forecaster pipeline
//!
//! Walks each customer's chronological telemetry inside the history
//! window and pairs the encoded state at step `t` with the observed
//! watts at `t+1`, then fits a ridge model on the pooled pairs.

use crate::database::Database;
use crate::domain::INTERVAL_MINUTES;
use crate::ml::features::{next_step_features, NEXT_STEP_FEATURE_NAMES};
use crate::ml::ridge::{evaluate, fit};
use crate::ml::ModelArtifact;
use crate::training::{Dataset, TrainingError};
use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::info;

/// Pooled pairs below this count cannot support a meaningful split.
pub const MIN_TRAINING_PAIRS: usize = 200;

/// A customer needs at least this many readings to contribute pairs.
pub const MIN_READINGS_PER_CUSTOMER: usize = 3;

/// Train the forecaster on telemetry newer than `history_days`.
pub async fn train(db: &Database, history_days: i64, l2: f64, seed: u64) -> Result<ModelArtifact> {
    let profiles = db.customers().load_all().await?;
    let telemetry = db.telemetry();
    let cutoff = Utc::now() - Duration::days(history_days);

    let mut dataset = Dataset::default();
    let mut contributing = 0usize;

    for profile in &profiles {
        let series = telemetry.series_for(&profile.id, cutoff).await?;
        if series.len() < MIN_READINGS_PER_CUSTOMER {
            continue;
        }
        contributing += 1;

        for pair in series.windows(2) {
            let row = next_step_features(pair[0].ts, profile, pair[0].watts, pair[0].temp_c);
            dataset.push(row, pair[1].watts);
        }
    }

    if dataset.len() < MIN_TRAINING_PAIRS {
        return Err(TrainingError::InsufficientData {
            needed: MIN_TRAINING_PAIRS,
            got: dataset.len(),
            unit: "training pairs",
        }
        .into());
    }

    let total = dataset.len();
    let (train, test) = dataset.shuffled_split(seed);
    let model = fit(&train.features, &train.targets, l2)?;

    let predictions: Vec<f64> = test.features.iter().map(|row| model.predict(row)).collect();
    let metrics = evaluate(&test.targets, &predictions);

    info!(
        pairs = total,
        customers = contributing,
        mae = metrics.mae,
        rmse = metrics.rmse,
        r2 = metrics.r2,
        "next-step model trained"
    );

    Ok(ModelArtifact::from_fitted(&model, &NEXT_STEP_FEATURE_NAMES, metrics)
        .with_interval_minutes(INTERVAL_MINUTES)
        .with_notes(format!(
            "next-step forecaster, {total} pairs from {contributing} customers, {history_days}d window"
        )))
}
