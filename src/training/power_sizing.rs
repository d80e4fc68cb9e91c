//! Ideal contracted-power estimator pipeline
//!
//! The target is synthesized from each customer's 30-day trailing peak
//! and average demand, inflated by a segment safety margin and snapped
//! to the commercial 0.1 kVA grid.

use crate::database::Database;
use crate::domain::Segment;
use crate::ml::features::{power_sizing_features, POWER_SIZING_FEATURE_NAMES};
use crate::ml::ridge::{evaluate, fit};
use crate::ml::ModelArtifact;
use crate::training::{Dataset, TrainingError};
use anyhow::Result;
use chrono::Duration;
use tracing::info;

/// Fewer customers than this cannot support a meaningful split.
pub const MIN_CUSTOMERS: usize = 10;

/// Trailing statistics window.
pub const WINDOW_DAYS: i64 = 30;

/// Peak watts are converted to apparent power at this power factor.
const PEAK_POWER_FACTOR: f64 = 0.85;

/// Headroom multiplier applied to the average-demand floor.
const AVG_HEADROOM_FACTOR: f64 = 2.2;

/// Commercially offerable contracted power range.
const KVA_RANGE: (f64, f64) = (1.0, 60.0);

fn segment_margin(segment: Segment) -> f64 {
    match segment {
        Segment::Residential => 0.08,
        Segment::Sme => 0.10,
        Segment::Industrial => 0.15,
    }
}

/// Ideal contracted power in kVA for observed demand statistics.
pub fn target_ideal_kva(segment: Segment, peak_watts: f64, avg_watts: f64) -> f64 {
    let peak_kva = (peak_watts / 1000.0) / PEAK_POWER_FACTOR;
    let avg_kva = (avg_watts / 1000.0) * AVG_HEADROOM_FACTOR;
    let sized = peak_kva.max(avg_kva) * (1.0 + segment_margin(segment));
    let snapped = (sized * 10.0).ceil() / 10.0;
    snapped.clamp(KVA_RANGE.0, KVA_RANGE.1)
}

/// Train the estimator on one row per customer with telemetry.
pub async fn train(db: &Database, l2: f64, seed: u64) -> Result<ModelArtifact> {
    let profiles = db.customers().load_all().await?;
    let telemetry = db.telemetry();

    let mut dataset = Dataset::default();
    for profile in &profiles {
        let latest = match telemetry.latest_timestamp_for(&profile.id).await? {
            Some(ts) => ts,
            None => continue,
        };
        let stats = match telemetry
            .window_stats(&profile.id, latest - Duration::days(WINDOW_DAYS), latest)
            .await?
        {
            Some(stats) => stats,
            None => continue,
        };

        let row = power_sizing_features(profile, stats.peak_watts, stats.avg_watts);
        let target = target_ideal_kva(profile.segment, stats.peak_watts, stats.avg_watts);
        dataset.push(row, target);
    }

    if dataset.len() < MIN_CUSTOMERS {
        return Err(TrainingError::InsufficientData {
            needed: MIN_CUSTOMERS,
            got: dataset.len(),
            unit: "customers with telemetry",
        }
        .into());
    }

    let total = dataset.len();
    let (train, test) = dataset.shuffled_split(seed);
    let model = fit(&train.features, &train.targets, l2)?;

    let predictions: Vec<f64> = test.features.iter().map(|row| model.predict(row)).collect();
    let metrics = evaluate(&test.targets, &predictions);

    info!(
        customers = total,
        mae = metrics.mae,
        rmse = metrics.rmse,
        r2 = metrics.r2,
        "power-sizing model trained"
    );

    Ok(
        ModelArtifact::from_fitted(&model, &POWER_SIZING_FEATURE_NAMES, metrics).with_notes(
            format!("contracted-power estimator, {total} customers, {WINDOW_DAYS}d statistics"),
        ),
    )
}
