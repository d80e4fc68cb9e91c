//! Feature encoding for the two training pipelines
//!
//! Both pipelines share one declared, ordered feature schema per model
//! so that a persisted artifact and the runtime feature vector can
//! never drift apart. Encoding is total: any well-formed
//! `CustomerProfile` produces a vector, and a missing reading
//! temperature is backfilled from the deterministic seasonal model
//! rather than failing.

use crate::domain::{CustomerProfile, Segment, Tariff};
use crate::simulation::weather;
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::f64::consts::PI;

/// Ordered schema of the next-interval forecaster.
pub const NEXT_STEP_FEATURE_NAMES: [&str; 17] = [
    "last_watts",
    "hour_sin",
    "hour_cos",
    "dow_sin",
    "dow_cos",
    "is_weekend",
    "temp_c",
    "contracted_power_kva",
    "tariff_flat",
    "tariff_time_of_use",
    "segment_residential",
    "segment_sme",
    "segment_industrial",
    "home_area_m2",
    "household_size",
    "has_solar",
    "ev_count",
];

/// Ordered schema of the contracted-power estimator.
pub const POWER_SIZING_FEATURE_NAMES: [&str; 10] = [
    "contracted_power_kva",
    "peak_watts_30d",
    "avg_watts_30d",
    "home_area_m2",
    "household_size",
    "has_solar",
    "ev_count",
    "segment_residential",
    "segment_sme",
    "segment_industrial",
];

fn one_hot_tariff(tariff: Tariff) -> (f64, f64) {
    match tariff {
        Tariff::Flat => (1.0, 0.0),
        Tariff::TimeOfUse => (0.0, 1.0),
    }
}

fn one_hot_segment(segment: Segment) -> (f64, f64, f64) {
    match segment {
        Segment::Residential => (1.0, 0.0, 0.0),
        Segment::Sme => (0.0, 1.0, 0.0),
        Segment::Industrial => (0.0, 0.0, 1.0),
    }
}

/// Encode one next-step sample.
///
/// `temp_c` is the reading's ambient temperature when the store has
/// one; `None` falls back to the seasonal model for the profile's city.
pub fn next_step_features(
    ts: DateTime<Utc>,
    profile: &CustomerProfile,
    last_watts: f64,
    temp_c: Option<f64>,
) -> Vec<f64> {
    let hour = ts.hour() as f64 + ts.minute() as f64 / 60.0;
    let dow = ts.weekday().num_days_from_monday() as f64;
    let is_weekend = if dow >= 5.0 { 1.0 } else { 0.0 };

    let hour_rad = 2.0 * PI * (hour / 24.0);
    let dow_rad = 2.0 * PI * (dow / 7.0);

    let temp_c = temp_c.unwrap_or_else(|| weather::seasonal_temperature(ts, &profile.city));

    let (tariff_flat, tariff_tou) = one_hot_tariff(profile.tariff);
    let (seg_res, seg_sme, seg_ind) = one_hot_segment(profile.segment);

    vec![
        last_watts,
        hour_rad.sin(),
        hour_rad.cos(),
        dow_rad.sin(),
        dow_rad.cos(),
        is_weekend,
        temp_c,
        profile.contracted_power_kva,
        tariff_flat,
        tariff_tou,
        seg_res,
        seg_sme,
        seg_ind,
        profile.home_area_m2,
        profile.household_size as f64,
        if profile.has_solar { 1.0 } else { 0.0 },
        profile.ev_count as f64,
    ]
}

/// Encode one power-sizing sample from 30-day trailing statistics.
pub fn power_sizing_features(
    profile: &CustomerProfile,
    peak_watts_30d: f64,
    avg_watts_30d: f64,
) -> Vec<f64> {
    let (seg_res, seg_sme, seg_ind) = one_hot_segment(profile.segment);

    vec![
        profile.contracted_power_kva,
        peak_watts_30d,
        avg_watts_30d,
        profile.home_area_m2,
        profile.household_size as f64,
        if profile.has_solar { 1.0 } else { 0.0 },
        profile.ev_count as f64,
        seg_res,
        seg_sme,
        seg_ind,
    ]
}
