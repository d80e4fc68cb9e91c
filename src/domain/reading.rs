//! Telemetry reading records
//!
//! One row of the append-only `customer_telemetry_15m` fact table.
//! Readings are aligned to a 15-minute UTC grid and never updated or
//! deleted after insertion.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Grid spacing of the telemetry log.
pub const INTERVAL_MINUTES: u32 = 15;
/// One interval expressed in hours, used to turn watts into kWh.
pub const INTERVAL_HOURS: f64 = INTERVAL_MINUTES as f64 / 60.0;

/// Lowest watt value a meter ever reports; standby draw of the
/// metering hardware itself.
pub const MIN_READING_WATTS: f64 = 40.0;

/// A single 15-minute consumption reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryReading {
    pub customer_id: String,
    pub ts: DateTime<Utc>,
    pub watts: f64,
    pub cost_eur: f64,
    pub temp_c: Option<f64>,
    pub is_estimated: bool,
}

impl TelemetryReading {
    /// Whether `watts` respects the floor and the contracted-power cap.
    pub fn within_bounds(&self, cap_watts: f64) -> bool {
        self.watts >= MIN_READING_WATTS && self.watts <= cap_watts
    }
}

/// Floor a timestamp to the 15-minute grid.
pub fn floor_to_interval(ts: DateTime<Utc>) -> DateTime<Utc> {
    let minute = (ts.minute() / INTERVAL_MINUTES) * INTERVAL_MINUTES;
    ts.with_minute(minute)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .expect("minute/second truncation cannot overflow")
}

/// Next 15-minute boundary at or after `ts`.
pub fn next_interval_boundary(ts: DateTime<Utc>) -> DateTime<Utc> {
    let floored = floor_to_interval(ts);
    if floored == ts {
        floored
    } else {
        floored + chrono::Duration::minutes(INTERVAL_MINUTES as i64)
    }
}
