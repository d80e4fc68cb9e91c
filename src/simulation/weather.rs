//! Seasonal ambient temperature model
//!
//! Mild Portuguese climate approximated by a day-of-year sinusoid with
//! a fixed offset for Atlantic-coast cities. The deterministic part is
//! shared with feature encoding, which backfills missing reading
//! temperatures from it; the simulation engine adds Gaussian noise on
//! top.

use chrono::{DateTime, Datelike, Utc};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

/// Yearly midline temperature (°C).
pub const TEMP_MIDLINE_C: f64 = 16.0;
/// Seasonal swing amplitude (°C).
pub const TEMP_AMPLITUDE_C: f64 = 7.0;
/// Day-of-year where the sinusoid peaks (mid summer).
pub const TEMP_PEAK_DAY: f64 = 170.0;
/// Offset applied to coastal cities (°C).
pub const COASTAL_OFFSET_C: f64 = -1.0;
/// Standard deviation of per-tick temperature noise (°C).
pub const TEMP_NOISE_STD_C: f64 = 1.2;

const COASTAL_CITIES: &[&str] = &["Porto", "Matosinhos", "Vila Nova de Gaia", "Aveiro"];

/// Deterministic seasonal temperature for a timestamp and city.
pub fn seasonal_temperature(ts: DateTime<Utc>, city: &str) -> f64 {
    let day_of_year = ts.ordinal() as f64;
    let base = TEMP_MIDLINE_C
        + TEMP_AMPLITUDE_C
            * (2.0 * std::f64::consts::PI * (day_of_year - TEMP_PEAK_DAY) / 365.0).sin();
    let coastal = if COASTAL_CITIES.contains(&city) {
        COASTAL_OFFSET_C
    } else {
        0.0
    };
    base + coastal
}

/// Seasonal temperature with simulation noise applied.
pub fn sampled_temperature(ts: DateTime<Utc>, city: &str, rng: &mut StdRng) -> f64 {
    let noise = Normal::new(0.0, TEMP_NOISE_STD_C)
        .expect("valid normal parameters")
        .sample(rng);
    seasonal_temperature(ts, city) + noise
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;

    #[test]
    fn test_summer_warmer_than_winter() {
        let summer = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        let winter = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert!(seasonal_temperature(summer, "Lisboa") > seasonal_temperature(winter, "Lisboa"));
    }

    #[test]
    fn test_seasonal_phase() {
        // The sinusoid crosses the midline on day 170 (mid June) and
        // peaks a quarter year later, in mid September.
        let midline_day = Utc.with_ymd_and_hms(2024, 6, 18, 0, 0, 0).unwrap();
        let t = seasonal_temperature(midline_day, "Braga");
        assert!((t - TEMP_MIDLINE_C).abs() < 0.1);

        let peak_day = Utc.with_ymd_and_hms(2024, 9, 17, 0, 0, 0).unwrap();
        let t = seasonal_temperature(peak_day, "Braga");
        assert!((t - (TEMP_MIDLINE_C + TEMP_AMPLITUDE_C)).abs() < 0.1);
    }

    #[test]
    fn test_coastal_offset() {
        let ts = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let coastal = seasonal_temperature(ts, "Porto");
        let inland = seasonal_temperature(ts, "Braga");
        assert!((coastal - inland - COASTAL_OFFSET_C).abs() < 1e-9);
    }

    #[test]
    fn test_sampled_temperature_is_deterministic_per_seed() {
        let ts = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        assert_eq!(
            sampled_temperature(ts, "Porto", &mut rng_a),
            sampled_temperature(ts, "Porto", &mut rng_b)
        );
    }
}
