//! Customer profile value objects
//!
//! A `CustomerProfile` is created once at population-generation time and
//! never mutated afterwards. Segment- and tariff-dependent behaviour is
//! data-driven branching on the closed enums below; there is no
//! inheritance hierarchy.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Contracted power steps available per segment (kVA).
///
/// These are the discrete tiers offered by Portuguese utilities; a
/// profile whose contracted power is not drawn from its segment's set
/// fails validation.
pub const RESIDENTIAL_POWER_STEPS_KVA: &[f64] = &[3.45, 4.6, 5.75, 6.9, 10.35];
pub const SME_POWER_STEPS_KVA: &[f64] = &[10.35, 13.8, 17.25];
pub const INDUSTRIAL_POWER_STEPS_KVA: &[f64] = &[17.25, 20.7, 27.6];

/// Unit price bounds (€/kWh).
pub const UNIT_PRICE_RANGE_EUR: (f64, f64) = (0.08, 0.45);
/// Fixed daily fee bounds (€).
pub const FIXED_FEE_RANGE_EUR: (f64, f64) = (0.0, 1.5);

/// Fraction of contracted power a meter will sustain before the main
/// breaker trips. Readings are capped at this fraction of the
/// contracted apparent power.
pub const CONTRACTED_POWER_CAP_FRACTION: f64 = 0.92;

/// Customer segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Residential,
    Sme,
    Industrial,
}

impl Segment {
    /// Contracted power tiers this segment can subscribe to.
    pub fn power_steps_kva(&self) -> &'static [f64] {
        match self {
            Segment::Residential => RESIDENTIAL_POWER_STEPS_KVA,
            Segment::Sme => SME_POWER_STEPS_KVA,
            Segment::Industrial => INDUSTRIAL_POWER_STEPS_KVA,
        }
    }
}

/// Tariff scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Tariff {
    Flat,
    TimeOfUse,
}

/// Locality classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LocalityType {
    Urban,
    Suburban,
    Rural,
}

/// Dwelling classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DwellingType {
    Apartment,
    DetachedHouse,
    SemiDetachedHouse,
    Commercial,
    Industrial,
}

/// How eagerly the customer wants consumption alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AlertSensitivity {
    Low,
    Medium,
    High,
}

/// Profile validation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProfileValidationError {
    #[error("contracted power {kva} kVA is not a valid {segment} tier")]
    InvalidContractedPower { segment: Segment, kva: f64 },

    #[error("unit price {0} €/kWh outside [0.08, 0.45]")]
    UnitPriceOutOfRange(f64),

    #[error("fixed daily fee {0} € outside [0, 1.5]")]
    FixedFeeOutOfRange(f64),

    #[error("home area {0} m² must be positive")]
    NonPositiveHomeArea(f64),

    #[error("household size must be at least 1, got {0}")]
    EmptyHousehold(u32),
}

/// Immutable customer profile
///
/// Wide value object matching the `customers` table row. Validation is
/// a construction-time precondition; the simulation engine assumes a
/// profile it receives is already in-range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub id: String,
    pub name: String,
    pub segment: Segment,
    pub city: String,
    pub contracted_power_kva: f64,
    pub tariff: Tariff,
    pub utility: String,
    pub price_eur_per_kwh: f64,
    pub fixed_daily_fee_eur: f64,
    pub has_smart_meter: bool,
    pub home_area_m2: f64,
    pub household_size: u32,
    pub locality_type: LocalityType,
    pub dwelling_type: DwellingType,
    pub build_year_band: String,
    pub heating_sources: Vec<String>,
    pub has_solar: bool,
    pub ev_count: u32,
    pub alert_sensitivity: AlertSensitivity,
    pub main_appliances: Vec<String>,
}

impl CustomerProfile {
    /// Hard consumption cap in watts implied by the contracted power.
    pub fn power_cap_watts(&self) -> f64 {
        self.contracted_power_kva * 1000.0 * CONTRACTED_POWER_CAP_FRACTION
    }

    /// Check every field against its allowed domain.
    ///
    /// Called once when a profile is built or loaded; a failure is
    /// terminal for the current run.
    pub fn validate(&self) -> Result<(), ProfileValidationError> {
        let steps = self.segment.power_steps_kva();
        if !steps.iter().any(|s| (s - self.contracted_power_kva).abs() < 1e-9) {
            return Err(ProfileValidationError::InvalidContractedPower {
                segment: self.segment,
                kva: self.contracted_power_kva,
            });
        }

        let (price_min, price_max) = UNIT_PRICE_RANGE_EUR;
        if self.price_eur_per_kwh < price_min || self.price_eur_per_kwh > price_max {
            return Err(ProfileValidationError::UnitPriceOutOfRange(self.price_eur_per_kwh));
        }

        let (fee_min, fee_max) = FIXED_FEE_RANGE_EUR;
        if self.fixed_daily_fee_eur < fee_min || self.fixed_daily_fee_eur > fee_max {
            return Err(ProfileValidationError::FixedFeeOutOfRange(self.fixed_daily_fee_eur));
        }

        if self.home_area_m2 <= 0.0 {
            return Err(ProfileValidationError::NonPositiveHomeArea(self.home_area_m2));
        }

        if self.household_size == 0 {
            return Err(ProfileValidationError::EmptyHousehold(self.household_size));
        }

        Ok(())
    }
}
