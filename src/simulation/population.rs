//! Random customer population generation
//!
//! Draws N `CustomerProfile`s from segment-conditioned attribute
//! distributions. Every generated profile is validated before being
//! handed out; generation is deterministic for a given seed.

use crate::domain::{
    AlertSensitivity, CustomerProfile, DwellingType, LocalityType, ProfileValidationError,
    Segment, Tariff, FIXED_FEE_RANGE_EUR, UNIT_PRICE_RANGE_EUR,
};
use rand::distributions::{Alphanumeric, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

const CITIES: &[&str] = &[
    "Porto",
    "Matosinhos",
    "Maia",
    "Vila Nova de Gaia",
    "Braga",
    "Aveiro",
    "Coimbra",
    "Lisboa",
];

const UTILITIES: &[&str] = &["EDP", "Endesa", "Iberdrola"];

const SEGMENT_WEIGHTS: [f64; 3] = [0.72, 0.22, 0.06];
const TARIFF_WEIGHTS: [f64; 2] = [0.7, 0.3];
const SMART_METER_PROBABILITY: f64 = 0.88;
const RESIDENTIAL_SOLAR_PROBABILITY: f64 = 0.22;
const RESIDENTIAL_EV_WEIGHTS: [f64; 3] = [0.78, 0.18, 0.04];

const BUILD_YEAR_BANDS: &[&str] = &["pre-1980", "1980-1999", "2000-2014", "2015-2020", "2021+"];
const HEATING_SOURCES: &[&str] = &["electric", "gas", "heat_pump", "wood_pellets"];
const APPLIANCES: &[&str] = &["air_conditioning", "water_heater", "pool", "water_pump", "dryer"];

const RESIDENTIAL_FIRST_NAMES: &[&str] =
    &["Ana", "João", "Rita", "Tiago", "Inês", "Miguel", "Sofia", "Bruno"];
const RESIDENTIAL_LAST_NAMES: &[&str] =
    &["Silva", "Ferreira", "Santos", "Oliveira", "Costa", "Pereira", "Ribeiro"];
const SME_NAMES: &[&str] = &["Café", "Oficina", "Farmácia", "Padaria", "Lavandaria"];
const SME_SUFFIXES: &[&str] = &["Central", "do Bairro", "Alfa", "Norte", "Express"];
const INDUSTRIAL_NAMES: &[&str] =
    &["MetalNorte", "AgroVale", "TecFabril", "LogiPort", "QuimAtlantic"];

/// Deterministic population builder
pub struct PopulationGenerator {
    rng: StdRng,
}

impl PopulationGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate `count` validated customer profiles.
    pub fn generate(&mut self, count: usize) -> Result<Vec<CustomerProfile>, ProfileValidationError> {
        (0..count).map(|_| self.generate_one()).collect()
    }

    fn generate_one(&mut self) -> Result<CustomerProfile, ProfileValidationError> {
        let segment = self.pick_segment();
        let tariff = self.pick_tariff();
        let city = *CITIES.choose(&mut self.rng).expect("non-empty city list");
        let utility = *UTILITIES.choose(&mut self.rng).expect("non-empty utility list");

        let contracted_power_kva = *segment
            .power_steps_kva()
            .choose(&mut self.rng)
            .expect("non-empty power tier list");

        let price_eur_per_kwh = self
            .gauss(0.20, 0.03)
            .clamp(UNIT_PRICE_RANGE_EUR.0, UNIT_PRICE_RANGE_EUR.1);
        let fixed_daily_fee_eur = self
            .gauss(0.22, 0.09)
            .clamp(FIXED_FEE_RANGE_EUR.0, FIXED_FEE_RANGE_EUR.1);
        let has_smart_meter = self.rng.gen_bool(SMART_METER_PROBABILITY);

        let (home_area_m2, household_size, dwelling_type) = match segment {
            Segment::Residential => {
                let area = *[45.0, 70.0, 95.0, 130.0, 180.0]
                    .choose(&mut self.rng)
                    .expect("non-empty")
                    + self.rng.gen_range(-6.0..10.0);
                let weights = WeightedIndex::new([0.18, 0.34, 0.22, 0.16, 0.10])
                    .expect("valid household weights");
                let household = [1u32, 2, 3, 4, 5][weights.sample(&mut self.rng)];
                let dwelling = *[
                    DwellingType::Apartment,
                    DwellingType::DetachedHouse,
                    DwellingType::SemiDetachedHouse,
                ]
                .choose(&mut self.rng)
                .expect("non-empty");
                (area, household, dwelling)
            }
            Segment::Sme => {
                let area = *[120.0, 180.0, 260.0, 420.0]
                    .choose(&mut self.rng)
                    .expect("non-empty")
                    + self.rng.gen_range(-20.0..30.0);
                let household = *[3u32, 5, 8, 12].choose(&mut self.rng).expect("non-empty");
                (area, household, DwellingType::Commercial)
            }
            Segment::Industrial => {
                let area = *[800.0, 1500.0, 2600.0]
                    .choose(&mut self.rng)
                    .expect("non-empty")
                    + self.rng.gen_range(-120.0..180.0);
                let household = *[20u32, 35, 60].choose(&mut self.rng).expect("non-empty");
                (area, household, DwellingType::Industrial)
            }
        };

        let locality_type = *[LocalityType::Urban, LocalityType::Suburban, LocalityType::Rural]
            .choose(&mut self.rng)
            .expect("non-empty");
        let build_year_band = (*BUILD_YEAR_BANDS.choose(&mut self.rng).expect("non-empty")).to_string();

        let heating_count = *[1usize, 2].choose(&mut self.rng).expect("non-empty");
        let heating_sources: Vec<String> = HEATING_SOURCES
            .choose_multiple(&mut self.rng, heating_count)
            .map(|s| s.to_string())
            .collect();

        let has_solar =
            segment == Segment::Residential && self.rng.gen_bool(RESIDENTIAL_SOLAR_PROBABILITY);
        let ev_count = if segment == Segment::Residential {
            let weights = WeightedIndex::new(RESIDENTIAL_EV_WEIGHTS).expect("valid EV weights");
            [0u32, 1, 2][weights.sample(&mut self.rng)]
        } else {
            0
        };

        let alert_sensitivity = *[
            AlertSensitivity::Low,
            AlertSensitivity::Medium,
            AlertSensitivity::High,
        ]
        .choose(&mut self.rng)
        .expect("non-empty");

        let appliance_count = *[0usize, 1, 2, 3].choose(&mut self.rng).expect("non-empty");
        let main_appliances: Vec<String> = APPLIANCES
            .choose_multiple(&mut self.rng, appliance_count)
            .map(|s| s.to_string())
            .collect();

        let profile = CustomerProfile {
            id: self.customer_id(),
            name: self.customer_name(segment),
            segment,
            city: city.to_string(),
            contracted_power_kva,
            tariff,
            utility: utility.to_string(),
            price_eur_per_kwh,
            fixed_daily_fee_eur,
            has_smart_meter,
            home_area_m2,
            household_size,
            locality_type,
            dwelling_type,
            build_year_band,
            heating_sources,
            has_solar,
            ev_count,
            alert_sensitivity,
            main_appliances,
        };

        profile.validate()?;
        Ok(profile)
    }

    fn pick_segment(&mut self) -> Segment {
        let weights = WeightedIndex::new(SEGMENT_WEIGHTS).expect("valid segment weights");
        [Segment::Residential, Segment::Sme, Segment::Industrial][weights.sample(&mut self.rng)]
    }

    fn pick_tariff(&mut self) -> Tariff {
        let weights = WeightedIndex::new(TARIFF_WEIGHTS).expect("valid tariff weights");
        [Tariff::Flat, Tariff::TimeOfUse][weights.sample(&mut self.rng)]
    }

    fn gauss(&mut self, mean: f64, std: f64) -> f64 {
        Normal::new(mean, std)
            .expect("valid normal parameters")
            .sample(&mut self.rng)
    }

    fn customer_id(&mut self) -> String {
        let suffix: String = (0..8)
            .map(|_| (self.rng.sample(Alphanumeric) as char).to_ascii_uppercase())
            .collect();
        format!("C_{suffix}")
    }

    fn customer_name(&mut self, segment: Segment) -> String {
        match segment {
            Segment::Residential => format!(
                "{} {}",
                RESIDENTIAL_FIRST_NAMES.choose(&mut self.rng).expect("non-empty"),
                RESIDENTIAL_LAST_NAMES.choose(&mut self.rng).expect("non-empty"),
            ),
            Segment::Sme => format!(
                "{} {}",
                SME_NAMES.choose(&mut self.rng).expect("non-empty"),
                SME_SUFFIXES.choose(&mut self.rng).expect("non-empty"),
            ),
            Segment::Industrial => format!(
                "{} S.A.",
                INDUSTRIAL_NAMES.choose(&mut self.rng).expect("non-empty"),
            ),
        }
    }
}
