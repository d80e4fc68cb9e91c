use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub db: DbConfig,
    pub simulation: SimulationConfig,
    pub training: TrainingConfig,
    pub artifacts: ArtifactsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig { pub url: String }

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    pub seed: u64,
    pub customers: usize,
    pub backfill_days: i64,
    /// Wipe customers and telemetry before generating.
    #[serde(default)]
    pub reset: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    pub seed: u64,
    pub l2: f64,
    pub power_l2: f64,
    pub history_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    pub next_step_path: PathBuf,
    pub power_sizing_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("METERFORGE__").split("__"));
        Ok(figment.extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [db]
        url = "sqlite://meterforge.db"

        [simulation]
        seed = 42
        customers = 200
        backfill_days = 30

        [training]
        seed = 42
        l2 = 1.0
        power_l2 = 1.0
        history_days = 30

        [artifacts]
        next_step_path = "artifacts/next_step.json"
        power_sizing_path = "artifacts/power_sizing.json"
    "#;

    #[test]
    fn test_full_file_parses() {
        let config: Config = Figment::new()
            .merge(Toml::string(SAMPLE))
            .extract()
            .expect("config parses");

        assert_eq!(config.simulation.customers, 200);
        assert_eq!(config.training.history_days, 30);
        assert_eq!(
            config.artifacts.next_step_path,
            PathBuf::from("artifacts/next_step.json")
        );
    }

    #[test]
    fn test_reset_defaults_to_false() {
        let config: Config = Figment::new()
            .merge(Toml::string(SAMPLE))
            .extract()
            .expect("config parses");
        assert!(!config.simulation.reset);
    }

    #[test]
    fn test_later_layer_wins() {
        let config: Config = Figment::new()
            .merge(Toml::string(SAMPLE))
            .merge(Toml::string("[simulation]\nseed = 7\ncustomers = 17\nbackfill_days = 2"))
            .extract()
            .expect("config parses");
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.customers, 17);
        assert_eq!(config.db.url, "sqlite://meterforge.db");
    }
}
