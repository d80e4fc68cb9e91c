use anyhow::Result;
use meterforge::config::Config;
use meterforge::database::Database;
use meterforge::ml::ModelArtifact;
use meterforge::observability;
use meterforge::simulation::{scheduler, PopulationGenerator, SimulationEngine};
use meterforge::training;
use std::path::Path;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    observability::init_tracing();

    let cfg = Config::load()?;
    let mode = std::env::args().nth(1).unwrap_or_else(|| "generate".to_string());

    let db = Database::connect(&cfg.db.url).await?;

    match mode.as_str() {
        "generate" => generate(&db, &cfg, false).await?,
        "watch" => generate(&db, &cfg, true).await?,
        "train" => {
            let artifact = training::next_step::train(
                &db,
                cfg.training.history_days,
                cfg.training.l2,
                cfg.training.seed,
            )
            .await?;
            save_artifact(&artifact, &cfg.artifacts.next_step_path)?;
        }
        "train-power" => {
            let artifact =
                training::power_sizing::train(&db, cfg.training.power_l2, cfg.training.seed)
                    .await?;
            save_artifact(&artifact, &cfg.artifacts.power_sizing_path)?;
        }
        other => anyhow::bail!("unknown mode '{other}', expected generate | train | train-power | watch"),
    }

    db.close().await;
    Ok(())
}

async fn generate(db: &Database, cfg: &Config, continuous: bool) -> Result<()> {
    if cfg.simulation.reset {
        warn!("reset requested, wiping customers and telemetry");
        db.telemetry().delete_all().await?;
        db.customers().delete_all().await?;
    }

    let customers = db.customers();
    let mut profiles = customers.load_all().await?;
    if profiles.is_empty() {
        profiles = PopulationGenerator::new(cfg.simulation.seed)
            .generate(cfg.simulation.customers)?;
        customers.insert_batch(&profiles).await?;
        info!(count = profiles.len(), "generated customer population");
    }

    let mut engine = SimulationEngine::new(cfg.simulation.seed);
    engine.warm_start(db.telemetry().latest_watts_by_customer().await?);

    scheduler::backfill(db, &mut engine, &profiles, cfg.simulation.backfill_days).await?;

    if continuous {
        tokio::select! {
            result = scheduler::run_continuous(db, &mut engine, &profiles) => result?,
            _ = observability::shutdown_signal() => info!("stopping continuous generation"),
        }
    }
    Ok(())
}

fn save_artifact(artifact: &ModelArtifact, path: &Path) -> Result<()> {
    artifact.save(path)?;
    info!(mae = artifact.metrics.mae, r2 = artifact.metrics.r2, "training complete");
    Ok(())
}
