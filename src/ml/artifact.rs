//! Persisted model artifact
//!
//! JSON file exchanged with the inference consumer. The consumer
//! reproduces the feature ordering and the standardize/predict formula,
//! so the artifact carries the full schema: ordered feature names, the
//! training-set mean/std vectors, weights, bias and evaluation metrics.
//! Each training run overwrites the previous artifact.

use super::ridge::{EvalMetrics, FittedRidge};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Current artifact schema version.
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

/// Artifact persistence failures
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error(
        "inconsistent artifact vectors: {names} names, {mean} means, {std} stds, {weights} weights"
    )]
    InconsistentLengths {
        names: usize,
        mean: usize,
        std: usize,
        weights: usize,
    },

    #[error("artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialized trained model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub trained_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<u32>,
    pub l2: f64,
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    pub weights: Vec<f64>,
    pub bias: f64,
    pub metrics: EvalMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ModelArtifact {
    /// Assemble an artifact from a fitted model and its schema.
    pub fn from_fitted(
        model: &FittedRidge,
        feature_names: &[&str],
        metrics: EvalMetrics,
    ) -> Self {
        Self {
            version: ARTIFACT_SCHEMA_VERSION,
            trained_at: Utc::now(),
            interval_minutes: None,
            l2: model.l2,
            feature_names: feature_names.iter().map(|s| s.to_string()).collect(),
            mean: model.mean.clone(),
            std: model.std.clone(),
            weights: model.weights.clone(),
            bias: model.bias,
            metrics,
            notes: None,
        }
    }

    pub fn with_interval_minutes(mut self, minutes: u32) -> Self {
        self.interval_minutes = Some(minutes);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Enforce the length invariant across all per-feature vectors.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let names = self.feature_names.len();
        if self.mean.len() != names || self.std.len() != names || self.weights.len() != names {
            return Err(ArtifactError::InconsistentLengths {
                names,
                mean: self.mean.len(),
                std: self.std.len(),
                weights: self.weights.len(),
            });
        }
        Ok(())
    }

    /// Write the artifact as pretty JSON, replacing any prior file.
    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "model artifact written");
        Ok(())
    }

    /// Load and validate an artifact file.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let json = std::fs::read_to_string(path)?;
        let artifact: Self = serde_json::from_str(&json)?;
        artifact.validate()?;
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> FittedRidge {
        FittedRidge {
            weights: vec![0.5, -1.2],
            bias: 320.0,
            mean: vec![400.0, 12.5],
            std: vec![120.0, 3.4],
            l2: 2.0,
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let metrics = EvalMetrics { mae: 41.2, rmse: 58.9, r2: 0.87 };
        let artifact = ModelArtifact::from_fitted(&fitted(), &["last_watts", "temp_c"], metrics)
            .with_interval_minutes(15)
            .with_notes("synthetic ridge model");

        artifact.save(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();

        assert_eq!(loaded.version, ARTIFACT_SCHEMA_VERSION);
        assert_eq!(loaded.feature_names, vec!["last_watts", "temp_c"]);
        assert_eq!(loaded.weights, artifact.weights);
        assert_eq!(loaded.bias, artifact.bias);
        assert_eq!(loaded.interval_minutes, Some(15));
    }

    #[test]
    fn test_inconsistent_lengths_rejected() {
        let metrics = EvalMetrics { mae: 0.0, rmse: 0.0, r2: 0.0 };
        let mut artifact = ModelArtifact::from_fitted(&fitted(), &["last_watts", "temp_c"], metrics);
        artifact.weights.push(9.9);

        assert!(matches!(
            artifact.validate(),
            Err(ArtifactError::InconsistentLengths { .. })
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        assert!(artifact.save(&path).is_err());
        assert!(!path.exists(), "no partial artifact may be written");
    }

    #[test]
    fn test_overwrite_replaces_prior_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let metrics = EvalMetrics { mae: 1.0, rmse: 2.0, r2: 0.5 };

        let first = ModelArtifact::from_fitted(&fitted(), &["last_watts", "temp_c"], metrics);
        first.save(&path).unwrap();

        let mut second = first.clone();
        second.bias = 999.0;
        second.save(&path).unwrap();

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded.bias, 999.0);
    }
}
