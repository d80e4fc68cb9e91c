//! Linear-model toolkit
//!
//! Everything the two training pipelines share: the dense matrix
//! kernel, the declared feature schemas, the ridge fit/evaluate core
//! and the persisted artifact format.

pub mod artifact;
pub mod features;
pub mod linalg;
pub mod ridge;

pub use artifact::{ArtifactError, ModelArtifact, ARTIFACT_SCHEMA_VERSION};
pub use features::{NEXT_STEP_FEATURE_NAMES, POWER_SIZING_FEATURE_NAMES};
pub use linalg::LinAlgError;
pub use ridge::{EvalMetrics, FittedRidge, RidgeError};
