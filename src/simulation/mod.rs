//! Customer demand simulation
//!
//! - `weather`: seasonal ambient temperature model
//! - `population`: random customer profile generation
//! - `engine`: per-tick reading synthesis
//! - `scheduler`: batch backfill and the continuous 15-minute loop

pub mod engine;
pub mod population;
pub mod scheduler;
pub mod weather;

pub use engine::{SimulatedSample, SimulationEngine};
pub use population::PopulationGenerator;
