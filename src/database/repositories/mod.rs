//! Repository pattern implementations for the telemetry store
//!
//! - Customers: wide profile rows, written once at population time
//! - Telemetry: append-only 15-minute facts with windowed statistics

pub mod customers;
pub mod telemetry;

pub use customers::CustomerRepository;
pub use telemetry::{SeriesPoint, TelemetryRepository, WindowStats};
