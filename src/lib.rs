//! Synthetic electricity telemetry and contracted-power model training
//!
//! The crate simulates 15-minute smart-meter readings for a generated
//! customer population, persists them to SQLite, and trains two ridge
//! regression models on the stored history: a next-interval demand
//! forecaster and an ideal contracted-power estimator. The linear
//! algebra behind both models is implemented in [`ml::linalg`].

pub mod config;
pub mod database;
pub mod domain;
pub mod ml;
pub mod observability;
pub mod simulation;
pub mod training;
