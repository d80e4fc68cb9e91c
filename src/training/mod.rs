//! Model training pipelines
//!
//! Both pipelines share the dataset plumbing here: assemble rows from
//! the telemetry store, shuffle with a seeded RNG, split 80/20, fit a
//! ridge model and score it on the held-out part. They differ only in
//! how rows and targets are derived.

pub mod next_step;
pub mod power_sizing;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Fraction of rows used for fitting; the rest scores the model.
pub const TRAIN_FRACTION: f64 = 0.8;

/// Training data below a pipeline's minimum is terminal. No partial
/// artifact is written.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("insufficient training data: have {got} {unit}, need at least {needed}")]
    InsufficientData {
        needed: usize,
        got: usize,
        unit: &'static str,
    },
}

/// Feature rows paired with their targets.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl Dataset {
    pub fn push(&mut self, row: Vec<f64>, target: f64) {
        self.features.push(row);
        self.targets.push(target);
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Seeded shuffle followed by an 80/20 split.
    pub fn shuffled_split(self, seed: u64) -> (Dataset, Dataset) {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let cut = (self.len() as f64 * TRAIN_FRACTION) as usize;
        let mut train = Dataset::default();
        let mut test = Dataset::default();

        for (position, &index) in indices.iter().enumerate() {
            let row = self.features[index].clone();
            let target = self.targets[index];
            if position < cut {
                train.push(row, target);
            } else {
                test.push(row, target);
            }
        }
        (train, test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n: usize) -> Dataset {
        let mut data = Dataset::default();
        for i in 0..n {
            data.push(vec![i as f64, (i * 2) as f64], i as f64);
        }
        data
    }

    #[test]
    fn test_split_sizes() {
        let (train, test) = dataset(100).shuffled_split(42);
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
    }

    #[test]
    fn test_split_preserves_all_rows() {
        let (train, test) = dataset(50).shuffled_split(7);
        let mut targets: Vec<f64> = train.targets.iter().chain(&test.targets).copied().collect();
        targets.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let expected: Vec<f64> = (0..50).map(|i| i as f64).collect();
        assert_eq!(targets, expected);
    }

    #[test]
    fn test_split_is_deterministic() {
        let (train_a, _) = dataset(40).shuffled_split(9);
        let (train_b, _) = dataset(40).shuffled_split(9);
        assert_eq!(train_a.targets, train_b.targets);
    }

    #[test]
    fn test_split_actually_shuffles() {
        let (train, _) = dataset(100).shuffled_split(42);
        let in_order: Vec<f64> = (0..80).map(|i| i as f64).collect();
        assert_ne!(train.targets, in_order);
    }
}
