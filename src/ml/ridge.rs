//! Ridge regression on standardized features
//!
//! Closed-form fit via the normal equations: z-score the design
//! matrix, centre the target, add the L2 penalty to the Gram diagonal
//! and solve with the Gauss-Jordan kernel. The standardization vectors
//! are part of the fitted model and must be reused verbatim at
//! inference time.

use super::linalg::{self, LinAlgError};
use serde::{Deserialize, Serialize};

/// Standard deviations below this are treated as constant features.
const STD_FLOOR_EPSILON: f64 = 1e-9;

/// Ridge fitting failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum RidgeError {
    #[error("empty training matrix")]
    EmptyDesignMatrix,

    #[error("feature/target count mismatch: {rows} rows, {targets} targets")]
    DimensionMismatch { rows: usize, targets: usize },

    #[error(transparent)]
    Singular(#[from] LinAlgError),
}

/// Per-feature standardization statistics plus the z-scored matrix.
pub struct Standardized {
    pub matrix: Vec<Vec<f64>>,
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

/// Z-score a design matrix column-wise.
///
/// Sample standard deviation uses Bessel's correction with a minimum
/// denominator of 1; a near-zero deviation is floored to 1.0 so a
/// constant feature standardizes to zero instead of blowing up.
pub fn standardize(x: &[Vec<f64>]) -> Standardized {
    let n = x.len();
    let d = x.first().map_or(0, |row| row.len());

    let mut mean = vec![0.0; d];
    for row in x {
        for (j, &v) in row.iter().enumerate() {
            mean[j] += v;
        }
    }
    for m in mean.iter_mut() {
        *m /= n as f64;
    }

    let mut std = vec![0.0; d];
    for row in x {
        for (j, &v) in row.iter().enumerate() {
            std[j] += (v - mean[j]).powi(2);
        }
    }
    let denom = (n.saturating_sub(1)).max(1) as f64;
    for s in std.iter_mut() {
        *s = (*s / denom).sqrt();
        if *s < STD_FLOOR_EPSILON {
            *s = 1.0;
        }
    }

    let matrix = x
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(j, &v)| (v - mean[j]) / std[j])
                .collect()
        })
        .collect();

    Standardized { matrix, mean, std }
}

/// Undo standardization; inverse of [`standardize`] for a given model.
pub fn destandardize(z: &[Vec<f64>], mean: &[f64], std: &[f64]) -> Vec<Vec<f64>> {
    z.iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(j, &v)| v * std[j] + mean[j])
                .collect()
        })
        .collect()
}

/// A fitted ridge model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedRidge {
    pub weights: Vec<f64>,
    pub bias: f64,
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    pub l2: f64,
}

impl FittedRidge {
    /// Score one raw (unstandardized) feature vector.
    pub fn predict(&self, x: &[f64]) -> f64 {
        let z: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(j, &v)| (v - self.mean[j]) / self.std[j])
            .collect();
        linalg::dot(&z, &self.weights) + self.bias
    }
}

/// Fit ridge regression with regularization strength `l2`.
///
/// The target is centred by its mean, which becomes the bias: with
/// z-scored features the columns have (approximately) zero mean, so the
/// optimal intercept reduces exactly to the target mean.
pub fn fit(x: &[Vec<f64>], y: &[f64], l2: f64) -> Result<FittedRidge, RidgeError> {
    if x.is_empty() {
        return Err(RidgeError::EmptyDesignMatrix);
    }
    if x.len() != y.len() {
        return Err(RidgeError::DimensionMismatch {
            rows: x.len(),
            targets: y.len(),
        });
    }

    let Standardized { matrix: xz, mean, std } = standardize(x);
    let d = xz[0].len();

    let y_mean = y.iter().sum::<f64>() / y.len() as f64;
    let y_centered: Vec<f64> = y.iter().map(|v| v - y_mean).collect();

    let xt = linalg::transpose(&xz);
    let mut xtx = linalg::mat_mul(&xt, &xz);
    for (j, row) in xtx.iter_mut().enumerate().take(d) {
        row[j] += l2;
    }

    let xty = linalg::mat_vec_mul(&xt, &y_centered);
    let inv = linalg::invert(&xtx)?;
    let weights = linalg::mat_vec_mul(&inv, &xty);

    Ok(FittedRidge {
        weights,
        bias: y_mean,
        mean,
        std,
        l2,
    })
}

/// Evaluation metrics of a fitted model on held-out data
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

/// MAE, RMSE and R² over paired true/predicted values.
///
/// R² is defined as 0 when the target variance is numerically zero
/// (degenerate constant target) instead of dividing by zero.
pub fn evaluate(y_true: &[f64], y_pred: &[f64]) -> EvalMetrics {
    let n = y_true.len() as f64;

    let mae = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / n;

    let mse = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / n;
    let rmse = mse.sqrt();

    let y_mean = y_true.iter().sum::<f64>() / n;
    let ss_tot: f64 = y_true.iter().map(|t| (t - y_mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    let r2 = if ss_tot > 1e-12 {
        1.0 - ss_res / ss_tot
    } else {
        0.0
    };

    EvalMetrics { mae, rmse, r2 }
}
