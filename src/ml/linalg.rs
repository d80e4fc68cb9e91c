//! Dense matrix primitives
//!
//! Hand-rolled kernel backing the ridge trainer: transpose, products,
//! identity, and Gauss-Jordan inversion with partial pivoting. Matrices
//! are row-major `Vec<Vec<f64>>`; dimensions stay small (feature count
//! squared) so the cubic inversion cost is irrelevant in practice.

/// Pivot magnitudes below this are treated as zero; the system is not
/// invertible at working precision.
pub const SINGULARITY_EPSILON: f64 = 1e-12;

/// Linear-algebra failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum LinAlgError {
    #[error(
        "matrix is singular or ill-conditioned (pivot below {SINGULARITY_EPSILON:e}); \
         usually too few samples relative to feature count, or exactly collinear features"
    )]
    Singular,
}

/// Dot product of two equally sized slices.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Transpose a rectangular matrix.
pub fn transpose(m: &[Vec<f64>]) -> Vec<Vec<f64>> {
    if m.is_empty() {
        return Vec::new();
    }
    let rows = m.len();
    let cols = m[0].len();
    let mut out = vec![vec![0.0; rows]; cols];
    for (i, row) in m.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            out[j][i] = v;
        }
    }
    out
}

/// Matrix-matrix product, computed as dot products against the columns
/// of the transposed right operand.
pub fn mat_mul(a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let bt = transpose(b);
    a.iter()
        .map(|row| bt.iter().map(|col| dot(row, col)).collect())
        .collect()
}

/// Matrix-vector product.
pub fn mat_vec_mul(a: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    a.iter().map(|row| dot(row, v)).collect()
}

/// n×n identity matrix.
pub fn identity(n: usize) -> Vec<Vec<f64>> {
    let mut m = vec![vec![0.0; n]; n];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    m
}

/// Invert a square matrix by Gauss-Jordan elimination.
///
/// For each column the row with the largest absolute value (from the
/// current index down) is swapped into pivot position; the augmented
/// `[A | I]` block is reduced until the right half holds the inverse.
pub fn invert(a: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, LinAlgError> {
    let n = a.len();
    let mut aug: Vec<Vec<f64>> = a
        .iter()
        .zip(identity(n))
        .map(|(row, ident_row)| {
            let mut r = row.clone();
            r.extend(ident_row);
            r
        })
        .collect();

    for col in 0..n {
        let mut pivot = col;
        for r in (col + 1)..n {
            if aug[r][col].abs() > aug[pivot][col].abs() {
                pivot = r;
            }
        }
        if aug[pivot][col].abs() < SINGULARITY_EPSILON {
            return Err(LinAlgError::Singular);
        }
        if pivot != col {
            aug.swap(pivot, col);
        }

        let inv_pv = 1.0 / aug[col][col];
        for v in aug[col].iter_mut() {
            *v *= inv_pv;
        }

        for r in 0..n {
            if r == col {
                continue;
            }
            let factor = aug[r][col];
            if factor.abs() < SINGULARITY_EPSILON {
                continue;
            }
            for c in 0..2 * n {
                aug[r][c] -= factor * aug[col][c];
            }
        }
    }

    Ok(aug.into_iter().map(|row| row[n..].to_vec()).collect())
}
