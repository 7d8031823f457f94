//! Dense linear system solver
//!
//! Gaussian elimination with partial pivoting on a row-major augmented
//! matrix of shape `n × (n + 1)`, the last column holding the right-hand side.

use crate::error::SolveError;

/// Pivots (and leading coefficients) below this magnitude are treated as zero.
pub const SINGULAR_TOLERANCE: f64 = 1e-5;

/// Solve `A·x = b` in place.
///
/// `augmented` is destroyed. On error `x` must not be read: it may hold
/// partially written values.
///
/// # Arguments
/// * `augmented` - Row-major `n × (n + 1)` matrix, `b` in the last column
/// * `n` - Number of unknowns
/// * `x` - Output solution, length `n`
pub fn solve(augmented: &mut [f64], n: usize, x: &mut [f64]) -> Result<(), SolveError> {
    if n == 0 {
        return Err(SolveError::Empty);
    }
    let cols = n + 1;
    if augmented.len() != n * cols {
        return Err(SolveError::Shape {
            expected: n * cols,
            actual: augmented.len(),
        });
    }
    if x.len() != n {
        return Err(SolveError::Shape {
            expected: n,
            actual: x.len(),
        });
    }

    for k in 0..n {
        let mut pivot_row = k;
        let mut max = augmented[k * cols + k].abs();
        for i in (k + 1)..n {
            let t = augmented[i * cols + k].abs();
            if t > max {
                max = t;
                pivot_row = i;
            }
        }
        if max < SINGULAR_TOLERANCE {
            return Err(SolveError::Singular { column: k });
        }

        if pivot_row != k {
            for j in 0..cols {
                augmented.swap(k * cols + j, pivot_row * cols + j);
            }
        }

        for i in k..n {
            let lead = augmented[i * cols + k];
            if lead.abs() < SINGULAR_TOLERANCE {
                continue;
            }
            for j in 0..cols {
                augmented[i * cols + j] /= lead;
            }
            if i != k {
                for j in 0..cols {
                    let pivot = augmented[k * cols + j];
                    augmented[i * cols + j] -= pivot;
                }
            }
        }
    }

    for k in (0..n).rev() {
        x[k] = augmented[k * cols + n];
        for i in 0..k {
            let coeff = augmented[i * cols + k];
            augmented[i * cols + n] -= coeff * x[k];
        }
    }

    Ok(())
}
