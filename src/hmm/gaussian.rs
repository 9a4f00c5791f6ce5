//! Diagonal-covariance Gaussian emission distributions.
//!
//! Each hidden state emits frames from an axis-aligned Gaussian. Diagonal
//! covariance keeps the free-parameter count linear in the feature
//! dimensionality and makes the log-density a cheap per-dimension sum.
//!
//! Numerical notes:
//! - variances are floored at `MIN_VAR` so a state that captures
//!   near-constant frames cannot drive the log-density to +inf;
//! - the log-normalizer is cached at construction since it only depends on
//!   the variances.

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};

/// Variance floor applied during construction and re-estimation.
pub const MIN_VAR: f64 = 1e-3;

/// A single state's emission distribution.
#[derive(Debug, Clone)]
pub struct DiagGaussian {
    mean: DVector<f64>,
    var: DVector<f64>,
    /// `-0.5 * Σ_d ln(2π var_d)`, cached.
    log_norm: f64,
}

impl DiagGaussian {
    /// Build from a mean vector and per-dimension variances (floored).
    ///
    /// # Panics
    /// Panics if `mean` and `var` have different lengths. Callers construct
    /// both from the same frame matrix, so a mismatch is a programming error.
    pub fn new(mean: DVector<f64>, var: DVector<f64>) -> Self {
        assert_eq!(mean.len(), var.len(), "mean/var dimensionality mismatch");
        let var = var.map(|v| v.max(MIN_VAR));
        let log_norm = -0.5 * var.iter().map(|&v| (2.0 * PI * v).ln()).sum::<f64>();
        Self {
            mean,
            var,
            log_norm,
        }
    }

    /// Feature dimensionality.
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    pub fn var(&self) -> &DVector<f64> {
        &self.var
    }

    /// Log-density of frame `t` of `frames` (rows are frames).
    pub fn log_pdf_frame(&self, frames: &DMatrix<f64>, t: usize) -> f64 {
        let mut quad = 0.0;
        for d in 0..self.mean.len() {
            let diff = frames[(t, d)] - self.mean[d];
            quad += diff * diff / self.var[d];
        }
        self.log_norm - 0.5 * quad
    }

    /// Re-estimate from weighted frames.
    ///
    /// Returns `None` when the total weight is numerically zero: the state
    /// received no posterior mass and cannot be re-estimated.
    pub fn from_weighted(frames: &DMatrix<f64>, weights: &DVector<f64>) -> Option<Self> {
        let n = frames.nrows();
        let d = frames.ncols();
        debug_assert_eq!(weights.len(), n);

        let total: f64 = weights.iter().sum();
        if !(total.is_finite() && total > 1e-10) {
            return None;
        }

        let mut mean = DVector::zeros(d);
        for t in 0..n {
            let w = weights[t];
            for j in 0..d {
                mean[j] += w * frames[(t, j)];
            }
        }
        mean /= total;

        let mut var = DVector::zeros(d);
        for t in 0..n {
            let w = weights[t];
            for j in 0..d {
                let diff = frames[(t, j)] - mean[j];
                var[j] += w * diff * diff;
            }
        }
        var /= total;

        Some(Self::new(mean, var))
    }
}
