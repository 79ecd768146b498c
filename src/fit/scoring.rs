//! Goodness-of-fit criteria.
//!
//! - AIC = n · ln(SSR / n) + 2k (lower is better)
//! - adjusted R² = 1 − (SSR / (n − 1)) / (SST / (n − k)) (higher is better)
//!
//! `k` counts every coefficient, intercept included.

use crate::domain::Criterion;
use crate::error::{ModelError, ModelResult};

/// SSR below this fraction of SST is floating-point residue of an exact fit.
const PERFECT_FIT_REL_TOL: f64 = 1e-20;

/// Sum of squared residuals.
pub fn ssr(y: &[f64], y_hat: &[f64]) -> f64 {
    y.iter().zip(y_hat).map(|(a, b)| (a - b) * (a - b)).sum()
}

/// Total sum of squares around the mean.
pub fn sst(y: &[f64]) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    let mean = y.iter().sum::<f64>() / y.len() as f64;
    y.iter().map(|v| (v - mean) * (v - mean)).sum()
}

// Scaled by the spread of `y`, not its level: an outcome sitting near 1e8
// still has to be matched to within its own variation.
fn is_perfect_fit(y: &[f64], ssr: f64) -> bool {
    ssr == 0.0 || ssr <= PERFECT_FIT_REL_TOL * sst(y)
}

/// Akaike information criterion.
///
/// A perfect fit scores `-∞`, the best value possible.
pub fn aic(y: &[f64], y_hat: &[f64], n: usize, k: usize) -> f64 {
    let ssr = ssr(y, y_hat);
    if is_perfect_fit(y, ssr) {
        return f64::NEG_INFINITY;
    }
    let n_f = n as f64;
    n_f * (ssr / n_f).ln() + 2.0 * k as f64
}

/// Adjusted R².
///
/// Fails with `DegenerateSample` when `n <= k` or the outcome has no variance.
pub fn adjusted_r2(y: &[f64], y_hat: &[f64], n: usize, k: usize) -> ModelResult<f64> {
    if n <= k {
        return Err(ModelError::degenerate(format!(
            "adjusted R2 needs more rows than coefficients (n={n}, k={k})"
        )));
    }
    let sst = sst(y);
    if sst == 0.0 {
        return Err(ModelError::degenerate("outcome has zero variance"));
    }
    let ssr = ssr(y, y_hat);
    let dof_n = (n - 1) as f64;
    let dof_d = (n - k) as f64;
    Ok(1.0 - (ssr / dof_n) / (sst / dof_d))
}

impl Criterion {
    /// Score a fitted model with `k` coefficients.
    pub fn score(self, y: &[f64], y_hat: &[f64], k: usize) -> ModelResult<f64> {
        if y.len() != y_hat.len() {
            return Err(ModelError::shape(
                format!("{} fitted values", y.len()),
                format!("{}", y_hat.len()),
            ));
        }
        let n = y.len();
        match self {
            Criterion::Aic => Ok(aic(y, y_hat, n, k)),
            Criterion::AdjustedR2 => adjusted_r2(y, y_hat, n, k),
        }
    }

    /// Sentinel that any finite score improves on.
    pub fn initial(self) -> f64 {
        match self {
            Criterion::Aic => f64::INFINITY,
            Criterion::AdjustedR2 => f64::NEG_INFINITY,
        }
    }

    /// Whether `candidate` is strictly better than `incumbent`.
    pub fn improves(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Criterion::Aic => candidate < incumbent,
            Criterion::AdjustedR2 => candidate > incumbent,
        }
    }
}
