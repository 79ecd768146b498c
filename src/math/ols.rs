//! Ordinary least squares solver.
//!
//! Forward selection solves many small regression problems of the form:
//!
//! ```text
//! minimize ‖Xβ − y‖²
//! ```
//!
//! one per candidate feature subset.
//!
//! Implementation choices:
//! - We solve through an SVD rather than the normal equations, so nearly
//!   collinear covariates (e.g. population shares that sum to ~1) do not blow up.
//! - Singular values below `max(n, p) · ε · σ_max` count as zero, which yields
//!   the minimum-norm solution for rank-deficient designs.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)

use nalgebra::{DMatrix, DVector};

use crate::domain::RankPolicy;
use crate::error::{ModelError, ModelResult};

/// Solve a least squares problem using SVD.
///
/// Fails with `SingularDesign` when no singular value survives the cutoff, when
/// the solution is not finite, or (under [`RankPolicy::Strict`]) when the
/// design is rank deficient.
pub fn solve_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    policy: RankPolicy,
) -> ModelResult<DVector<f64>> {
    solve_with_rank(x, y, policy).map(|(beta, _)| beta)
}

/// Same as [`solve_least_squares`], also returning the numerical rank of `x`.
pub fn solve_with_rank(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    policy: RankPolicy,
) -> ModelResult<(DVector<f64>, usize)> {
    if x.nrows() != y.len() {
        return Err(ModelError::shape(
            format!("{} target values", x.nrows()),
            format!("{}", y.len()),
        ));
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ModelError::singular(format!(
            "empty design matrix ({}x{})",
            x.nrows(),
            x.ncols()
        )));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(ModelError::singular("design or target holds non-finite values"));
    }

    let svd = x.clone().svd(true, true);
    let sigma_max = svd.singular_values.max();
    let cutoff = x.nrows().max(x.ncols()) as f64 * f64::EPSILON * sigma_max;
    let rank = svd.singular_values.iter().filter(|&&s| s > cutoff).count();

    if rank == 0 {
        return Err(ModelError::singular("design matrix has numerical rank 0"));
    }
    if policy == RankPolicy::Strict && rank < x.ncols() {
        return Err(ModelError::singular(format!(
            "design matrix has rank {rank} < {} columns",
            x.ncols()
        )));
    }

    let beta = svd.solve(y, cutoff).map_err(ModelError::singular)?;
    if !beta.iter().all(|v| v.is_finite()) {
        return Err(ModelError::singular("least squares produced non-finite coefficients"));
    }

    Ok((beta, rank))
}

/// Fit OLS coefficients for a design matrix (intercept column included by the caller).
pub fn fit(x: &DMatrix<f64>, y: &DVector<f64>, policy: RankPolicy) -> ModelResult<DVector<f64>> {
    solve_least_squares(x, y, policy)
}

/// Fitted values `X·β`.
pub fn predict(beta: &DVector<f64>, x: &DMatrix<f64>) -> ModelResult<DVector<f64>> {
    if x.ncols() != beta.len() {
        return Err(ModelError::shape(
            format!("{} design columns", beta.len()),
            format!("{}", x.ncols()),
        ));
    }
    Ok(x * beta)
}
