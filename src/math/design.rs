//! Design matrix construction.
//!
//! Columns follow the feature order; the intercept (a constant 1.0) is always
//! the last column, so a coefficient vector reads `[slopes..., intercept]`.

use nalgebra::{DMatrix, DVector};

use crate::domain::Dataset;
use crate::error::ModelResult;

/// Build the `(n_rows, k + 1)` design matrix for `features`.
///
/// Fails with a `Schema` error if a feature is missing or holds a value that
/// is not a finite number.
pub fn build_design_matrix<S: AsRef<str>>(dataset: &Dataset, features: &[S]) -> ModelResult<DMatrix<f64>> {
    let n = dataset.n_rows();
    let k = features.len();

    let mut x = DMatrix::from_element(n, k + 1, 1.0);
    for (j, feature) in features.iter().enumerate() {
        let values = dataset.numeric_column(feature.as_ref())?;
        x.set_column(j, &DVector::from_vec(values));
    }
    Ok(x)
}

/// Outcome column as a target vector, in dataset row order.
pub fn target_vector(dataset: &Dataset, outcome: &str) -> ModelResult<DVector<f64>> {
    Ok(DVector::from_vec(dataset.numeric_column(outcome)?))
}
