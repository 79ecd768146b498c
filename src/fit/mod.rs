//! Model fitting orchestration.
//!
//! Responsibilities:
//!
//! - score fitted models (AIC / adjusted R²)
//! - grow the feature set greedily (forward selection)

pub mod scoring;
pub mod selection;

pub use scoring::*;
pub use selection::*;
