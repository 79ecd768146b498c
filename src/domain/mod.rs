//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the tabular input (`Dataset`, `Value`)
//! - selection settings (`Criterion`, `RankPolicy`, `SelectionConfig`)
//! - fit outputs (`FittedModel`, `SelectionStep`, `DistrictPrediction`)

pub mod types;

pub use types::*;
