//! Read/write fitted model JSON files.
//!
//! Model JSON is the portable representation of a selection run:
//! - outcome column and criterion
//! - selected features, in selection order
//! - coefficients (slopes, then intercept)
//!
//! The schema is defined by `domain::FittedModel`.

use std::fs::File;
use std::path::Path;

use log::info;

use crate::domain::FittedModel;
use crate::error::AppError;

/// Write a model JSON file.
pub fn write_model_json(path: &Path, model: &FittedModel) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create model JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, model)
        .map_err(|e| AppError::new(2, format!("Failed to write model JSON: {e}")))?;

    info!("wrote model ({} features) to {}", model.features.len(), path.display());
    Ok(())
}

/// Read a model JSON file.
pub fn read_model_json(path: &Path) -> Result<FittedModel, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let model: FittedModel =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid model JSON: {e}")))?;

    if model.coefficients.len() != model.features.len() + 1 {
        return Err(AppError::new(
            2,
            format!(
                "Invalid model JSON: {} coefficients for {} features (expected features + intercept)",
                model.coefficients.len(),
                model.features.len()
            ),
        ));
    }
    Ok(model)
}
