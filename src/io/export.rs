//! Export predictions to CSV.
//!
//! Two shapes are written per proposed map:
//! - per precinct: the input columns plus the predicted turnout
//! - per district: precinct count, weight and mean predicted turnout

use std::fs::File;
use std::path::Path;

use crate::domain::{Dataset, DistrictPrediction};
use crate::error::AppError;

/// Name of the column appended to precinct-level outputs.
pub const PREDICTION_COLUMN: &str = "predicted_turnout";

/// Write the dataset with one extra prediction column.
pub fn write_predictions_csv(
    path: &Path,
    dataset: &Dataset,
    predictions: &[f64],
    column_name: &str,
) -> Result<(), AppError> {
    if predictions.len() != dataset.n_rows() {
        return Err(AppError::new(
            4,
            format!(
                "Prediction count ({}) != dataset rows ({})",
                predictions.len(),
                dataset.n_rows()
            ),
        ));
    }

    let mut writer = csv_writer(path)?;

    let mut header: Vec<&str> = dataset.columns().iter().map(String::as_str).collect();
    header.push(column_name);
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for (row, y_hat) in dataset.rows().iter().zip(predictions) {
        let mut record: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        record.push(format!("{y_hat:.6}"));
        writer
            .write_record(&record)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush '{}': {e}", path.display())))
}

/// Write the dataset as-is (header row, then one record per row).
pub fn write_dataset_csv(path: &Path, dataset: &Dataset) -> Result<(), AppError> {
    let mut writer = csv_writer(path)?;

    writer
        .write_record(dataset.columns())
        .map_err(|e| AppError::new(2, format!("Failed to write dataset CSV header: {e}")))?;

    for row in dataset.rows() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(|e| AppError::new(2, format!("Failed to write dataset CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush '{}': {e}", path.display())))
}

/// Write per-district aggregates.
pub fn write_district_csv(path: &Path, rows: &[DistrictPrediction]) -> Result<(), AppError> {
    let mut writer = csv_writer(path)?;

    writer
        .write_record(["district", "precincts", "weight", PREDICTION_COLUMN])
        .map_err(|e| AppError::new(2, format!("Failed to write district CSV header: {e}")))?;

    for r in rows {
        writer
            .write_record([
                r.district.clone(),
                r.precincts.to_string(),
                format!("{:.4}", r.weight),
                format!("{:.6}", r.predicted),
            ])
            .map_err(|e| AppError::new(2, format!("Failed to write district CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush '{}': {e}", path.display())))
}

fn csv_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    Ok(csv::Writer::from_writer(file))
}
