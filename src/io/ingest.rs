//! CSV ingest.
//!
//! Turns a joined precinct CSV (election results + census covariates) into a
//! [`Dataset`]. No cleaning happens here: a malformed file is reported, not
//! repaired.
//!
//! - fields are trimmed; numeric fields become `Value::Field` and keep their text
//! - zero-padded codes (`01001`) stay `Value::Text`
//! - a UTF-8 BOM on the first header is stripped
//! - a row with the wrong number of fields is a schema error naming its line

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use log::{info, warn};

use crate::domain::{Dataset, Value};
use crate::error::{AppError, ModelError};

/// Load a CSV file into a dataset.
pub fn read_dataset_csv(path: &Path) -> Result<Dataset, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let dataset = parse_dataset_csv(file)
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))?;

    info!(
        "loaded {} rows x {} columns from {}",
        dataset.n_rows(),
        dataset.columns().len(),
        path.display()
    );
    Ok(dataset)
}

/// Parse CSV text from any reader into a dataset.
pub fn parse_dataset_csv<R: Read>(reader: R) -> Result<Dataset, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let columns = normalize_headers(&headers);

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header line and lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("CSV parse error on line {line}: {e}")))?;

        if record.len() != columns.len() {
            return Err(ModelError::schema(format!(
                "line {line} has {} fields but the header has {}",
                record.len(),
                columns.len()
            ))
            .into());
        }
        rows.push(record.iter().map(Value::parse).collect::<Vec<_>>());
    }

    if rows.is_empty() {
        return Err(ModelError::degenerate("CSV has a header but no data rows").into());
    }

    let blank_columns: Vec<&String> = columns
        .iter()
        .enumerate()
        .filter(|(j, _)| rows.iter().all(|row: &Vec<Value>| row[*j] == Value::Text(String::new())))
        .map(|(_, name)| name)
        .collect();
    if !blank_columns.is_empty() {
        warn!("columns with no values: {blank_columns:?}");
    }

    Dataset::new(columns, rows).map_err(AppError::from)
}

fn normalize_headers(headers: &StringRecord) -> Vec<String> {
    headers.iter().map(normalize_header_name).collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, column lookups fail on that name.
    name.trim().trim_start_matches('\u{feff}').to_string()
}
