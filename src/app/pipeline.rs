//! Shared selection/scoring pipeline used by the CLI subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> candidate pool -> forward selection -> model JSON -> map scoring
//!
//! The front-end can then focus on presentation.

use std::path::{Path, PathBuf};

use log::info;

use crate::domain::{Dataset, DistrictPrediction, FittedModel, SelectionConfig};
use crate::error::AppError;
use crate::fit::selection::{SelectionOutcome, forward_select};
use crate::io::{
    PREDICTION_COLUMN, read_dataset_csv, write_district_csv, write_model_json, write_predictions_csv,
};
use crate::report::{aggregate_by_district, score_dataset};

/// Resolved settings for `turnout select`.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data: PathBuf,
    pub outcome: String,
    /// Explicit candidate pool; empty means "every numeric column".
    pub features: Vec<String>,
    pub exclude: Vec<String>,
    pub selection: SelectionConfig,
    pub save_model: Option<PathBuf>,
    pub maps: MapConfig,
}

/// Which maps to score and how.
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    pub dir: Option<PathBuf>,
    pub names: Vec<String>,
    pub district_column: Option<String>,
    pub weight_column: Option<String>,
}

/// Scored output for one proposed map.
#[derive(Debug, Clone)]
pub struct MapOutput {
    pub name: String,
    pub results_path: PathBuf,
    pub districts: Option<Vec<DistrictPrediction>>,
}

/// All computed outputs of a single `turnout select` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub selection: SelectionOutcome,
    pub maps: Vec<MapOutput>,
}

/// Execute selection on the configured dataset, then save and score.
pub fn run_selection(config: &RunConfig) -> Result<RunOutput, AppError> {
    let dataset = read_dataset_csv(&config.data)?;
    run_selection_on(&dataset, config)
}

/// Same as [`run_selection`] with an already loaded dataset.
pub fn run_selection_on(dataset: &Dataset, config: &RunConfig) -> Result<RunOutput, AppError> {
    let candidates = resolve_candidates(dataset, &config.outcome, &config.features, &config.exclude)?;
    let selection = forward_select(dataset, &config.outcome, &candidates, &config.selection)?;

    if let Some(path) = &config.save_model {
        write_model_json(path, &selection.model)?;
    }

    let maps = score_maps(&selection.model, &config.maps)?;
    Ok(RunOutput { selection, maps })
}

/// Build the candidate pool.
///
/// An explicit list is used as given (validation happens in selection) and
/// cannot be combined with `exclude`. Otherwise every numeric column except the
/// outcome and `exclude` is a candidate.
pub fn resolve_candidates(
    dataset: &Dataset,
    outcome: &str,
    features: &[String],
    exclude: &[String],
) -> Result<Vec<String>, AppError> {
    if !features.is_empty() {
        if !exclude.is_empty() {
            return Err(AppError::new(
                2,
                "--exclude only applies to the default candidate pool; drop it or drop --features.",
            ));
        }
        return Ok(features.to_vec());
    }

    if let Some(missing) = exclude.iter().find(|c| !dataset.has_column(c)) {
        return Err(AppError::new(2, format!("Excluded column '{missing}' not found in dataset.")));
    }

    let candidates: Vec<String> = dataset
        .numeric_column_names()
        .into_iter()
        .filter(|c| c != outcome && !exclude.contains(c))
        .collect();

    if candidates.is_empty() {
        return Err(AppError::new(2, "No numeric candidate columns found in dataset."));
    }
    info!("candidate pool: {} numeric columns", candidates.len());
    Ok(candidates)
}

/// Score every configured map with `model` and write the result files.
pub fn score_maps(model: &FittedModel, maps: &MapConfig) -> Result<Vec<MapOutput>, AppError> {
    if maps.names.is_empty() {
        return Ok(Vec::new());
    }
    let Some(dir) = &maps.dir else {
        return Err(AppError::new(2, "Scoring maps requires --maps-dir."));
    };

    maps.names
        .iter()
        .map(|name| score_map(model, dir, name, maps))
        .collect()
}

fn score_map(model: &FittedModel, dir: &Path, name: &str, maps: &MapConfig) -> Result<MapOutput, AppError> {
    let dataset = read_dataset_csv(&dir.join(format!("{name}.csv")))?;
    let predictions = score_dataset(model, &dataset)?;

    let results_path = dir.join(format!("{name}_results.csv"));
    write_predictions_csv(&results_path, &dataset, &predictions, PREDICTION_COLUMN)?;
    info!("map {name}: scored {} precincts -> {}", predictions.len(), results_path.display());

    let districts = match &maps.district_column {
        Some(column) => {
            let rows = aggregate_by_district(&dataset, &predictions, column, maps.weight_column.as_deref())?;
            write_district_csv(&dir.join(format!("{name}_districts.csv")), &rows)?;
            Some(rows)
        }
        None => None,
    };

    Ok(MapOutput {
        name: name.to_string(),
        results_path,
        districts,
    })
}
