//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - built by the CSV ingest or the synthetic generator
//! - consumed read-only by the regression core
//! - exported to JSON/CSV after a run

use std::collections::HashMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// A single cell of a [`Dataset`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A computed number (synthetic data, predictions).
    Number(f64),
    /// A numeric field read from a file, kept with its text so it is written
    /// back unchanged.
    Field { value: f64, raw: String },
    Text(String),
}

impl Value {
    /// Parse a raw CSV field.
    ///
    /// Numbers become `Field`. Codes with a leading zero (`01001`, a FIPS
    /// prefix) and everything non-numeric stay `Text`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if is_zero_padded_code(trimmed) {
            return Value::Text(trimmed.to_string());
        }
        match trimmed.parse::<f64>() {
            Ok(value) => Value::Field {
                value,
                raw: trimmed.to_string(),
            },
            Err(_) => Value::Text(trimmed.to_string()),
        }
    }

    /// Coerce to a finite real number, if possible.
    ///
    /// `Text` is parsed on demand, so an explicitly requested column of codes
    /// can still be used as a regressor.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Value::Number(v) | Value::Field { value: v, .. } => *v,
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        v.is_finite().then_some(v)
    }

    /// Whether the cell holds a finite number (not text that happens to parse).
    pub fn is_numeric(&self) -> bool {
        match self {
            Value::Number(v) | Value::Field { value: v, .. } => v.is_finite(),
            Value::Text(_) => false,
        }
    }
}

fn is_zero_padded_code(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('0') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{v}"),
            Value::Field { raw, .. } => write!(f, "{raw}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// Tabular precinct-level data: an ordered list of rows sharing one header.
///
/// The regression core only ever borrows a `Dataset`; nothing in the crate
/// mutates one after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset, checking that every row has one value per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> ModelResult<Self> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(ModelError::schema(format!("duplicate column '{name}'")));
            }
        }
        for (r, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(ModelError::schema(format!(
                    "row {} has {} values but the header has {} columns",
                    r + 1,
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self { columns, index, rows })
    }

    /// Convenience constructor for all-numeric data given column-wise.
    pub fn from_numeric_columns(columns: &[(&str, Vec<f64>)]) -> ModelResult<Self> {
        let n = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        if let Some((name, v)) = columns.iter().find(|(_, v)| v.len() != n) {
            return Err(ModelError::shape(
                format!("{n} values in column '{name}'"),
                format!("{}", v.len()),
            ));
        }
        let names = columns.iter().map(|(name, _)| name.to_string()).collect();
        let rows = (0..n)
            .map(|r| columns.iter().map(|(_, v)| Value::Number(v[r])).collect())
            .collect();
        Self::new(names, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Position of a column, or a `Schema` error naming it.
    pub fn column_index(&self, name: &str) -> ModelResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::schema(format!("column '{name}' not found in dataset")))
    }

    /// Values of one column coerced to finite `f64`, in row order.
    pub fn numeric_column(&self, name: &str) -> ModelResult<Vec<f64>> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row[idx].as_f64().ok_or_else(|| {
                    ModelError::schema(format!(
                        "column '{name}' row {}: '{}' is not a finite number",
                        r + 1,
                        row[idx]
                    ))
                })
            })
            .collect()
    }

    /// Columns whose every cell is numeric, in header order.
    ///
    /// `Text` cells disqualify a column even when they would coerce, which keeps
    /// identifier columns (e.g. `GEOID20`) out of default candidate pools.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.rows.iter().all(|row| row[*idx].is_numeric()))
            .map(|(_, name)| name.clone())
            .collect()
    }
}

/// Which criterion drives forward selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Criterion {
    /// Akaike information criterion (lower is better).
    Aic,
    /// Adjusted R² (higher is better).
    AdjustedR2,
}

impl Criterion {
    pub fn display_name(self) -> &'static str {
        match self {
            Criterion::Aic => "AIC",
            Criterion::AdjustedR2 => "adjusted R2",
        }
    }
}

/// How the least-squares solver treats rank-deficient design matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RankPolicy {
    /// Return the minimum-norm solution; only fail when nothing is solvable.
    #[default]
    MinNorm,
    /// Fail whenever the numerical rank is below the column count.
    Strict,
}

/// Knobs for one forward-selection run.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    pub criterion: Criterion,
    pub rank_policy: RankPolicy,
    /// Evaluate the trials of a round on the rayon pool.
    pub parallel: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            criterion: Criterion::Aic,
            rank_policy: RankPolicy::MinNorm,
            parallel: true,
        }
    }
}

/// One accepted round of forward selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionStep {
    pub feature: String,
    /// Criterion value of the model after adding `feature`.
    pub score: f64,
    /// Trials fitted this round.
    pub trials: usize,
    /// Trials skipped this round because the design was singular.
    pub singular: usize,
    /// `feature` is collinear with the intercept or earlier features.
    pub rank_deficient: bool,
}

/// A fitted linear turnout model, portable between runs.
///
/// `coefficients` holds one slope per entry of `features` (same order) followed
/// by the intercept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub outcome: String,
    pub criterion: Criterion,
    pub features: Vec<String>,
    pub coefficients: Vec<f64>,
    /// Criterion value of the final model (`null` in JSON when infinite).
    pub score: Option<f64>,
    pub n_rows: usize,
}

impl FittedModel {
    pub fn intercept(&self) -> f64 {
        self.coefficients.last().copied().unwrap_or(0.0)
    }

    /// `(feature, slope)` pairs in selection order.
    pub fn slopes(&self) -> impl Iterator<Item = (&str, f64)> {
        self.features
            .iter()
            .map(String::as_str)
            .zip(self.coefficients.iter().copied())
    }
}

/// Mean predicted turnout for one district of a proposed map.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictPrediction {
    pub district: String,
    pub precincts: usize,
    /// Sum of weights used (equals `precincts` when unweighted).
    pub weight: f64,
    pub predicted: f64,
}

/// Settings for the synthetic precinct generator.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub rows: usize,
    pub districts: usize,
    pub seed: u64,
    /// Standard deviation of the turnout noise term.
    pub noise: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            rows: 500,
            districts: 13,
            seed: 42,
            noise: 0.02,
        }
    }
}
