//! Command-line parsing for the turnout model.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::Criterion;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "turnout", version, about = "Precinct turnout regression with forward feature selection")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Select features by forward selection, fit the model, and optionally score maps.
    Select(SelectArgs),
    /// Score proposed maps with a previously saved model JSON.
    Predict(PredictArgs),
    /// Write a synthetic precinct dataset (for demos and smoke runs).
    Sample(SampleArgs),
}

/// Options for forward selection.
#[derive(Debug, Parser, Clone)]
pub struct SelectArgs {
    /// Joined precinct dataset (CSV).
    #[arg(long, env = "TURNOUT_DATA", value_name = "CSV")]
    pub data: PathBuf,

    /// Outcome column (e.g. turnout share).
    #[arg(long, env = "TURNOUT_OUTCOME", default_value = "turnout")]
    pub outcome: String,

    /// Candidate features, comma separated. Defaults to every numeric column except the outcome.
    #[arg(long, value_delimiter = ',', conflicts_with = "exclude")]
    pub features: Vec<String>,

    /// Columns to leave out of the default candidate pool (ids, district numbers, raw counts).
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Selection criterion.
    #[arg(long, value_enum, default_value_t = Criterion::Aic)]
    pub criterion: Criterion,

    /// Treat any rank-deficient trial design as singular and skip it.
    #[arg(long)]
    pub strict_rank: bool,

    /// Evaluate trials on a single thread.
    #[arg(long)]
    pub no_parallel: bool,

    /// Save the fitted model to JSON.
    #[arg(long = "save-model", value_name = "JSON")]
    pub save_model: Option<PathBuf>,

    #[command(flatten)]
    pub maps: MapArgs,
}

/// Options for scoring with a saved model.
#[derive(Debug, Parser, Clone)]
pub struct PredictArgs {
    /// Model JSON produced by `turnout select --save-model`.
    #[arg(long, value_name = "JSON")]
    pub model: PathBuf,

    #[command(flatten)]
    pub maps: MapArgs,
}

/// Which proposed maps to score and how to aggregate them.
#[derive(Debug, Args, Clone)]
pub struct MapArgs {
    /// Directory holding `<map>.csv` precinct files.
    #[arg(long, env = "TURNOUT_MAPS_DIR", value_name = "DIR")]
    pub maps_dir: Option<PathBuf>,

    /// Map names, comma separated (e.g. apple,birch,chestnut,lange,szetela).
    #[arg(long, value_delimiter = ',')]
    pub maps: Vec<String>,

    /// Column holding the district assignment; enables per-district output.
    #[arg(long)]
    pub district_column: Option<String>,

    /// Column used to weight district means (e.g. registered voters).
    #[arg(long)]
    pub weight_column: Option<String>,
}

/// Options for the synthetic sample.
#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Number of precincts.
    #[arg(short = 'n', long, default_value_t = 500)]
    pub rows: usize,

    /// Number of districts precincts are spread over.
    #[arg(long, default_value_t = 13)]
    pub districts: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Standard deviation of the turnout noise.
    #[arg(long, default_value_t = 0.02)]
    pub noise: f64,

    /// Output CSV.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,
}
