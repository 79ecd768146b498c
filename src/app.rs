//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments
//! - runs selection / scoring / sample generation
//! - prints reports

use clap::Parser;
use log::info;

use crate::cli::{Command, MapArgs, PredictArgs, SampleArgs, SelectArgs};
use crate::domain::{RankPolicy, SampleConfig, SelectionConfig};
use crate::error::AppError;

pub mod pipeline;

use pipeline::{MapConfig, MapOutput, RunConfig};

/// Entry point for the `turnout` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` first, so it can feed both RUST_LOG and the clap `env` fallbacks.
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Select(args) => handle_select(args),
        Command::Predict(args) => handle_predict(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_select(args: SelectArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let run = pipeline::run_selection(&config)?;

    println!(
        "{}",
        crate::report::format_selection_summary(&run.selection, &config.data.display().to_string())
    );
    print_maps(&run.maps);
    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let model = crate::io::read_model_json(&args.model)?;
    info!(
        "loaded model for '{}' with {} features from {}",
        model.outcome,
        model.features.len(),
        args.model.display()
    );

    println!("{}", crate::report::format_coefficients(&model));
    let maps = pipeline::score_maps(&model, &map_config_from_args(&args.maps))?;
    if maps.is_empty() {
        return Err(AppError::new(2, "Nothing to score: pass --maps."));
    }
    print_maps(&maps);
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        rows: args.rows,
        districts: args.districts,
        seed: args.seed,
        noise: args.noise,
    };
    let dataset = crate::data::generate_precincts(&config)?;

    let columns = dataset.columns().len();
    crate::io::write_dataset_csv(&args.out, &dataset)?;
    info!("wrote {} synthetic precincts ({columns} columns) to {}", dataset.n_rows(), args.out.display());
    Ok(())
}

fn print_maps(maps: &[MapOutput]) {
    for map in maps {
        println!("Map {}: {}", map.name, map.results_path.display());
        if let Some(rows) = &map.districts {
            println!("{}", crate::report::format_districts(&map.name, rows));
        }
    }
}

pub fn run_config_from_args(args: &SelectArgs) -> RunConfig {
    RunConfig {
        data: args.data.clone(),
        outcome: args.outcome.clone(),
        features: args.features.clone(),
        exclude: args.exclude.clone(),
        selection: SelectionConfig {
            criterion: args.criterion,
            rank_policy: if args.strict_rank {
                RankPolicy::Strict
            } else {
                RankPolicy::MinNorm
            },
            parallel: !args.no_parallel,
        },
        save_model: args.save_model.clone(),
        maps: map_config_from_args(&args.maps),
    }
}

fn map_config_from_args(args: &MapArgs) -> MapConfig {
    MapConfig {
        dir: args.maps_dir.clone(),
        names: args.maps.clone(),
        district_column: args.district_column.clone(),
        weight_column: args.weight_column.clone(),
    }
}
