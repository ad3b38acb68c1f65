//! Pandemic surge sweep
//!
//! Runs the baseline forecast once, then the pandemic stage for each surge
//! multiplier, and prints a JSON summary of total demand per window offset.
//! Each sweep point applies one uniform multiplier to all affected categories.

use anyhow::{Context, Result};
use clap::Parser;
use gerontech_forecast::district::load_inputs;
use gerontech_forecast::forecast::{total_demand, total_surge_demand};
use gerontech_forecast::{AnalyticsConfig, LookupTables, PipelineRunner};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "scenario_sweep", about = "Pandemic demand under a range of surge multipliers")]
struct Args {
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[arg(long)]
    lookups: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated surge multipliers
    #[arg(long, value_delimiter = ',', default_values_t = vec![1.5, 2.0, 2.5, 3.0])]
    multipliers: Vec<f64>,
}

#[derive(Serialize)]
struct SweepResult {
    surge_multiplier: f64,
    /// Total surge demand per offset, None when the scenario failed
    demand_by_offset: Option<Vec<f64>>,
    peak_demand: Option<f64>,
    error: Option<String>,
}

#[derive(Serialize)]
struct SweepSummary {
    reference_year: i32,
    baseline_demand: f64,
    window_periods: u32,
    affected_categories: Vec<String>,
    results: Vec<SweepResult>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AnalyticsConfig::from_json_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalyticsConfig::default(),
    };
    let lookups = match &args.lookups {
        Some(path) => LookupTables::from_csv_path(path)
            .with_context(|| format!("loading lookup tables from {}", path.display()))?,
        None => LookupTables::default_tables().context("building default lookup tables")?,
    };
    let (districts, diseases) = load_inputs(&args.data_dir)
        .with_context(|| format!("loading inputs from {}", args.data_dir.display()))?;

    let runner = PipelineRunner::new(lookups, config).context("invalid configuration")?;
    let baseline = runner.run(&districts, &diseases).context("running baseline pipeline")?;

    let window = runner.config().pandemic.window_periods;
    let results: Vec<SweepResult> = args
        .multipliers
        .par_iter()
        .map(|&multiplier| match runner.run_scenario(&baseline.demand, Some(multiplier)) {
            Ok(points) => {
                let by_offset: Vec<f64> = (0..window).map(|t| total_surge_demand(&points, t)).collect();
                let peak = by_offset.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                SweepResult {
                    surge_multiplier: multiplier,
                    demand_by_offset: Some(by_offset),
                    peak_demand: Some(peak),
                    error: None,
                }
            }
            Err(err) => SweepResult {
                surge_multiplier: multiplier,
                demand_by_offset: None,
                peak_demand: None,
                error: Some(err.to_string()),
            },
        })
        .collect();

    let reference_year = runner.config().pandemic_reference_year();
    let summary = SweepSummary {
        reference_year,
        baseline_demand: total_demand(&baseline.demand, reference_year),
        window_periods: window,
        affected_categories: runner.config().pandemic.affected_categories.clone(),
        results,
    };

    println!("{}", serde_json::to_string_pretty(&summary).context("serialising sweep summary")?);
    Ok(())
}
