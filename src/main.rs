//! Gerontech Forecast CLI
//!
//! Reads the cleaned district and disease tables, runs the full pipeline,
//! and writes every output table.

use anyhow::{Context, Result};
use clap::Parser;
use gerontech_forecast::district::load_inputs;
use gerontech_forecast::output::write_outputs;
use gerontech_forecast::{AnalyticsConfig, LookupTables, PipelineRunner};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "gerontech_forecast", version, about = "Service-gap analytics and demand forecasting")]
struct Args {
    /// Directory holding districts.csv and diseases.csv
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Lookup table directory; built-in tables when omitted
    #[arg(long)]
    lookups: Option<PathBuf>,

    /// JSON configuration file; defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for output tables
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start = Instant::now();

    println!("Gerontech Forecast v{}", env!("CARGO_PKG_VERSION"));
    println!("==========================\n");

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
    log::debug!("{} equipment categories, {} personas", lookups.categories().len(), lookups.personas().len());

    let (districts, diseases) = load_inputs(&args.data_dir)
        .with_context(|| format!("loading inputs from {}", args.data_dir.display()))?;
    println!("Loaded {} districts and {} causes of death", districts.len(), diseases.len());

    let runner = PipelineRunner::new(lookups, config).context("invalid configuration")?;
    let output = runner.run(&districts, &diseases).context("running pipeline")?;

    let written = write_outputs(&output, &args.output_dir)
        .with_context(|| format!("writing outputs to {}", args.output_dir.display()))?;

    let s = &output.summary;
    println!("\nSummary:");
    println!("  Districts analysed:      {}", s.districts_analyzed);
    println!("  Districts forecast:      {}", s.districts_forecast);
    println!("  Baseline elderly pop:    {}", s.total_baseline_population);
    println!("  Projected {} total:    {:.0}", s.end_year, s.end_year_population);
    if let Some(district) = &s.top_priority_district {
        println!("  Top priority district:   {}", district);
    }
    if let Some(disease) = &s.top_cause_of_death {
        println!("  Top cause of death:      {}", disease);
    }
    println!("  {} equipment demand:   {:.0} units", s.first_year, s.first_year_demand);
    println!("  Pandemic scenario:       {}", if s.pandemic_generated { "generated" } else { "skipped" });
    println!("  Warnings:                {}", s.warning_count);

    if let Some(err) = &output.scenario_error {
        println!("\nPandemic scenario not written: {}", err);
    }

    println!("\nTop expansion priorities:");
    for p in &output.expansion_priorities {
        println!("  {}. {:<22} score {:>7.1}", p.rank, p.district_id, p.expansion_score);
    }

    if !output.outreach_plan.is_empty() {
        println!("\nOutreach plan:");
        for a in &output.outreach_plan {
            println!("  {:<22} {:<36} reach {}", a.district_id, a.target_persona, a.estimated_reach);
        }
    }
    println!("\n{} catalogue gaps for leading causes of death", output.supply_gaps.len());

    println!("\nWrote {} files to {} in {:?}", written.len(), args.output_dir.display(), start.elapsed());
    Ok(())
}
