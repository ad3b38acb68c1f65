//! Flat output tables
//!
//! One CSV per table, header always present. List-valued cells are joined
//! with "; ". Floats use the csv writer's shortest round-trip formatting.

use crate::error::Result;
use crate::pipeline::PipelineOutput;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const SERVICE_GAPS_FILE: &str = "service_gaps.csv";
pub const DISEASE_WEIGHTS_FILE: &str = "disease_equipment_weights.csv";
pub const OVERLOOKED_FILE: &str = "overlooked_conditions.csv";
pub const POPULATION_FILE: &str = "population_forecast.csv";
pub const POPULATION_TOTALS_FILE: &str = "population_totals.csv";
pub const DEMAND_FILE: &str = "demand_forecast.csv";
pub const PANDEMIC_FILE: &str = "pandemic_scenario.csv";
pub const PERSONAS_FILE: &str = "personas.csv";
pub const EXPANSION_FILE: &str = "expansion_priorities.csv";
pub const INVENTORY_FILE: &str = "inventory_priorities.csv";
pub const SUPPLY_GAPS_FILE: &str = "supply_gaps.csv";
pub const OUTREACH_FILE: &str = "outreach_plan.csv";
pub const WARNINGS_FILE: &str = "warnings.csv";
pub const SUMMARY_FILE: &str = "run_summary.json";

const LIST_JOIN: &str = "; ";

#[derive(Serialize)]
struct DiseaseWeightRow<'a> {
    category_name: &'a str,
    demand_weight: f64,
    raw_score: f64,
    contributing_diseases: String,
}

#[derive(Serialize)]
struct PersonaRow<'a> {
    persona_id: &'a str,
    name: &'a str,
    pain_points: String,
    equipment_needs: String,
}

#[derive(Serialize)]
struct SupplyGapRow<'a> {
    equipment_name: &'a str,
    required_by: String,
    recommended_action: &'a str,
}

/// Write rows under an explicit header so empty tables still carry one
pub fn write_table<T: Serialize>(path: &Path, header: &[&str], rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(File::create(path)?);
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write every table of a run into `dir`, returning the files written.
/// The pandemic table is skipped when the scenario failed.
pub fn write_outputs(output: &PipelineOutput, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    let mut target = |name: &str| {
        let path = dir.join(name);
        written.push(path.clone());
        path
    };

    write_table(
        &target(SERVICE_GAPS_FILE),
        &["district_id", "elderly_population", "service_users", "penetration_rate", "growth_rate", "gap_score", "rank"],
        &output.service_gaps,
    )?;

    write_table(
        &target(DISEASE_WEIGHTS_FILE),
        &["category_name", "demand_weight", "raw_score", "contributing_diseases"],
        output.disease_weights.iter().map(|w| DiseaseWeightRow {
            category_name: &w.category_name,
            demand_weight: w.demand_weight,
            raw_score: w.raw_score,
            contributing_diseases: w.contributing_diseases.join(LIST_JOIN),
        }),
    )?;

    write_table(
        &target(OVERLOOKED_FILE),
        &["disease_name", "death_count", "rank"],
        &output.overlooked_conditions,
    )?;

    write_table(
        &target(POPULATION_FILE),
        &["district_id", "year", "projected_population", "baseline_year", "growth_rate", "low_confidence", "fit_r2"],
        &output.population,
    )?;

    write_table(
        &target(POPULATION_TOTALS_FILE),
        &["year", "total_population", "district_count"],
        &output.population_totals,
    )?;

    write_table(
        &target(DEMAND_FILE),
        &[
            "district_id",
            "year",
            "category_name",
            "projected_population",
            "base_penetration",
            "demand_weight",
            "projected_demand",
        ],
        &output.demand,
    )?;

    if let Some(pandemic) = &output.pandemic {
        write_table(
            &target(PANDEMIC_FILE),
            &["district_id", "year_offset", "year", "category_name", "baseline_demand", "multiplier", "surge_demand"],
            pandemic,
        )?;
    }

    write_table(
        &target(PERSONAS_FILE),
        &["persona_id", "name", "pain_points", "equipment_needs"],
        output.personas.iter().map(|p| PersonaRow {
            persona_id: &p.persona_id,
            name: &p.name,
            pain_points: p.pain_points.join(LIST_JOIN),
            equipment_needs: p.equipment_needs.iter().map(String::as_str).collect::<Vec<_>>().join(LIST_JOIN),
        }),
    )?;

    write_table(
        &target(EXPANSION_FILE),
        &[
            "rank",
            "district_id",
            "gap_score",
            "start_year_population",
            "end_year_population",
            "growth_rate",
            "expansion_score",
        ],
        &output.expansion_priorities,
    )?;

    write_table(
        &target(INVENTORY_FILE),
        &["district_id", "year", "priority", "category_name", "projected_demand"],
        &output.inventory_priorities,
    )?;

    write_table(
        &target(SUPPLY_GAPS_FILE),
        &["equipment_name", "required_by", "recommended_action"],
        output.supply_gaps.iter().map(|g| SupplyGapRow {
            equipment_name: &g.equipment_name,
            required_by: g.required_by.join(LIST_JOIN),
            recommended_action: &g.recommended_action,
        }),
    )?;

    write_table(
        &target(OUTREACH_FILE),
        &[
            "district_id",
            "gap_rank",
            "target_persona",
            "persona_id",
            "channel",
            "message",
            "estimated_reach",
            "success_metric",
        ],
        &output.outreach_plan,
    )?;

    write_table(&target(WARNINGS_FILE), &["kind", "subject", "message"], &output.warnings)?;

    let summary_path = target(SUMMARY_FILE);
    fs::write(&summary_path, serde_json::to_string_pretty(&output.summary)?)?;

    log::info!("Wrote {} output files to {}", written.len(), dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyticsConfig;
    use crate::district::load_inputs;
    use crate::pipeline::PipelineRunner;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gerontech_forecast_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn sample_output(config: AnalyticsConfig) -> PipelineOutput {
        let (districts, diseases) = load_inputs(Path::new("data")).unwrap();
        PipelineRunner::with_default_tables(config)
            .unwrap()
            .run(&districts, &diseases)
            .unwrap()
    }

    #[test]
    fn test_writes_all_tables_with_headers() {
        let dir = scratch_dir("all");
        let written = write_outputs(&sample_output(AnalyticsConfig::default()), &dir).unwrap();
        assert_eq!(written.len(), 14);

        let gaps = fs::read_to_string(dir.join(SERVICE_GAPS_FILE)).unwrap();
        assert!(gaps.starts_with("district_id,elderly_population,service_users,penetration_rate"));
        assert_eq!(gaps.lines().count(), 19);

        let personas = fs::read_to_string(dir.join(PERSONAS_FILE)).unwrap();
        assert!(personas.contains("Fall risk; Forgetfulness; No caregiver"));

        let supply = fs::read_to_string(dir.join(SUPPLY_GAPS_FILE)).unwrap();
        assert!(supply.starts_with("equipment_name,required_by,recommended_action\n"));
        assert!(supply.contains("transfer board,Cerebrovascular diseases,"));

        let outreach = fs::read_to_string(dir.join(OUTREACH_FILE)).unwrap();
        assert_eq!(outreach.lines().count(), 4);

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join(SUMMARY_FILE)).unwrap()).unwrap();
        assert_eq!(summary["districts_analyzed"], 18);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_failed_scenario_omits_pandemic_table() {
        let mut config = AnalyticsConfig::default();
        config.pandemic.affected_categories = vec!["Hover Chairs".to_string()];
        let dir = scratch_dir("no_pandemic");
        write_outputs(&sample_output(config), &dir).unwrap();

        assert!(!dir.join(PANDEMIC_FILE).exists());
        let warnings = fs::read_to_string(dir.join(WARNINGS_FILE)).unwrap();
        assert!(warnings.contains("scenario_config_error"));
        assert!(warnings.contains("unmapped_disease"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_identical_runs_give_identical_files() {
        let first = scratch_dir("idem_a");
        let second = scratch_dir("idem_b");
        write_outputs(&sample_output(AnalyticsConfig::default()), &first).unwrap();
        write_outputs(&sample_output(AnalyticsConfig::default()), &second).unwrap();

        for name in [DEMAND_FILE, POPULATION_FILE, PANDEMIC_FILE, SERVICE_GAPS_FILE, WARNINGS_FILE] {
            assert_eq!(fs::read(first.join(name)).unwrap(), fs::read(second.join(name)).unwrap(), "{}", name);
        }

        fs::remove_dir_all(&first).unwrap();
        fs::remove_dir_all(&second).unwrap();
    }
}
