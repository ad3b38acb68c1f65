//! Pipeline runner
//!
//! Holds the lookup tables and configuration once, then sequences the
//! components over already-cleaned input tables:
//!
//! gap analysis ∥ disease mapping → population → demand → pandemic scenario
//! → recommendations

use crate::analysis::{
    DiseaseEquipmentMapper, DiseaseEquipmentWeight, GapAnalyzer, OverlookedCondition, ServiceGapScore,
};
use crate::config::AnalyticsConfig;
use crate::district::{DiseaseRecord, DistrictRecord};
use crate::error::{AnalyticsError, Result, RunWarning, WarningKind};
use crate::forecast::{
    total_demand, DemandForecastPoint, DemandForecaster, PandemicScenarioPoint, PandemicSimulator,
    PopulationForecastPoint, PopulationForecaster, PopulationTotal,
};
use crate::lookup::{LookupTables, UserPersona};
use crate::recommend::{ExpansionPriority, InventoryPriority, OutreachAction, Recommender, SupplyGap};
use serde::Serialize;
use std::path::Path;

/// Headline figures of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub districts_analyzed: usize,
    pub districts_forecast: usize,
    pub total_baseline_population: u64,
    pub end_year: i32,
    pub end_year_population: f64,
    pub top_priority_district: Option<String>,
    pub top_cause_of_death: Option<String>,
    pub first_year: i32,
    pub first_year_demand: f64,
    pub pandemic_generated: bool,
    pub warning_count: usize,
}

/// Every table produced by one run
#[derive(Debug)]
pub struct PipelineOutput {
    pub service_gaps: Vec<ServiceGapScore>,
    pub disease_weights: Vec<DiseaseEquipmentWeight>,
    pub overlooked_conditions: Vec<OverlookedCondition>,
    pub population: Vec<PopulationForecastPoint>,
    pub population_totals: Vec<PopulationTotal>,
    pub excluded_districts: Vec<String>,
    pub demand: Vec<DemandForecastPoint>,
    /// None when the scenario stage failed
    pub pandemic: Option<Vec<PandemicScenarioPoint>>,
    pub scenario_error: Option<AnalyticsError>,
    pub personas: Vec<UserPersona>,
    pub expansion_priorities: Vec<ExpansionPriority>,
    pub inventory_priorities: Vec<InventoryPriority>,
    pub supply_gaps: Vec<SupplyGap>,
    pub outreach_plan: Vec<OutreachAction>,
    /// In stage order
    pub warnings: Vec<RunWarning>,
    pub summary: RunSummary,
}

/// Pre-loaded pipeline runner
///
/// # Example
/// ```ignore
/// let runner = PipelineRunner::from_csv_path(Path::new("data/lookups"), config)?;
/// let (districts, diseases) = load_inputs(Path::new("data"))?;
/// let output = runner.run(&districts, &diseases)?;
/// ```
#[derive(Debug, Clone)]
pub struct PipelineRunner {
    lookups: LookupTables,
    config: AnalyticsConfig,
}

impl PipelineRunner {
    /// Fails with `InvalidConfig` unless the configuration validates
    pub fn new(lookups: LookupTables, config: AnalyticsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { lookups, config })
    }

    /// Runner over the built-in lookup tables
    pub fn with_default_tables(config: AnalyticsConfig) -> Result<Self> {
        Self::new(LookupTables::default_tables()?, config)
    }

    /// Runner over lookup tables loaded from a directory
    pub fn from_csv_path(path: &Path, config: AnalyticsConfig) -> Result<Self> {
        Self::new(LookupTables::from_csv_path(path)?, config)
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn lookups(&self) -> &LookupTables {
        &self.lookups
    }

    /// Run every stage. Only an empty district table fails the whole run;
    /// a failed pandemic scenario is recorded and the other tables are kept.
    pub fn run(&self, districts: &[DistrictRecord], diseases: &[DiseaseRecord]) -> Result<PipelineOutput> {
        if districts.is_empty() {
            return Err(AnalyticsError::EmptyDistrictTable);
        }
        let cfg = &self.config;

        let analyzer = GapAnalyzer::new(cfg.gap_score_weights, cfg.growth_strategy, cfg.baseline_year);
        let mapper = DiseaseEquipmentMapper::new(&self.lookups, cfg.weight_normalization_total);
        let (gaps, mapping) = rayon::join(|| analyzer.analyze(districts), || mapper.map(diseases));

        let population = PopulationForecaster::new(cfg).forecast(districts);
        let demand = DemandForecaster::new(&self.lookups, cfg.default_category_weight).forecast(&population, &mapping);

        let mut warnings = Vec::new();
        warnings.extend(gaps.warnings.iter().cloned());
        warnings.extend(mapping.warnings.iter().cloned());
        warnings.extend(population.warnings.iter().cloned());

        let (pandemic, scenario_error) = match self.run_scenario(&demand, None) {
            Ok(points) => (Some(points), None),
            Err(err) => {
                warnings.push(RunWarning::new(
                    WarningKind::ScenarioConfigError,
                    "pandemic_scenario",
                    err.to_string(),
                ));
                (None, Some(err))
            }
        };

        let recommender = Recommender::new(cfg);
        let expansion_priorities = recommender.expansion_priorities(&gaps, &population);
        let inventory_priorities = recommender.inventory_priorities(&demand);
        let supply_gaps = recommender.supply_gaps(diseases, &self.lookups);
        let outreach_plan = recommender.outreach_plan(&gaps, self.lookups.personas());

        let population_totals = population.totals();
        let summary = RunSummary {
            districts_analyzed: gaps.scores.len(),
            districts_forecast: districts.len() - population.excluded.len(),
            total_baseline_population: gaps.scores.iter().map(|s| s.elderly_population).sum(),
            end_year: cfg.forecast_end_year,
            end_year_population: population_totals
                .iter()
                .find(|t| t.year == cfg.forecast_end_year)
                .map(|t| t.total_population)
                .unwrap_or(0.0),
            top_priority_district: gaps.top().map(|s| s.district_id.clone()),
            top_cause_of_death: diseases.iter().min_by_key(|d| d.rank).map(|d| d.disease_name.clone()),
            first_year: cfg.forecast_start_year,
            first_year_demand: total_demand(&demand, cfg.forecast_start_year),
            pandemic_generated: pandemic.is_some(),
            warning_count: warnings.len(),
        };

        log::info!(
            "Pipeline complete: {} districts, {} demand rows, {} warnings",
            summary.districts_analyzed,
            demand.len(),
            summary.warning_count
        );

        Ok(PipelineOutput {
            service_gaps: gaps.scores,
            disease_weights: mapping.weights,
            overlooked_conditions: mapping.overlooked,
            population: population.points,
            population_totals,
            excluded_districts: population.excluded,
            demand,
            pandemic,
            scenario_error,
            personas: self.lookups.personas().to_vec(),
            expansion_priorities,
            inventory_priorities,
            supply_gaps,
            outreach_plan,
            warnings,
            summary,
        })
    }

    /// Pandemic stage alone over an existing demand forecast,
    /// optionally with a different surge multiplier
    pub fn run_scenario(
        &self,
        demand: &[DemandForecastPoint],
        surge_multiplier: Option<f64>,
    ) -> Result<Vec<PandemicScenarioPoint>> {
        let mut simulator = PandemicSimulator::new(&self.config);
        if let Some(multiplier) = surge_multiplier {
            simulator = simulator.with_surge_multiplier(multiplier);
        }
        simulator.simulate(demand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::district::load_inputs;
    use approx::assert_relative_eq;

    fn runner(config: AnalyticsConfig) -> PipelineRunner {
        PipelineRunner::with_default_tables(config).unwrap()
    }

    #[test]
    fn test_sample_data_run() {
        let (districts, diseases) = load_inputs(Path::new("data")).unwrap();
        let output = runner(AnalyticsConfig::default()).run(&districts, &diseases).unwrap();

        assert_eq!(output.service_gaps.len(), 18);
        assert_eq!(output.population.len(), 18 * 6);
        assert_eq!(output.demand.len(), 18 * 6 * 9);
        assert_eq!(output.overlooked_conditions.len(), 1);
        assert_eq!(output.overlooked_conditions[0].disease_name, "COVID-19");
        assert_eq!(output.personas.len(), 6);
        assert_eq!(output.expansion_priorities.len(), 5);
        assert_eq!(output.inventory_priorities.len(), 18 * 3);
        assert!(output.pandemic.is_some());
        assert_eq!(output.summary.top_cause_of_death.as_deref(), Some("Malignant neoplasms"));
        assert_eq!(output.summary.districts_forecast, 18);
        assert_eq!(output.outreach_plan.len(), 3);
        assert_eq!(output.supply_gaps.len(), 6);

        let weight_sum: f64 = output.disease_weights.iter().map(|w| w.demand_weight).sum();
        assert_relative_eq!(weight_sum, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_all_unmapped_causes_leave_weights_empty() {
        let (districts, _) = load_inputs(Path::new("data")).unwrap();
        let diseases = vec![DiseaseRecord::new("COVID-19", 4_520, 1), DiseaseRecord::new("Accidents", 900, 2)];
        let output = runner(AnalyticsConfig::default()).run(&districts, &diseases).unwrap();

        assert!(output.disease_weights.is_empty());
        assert_eq!(output.overlooked_conditions.len(), 2);
        assert!(output.supply_gaps.is_empty());
        // Every category falls back to the neutral weight
        assert!(output.demand.iter().all(|row| row.demand_weight == 1.0));
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = AnalyticsConfig::default();
        config.gap_score_weights.population_weight = 0.0;
        config.gap_score_weights.penetration_weight = 0.0;
        config.gap_score_weights.growth_weight = 0.0;

        let tables = LookupTables::default_tables().unwrap();
        let result = PipelineRunner::new(tables, config.clone());
        assert!(matches!(result, Err(AnalyticsError::InvalidConfig(_))));
        assert!(matches!(
            PipelineRunner::with_default_tables(config),
            Err(AnalyticsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rerun_is_identical() {
        let (districts, diseases) = load_inputs(Path::new("data")).unwrap();
        let runner = runner(AnalyticsConfig::default());
        let first = runner.run(&districts, &diseases).unwrap();
        let second = runner.run(&districts, &diseases).unwrap();

        assert_eq!(first.service_gaps, second.service_gaps);
        assert_eq!(first.disease_weights, second.disease_weights);
        assert_eq!(first.population, second.population);
        assert_eq!(first.demand, second.demand);
        assert_eq!(first.pandemic, second.pandemic);
        assert_eq!(first.warnings, second.warnings);
        assert_eq!(first.summary, second.summary);
    }

    #[test]
    fn test_scenario_error_does_not_abort_run() {
        let mut config = AnalyticsConfig::default();
        config.pandemic.affected_categories = vec!["Hover Chairs".to_string()];
        let districts = vec![DistrictRecord::new("D1", 1_000).with_population(2024, 10_000).with_growth_rate(0.02)];
        let output = runner(config).run(&districts, &[DiseaseRecord::new("Pneumonia", 100, 1)]).unwrap();

        assert!(output.pandemic.is_none());
        assert!(matches!(output.scenario_error, Some(AnalyticsError::ScenarioConfig { .. })));
        assert!(output.warnings.iter().any(|w| w.kind == WarningKind::ScenarioConfigError));
        assert_eq!(output.population.len(), 6);
        assert!(!output.demand.is_empty());
        assert!(!output.summary.pandemic_generated);
    }

    #[test]
    fn test_empty_district_table_fails() {
        let result = runner(AnalyticsConfig::default()).run(&[], &[]);
        assert!(matches!(result, Err(AnalyticsError::EmptyDistrictTable)));
    }

    #[test]
    fn test_sweep_multiplier_scales_surge() {
        let mut config = AnalyticsConfig::default();
        config.pandemic.affected_categories = vec!["Respiratory".to_string()];
        config.pandemic.peak_offset = Some(1);
        let runner = runner(config);
        let districts = vec![DistrictRecord::new("D1", 1_000).with_population(2024, 10_000).with_growth_rate(0.0)];
        let output = runner.run(&districts, &[]).unwrap();

        let low = runner.run_scenario(&output.demand, Some(1.5)).unwrap();
        let high = runner.run_scenario(&output.demand, Some(3.0)).unwrap();
        let peak = |points: &[PandemicScenarioPoint]| {
            points
                .iter()
                .find(|p| p.category_name == "Respiratory" && p.year_offset == 1)
                .map(|p| p.surge_demand)
                .unwrap()
        };
        assert!(peak(&high) > peak(&low));
        // 10,000 × 0.06 × neutral weight × 3.0
        assert!((peak(&high) - 1_800.0).abs() < 1e-9);
    }
}
