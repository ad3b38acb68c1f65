//! Elderly population projection by district
//!
//! projected(year) = baseline × (1 + growth_rate)^(year - baseline_year),
//! rounded to whole persons and floored at zero.

use super::growth::GrowthStrategy;
use crate::config::AnalyticsConfig;
use crate::district::DistrictRecord;
use crate::error::{RunWarning, WarningKind};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Projected elderly population for one district and year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationForecastPoint {
    pub district_id: String,
    pub year: i32,
    pub projected_population: f64,
    pub baseline_year: i32,
    pub growth_rate: f64,
    /// Year lies further past the last observation than history supports
    pub low_confidence: bool,
    /// R² of the trend fit when the linear-trend strategy is used
    pub fit_r2: Option<f64>,
}

/// Territory-wide total for one forecast year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationTotal {
    pub year: i32,
    pub total_population: f64,
    pub district_count: usize,
}

/// Output of the population forecaster
#[derive(Debug, Clone, Default)]
pub struct PopulationForecast {
    /// Grouped by district (input order), years ascending
    pub points: Vec<PopulationForecastPoint>,
    /// Districts left out of the forecast
    pub excluded: Vec<String>,
    pub warnings: Vec<RunWarning>,
}

impl PopulationForecast {
    /// Projected population for a district in a year
    pub fn value(&self, district_id: &str, year: i32) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.district_id == district_id && p.year == year)
            .map(|p| p.projected_population)
    }

    /// Growth rate used for a forecast district
    pub fn growth_rate(&self, district_id: &str) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.district_id == district_id)
            .map(|p| p.growth_rate)
    }

    /// Sum across districts per year
    pub fn totals(&self) -> Vec<PopulationTotal> {
        let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
        for point in &self.points {
            let entry = by_year.entry(point.year).or_insert((0.0, 0));
            entry.0 += point.projected_population;
            entry.1 += 1;
        }
        by_year
            .into_iter()
            .map(|(year, (total_population, district_count))| PopulationTotal {
                year,
                total_population,
                district_count,
            })
            .collect()
    }
}

/// Per-district outcome before merging
enum DistrictOutcome {
    Forecast(Vec<PopulationForecastPoint>, Option<RunWarning>),
    Excluded(RunWarning),
}

/// Projects elderly population across a configured horizon
#[derive(Debug, Clone)]
pub struct PopulationForecaster {
    strategy: GrowthStrategy,
    baseline_year: Option<i32>,
    years: Vec<i32>,
    extrapolation_limit: Option<u32>,
}

impl PopulationForecaster {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            strategy: config.growth_strategy,
            baseline_year: config.baseline_year,
            years: config.forecast_years(),
            extrapolation_limit: config.extrapolation_limit_years,
        }
    }

    /// Replace the growth strategy
    pub fn with_strategy(mut self, strategy: GrowthStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> GrowthStrategy {
        self.strategy
    }

    /// Forecast every district; failures are isolated per district
    pub fn forecast(&self, districts: &[DistrictRecord]) -> PopulationForecast {
        let outcomes: Vec<DistrictOutcome> = districts
            .par_iter()
            .map(|district| self.forecast_district(district))
            .collect();

        let mut result = PopulationForecast::default();
        for (district, outcome) in districts.iter().zip(outcomes) {
            match outcome {
                DistrictOutcome::Forecast(points, warning) => {
                    result.points.extend(points);
                    result.warnings.extend(warning);
                }
                DistrictOutcome::Excluded(warning) => {
                    result.excluded.push(district.district_id.clone());
                    result.warnings.push(warning);
                }
            }
        }

        log::info!(
            "Population forecast ({} strategy): {} points, {} districts excluded",
            self.strategy.name(),
            result.points.len(),
            result.excluded.len()
        );
        result
    }

    fn forecast_district(&self, district: &DistrictRecord) -> DistrictOutcome {
        let id = &district.district_id;

        let Some((baseline_year, baseline)) = district.baseline(self.baseline_year) else {
            let message = match self.baseline_year {
                Some(year) => format!("no elderly population observed for baseline year {}", year),
                None => "no elderly population history".to_string(),
            };
            return DistrictOutcome::Excluded(RunWarning::new(WarningKind::MissingBaselineData, id, message));
        };

        let estimate = match self.strategy.estimate(district) {
            Ok(estimate) => estimate,
            Err(err) => {
                return DistrictOutcome::Excluded(RunWarning::new(
                    WarningKind::MissingBaselineData,
                    id,
                    format!("{} growth rate unavailable: {}", self.strategy.name(), err),
                ))
            }
        };

        let last_observed = district.latest_year().unwrap_or(baseline_year);
        let limit = self
            .extrapolation_limit
            .unwrap_or(district.elderly_population.len() as u32) as i32;

        let points: Vec<PopulationForecastPoint> = self
            .years
            .iter()
            .map(|&year| PopulationForecastPoint {
                district_id: id.clone(),
                year,
                projected_population: project(baseline as f64, estimate.rate, year - baseline_year),
                baseline_year,
                growth_rate: estimate.rate,
                low_confidence: year - last_observed > limit,
                fit_r2: estimate.fit_r2,
            })
            .collect();

        let flagged: Vec<i32> = points.iter().filter(|p| p.low_confidence).map(|p| p.year).collect();
        let warning = match (flagged.first(), flagged.last()) {
            (Some(first), Some(last)) => Some(RunWarning::new(
                WarningKind::ExtrapolationWarning,
                id,
                format!(
                    "years {}-{} extend more than {} years past last observation {}",
                    first, last, limit, last_observed
                ),
            )),
            _ => None,
        };

        DistrictOutcome::Forecast(points, warning)
    }
}

/// Compound a baseline forward (or backward) by whole years
pub fn project(baseline: f64, growth_rate: f64, years: i32) -> f64 {
    (baseline * (1.0 + growth_rate).powi(years)).round().max(0.0)
}
