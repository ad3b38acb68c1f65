//! Pandemic surge scenario
//!
//! Baseline demand for the reference year is perturbed over a window of
//! periods. Affected categories follow a surge curve that reaches the peak
//! multiplier at the peak offset and decays back toward 1.0; all other
//! categories pass through unchanged.

use super::demand::DemandForecastPoint;
use crate::config::{AnalyticsConfig, PandemicConfig};
use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Configured curve shape
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayShape {
    /// Straight ramp up to the peak and straight decay after it
    #[default]
    Linear,
    /// Excess over 1.0 shrinks by exp(-rate) per period away from the peak
    Exponential { rate: f64 },
}

impl DecayShape {
    pub fn curve(&self) -> Box<dyn SurgeCurve> {
        match *self {
            DecayShape::Linear => Box::new(LinearSurge),
            DecayShape::Exponential { rate } => Box::new(ExponentialSurge { rate }),
        }
    }
}

/// Time-indexed multiplier applied to baseline demand
pub trait SurgeCurve: Send + Sync {
    fn name(&self) -> &'static str;

    /// Multiplier at `offset` for a window of `window` periods peaking at `peak`.
    /// Must equal `peak_multiplier` at the peak.
    fn multiplier(&self, offset: u32, peak: u32, window: u32, peak_multiplier: f64) -> f64;
}

/// Piecewise-linear rise and decay
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearSurge;

impl SurgeCurve for LinearSurge {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn multiplier(&self, offset: u32, peak: u32, window: u32, peak_multiplier: f64) -> f64 {
        let excess = peak_multiplier - 1.0;
        let fraction = if offset <= peak {
            (offset + 1) as f64 / (peak + 1) as f64
        } else {
            1.0 - (offset - peak) as f64 / (window - peak) as f64
        };
        1.0 + excess * fraction
    }
}

/// Symmetric exponential decay around the peak
#[derive(Debug, Clone, Copy)]
pub struct ExponentialSurge {
    pub rate: f64,
}

impl SurgeCurve for ExponentialSurge {
    fn name(&self) -> &'static str {
        "exponential"
    }

    fn multiplier(&self, offset: u32, peak: u32, _window: u32, peak_multiplier: f64) -> f64 {
        let distance = (offset as f64 - peak as f64).abs();
        1.0 + (peak_multiplier - 1.0) * (-self.rate * distance).exp()
    }
}

/// Scenario demand for one (district, category, offset)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PandemicScenarioPoint {
    pub district_id: String,
    pub year_offset: u32,
    /// reference_year + year_offset
    pub year: i32,
    pub category_name: String,
    pub baseline_demand: f64,
    pub multiplier: f64,
    pub surge_demand: f64,
}

/// Applies a surge curve on top of the baseline demand forecast
pub struct PandemicSimulator {
    config: PandemicConfig,
    reference_year: i32,
    curve: Box<dyn SurgeCurve>,
}

impl PandemicSimulator {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            curve: config.pandemic.decay_shape.curve(),
            reference_year: config.pandemic_reference_year(),
            config: config.pandemic.clone(),
        }
    }

    /// Replace the configured curve shape
    pub fn with_curve(mut self, curve: Box<dyn SurgeCurve>) -> Self {
        self.curve = curve;
        self
    }

    /// Uniform peak multiplier for every affected category; drops per-category overrides
    pub fn with_surge_multiplier(mut self, surge_multiplier: f64) -> Self {
        self.config.surge_multiplier = surge_multiplier;
        self.config.category_multipliers.clear();
        self
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    pub fn curve_name(&self) -> &'static str {
        self.curve.name()
    }

    fn is_affected(&self, category: &str) -> bool {
        self.config.affected_categories.iter().any(|c| c == category)
    }

    /// Multipliers over the window for a category (all 1.0 when unaffected)
    pub fn curve_for(&self, category: &str) -> Vec<f64> {
        let window = self.config.window_periods;
        if !self.is_affected(category) {
            return vec![1.0; window as usize];
        }
        let peak_multiplier = self.config.peak_multiplier(category);
        (0..window)
            .map(|t| self.curve.multiplier(t, self.config.peak(), window, peak_multiplier))
            .collect()
    }

    /// Build the scenario from the baseline demand rows of the reference year.
    ///
    /// Rows follow baseline order (district, category), offsets ascending.
    /// Fails if an affected or overridden category has no baseline row.
    pub fn simulate(&self, demand: &[DemandForecastPoint]) -> Result<Vec<PandemicScenarioPoint>> {
        let baseline: Vec<&DemandForecastPoint> = demand
            .iter()
            .filter(|row| row.year == self.reference_year)
            .collect();

        let present: BTreeSet<&str> = baseline.iter().map(|row| row.category_name.as_str()).collect();
        let mut unknown_categories: Vec<String> = Vec::new();
        for category in self
            .config
            .affected_categories
            .iter()
            .chain(self.config.category_multipliers.keys())
        {
            if !present.contains(category.as_str()) && !unknown_categories.contains(category) {
                unknown_categories.push(category.clone());
            }
        }
        if !unknown_categories.is_empty() {
            return Err(AnalyticsError::ScenarioConfig { unknown_categories });
        }

        let window = self.config.window_periods;
        let mut points = Vec::with_capacity(baseline.len() * window as usize);
        for row in baseline {
            let affected = self.is_affected(&row.category_name);
            let curve = self.curve_for(&row.category_name);
            for (offset, multiplier) in (0..window).zip(curve) {
                let surge_demand = if affected {
                    row.projected_demand * multiplier
                } else {
                    row.projected_demand
                };
                points.push(PandemicScenarioPoint {
                    district_id: row.district_id.clone(),
                    year_offset: offset,
                    year: self.reference_year + offset as i32,
                    category_name: row.category_name.clone(),
                    baseline_demand: row.projected_demand,
                    multiplier,
                    surge_demand,
                });
            }
        }

        log::info!(
            "Pandemic scenario ({} curve, reference year {}): {} rows, {} affected categories",
            self.curve.name(),
            self.reference_year,
            points.len(),
            self.config.affected_categories.len()
        );
        Ok(points)
    }
}

/// Total surge demand at one offset across districts and categories
pub fn total_surge_demand(points: &[PandemicScenarioPoint], year_offset: u32) -> f64 {
    points
        .iter()
        .filter(|p| p.year_offset == year_offset)
        .map(|p| p.surge_demand)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(district: &str, category: &str, demand: f64) -> DemandForecastPoint {
        DemandForecastPoint {
            district_id: district.to_string(),
            year: 2025,
            category_name: category.to_string(),
            projected_population: 10_000.0,
            base_penetration: 0.1,
            demand_weight: 1.0,
            projected_demand: demand,
        }
    }

    fn config(affected: &[&str], shape: DecayShape) -> AnalyticsConfig {
        let mut config = AnalyticsConfig::default();
        config.pandemic.surge_multiplier = 2.0;
        config.pandemic.window_periods = 3;
        config.pandemic.peak_offset = Some(1);
        config.pandemic.decay_shape = shape;
        config.pandemic.affected_categories = affected.iter().map(|s| s.to_string()).collect();
        config
    }

    fn surge(points: &[PandemicScenarioPoint], category: &str) -> Vec<f64> {
        points
            .iter()
            .filter(|p| p.category_name == category)
            .map(|p| p.surge_demand)
            .collect()
    }

    #[test]
    fn test_monitoring_devices_linear_surge() {
        let sim = PandemicSimulator::new(&config(&["Monitoring Devices"], DecayShape::Linear));
        let points = sim.simulate(&[row("D1", "Monitoring Devices", 1_000.0)]).unwrap();

        let series = surge(&points, "Monitoring Devices");
        assert_eq!(series.len(), 3);
        assert_relative_eq!(series[1], 2_000.0);
        for t in [0, 2] {
            assert!(series[t] > 1_000.0 && series[t] < 2_000.0, "offset {} = {}", t, series[t]);
        }
    }

    #[test]
    fn test_monitoring_devices_exponential_surge() {
        let shape = DecayShape::Exponential { rate: std::f64::consts::LN_2 };
        let sim = PandemicSimulator::new(&config(&["Monitoring Devices"], shape));
        let points = sim.simulate(&[row("D1", "Monitoring Devices", 1_000.0)]).unwrap();

        let series = surge(&points, "Monitoring Devices");
        assert_relative_eq!(series[1], 2_000.0);
        assert_relative_eq!(series[0], 1_500.0, epsilon = 1e-9);
        assert_relative_eq!(series[2], 1_500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unaffected_categories_pass_through() {
        let sim = PandemicSimulator::new(&config(&["Monitoring Devices"], DecayShape::Linear));
        let points = sim
            .simulate(&[row("D1", "Monitoring Devices", 1_000.0), row("D1", "Mobility Aids", 1_530.0)])
            .unwrap();

        for p in points.iter().filter(|p| p.category_name == "Mobility Aids") {
            assert_eq!(p.surge_demand, 1_530.0);
            assert_eq!(p.multiplier, 1.0);
        }
        assert_eq!(points.len(), 6);
    }

    #[test]
    fn test_unknown_category_is_config_error() {
        let sim = PandemicSimulator::new(&config(&["Monitoring Devices", "Teleportation"], DecayShape::Linear));
        let err = sim.simulate(&[row("D1", "Monitoring Devices", 1_000.0)]).unwrap_err();
        match err {
            AnalyticsError::ScenarioConfig { unknown_categories } => {
                assert_eq!(unknown_categories, vec!["Teleportation".to_string()])
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_reference_year_without_rows_is_config_error() {
        let mut cfg = config(&["Monitoring Devices"], DecayShape::Linear);
        cfg.pandemic.reference_year = Some(2040);
        let sim = PandemicSimulator::new(&cfg);
        assert!(sim.simulate(&[row("D1", "Monitoring Devices", 1_000.0)]).is_err());
    }

    #[test]
    fn test_category_override_models_dip() {
        let mut cfg = config(&["Monitoring Devices", "Mobility Aids"], DecayShape::Linear);
        cfg.pandemic.category_multipliers.insert("Mobility Aids".to_string(), 0.5);
        let sim = PandemicSimulator::new(&cfg);
        let points = sim
            .simulate(&[row("D1", "Monitoring Devices", 1_000.0), row("D1", "Mobility Aids", 1_000.0)])
            .unwrap();

        let mobility = surge(&points, "Mobility Aids");
        assert_relative_eq!(mobility[1], 500.0);
        assert!(mobility[0] < 1_000.0 && mobility[0] > 500.0);
        assert_relative_eq!(surge(&points, "Monitoring Devices")[1], 2_000.0);
    }

    #[test]
    fn test_swapped_curve_and_years() {
        struct Flat;
        impl SurgeCurve for Flat {
            fn name(&self) -> &'static str {
                "flat"
            }
            fn multiplier(&self, _offset: u32, _peak: u32, _window: u32, peak_multiplier: f64) -> f64 {
                peak_multiplier
            }
        }

        let sim = PandemicSimulator::new(&config(&["Monitoring Devices"], DecayShape::Linear)).with_curve(Box::new(Flat));
        assert_eq!(sim.curve_name(), "flat");
        let points = sim.simulate(&[row("D1", "Monitoring Devices", 100.0)]).unwrap();

        let years: Vec<i32> = points.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2025, 2026, 2027]);
        assert_relative_eq!(total_surge_demand(&points, 0), 200.0);
    }

    #[test]
    fn test_linear_curve_peaks_at_first_and_last_offsets() {
        let curve = LinearSurge;
        assert_relative_eq!(curve.multiplier(0, 0, 4, 3.0), 3.0);
        assert!(curve.multiplier(3, 0, 4, 3.0) > 1.0);
        assert_relative_eq!(curve.multiplier(3, 3, 4, 3.0), 3.0);
        assert_relative_eq!(curve.multiplier(0, 3, 4, 3.0), 1.5);
    }
}
