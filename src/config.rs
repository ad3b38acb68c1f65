//! Run configuration: forecast horizon, scoring weights, growth strategy, pandemic scenario
//!
//! Every field carries a default, so `{}` is a complete configuration file.

use crate::error::{AnalyticsError, Result};
use crate::forecast::{DecayShape, GrowthStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Default first forecast year
pub const DEFAULT_FORECAST_START_YEAR: i32 = 2025;
/// Default last forecast year (inclusive)
pub const DEFAULT_FORECAST_END_YEAR: i32 = 2030;

/// Top-level configuration for a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyticsConfig {
    #[serde(default = "default_start_year")]
    pub forecast_start_year: i32,

    #[serde(default = "default_end_year")]
    pub forecast_end_year: i32,

    /// Year the compound projection is anchored on.
    /// None = each district's latest observed year
    #[serde(default)]
    pub baseline_year: Option<i32>,

    #[serde(default)]
    pub growth_strategy: GrowthStrategy,

    /// Years past the last observation before a point is flagged low-confidence.
    /// None = the number of observed years
    #[serde(default)]
    pub extrapolation_limit_years: Option<u32>,

    #[serde(default)]
    pub gap_score_weights: GapScoreWeights,

    /// Total that disease demand weights are normalized to
    #[serde(default = "default_one")]
    pub weight_normalization_total: f64,

    /// Demand weight for categories not linked to any top-N disease
    #[serde(default = "default_one")]
    pub default_category_weight: f64,

    #[serde(default)]
    pub pandemic: PandemicConfig,

    #[serde(default)]
    pub recommendation: RecommendationConfig,
}

fn default_start_year() -> i32 { DEFAULT_FORECAST_START_YEAR }
fn default_end_year() -> i32 { DEFAULT_FORECAST_END_YEAR }
fn default_one() -> f64 { 1.0 }

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            forecast_start_year: DEFAULT_FORECAST_START_YEAR,
            forecast_end_year: DEFAULT_FORECAST_END_YEAR,
            baseline_year: None,
            growth_strategy: GrowthStrategy::default(),
            extrapolation_limit_years: None,
            gap_score_weights: GapScoreWeights::default(),
            weight_normalization_total: 1.0,
            default_category_weight: 1.0,
            pandemic: PandemicConfig::default(),
            recommendation: RecommendationConfig::default(),
        }
    }
}

/// Weights of the three gap-score components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GapScoreWeights {
    /// Normalized elderly population size
    pub population_weight: f64,
    /// One minus penetration rate
    pub penetration_weight: f64,
    /// Normalized growth rate (faster growth = less stable coverage)
    pub growth_weight: f64,
}

impl Default for GapScoreWeights {
    fn default() -> Self {
        Self {
            population_weight: 0.4,
            penetration_weight: 0.4,
            growth_weight: 0.2,
        }
    }
}

/// Pandemic surge scenario parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PandemicConfig {
    /// Peak multiplier applied to affected categories
    pub surge_multiplier: f64,
    /// Number of periods in the surge window (offsets 0..window_periods)
    pub window_periods: u32,
    /// Offset at which the curve peaks. None = window_periods / 2
    pub peak_offset: Option<u32>,
    pub decay_shape: DecayShape,
    pub affected_categories: Vec<String>,
    /// Baseline demand year. None = forecast_start_year
    pub reference_year: Option<i32>,
    /// Per-category peak overrides; every key must also be an affected category
    pub category_multipliers: BTreeMap<String, f64>,
}

impl Default for PandemicConfig {
    fn default() -> Self {
        Self {
            surge_multiplier: 2.0,
            window_periods: 3,
            peak_offset: None,
            decay_shape: DecayShape::Linear,
            affected_categories: Vec::new(),
            reference_year: None,
            category_multipliers: BTreeMap::new(),
        }
    }
}

impl PandemicConfig {
    /// Resolved peak offset
    pub fn peak(&self) -> u32 {
        self.peak_offset.unwrap_or(self.window_periods / 2)
    }

    /// Peak multiplier for a category, honouring per-category overrides
    pub fn peak_multiplier(&self, category: &str) -> f64 {
        self.category_multipliers
            .get(category)
            .copied()
            .unwrap_or(self.surge_multiplier)
    }
}

/// Weights for ranking expansion priorities, list lengths, and outreach reach
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecommendationConfig {
    pub gap_weight: f64,
    pub size_weight: f64,
    pub growth_weight: f64,
    pub top_districts: usize,
    pub items_per_district: usize,
    /// Top-ranked causes of death checked against the equipment catalogue
    pub supply_gap_diseases: usize,
    /// Maximum districts in the outreach plan
    pub outreach_districts: usize,
    /// Share of a district's elderly population an outreach campaign reaches
    pub outreach_reach_fraction: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            gap_weight: 0.4,
            size_weight: 0.3,
            growth_weight: 0.3,
            top_districts: 5,
            items_per_district: 3,
            supply_gap_diseases: 10,
            outreach_districts: 3,
            outreach_reach_fraction: 0.3,
        }
    }
}

impl AnalyticsConfig {
    /// Load configuration from a JSON file and validate it
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON string and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Inclusive list of forecast years
    pub fn forecast_years(&self) -> Vec<i32> {
        (self.forecast_start_year..=self.forecast_end_year).collect()
    }

    /// Year whose baseline demand feeds the pandemic scenario
    pub fn pandemic_reference_year(&self) -> i32 {
        self.pandemic.reference_year.unwrap_or(self.forecast_start_year)
    }

    /// Check structural consistency
    pub fn validate(&self) -> Result<()> {
        if self.forecast_start_year > self.forecast_end_year {
            return Err(invalid(format!(
                "forecast_start_year {} is after forecast_end_year {}",
                self.forecast_start_year, self.forecast_end_year
            )));
        }

        let w = &self.gap_score_weights;
        for (name, value) in [
            ("population_weight", w.population_weight),
            ("penetration_weight", w.penetration_weight),
            ("growth_weight", w.growth_weight),
        ] {
            check_non_negative(name, value)?;
        }
        if w.population_weight + w.penetration_weight + w.growth_weight <= 0.0 {
            return Err(invalid("gap_score_weights are all zero".to_string()));
        }

        if !(self.weight_normalization_total.is_finite() && self.weight_normalization_total > 0.0) {
            return Err(invalid(format!(
                "weight_normalization_total must be positive, got {}",
                self.weight_normalization_total
            )));
        }
        check_non_negative("default_category_weight", self.default_category_weight)?;

        let p = &self.pandemic;
        if p.window_periods == 0 {
            return Err(invalid("pandemic.window_periods must be at least 1".to_string()));
        }
        if p.peak() >= p.window_periods {
            return Err(invalid(format!(
                "pandemic.peak_offset {} outside window of {} periods",
                p.peak(),
                p.window_periods
            )));
        }
        check_positive("pandemic.surge_multiplier", p.surge_multiplier)?;
        for (category, multiplier) in &p.category_multipliers {
            check_positive(&format!("pandemic.category_multipliers[{}]", category), *multiplier)?;
            if !p.affected_categories.contains(category) {
                return Err(invalid(format!(
                    "pandemic.category_multipliers names {}, which is not in affected_categories",
                    category
                )));
            }
        }
        if let DecayShape::Exponential { rate } = p.decay_shape {
            check_positive("pandemic.decay_shape.exponential.rate", rate)?;
        }

        let r = &self.recommendation;
        for (name, value) in [
            ("recommendation.gap_weight", r.gap_weight),
            ("recommendation.size_weight", r.size_weight),
            ("recommendation.growth_weight", r.growth_weight),
        ] {
            check_non_negative(name, value)?;
        }
        if !(0.0..=1.0).contains(&r.outreach_reach_fraction) {
            return Err(invalid(format!(
                "recommendation.outreach_reach_fraction must be within [0, 1], got {}",
                r.outreach_reach_fraction
            )));
        }

        Ok(())
    }
}

fn invalid(message: String) -> AnalyticsError {
    AnalyticsError::InvalidConfig(message)
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} must be finite and non-negative, got {}", name, value)))
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} must be finite and positive, got {}", name, value)))
    }
}
