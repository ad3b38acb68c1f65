//! Service gap scoring and district ranking
//!
//! gap_score = 100 × (w_pop × pop_norm + w_pen × (1 - min(penetration, 1)) + w_growth × growth_norm)
//!             / (w_pop + w_pen + w_growth)
//!
//! - pop_norm: baseline population / largest baseline population
//! - growth_norm: min-max scaled growth rate across districts (0 when unavailable or all equal)

use crate::config::GapScoreWeights;
use crate::district::DistrictRecord;
use crate::error::{RunWarning, WarningKind};
use crate::forecast::GrowthStrategy;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Ranked service gap for one district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceGapScore {
    pub district_id: String,
    /// Baseline-year elderly population
    pub elderly_population: u64,
    pub service_users: u64,
    pub penetration_rate: f64,
    pub growth_rate: Option<f64>,
    /// Higher = more underserved
    pub gap_score: f64,
    /// 1 = most underserved
    pub rank: usize,
}

/// Output of the gap analyzer
#[derive(Debug, Clone, Default)]
pub struct GapAnalysis {
    /// Sorted by rank
    pub scores: Vec<ServiceGapScore>,
    pub warnings: Vec<RunWarning>,
}

impl GapAnalysis {
    pub fn top(&self) -> Option<&ServiceGapScore> {
        self.scores.first()
    }

    pub fn get(&self, district_id: &str) -> Option<&ServiceGapScore> {
        self.scores.iter().find(|s| s.district_id == district_id)
    }
}

/// Service users / population, defined as 0 for an empty district
pub fn penetration_rate(service_users: u64, elderly_population: u64) -> f64 {
    if elderly_population == 0 {
        0.0
    } else {
        service_users as f64 / elderly_population as f64
    }
}

/// Scores and ranks districts by how underserved they are
#[derive(Debug, Clone)]
pub struct GapAnalyzer {
    weights: GapScoreWeights,
    growth_strategy: GrowthStrategy,
    baseline_year: Option<i32>,
}

impl GapAnalyzer {
    pub fn new(weights: GapScoreWeights, growth_strategy: GrowthStrategy, baseline_year: Option<i32>) -> Self {
        Self {
            weights,
            growth_strategy,
            baseline_year,
        }
    }

    pub fn analyze(&self, districts: &[DistrictRecord]) -> GapAnalysis {
        let mut warnings = Vec::new();

        let populations: Vec<u64> = districts
            .iter()
            .map(|d| {
                d.baseline(self.baseline_year)
                    .or_else(|| d.baseline(None))
                    .map(|(_, count)| count)
                    .unwrap_or(0)
            })
            .collect();

        let growth: Vec<Option<f64>> = districts
            .iter()
            .map(|d| self.growth_strategy.estimate(d).ok().map(|e| e.rate))
            .collect();

        let max_population = populations.iter().copied().max().unwrap_or(0);
        let (growth_min, growth_max) = growth.iter().flatten().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), &g| (lo.min(g), hi.max(g)),
        );

        let w = &self.weights;
        let weight_sum = w.population_weight + w.penetration_weight + w.growth_weight;

        let mut scores: Vec<ServiceGapScore> = districts
            .iter()
            .zip(populations.iter().zip(growth.iter()))
            .map(|(district, (&population, &growth_rate))| {
                if population == 0 {
                    warnings.push(RunWarning::new(
                        WarningKind::DivisionGuard,
                        &district.district_id,
                        "zero elderly population; penetration rate set to 0",
                    ));
                }
                let penetration = penetration_rate(district.service_users, population);

                let population_norm = if max_population > 0 {
                    population as f64 / max_population as f64
                } else {
                    0.0
                };
                let coverage_gap = 1.0 - penetration.min(1.0);
                let growth_norm = match growth_rate {
                    Some(g) if growth_max > growth_min => (g - growth_min) / (growth_max - growth_min),
                    _ => 0.0,
                };

                let gap_score = 100.0
                    * (w.population_weight * population_norm
                        + w.penetration_weight * coverage_gap
                        + w.growth_weight * growth_norm)
                    / weight_sum;

                ServiceGapScore {
                    district_id: district.district_id.clone(),
                    elderly_population: population,
                    service_users: district.service_users,
                    penetration_rate: penetration,
                    growth_rate,
                    gap_score,
                    rank: 0,
                }
            })
            .collect();

        scores.sort_by(rank_order);
        for (idx, score) in scores.iter_mut().enumerate() {
            score.rank = idx + 1;
        }

        if let Some(top) = scores.first() {
            log::info!(
                "Gap analysis: {} districts ranked, top priority {} (score {:.2})",
                scores.len(),
                top.district_id,
                top.gap_score
            );
        }

        GapAnalysis { scores, warnings }
    }
}

/// Score descending, then population descending, then id ascending
fn rank_order(a: &ServiceGapScore, b: &ServiceGapScore) -> Ordering {
    b.gap_score
        .total_cmp(&a.gap_score)
        .then_with(|| b.elderly_population.cmp(&a.elderly_population))
        .then_with(|| a.district_id.cmp(&b.district_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn analyzer() -> GapAnalyzer {
        GapAnalyzer::new(GapScoreWeights::default(), GrowthStrategy::Auto, None)
    }

    fn district(id: &str, population: u64, users: u64, growth: f64) -> DistrictRecord {
        DistrictRecord::new(id, users)
            .with_population(2024, population)
            .with_growth_rate(growth)
    }

    #[test]
    fn test_d1_penetration() {
        let analysis = analyzer().analyze(&[district("D1", 10_000, 1_000, 0.02)]);
        let d1 = analysis.get("D1").unwrap();
        assert_relative_eq!(d1.penetration_rate, 0.10);
        assert_eq!(d1.rank, 1);
        assert!(d1.gap_score.is_finite());
    }

    #[test]
    fn test_lower_coverage_ranks_higher() {
        let analysis = analyzer().analyze(&[
            district("Covered", 50_000, 10_000, 0.02),
            district("Neglected", 50_000, 500, 0.02),
        ]);
        assert_eq!(analysis.scores[0].district_id, "Neglected");
        assert_eq!(analysis.scores[1].rank, 2);
    }

    #[test]
    fn test_score_components() {
        let analysis = analyzer().analyze(&[
            district("Big", 100_000, 10_000, 0.05),
            district("Small", 50_000, 0, 0.01),
        ]);
        // Big: 0.4×1 + 0.4×0.9 + 0.2×1 = 0.96
        assert_relative_eq!(analysis.get("Big").unwrap().gap_score, 96.0, epsilon = 1e-9);
        // Small: 0.4×0.5 + 0.4×1 + 0.2×0 = 0.60
        assert_relative_eq!(analysis.get("Small").unwrap().gap_score, 60.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_population_guard() {
        let analysis = analyzer().analyze(&[
            district("Empty", 0, 25, 0.0),
            district("Full", 1_000, 100, 0.0),
        ]);
        let empty = analysis.get("Empty").unwrap();
        assert_eq!(empty.penetration_rate, 0.0);
        assert!(empty.gap_score.is_finite());
        assert_eq!(analysis.warnings.len(), 1);
        assert_eq!(analysis.warnings[0].kind, WarningKind::DivisionGuard);
    }

    #[test]
    fn test_ties_broken_by_population_then_id() {
        let weights = GapScoreWeights {
            population_weight: 0.0,
            penetration_weight: 1.0,
            growth_weight: 0.0,
        };
        let analyzer = GapAnalyzer::new(weights, GrowthStrategy::Auto, None);
        let analysis = analyzer.analyze(&[
            district("B", 1_000, 100, 0.0),
            district("C", 2_000, 200, 0.0),
            district("A", 1_000, 100, 0.0),
        ]);
        let order: Vec<&str> = analysis.scores.iter().map(|s| s.district_id.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let districts = vec![
            district("X", 70_000, 2_000, 0.03),
            district("Y", 70_000, 2_000, 0.03),
            district("Z", 35_000, 100, 0.06),
        ];
        let first = analyzer().analyze(&districts);
        let second = analyzer().analyze(&districts);
        assert_eq!(first.scores, second.scores);
    }
}
