//! District and cause-of-death records as supplied by the cleaning stage

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One district row: elderly population history, current enrolment, optional growth rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictRecord {
    /// Unique district identifier
    pub district_id: String,

    /// Elderly (65+) population by calendar year
    pub elderly_population: BTreeMap<i32, u64>,

    /// Elderly residents currently enrolled in the rental service
    pub service_users: u64,

    /// Annual fractional growth rate, if supplied directly
    pub growth_rate: Option<f64>,
}

impl DistrictRecord {
    pub fn new(district_id: impl Into<String>, service_users: u64) -> Self {
        Self {
            district_id: district_id.into(),
            elderly_population: BTreeMap::new(),
            service_users,
            growth_rate: None,
        }
    }

    /// Builder-style helper to add one year of population history
    pub fn with_population(mut self, year: i32, count: u64) -> Self {
        self.elderly_population.insert(year, count);
        self
    }

    /// Builder-style helper to set an explicit growth rate
    pub fn with_growth_rate(mut self, rate: f64) -> Self {
        self.growth_rate = Some(rate);
        self
    }

    /// Earliest and latest observed years
    pub fn observed_span(&self) -> Option<(i32, i32)> {
        let first = *self.elderly_population.keys().next()?;
        let last = *self.elderly_population.keys().next_back()?;
        Some((first, last))
    }

    /// Latest observed year
    pub fn latest_year(&self) -> Option<i32> {
        self.elderly_population.keys().next_back().copied()
    }

    /// Population for a given year, if observed
    pub fn population_in(&self, year: i32) -> Option<u64> {
        self.elderly_population.get(&year).copied()
    }

    /// Baseline (year, population) for projection.
    ///
    /// With an explicit baseline year the district must have that year observed;
    /// otherwise the latest observed year is used.
    pub fn baseline(&self, baseline_year: Option<i32>) -> Option<(i32, u64)> {
        match baseline_year {
            Some(year) => self.population_in(year).map(|count| (year, count)),
            None => self
                .elderly_population
                .iter()
                .next_back()
                .map(|(&year, &count)| (year, count)),
        }
    }

    /// Observed history as (year, population) pairs in ascending year order
    pub fn history(&self) -> Vec<(i32, f64)> {
        self.elderly_population
            .iter()
            .map(|(&year, &count)| (year, count as f64))
            .collect()
    }
}

/// A ranked leading cause of death
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseRecord {
    pub disease_name: String,
    pub death_count: u64,
    /// 1 = leading cause
    pub rank: u32,
}

impl DiseaseRecord {
    pub fn new(disease_name: impl Into<String>, death_count: u64, rank: u32) -> Self {
        Self {
            disease_name: disease_name.into(),
            death_count,
            rank,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DistrictRecord {
        DistrictRecord::new("Kwun Tong", 4_200)
            .with_population(2019, 126_900)
            .with_population(2024, 159_600)
            .with_population(2022, 148_800)
    }

    #[test]
    fn test_span_and_latest() {
        let d = sample();
        assert_eq!(d.observed_span(), Some((2019, 2024)));
        assert_eq!(d.latest_year(), Some(2024));
        assert_eq!(d.history().first(), Some(&(2019, 126_900.0)));
    }

    #[test]
    fn test_baseline_selection() {
        let d = sample();
        assert_eq!(d.baseline(None), Some((2024, 159_600)));
        assert_eq!(d.baseline(Some(2022)), Some((2022, 148_800)));
        assert_eq!(d.baseline(Some(2023)), None);
    }

    #[test]
    fn test_empty_history() {
        let d = DistrictRecord::new("Islands", 0);
        assert_eq!(d.observed_span(), None);
        assert_eq!(d.baseline(None), None);
    }
}
