//! Equipment demand projection
//!
//! projected_demand = projected_population × base_penetration × demand_weight

use super::population::{PopulationForecast, PopulationForecastPoint};
use crate::analysis::DiseaseMapping;
use crate::lookup::LookupTables;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Projected demand for one (district, year, category)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandForecastPoint {
    pub district_id: String,
    pub year: i32,
    pub category_name: String,
    pub projected_population: f64,
    pub base_penetration: f64,
    pub demand_weight: f64,
    pub projected_demand: f64,
}

/// Combines population projections with adoption rates and disease weights
pub struct DemandForecaster<'a> {
    lookups: &'a LookupTables,
    default_category_weight: f64,
}

impl<'a> DemandForecaster<'a> {
    pub fn new(lookups: &'a LookupTables, default_category_weight: f64) -> Self {
        Self {
            lookups,
            default_category_weight,
        }
    }

    /// Demand weight for a category, falling back to the neutral weight
    pub fn demand_weight(&self, mapping: &DiseaseMapping, category: &str) -> f64 {
        mapping
            .weight_for(category)
            .unwrap_or(self.default_category_weight)
    }

    /// One row per (district, year, category): districts in forecast order,
    /// years ascending, categories in lookup order
    pub fn forecast(&self, population: &PopulationForecast, mapping: &DiseaseMapping) -> Vec<DemandForecastPoint> {
        let weights: Vec<(&str, f64, f64)> = self
            .lookups
            .categories()
            .iter()
            .map(|c| {
                (
                    c.category_name.as_str(),
                    c.base_penetration,
                    self.demand_weight(mapping, &c.category_name),
                )
            })
            .collect();

        let groups = group_by_district(&population.points);

        let rows: Vec<DemandForecastPoint> = groups
            .par_iter()
            .map(|points| {
                let mut district_rows = Vec::with_capacity(points.len() * weights.len());
                for point in points {
                    for &(category, base_penetration, demand_weight) in &weights {
                        district_rows.push(DemandForecastPoint {
                            district_id: point.district_id.clone(),
                            year: point.year,
                            category_name: category.to_string(),
                            projected_population: point.projected_population,
                            base_penetration,
                            demand_weight,
                            projected_demand: point.projected_population * base_penetration * demand_weight,
                        });
                    }
                }
                district_rows
            })
            .flatten()
            .collect();

        log::info!(
            "Demand forecast: {} rows across {} districts and {} categories",
            rows.len(),
            groups.len(),
            weights.len()
        );
        rows
    }
}

/// Group points by district in first-appearance order, years ascending within each group
fn group_by_district(points: &[PopulationForecastPoint]) -> Vec<Vec<&PopulationForecastPoint>> {
    let mut groups: Vec<Vec<&PopulationForecastPoint>> = Vec::new();
    for point in points {
        match groups.iter_mut().find(|g| g[0].district_id == point.district_id) {
            Some(group) => group.push(point),
            None => groups.push(vec![point]),
        }
    }
    for group in &mut groups {
        group.sort_by_key(|p| p.year);
    }
    groups
}

/// Total projected demand in a year across districts and categories
pub fn total_demand(rows: &[DemandForecastPoint], year: i32) -> f64 {
    rows.iter()
        .filter(|r| r.year == year)
        .map(|r| r.projected_demand)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DiseaseEquipmentMapper;
    use crate::config::AnalyticsConfig;
    use crate::district::{DiseaseRecord, DistrictRecord};
    use crate::forecast::PopulationForecaster;
    use crate::lookup::{DiseaseEquipmentMatrix, EquipmentCategory};
    use approx::assert_relative_eq;

    fn lookups() -> LookupTables {
        let mut matrix = DiseaseEquipmentMatrix::default();
        matrix.link("Stroke", "Hemiplegia", "Mobility Aids");
        matrix.link("Stroke", "Hemiplegia", "Beds & Transfer");
        LookupTables::new(
            vec![
                EquipmentCategory::new("Mobility Aids", 0.3),
                EquipmentCategory::new("Beds & Transfer", 0.08),
                EquipmentCategory::new("Monitoring Devices", 0.1),
            ],
            matrix,
            vec![],
        )
        .unwrap()
    }

    fn population(districts: &[DistrictRecord]) -> PopulationForecast {
        let config = AnalyticsConfig {
            forecast_start_year: 2025,
            forecast_end_year: 2026,
            ..AnalyticsConfig::default()
        };
        PopulationForecaster::new(&config).forecast(districts)
    }

    #[test]
    fn test_stroke_mobility_demand() {
        let tables = lookups();
        let mapping = DiseaseEquipmentMapper::new(&tables, 1.0).map(&[DiseaseRecord::new("Stroke", 3_000, 1)]);
        let pop = population(&[DistrictRecord::new("D1", 1_000)
            .with_population(2024, 10_000)
            .with_growth_rate(0.02)]);

        let rows = DemandForecaster::new(&tables, 1.0).forecast(&pop, &mapping);
        let mobility = rows
            .iter()
            .find(|r| r.district_id == "D1" && r.year == 2025 && r.category_name == "Mobility Aids")
            .unwrap();

        assert_eq!(mobility.projected_population, 10_200.0);
        assert_eq!(mobility.demand_weight, 0.5);
        assert_relative_eq!(mobility.projected_demand, 1_530.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unlinked_category_gets_neutral_weight() {
        let tables = lookups();
        let mapping = DiseaseEquipmentMapper::new(&tables, 1.0).map(&[DiseaseRecord::new("Stroke", 3_000, 1)]);
        let pop = population(&[DistrictRecord::new("D1", 0).with_population(2024, 10_000).with_growth_rate(0.0)]);

        let rows = DemandForecaster::new(&tables, 1.0).forecast(&pop, &mapping);
        let monitoring = rows.iter().find(|r| r.category_name == "Monitoring Devices").unwrap();
        assert_eq!(monitoring.demand_weight, 1.0);
        assert_relative_eq!(monitoring.projected_demand, 1_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_product_identity_holds_exactly() {
        let tables = lookups();
        let mapping = DiseaseEquipmentMapper::new(&tables, 1.0).map(&[DiseaseRecord::new("Stroke", 3_000, 1)]);
        let pop = population(&[
            DistrictRecord::new("A", 0).with_population(2024, 33_333).with_growth_rate(0.017),
            DistrictRecord::new("B", 0).with_population(2024, 71_001).with_growth_rate(-0.004),
        ]);
        let forecaster = DemandForecaster::new(&tables, 0.75);
        let rows = forecaster.forecast(&pop, &mapping);

        assert_eq!(rows.len(), 2 * 2 * 3);
        for row in &rows {
            let population = pop.value(&row.district_id, row.year).unwrap();
            let category = tables.category(&row.category_name).unwrap();
            let weight = forecaster.demand_weight(&mapping, &row.category_name);
            assert_eq!(row.projected_demand, population * category.base_penetration * weight);
            assert!(row.projected_demand >= 0.0);
        }
    }

    #[test]
    fn test_row_order() {
        let tables = lookups();
        let mapping = DiseaseMapping::default();
        let pop = population(&[
            DistrictRecord::new("Zeta", 0).with_population(2024, 100).with_growth_rate(0.0),
            DistrictRecord::new("Alpha", 0).with_population(2024, 100).with_growth_rate(0.0),
        ]);
        let rows = DemandForecaster::new(&tables, 1.0).forecast(&pop, &mapping);

        let keys: Vec<(&str, i32, &str)> = rows
            .iter()
            .take(4)
            .map(|r| (r.district_id.as_str(), r.year, r.category_name.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Zeta", 2025, "Mobility Aids"),
                ("Zeta", 2025, "Beds & Transfer"),
                ("Zeta", 2025, "Monitoring Devices"),
                ("Zeta", 2026, "Mobility Aids"),
            ]
        );
        assert_eq!(rows[6].district_id, "Alpha");
        assert_relative_eq!(total_demand(&rows, 2025), 2.0 * 100.0 * (0.3 + 0.08 + 0.1), epsilon = 1e-9);
    }
}
