//! Disease → equipment demand weights
//!
//! Each top-N cause of death contributes 1 / rank to every equipment category
//! it is linked to. Category totals are then scaled to sum to the configured
//! normalization total. Causes with no matrix entry become overlooked conditions.
//! A cause listed more than once counts only at its best rank.

use crate::district::DiseaseRecord;
use crate::error::{RunWarning, WarningKind};
use crate::lookup::{normalize_name, LookupTables};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Normalized disease-driven need for one equipment category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseEquipmentWeight {
    pub category_name: String,
    pub demand_weight: f64,
    /// Sum of inverse ranks before normalization
    pub raw_score: f64,
    /// Causes that contributed, in rank order
    pub contributing_diseases: Vec<String>,
}

/// A ranked cause of death with no equipment category in the matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlookedCondition {
    pub disease_name: String,
    pub death_count: u64,
    pub rank: u32,
}

/// Output of the mapper
#[derive(Debug, Clone, Default)]
pub struct DiseaseMapping {
    /// Categories with a positive weight, in lookup order
    pub weights: Vec<DiseaseEquipmentWeight>,
    pub overlooked: Vec<OverlookedCondition>,
    pub warnings: Vec<RunWarning>,
}

impl DiseaseMapping {
    pub fn weight_for(&self, category: &str) -> Option<f64> {
        self.weights
            .iter()
            .find(|w| w.category_name == category)
            .map(|w| w.demand_weight)
    }

    /// Sum of all demand weights
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().map(|w| w.demand_weight).sum()
    }
}

/// Joins ranked causes of death with the static matrix
pub struct DiseaseEquipmentMapper<'a> {
    lookups: &'a LookupTables,
    normalization_total: f64,
}

impl<'a> DiseaseEquipmentMapper<'a> {
    pub fn new(lookups: &'a LookupTables, normalization_total: f64) -> Self {
        Self {
            lookups,
            normalization_total,
        }
    }

    pub fn map(&self, diseases: &[DiseaseRecord]) -> DiseaseMapping {
        let mut ranked: Vec<&DiseaseRecord> = diseases.iter().collect();
        ranked.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.disease_name.cmp(&b.disease_name)));

        let mut mapping = DiseaseMapping::default();
        let mut scores: BTreeMap<&str, (f64, Vec<String>)> = BTreeMap::new();
        let mut seen = BTreeSet::new();

        for disease in ranked {
            if !seen.insert(normalize_name(&disease.disease_name)) {
                log::debug!("Skipping repeated cause {} at rank {}", disease.disease_name, disease.rank);
                continue;
            }
            let Some(link) = self.lookups.matrix().find(&disease.disease_name) else {
                mapping.warnings.push(RunWarning::new(
                    WarningKind::UnmappedDisease,
                    &disease.disease_name,
                    format!("rank {} cause has no equipment category; listed as overlooked", disease.rank),
                ));
                mapping.overlooked.push(OverlookedCondition {
                    disease_name: disease.disease_name.clone(),
                    death_count: disease.death_count,
                    rank: disease.rank,
                });
                continue;
            };

            let contribution = 1.0 / disease.rank.max(1) as f64;
            for category in &link.categories {
                let entry = scores.entry(category.as_str()).or_insert((0.0, Vec::new()));
                entry.0 += contribution;
                entry.1.push(disease.disease_name.clone());
            }
        }

        let total: f64 = scores.values().map(|(score, _)| score).sum();
        if total > 0.0 {
            for category in self.lookups.categories() {
                if let Some((raw_score, contributors)) = scores.remove(category.category_name.as_str()) {
                    mapping.weights.push(DiseaseEquipmentWeight {
                        category_name: category.category_name.clone(),
                        demand_weight: raw_score / total * self.normalization_total,
                        raw_score,
                        contributing_diseases: contributors,
                    });
                }
            }
        }

        log::info!(
            "Disease mapping: {} weighted categories, {} overlooked conditions",
            mapping.weights.len(),
            mapping.overlooked.len()
        );
        mapping
    }
}
