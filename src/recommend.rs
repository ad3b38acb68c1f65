//! Planning recommendations built on top of the forecast tables
//!
//! expansion_score = gap_weight × gap_score
//!                 + size_weight × (end-year population / 1000)
//!                 + growth_weight × (growth_rate × 100)
//!
//! Supply gaps list items the leading causes of death call for that the
//! equipment catalogue does not cover. The outreach plan pairs the
//! highest-priority districts with a target persona and channel.

use crate::analysis::GapAnalysis;
use crate::config::{AnalyticsConfig, RecommendationConfig};
use crate::district::DiseaseRecord;
use crate::forecast::{DemandForecastPoint, PopulationForecast};
use crate::lookup::{normalize_name, LookupTables, UserPersona};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Action attached to every supply gap
pub const SOURCING_ACTION: &str = "Consider sourcing / procurement to cover demand for top diseases";

/// Success metric attached to every outreach action
pub const OUTREACH_METRIC: &str = "Rental conversions + assessments";

/// Persona used for districts without a specific pairing
pub const GENERAL_PERSONA: &str = "General Elderly";

/// Districts whose household mix points at a specific persona
const DISTRICT_PERSONAS: [(&str, &str); 8] = [
    ("Kwun Tong", "Solo Ager"),
    ("Wong Tai Sin", "Solo Ager"),
    ("Eastern", "Solo Ager"),
    ("Sha Tin", "Spousal Caregiver Couple"),
    ("Tuen Mun", "Spousal Caregiver Couple"),
    ("Kwai Tsing", "Spousal Caregiver Couple"),
    ("Yuen Long", "Multi-generational Family Caregiver"),
    ("North", "Multi-generational Family Caregiver"),
];

/// (channel, message) for a target persona
fn channel_for(persona: &str) -> (&'static str, &'static str) {
    match persona {
        "Solo Ager" => ("District Council elderly centres + door-to-door", "Stay independent, stay home"),
        "Spousal Caregiver Couple" => (
            "Hospital discharge referrals + caregiver support groups",
            "You care for them, we care for you",
        ),
        "Multi-generational Family Caregiver" => {
            ("Housing estate roadshows + school networks", "Make room for memories, not worry")
        }
        _ => ("Community health ambassadors", "Age in place with confidence"),
    }
}

/// A district recommended for service expansion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionPriority {
    pub rank: usize,
    pub district_id: String,
    pub gap_score: f64,
    pub start_year_population: f64,
    pub end_year_population: f64,
    pub growth_rate: f64,
    pub expansion_score: f64,
}

/// One stocking priority for a district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryPriority {
    pub district_id: String,
    pub year: i32,
    /// 1 = stock first
    pub priority: usize,
    pub category_name: String,
    pub projected_demand: f64,
}

/// An item needed for a leading cause of death that the catalogue lacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyGap {
    pub equipment_name: String,
    /// Causes that call for the item, in rank order
    pub required_by: Vec<String>,
    pub recommended_action: String,
}

/// Targeted outreach for one high-priority district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachAction {
    pub district_id: String,
    pub gap_rank: usize,
    pub target_persona: String,
    /// None for the general persona or a persona missing from the lookup table
    pub persona_id: Option<String>,
    pub channel: String,
    pub message: String,
    pub estimated_reach: u64,
    pub success_metric: String,
}

/// Turns gap scores and forecasts into expansion and inventory priorities
#[derive(Debug, Clone)]
pub struct Recommender {
    config: RecommendationConfig,
    start_year: i32,
    end_year: i32,
    reference_year: i32,
}

impl Recommender {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            config: config.recommendation,
            start_year: config.forecast_start_year,
            end_year: config.forecast_end_year,
            reference_year: config.pandemic_reference_year(),
        }
    }

    /// Top districts by expansion score; districts without a forecast are skipped
    pub fn expansion_priorities(&self, gaps: &GapAnalysis, population: &PopulationForecast) -> Vec<ExpansionPriority> {
        let c = &self.config;
        let mut priorities: Vec<ExpansionPriority> = gaps
            .scores
            .iter()
            .filter_map(|gap| {
                let end_year_population = population.value(&gap.district_id, self.end_year)?;
                let start_year_population = population.value(&gap.district_id, self.start_year)?;
                let growth_rate = population.growth_rate(&gap.district_id)?;
                let expansion_score = c.gap_weight * gap.gap_score
                    + c.size_weight * (end_year_population / 1000.0)
                    + c.growth_weight * (growth_rate * 100.0);
                Some(ExpansionPriority {
                    rank: 0,
                    district_id: gap.district_id.clone(),
                    gap_score: gap.gap_score,
                    start_year_population,
                    end_year_population,
                    growth_rate,
                    expansion_score,
                })
            })
            .collect();

        // Stable sort: equal scores keep gap-rank order
        priorities.sort_by(|a, b| b.expansion_score.total_cmp(&a.expansion_score));
        priorities.truncate(c.top_districts);
        for (idx, p) in priorities.iter_mut().enumerate() {
            p.rank = idx + 1;
        }

        if let Some(first) = priorities.first() {
            log::info!(
                "Expansion priorities: {} districts, first {} (score {:.1})",
                priorities.len(),
                first.district_id,
                first.expansion_score
            );
        }
        priorities
    }

    /// Highest-demand categories per district in the reference year
    pub fn inventory_priorities(&self, demand: &[DemandForecastPoint]) -> Vec<InventoryPriority> {
        let mut districts: Vec<(&str, Vec<&DemandForecastPoint>)> = Vec::new();
        for row in demand.iter().filter(|r| r.year == self.reference_year) {
            match districts.iter_mut().find(|(id, _)| *id == row.district_id) {
                Some((_, rows)) => rows.push(row),
                None => districts.push((row.district_id.as_str(), vec![row])),
            }
        }

        let mut plan = Vec::new();
        for (_, mut rows) in districts {
            // Stable: ties stay in category lookup order
            rows.sort_by(|a, b| b.projected_demand.total_cmp(&a.projected_demand));
            for (idx, row) in rows.into_iter().take(self.config.items_per_district).enumerate() {
                plan.push(InventoryPriority {
                    district_id: row.district_id.clone(),
                    year: row.year,
                    priority: idx + 1,
                    category_name: row.category_name.clone(),
                    projected_demand: row.projected_demand,
                });
            }
        }

        log::info!("Inventory priorities: {} rows for year {}", plan.len(), self.reference_year);
        plan
    }

    /// Items required by the top-ranked causes of death that no catalogue item
    /// provides, sorted by item name. Unmapped causes require nothing.
    pub fn supply_gaps(&self, diseases: &[DiseaseRecord], lookups: &LookupTables) -> Vec<SupplyGap> {
        let mut ranked: Vec<&DiseaseRecord> = diseases.iter().collect();
        ranked.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.disease_name.cmp(&b.disease_name)));

        let mut seen = BTreeSet::new();
        let mut missing: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for disease in ranked
            .into_iter()
            .filter(|d| seen.insert(normalize_name(&d.disease_name)))
            .take(self.config.supply_gap_diseases)
        {
            let Some(link) = lookups.matrix().find(&disease.disease_name) else {
                continue;
            };
            for item in &link.specific_equipment {
                if lookups.catalogue().provides(item).is_some() {
                    continue;
                }
                let required_by = missing.entry(item.as_str()).or_default();
                if !required_by.contains(&disease.disease_name) {
                    required_by.push(disease.disease_name.clone());
                }
            }
        }

        let gaps: Vec<SupplyGap> = missing
            .into_iter()
            .map(|(item, required_by)| SupplyGap {
                equipment_name: item.to_string(),
                required_by,
                recommended_action: SOURCING_ACTION.to_string(),
            })
            .collect();
        log::info!("Supply gaps: {} items not covered by the catalogue", gaps.len());
        gaps
    }

    /// Outreach for the top-third districts by gap rank, at most
    /// `outreach_districts` of them, in rank order
    pub fn outreach_plan(&self, gaps: &GapAnalysis, personas: &[UserPersona]) -> Vec<OutreachAction> {
        let high_priority = gaps.scores.len().div_ceil(3);
        let plan: Vec<OutreachAction> = gaps
            .scores
            .iter()
            .filter(|s| s.rank <= high_priority)
            .take(self.config.outreach_districts)
            .map(|score| {
                let target_persona = DISTRICT_PERSONAS
                    .iter()
                    .find(|(district, _)| *district == score.district_id)
                    .map_or(GENERAL_PERSONA, |(_, persona)| *persona);
                let (channel, message) = channel_for(target_persona);
                OutreachAction {
                    district_id: score.district_id.clone(),
                    gap_rank: score.rank,
                    target_persona: target_persona.to_string(),
                    persona_id: personas
                        .iter()
                        .find(|p| p.name == target_persona)
                        .map(|p| p.persona_id.clone()),
                    channel: channel.to_string(),
                    message: message.to_string(),
                    estimated_reach: (score.elderly_population as f64 * self.config.outreach_reach_fraction).floor()
                        as u64,
                    success_metric: OUTREACH_METRIC.to_string(),
                }
            })
            .collect();

        log::info!("Outreach plan: {} districts", plan.len());
        plan
    }
}
