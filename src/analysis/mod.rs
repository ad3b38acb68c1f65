//! Insight tables derived directly from the cleaned inputs

mod gap;
mod disease;

pub use gap::{penetration_rate, GapAnalysis, GapAnalyzer, ServiceGapScore};
pub use disease::{DiseaseEquipmentMapper, DiseaseEquipmentWeight, DiseaseMapping, OverlookedCondition};
