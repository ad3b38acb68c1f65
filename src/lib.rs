//! Gerontech Forecast - service-gap analytics and equipment demand forecasting
//!
//! This library provides:
//! - District service-gap scoring and ranking
//! - Disease → equipment demand weights and overlooked conditions
//! - Elderly population projection with selectable growth strategies
//! - Equipment demand projection per district, year, and category
//! - Pandemic surge scenarios with swappable curve shapes
//! - Expansion and inventory priorities, supply gaps, and an outreach plan

pub mod error;
pub mod config;
pub mod district;
pub mod lookup;
pub mod analysis;
pub mod forecast;
pub mod recommend;
pub mod pipeline;
pub mod output;

// Re-export commonly used types
pub use error::{AnalyticsError, Result, RunWarning, WarningKind};
pub use config::AnalyticsConfig;
pub use district::{DistrictRecord, DiseaseRecord};
pub use lookup::{LookupTables, EquipmentCategory, UserPersona};
pub use analysis::{GapAnalyzer, DiseaseEquipmentMapper, ServiceGapScore, DiseaseEquipmentWeight};
pub use forecast::{PopulationForecaster, DemandForecaster, PandemicSimulator, GrowthStrategy, DecayShape};
pub use pipeline::{PipelineRunner, PipelineOutput, RunSummary};
