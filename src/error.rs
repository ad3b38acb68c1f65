//! Error and warning types for the analytics pipeline
//!
//! Two tiers:
//! - [`AnalyticsError`] for conditions that stop a run (or a whole stage)
//! - [`RunWarning`] for per-district / per-category problems that are recorded and skipped

use serde::Serialize;
use std::fmt;

/// Fatal error raised by loaders, configuration checks, or a failed stage
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// No district rows to analyse
    #[error("district table is empty")]
    EmptyDistrictTable,

    /// Configuration failed validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Lookup tables are inconsistent or unparseable
    #[error("invalid lookup table: {0}")]
    InvalidLookup(String),

    /// A cleaned input row could not be interpreted
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Pandemic scenario references categories missing from the baseline demand table
    #[error("pandemic scenario references categories absent from baseline demand: {}", unknown_categories.join(", "))]
    ScenarioConfig { unknown_categories: Vec<String> },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Category of a non-fatal condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// District excluded from forecasting (no baseline population or unusable growth rate)
    MissingBaselineData,
    /// Forecast year lies beyond the span supported by observed history
    ExtrapolationWarning,
    /// Top-N disease with no equipment link; routed to overlooked conditions
    UnmappedDisease,
    /// Zero elderly population; penetration rate defined as 0
    DivisionGuard,
    /// Pandemic scenario could not be generated
    ScenarioConfigError,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WarningKind::MissingBaselineData => "missing_baseline_data",
            WarningKind::ExtrapolationWarning => "extrapolation_warning",
            WarningKind::UnmappedDisease => "unmapped_disease",
            WarningKind::DivisionGuard => "division_guard",
            WarningKind::ScenarioConfigError => "scenario_config_error",
        };
        f.write_str(label)
    }
}

/// A recorded, non-fatal problem attached to one district, disease, or stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunWarning {
    pub kind: WarningKind,
    /// District id, disease name, or stage name the warning is about
    pub subject: String,
    pub message: String,
}

impl RunWarning {
    /// Build a warning and emit it on the `log` facade
    pub fn new(kind: WarningKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        let warning = Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        };
        log::warn!("[{}] {}: {}", warning.kind, warning.subject, warning.message);
        warning
    }
}
