//! Static user personas used to enrich planning output

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A planning persona; not derived from district data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPersona {
    pub persona_id: String,
    pub name: String,
    /// Ordered, most pressing first
    pub pain_points: Vec<String>,
    /// Equipment category names
    pub equipment_needs: BTreeSet<String>,
}

impl UserPersona {
    pub fn new(persona_id: &str, name: &str, pain_points: &[&str], equipment_needs: &[&str]) -> Self {
        Self {
            persona_id: persona_id.to_string(),
            name: name.to_string(),
            pain_points: pain_points.iter().map(|s| s.to_string()).collect(),
            equipment_needs: equipment_needs.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Built-in persona set
pub fn default_personas() -> Vec<UserPersona> {
    vec![
        UserPersona::new(
            "P1",
            "Solo Ager",
            &["Fall risk", "Forgetfulness", "No caregiver"],
            &["Monitoring", "Bathroom Safety", "Cognitive Support"],
        ),
        UserPersona::new(
            "P2",
            "Spousal Caregiver Couple",
            &["Physical strain", "Sleep disruption", "Transfer difficulty"],
            &["Beds & Transfer", "Bathroom Safety"],
        ),
        UserPersona::new(
            "P3",
            "Multi-generational Family Caregiver",
            &["Space constraints", "Noise at night", "Stairs"],
            &["Beds & Transfer", "Mobility - Walkers", "Bathroom Safety"],
        ),
        UserPersona::new(
            "P4",
            "Tech-Savvy Pre-Elderly",
            &["Future planning", "Prevention", "Smart home"],
            &["Monitoring", "Exercise"],
        ),
        UserPersona::new(
            "P5",
            "Frail Elderly - High Dependency",
            &["Bedsores", "Incontinence", "24/7 care"],
            &["Beds & Transfer", "Daily Living"],
        ),
        UserPersona::new(
            "P6",
            "Community-dwelling with Chronic Disease",
            &["Disease management", "Mobility", "Medication"],
            &["Respiratory", "Mobility - Wheelchairs", "Cognitive Support"],
        ),
    ]
}
