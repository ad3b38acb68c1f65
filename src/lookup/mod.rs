//! Static reference tables: equipment categories, disease → equipment matrix, personas
//!
//! Loaded once per process and passed by reference to each component.

mod equipment;
mod persona;
pub mod loader;

pub use equipment::{normalize_name, DiseaseEquipmentMatrix, DiseaseLink, EquipmentCatalogue, EquipmentCategory};
pub use persona::{default_personas, UserPersona};
pub use loader::LoadedLookups;

use crate::error::{AnalyticsError, Result};
use std::collections::BTreeSet;
use std::path::Path;

/// Container for all validated lookup tables
#[derive(Debug, Clone)]
pub struct LookupTables {
    categories: Vec<EquipmentCategory>,
    matrix: DiseaseEquipmentMatrix,
    personas: Vec<UserPersona>,
    catalogue: EquipmentCatalogue,
}

/// Items supplied by the rental programme in the reference dataset
const DEFAULT_CATALOGUE: [&str; 21] = [
    "Hospital Electric Bed",
    "Powered mattress",
    "Mattress with special function",
    "Seat Cushion",
    "Safety Bed rail",
    "Supporting Grip",
    "Portable toilet frame",
    "Auto-wrapping commode",
    "Shower commode chair",
    "Rotary shower chair",
    "Robotic assist walker",
    "Rollator wheelchair",
    "Exoskeleton",
    "Wheelchair with recliner function",
    "Power wheelchair",
    "Hearing aids",
    "Bone conduction hearing aids",
    "Foldable hoist",
    "Assembled Ramp",
    "Fall prevention package",
    "Portable hair washing machine",
];

impl LookupTables {
    /// Validate the tables and fill each category's linked diseases
    pub fn new(
        mut categories: Vec<EquipmentCategory>,
        matrix: DiseaseEquipmentMatrix,
        personas: Vec<UserPersona>,
    ) -> Result<Self> {
        if categories.is_empty() {
            return Err(AnalyticsError::InvalidLookup("no equipment categories".to_string()));
        }

        let mut names = BTreeSet::new();
        for category in &categories {
            if !names.insert(category.category_name.clone()) {
                return Err(AnalyticsError::InvalidLookup(format!(
                    "duplicate equipment category {}",
                    category.category_name
                )));
            }
            let p = category.base_penetration;
            if !(p.is_finite() && (0.0..=1.0).contains(&p)) {
                return Err(AnalyticsError::InvalidLookup(format!(
                    "base_penetration for {} must be within [0, 1], got {}",
                    category.category_name, p
                )));
            }
        }

        for link in matrix.entries() {
            for category in &link.categories {
                if !names.contains(category) {
                    return Err(AnalyticsError::InvalidLookup(format!(
                        "disease {} links to unknown category {}",
                        link.disease_name, category
                    )));
                }
            }
        }

        let mut persona_ids = BTreeSet::new();
        for persona in &personas {
            if !persona_ids.insert(persona.persona_id.as_str()) {
                return Err(AnalyticsError::InvalidLookup(format!(
                    "duplicate persona id {}",
                    persona.persona_id
                )));
            }
            if let Some(unknown) = persona.equipment_needs.iter().find(|n| !names.contains(*n)) {
                return Err(AnalyticsError::InvalidLookup(format!(
                    "persona {} needs unknown category {}",
                    persona.persona_id, unknown
                )));
            }
        }

        for category in &mut categories {
            category.linked_diseases = matrix
                .entries()
                .iter()
                .filter(|link| link.categories.contains(&category.category_name))
                .map(|link| link.disease_name.clone())
                .collect();
        }

        Ok(Self {
            categories,
            matrix,
            personas,
            catalogue: EquipmentCatalogue::default(),
        })
    }

    /// Attach the catalogue of items the programme supplies
    pub fn with_catalogue(mut self, catalogue: EquipmentCatalogue) -> Self {
        self.catalogue = catalogue;
        self
    }

    /// Built-in tables matching the reference dataset
    pub fn default_tables() -> Result<Self> {
        let categories = vec![
            EquipmentCategory::new("Mobility - Wheelchairs", 0.12),
            EquipmentCategory::new("Mobility - Walkers", 0.15),
            EquipmentCategory::new("Bathroom Safety", 0.18),
            EquipmentCategory::new("Beds & Transfer", 0.08),
            EquipmentCategory::new("Monitoring", 0.10),
            EquipmentCategory::new("Respiratory", 0.06),
            EquipmentCategory::new("Daily Living", 0.05),
            EquipmentCategory::new("Exercise", 0.04),
            EquipmentCategory::new("Cognitive Support", 0.07),
        ];

        let mut matrix = DiseaseEquipmentMatrix::default();
        let rows: [(&str, &str, [&str; 2], &[&str]); 12] = [
            ("Cerebrovascular diseases (Stroke)", "Hemiplegia, paralysis, speech difficulty", ["Mobility - Wheelchairs", "Beds & Transfer"],
                &["Wheelchair", "transfer board", "shower chair", "hospital bed"]),
            ("Dementia", "Memory loss, wandering, confusion", ["Cognitive Support", "Monitoring"],
                &["GPS tracker", "medication dispenser", "sensor mat", "automatic lights"]),
            ("Chronic lower respiratory diseases", "Breathlessness, low stamina", ["Respiratory", "Monitoring"],
                &["Oxygen concentrator", "pulse oximeter", "nebulizer"]),
            ("Diabetes mellitus", "Neuropathy, foot ulcers, vision problems", ["Daily Living", "Bathroom Safety"],
                &["Long-handled sponge", "diabetic shoes", "grab bars"]),
            ("Malignant neoplasms (Cancer)", "General frailty, pain, fatigue", ["Beds & Transfer", "Daily Living"],
                &["Hospital bed", "patient lift", "commode", "reacher"]),
            ("Diseases of heart", "Cardiac insufficiency, chest pain", ["Monitoring", "Beds & Transfer"],
                &["Blood pressure monitor", "fall detector", "hospital bed"]),
            ("Pneumonia", "Respiratory distress, hypoxia", ["Respiratory", "Monitoring"],
                &["Oxygen concentrator", "CPAP", "suction machine"]),
            ("Arthrosis", "Joint stiffness, pain, reduced mobility", ["Mobility - Walkers", "Bathroom Safety"],
                &["Rollator walker", "raised toilet seat", "bath board"]),
            ("Rheumatoid arthritis", "Joint deformity, pain, limited grip", ["Daily Living", "Exercise"],
                &["Adaptive utensils", "jar opener", "therapy putty"]),
            ("Fracture of femur", "Immobility, fall recovery", ["Mobility - Walkers", "Bathroom Safety"],
                &["Walker", "shower chair", "raised toilet seat", "bed rail"]),
            ("Parkinson's disease", "Tremor, rigidity, bradykinesia", ["Daily Living", "Mobility - Walkers"],
                &["Utensils with grip", "walker", "bathroom grab bars"]),
            ("Septicaemia", "Systemic infection, sepsis", ["Monitoring", "Beds & Transfer"],
                &["Patient monitor", "hospital bed", "pulse oximeter"]),
        ];
        for (disease, impairment, linked, items) in rows {
            for category in linked {
                matrix.link(disease, impairment, category);
            }
            for item in items {
                matrix.add_equipment(disease, item);
            }
        }

        Ok(Self::new(categories, matrix, default_personas())?
            .with_catalogue(EquipmentCatalogue::new(DEFAULT_CATALOGUE)))
    }

    /// Load lookup tables from CSV files in the default location (data/lookups/)
    pub fn from_csv() -> Result<Self> {
        Self::from_csv_path(Path::new(loader::DEFAULT_LOOKUP_PATH))
    }

    /// Load lookup tables from CSV files in a specific directory
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let loaded = LoadedLookups::load_from(path)?;
        Ok(Self::new(loaded.categories, loaded.matrix, loaded.personas)?.with_catalogue(loaded.catalogue))
    }

    /// Categories in lookup order
    pub fn categories(&self) -> &[EquipmentCategory] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&EquipmentCategory> {
        self.categories.iter().find(|c| c.category_name == name)
    }

    pub fn matrix(&self) -> &DiseaseEquipmentMatrix {
        &self.matrix
    }

    pub fn personas(&self) -> &[UserPersona] {
        &self.personas
    }

    pub fn catalogue(&self) -> &EquipmentCatalogue {
        &self.catalogue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_link_diseases() {
        let tables = LookupTables::default_tables().unwrap();
        assert_eq!(tables.categories().len(), 9);

        let respiratory = tables.category("Respiratory").unwrap();
        assert!(respiratory.linked_diseases.contains("Pneumonia"));
        assert!(respiratory.linked_diseases.contains("Chronic lower respiratory diseases"));
        assert_eq!(respiratory.linked_diseases.len(), 2);
    }

    #[test]
    fn test_csv_matches_builtin_categories() {
        let from_csv = LookupTables::from_csv().expect("Failed to load lookups");
        let builtin = LookupTables::default_tables().unwrap();
        assert_eq!(from_csv.categories(), builtin.categories());
        assert_eq!(from_csv.personas(), builtin.personas());
        assert_eq!(from_csv.matrix(), builtin.matrix());
        assert_eq!(from_csv.catalogue(), builtin.catalogue());
        assert_eq!(builtin.catalogue().items().len(), 21);
    }

    #[test]
    fn test_rejects_unknown_matrix_category() {
        let mut matrix = DiseaseEquipmentMatrix::default();
        matrix.link("Stroke", "", "Hoists");
        let err = LookupTables::new(vec![EquipmentCategory::new("Monitoring", 0.1)], matrix, vec![])
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidLookup(_)));
    }

    #[test]
    fn test_rejects_penetration_out_of_range() {
        let result = LookupTables::new(
            vec![EquipmentCategory::new("Monitoring", 1.5)],
            DiseaseEquipmentMatrix::default(),
            vec![],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_duplicate_category() {
        let result = LookupTables::new(
            vec![
                EquipmentCategory::new("Monitoring", 0.1),
                EquipmentCategory::new("Monitoring", 0.2),
            ],
            DiseaseEquipmentMatrix::default(),
            vec![],
        );
        assert!(result.is_err());
    }
}
