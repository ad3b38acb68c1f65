//! CSV-based lookup table loader
//!
//! Loads static reference tables from data/lookups/

use super::{DiseaseEquipmentMatrix, EquipmentCatalogue, EquipmentCategory, UserPersona};
use crate::error::{AnalyticsError, Result};
use std::fs::File;
use std::path::Path;

/// Default path to the lookup directory
pub const DEFAULT_LOOKUP_PATH: &str = "data/lookups";

/// Separator for list-valued cells
const LIST_SEPARATOR: char = ';';

fn open(path: &Path, name: &str) -> Result<csv::Reader<File>> {
    let file = File::open(path.join(name))?;
    Ok(csv::Reader::from_reader(file))
}

/// Trimmed cell `idx`, or an error naming the file and column when the row is short
fn field<'r>(record: &'r csv::StringRecord, idx: usize, file: &str, column: &str) -> Result<&'r str> {
    record.get(idx).map(str::trim).ok_or_else(|| {
        AnalyticsError::InvalidLookup(format!(
            "{}: row {} has no {} column",
            file,
            record.position().map_or(0, |p| p.line()),
            column
        ))
    })
}

fn parse_f64(value: &str, context: &str) -> Result<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| AnalyticsError::InvalidLookup(format!("{}: cannot parse {:?} as a number", context, value)))
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Load equipment categories in file order.
/// Columns: category_name, base_penetration
pub fn load_equipment_categories(path: &Path) -> Result<Vec<EquipmentCategory>> {
    const FILE: &str = "equipment_categories.csv";
    let mut reader = open(path, FILE)?;
    let mut categories = Vec::new();

    for result in reader.records() {
        let record = result?;
        let name = field(&record, 0, FILE, "category_name")?;
        let penetration = parse_f64(field(&record, 1, FILE, "base_penetration")?, name)?;
        categories.push(EquipmentCategory::new(name, penetration));
    }

    Ok(categories)
}

/// Load the disease → equipment matrix.
/// Columns: disease_name, category_name, impairment, specific_equipment
/// (one row per link; the last two are optional, items separated by ';')
pub fn load_disease_matrix(path: &Path) -> Result<DiseaseEquipmentMatrix> {
    const FILE: &str = "disease_equipment.csv";
    let mut reader = open(path, FILE)?;
    let mut matrix = DiseaseEquipmentMatrix::default();

    for result in reader.records() {
        let record = result?;
        let disease = field(&record, 0, FILE, "disease_name")?;
        let impairment = record.get(2).unwrap_or("").trim();
        matrix.link(disease, impairment, field(&record, 1, FILE, "category_name")?);
        for item in split_list(record.get(3).unwrap_or("")) {
            matrix.add_equipment(disease, &item);
        }
    }

    Ok(matrix)
}

/// Load personas.
/// Columns: persona_id, name, pain_points, equipment_needs (lists separated by ';')
pub fn load_personas(path: &Path) -> Result<Vec<UserPersona>> {
    const FILE: &str = "personas.csv";
    let mut reader = open(path, FILE)?;
    let mut personas = Vec::new();

    for result in reader.records() {
        let record = result?;
        personas.push(UserPersona {
            persona_id: field(&record, 0, FILE, "persona_id")?.to_string(),
            name: field(&record, 1, FILE, "name")?.to_string(),
            pain_points: split_list(field(&record, 2, FILE, "pain_points")?).collect(),
            equipment_needs: split_list(field(&record, 3, FILE, "equipment_needs")?).collect(),
        });
    }

    Ok(personas)
}

/// Load the supplied-equipment catalogue.
/// Columns: equipment_name
pub fn load_catalogue(path: &Path) -> Result<EquipmentCatalogue> {
    const FILE: &str = "available_equipment.csv";
    let mut reader = open(path, FILE)?;
    let mut items = Vec::new();

    for result in reader.records() {
        let record = result?;
        let name = field(&record, 0, FILE, "equipment_name")?;
        if !name.is_empty() {
            items.push(name.to_string());
        }
    }

    Ok(EquipmentCatalogue::new(items))
}

/// Raw lookup tables as read from disk, before cross-validation
pub struct LoadedLookups {
    pub categories: Vec<EquipmentCategory>,
    pub matrix: DiseaseEquipmentMatrix,
    pub personas: Vec<UserPersona>,
    pub catalogue: EquipmentCatalogue,
}

impl LoadedLookups {
    /// Load all lookup tables from the default path
    pub fn load_default() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_LOOKUP_PATH))
    }

    /// Load all lookup tables from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        Ok(Self {
            categories: load_equipment_categories(path)?,
            matrix: load_disease_matrix(path)?,
            personas: load_personas(path)?,
            catalogue: load_catalogue(path)?,
        })
    }
}
