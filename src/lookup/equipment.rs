//! Equipment categories and the disease → equipment matrix

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An equipment category with its assumed adoption rate among the elderly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentCategory {
    pub category_name: String,

    /// Diseases whose matrix entry points at this category.
    /// Filled in by `LookupTables::new`
    pub linked_diseases: BTreeSet<String>,

    /// Fraction of the elderly population expected to rent from this category
    pub base_penetration: f64,
}

impl EquipmentCategory {
    pub fn new(category_name: impl Into<String>, base_penetration: f64) -> Self {
        Self {
            category_name: category_name.into(),
            linked_diseases: BTreeSet::new(),
            base_penetration,
        }
    }
}

/// One disease row of the matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseLink {
    pub disease_name: String,
    /// Functional impairment driving the equipment need
    pub impairment: String,
    /// Linked categories, primary first
    pub categories: Vec<String>,
    /// Concrete items a patient typically needs, e.g. "transfer board"
    #[serde(default)]
    pub specific_equipment: Vec<String>,
}

/// Static disease → equipment category matrix
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiseaseEquipmentMatrix {
    entries: Vec<DiseaseLink>,
}

/// Lowercase and collapse whitespace
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized name with any parenthesised qualifier removed
fn stem(name: &str) -> String {
    let base = name.split('(').next().unwrap_or(name);
    normalize_name(base)
}

impl DiseaseEquipmentMatrix {
    pub fn new(entries: Vec<DiseaseLink>) -> Self {
        Self { entries }
    }

    /// Add a link; rows for the same disease are merged
    pub fn link(&mut self, disease: &str, impairment: &str, category: &str) {
        let key = normalize_name(disease);
        match self.entries.iter_mut().find(|e| normalize_name(&e.disease_name) == key) {
            Some(entry) => {
                if !entry.categories.iter().any(|c| c == category) {
                    entry.categories.push(category.to_string());
                }
                if entry.impairment.is_empty() {
                    entry.impairment = impairment.to_string();
                }
            }
            None => self.entries.push(DiseaseLink {
                disease_name: disease.to_string(),
                impairment: impairment.to_string(),
                categories: vec![category.to_string()],
                specific_equipment: Vec::new(),
            }),
        }
    }

    /// Record a specific item for an already linked disease.
    /// Returns false when the disease has no matrix row.
    pub fn add_equipment(&mut self, disease: &str, item: &str) -> bool {
        let key = normalize_name(disease);
        let Some(entry) = self.entries.iter_mut().find(|e| normalize_name(&e.disease_name) == key) else {
            return false;
        };
        if !entry.specific_equipment.iter().any(|e| e == item) {
            entry.specific_equipment.push(item.to_string());
        }
        true
    }

    pub fn entries(&self) -> &[DiseaseLink] {
        &self.entries
    }

    /// Find the matrix row for a reported cause of death.
    ///
    /// Exact (case/whitespace-insensitive) matches win; otherwise names are
    /// compared with any parenthesised qualifier removed.
    pub fn find(&self, disease_name: &str) -> Option<&DiseaseLink> {
        let key = normalize_name(disease_name);
        if let Some(entry) = self.entries.iter().find(|e| normalize_name(&e.disease_name) == key) {
            return Some(entry);
        }
        let key_stem = stem(disease_name);
        if key_stem.is_empty() {
            return None;
        }
        self.entries.iter().find(|e| stem(&e.disease_name) == key_stem)
    }
}

/// Items the rental programme can supply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentCatalogue {
    items: Vec<String>,
}

/// Keyword tokens shorter than this never count as a match
const MIN_KEYWORD_CHARS: usize = 4;

fn keyword_form(name: &str) -> String {
    name.to_lowercase().replace('-', " ").replace('\u{2019}', "'")
}

fn keywords(form: &str) -> impl Iterator<Item = &str> + '_ {
    form.split_whitespace().filter(|t| t.chars().count() >= MIN_KEYWORD_CHARS)
}

impl EquipmentCatalogue {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First catalogue item sharing a keyword with `required`.
    ///
    /// A keyword of either name found anywhere inside the other counts, so
    /// "Wheelchair" is covered by "Rollator wheelchair".
    pub fn provides(&self, required: &str) -> Option<&str> {
        let wanted = keyword_form(required);
        self.items
            .iter()
            .find(|item| {
                let offered = keyword_form(item);
                keywords(&wanted).any(|k| offered.contains(k)) || keywords(&offered).any(|k| wanted.contains(k))
            })
            .map(String::as_str)
    }
}
