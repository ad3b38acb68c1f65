//! District and disease input tables

mod data;
pub mod loader;

pub use data::{DistrictRecord, DiseaseRecord};
pub use loader::{load_districts, load_districts_from_reader, load_diseases, load_diseases_from_reader, load_inputs};
