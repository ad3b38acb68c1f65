//! Load cleaned district and cause-of-death tables from CSV

use super::{DiseaseRecord, DistrictRecord};
use crate::error::{AnalyticsError, Result};
use csv::{Reader, StringRecord};
use std::path::Path;

/// Prefix of the per-year population columns, e.g. `elderly_2024`
pub const POPULATION_COLUMN_PREFIX: &str = "elderly_";

/// Default file names inside a data directory
pub const DISTRICTS_FILE: &str = "districts.csv";
pub const DISEASES_FILE: &str = "diseases.csv";

/// Column positions resolved from the header row
struct DistrictColumns {
    district_id: usize,
    service_users: usize,
    growth_rate: Option<usize>,
    years: Vec<(usize, i32)>,
}

impl DistrictColumns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let district_id = position("district_id")
            .ok_or_else(|| AnalyticsError::InvalidInput("missing column district_id".to_string()))?;
        let service_users = position("service_users")
            .ok_or_else(|| AnalyticsError::InvalidInput("missing column service_users".to_string()))?;

        let mut years = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(suffix) = header.trim().strip_prefix(POPULATION_COLUMN_PREFIX) {
                let year: i32 = suffix.parse().map_err(|_| {
                    AnalyticsError::InvalidInput(format!("bad population column header: {}", header))
                })?;
                years.push((idx, year));
            }
        }

        Ok(Self {
            district_id,
            service_users,
            growth_rate: position("growth_rate"),
            years,
        })
    }

    fn to_record(&self, row: &StringRecord, line: usize) -> Result<DistrictRecord> {
        let field = |idx: usize| row.get(idx).map(str::trim).unwrap_or("");
        let bad = |column: &str, value: &str| {
            AnalyticsError::InvalidInput(format!("line {}: cannot parse {} value {:?}", line, column, value))
        };

        let district_id = field(self.district_id);
        if district_id.is_empty() {
            return Err(AnalyticsError::InvalidInput(format!("line {}: empty district_id", line)));
        }

        let raw_users = field(self.service_users);
        let service_users: u64 = raw_users.parse().map_err(|_| bad("service_users", raw_users))?;

        let mut record = DistrictRecord::new(district_id, service_users);

        if let Some(idx) = self.growth_rate {
            let raw = field(idx);
            if !raw.is_empty() {
                record.growth_rate = Some(raw.parse().map_err(|_| bad("growth_rate", raw))?);
            }
        }

        // Blank year cells mean "not observed"
        for &(idx, year) in &self.years {
            let raw = field(idx);
            if raw.is_empty() {
                continue;
            }
            let count: u64 = raw.parse().map_err(|_| bad(&format!("{}{}", POPULATION_COLUMN_PREFIX, year), raw))?;
            record.elderly_population.insert(year, count);
        }

        Ok(record)
    }
}

/// Load districts from any reader
pub fn load_districts_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<DistrictRecord>> {
    let mut csv_reader = Reader::from_reader(reader);
    let columns = DistrictColumns::from_headers(csv_reader.headers()?)?;

    let mut districts = Vec::new();
    for (i, result) in csv_reader.records().enumerate() {
        let row = result?;
        // Header is line 1
        districts.push(columns.to_record(&row, i + 2)?);
    }

    let mut seen = std::collections::BTreeSet::new();
    for d in &districts {
        if !seen.insert(d.district_id.as_str()) {
            return Err(AnalyticsError::InvalidInput(format!(
                "duplicate district_id {}",
                d.district_id
            )));
        }
    }

    Ok(districts)
}

/// Load districts from a CSV file
pub fn load_districts<P: AsRef<Path>>(path: P) -> Result<Vec<DistrictRecord>> {
    let file = std::fs::File::open(path)?;
    load_districts_from_reader(file)
}

/// Load ranked causes of death from any reader, ordered by rank
pub fn load_diseases_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<DiseaseRecord>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut diseases = Vec::new();

    for result in csv_reader.deserialize() {
        let row: DiseaseRecord = result?;
        if row.rank == 0 {
            return Err(AnalyticsError::InvalidInput(format!(
                "disease {} has rank 0; ranks start at 1",
                row.disease_name
            )));
        }
        diseases.push(row);
    }

    diseases.sort_by_key(|d| d.rank);
    Ok(diseases)
}

/// Load ranked causes of death from a CSV file
pub fn load_diseases<P: AsRef<Path>>(path: P) -> Result<Vec<DiseaseRecord>> {
    let file = std::fs::File::open(path)?;
    load_diseases_from_reader(file)
}

/// Load both cleaned tables from a data directory
pub fn load_inputs(dir: &Path) -> Result<(Vec<DistrictRecord>, Vec<DiseaseRecord>)> {
    Ok((
        load_districts(dir.join(DISTRICTS_FILE))?,
        load_diseases(dir.join(DISEASES_FILE))?,
    ))
}
