use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::InputRecord;

pub const FIRST_NAME_KEY: &str = "first name";
pub const LAST_NAME_KEY: &str = "last name";
pub const ADMIT_DATE_KEY: &str = "admit date";

/// Caller-supplied CSV header for each canonical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(rename = "first name", default = "default_first_name")]
    pub first_name: String,
    #[serde(rename = "last name", default = "default_last_name")]
    pub last_name: String,
    #[serde(rename = "admit date", default = "default_admit_date")]
    pub admit_date: String,
}

fn default_first_name() -> String {
    FIRST_NAME_KEY.to_string()
}

fn default_last_name() -> String {
    LAST_NAME_KEY.to_string()
}

fn default_admit_date() -> String {
    ADMIT_DATE_KEY.to_string()
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            first_name: default_first_name(),
            last_name: default_last_name(),
            admit_date: default_admit_date(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read input file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("column '{header}' mapped to '{canonical}' is not present in the CSV")]
    MissingColumn {
        canonical: &'static str,
        header: String,
    },
}

pub fn parse_path<P: AsRef<Path>>(
    path: P,
    mapping: &ColumnMapping,
) -> Result<Vec<InputRecord>, IngestError> {
    let file = std::fs::File::open(path)?;
    parse_records(file, mapping)
}

/// Parse rows into typed records, dropping rows whose names are both blank.
pub fn parse_records<R: Read>(
    reader: R,
    mapping: &ColumnMapping,
) -> Result<Vec<InputRecord>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let locate = |canonical: &'static str, header: &str| {
        let wanted = header.trim();
        headers
            .iter()
            .position(|candidate| {
                candidate.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| IngestError::MissingColumn {
                canonical,
                header: wanted.to_string(),
            })
    };
    let first_name = locate(FIRST_NAME_KEY, &mapping.first_name)?;
    let last_name = locate(LAST_NAME_KEY, &mapping.last_name)?;
    let admit_date = locate(ADMIT_DATE_KEY, &mapping.admit_date)?;

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let cell = |index: usize| row.get(index).unwrap_or_default();
        let record = InputRecord::new(cell(first_name), cell(last_name), cell(admit_date));
        if !record.is_blank() {
            records.push(record);
        }
    }

    Ok(records)
}
