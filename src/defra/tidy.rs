//! The tidy-table interchange format shared by the DEFRA generators.
//!
//! One row per factor the pre-processor retained. Written once by
//! `preprocess`, read by both `general` and `categories`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default location of the intermediate CSV, next to the inputs.
pub const DEFAULT_TIDY_CSV: &str = "pre-processed-defra.csv";

#[derive(Error, Debug)]
pub enum TidyError {
    #[error("failed to read {}: {}", path.display(), source)]
    Read {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("failed to write {}: {}", path.display(), source)]
    Write {
        path: PathBuf,
        source: csv::Error,
    },
}

/// One cleaned factor row. Every text column except the category may be
/// absent in the source workbook, and the factor may be absent in tidy files
/// produced elsewhere; consumers drop rows without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TidyRow {
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Subcategory")]
    pub subcategory: Option<String>,
    #[serde(rename = "Detail")]
    pub detail: Option<String>,
    #[serde(rename = "Activity")]
    pub activity: Option<String>,
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "Unit")]
    pub unit: Option<String>,
    #[serde(rename = "EmissionFactor")]
    pub emission_factor: Option<f64>,
}

pub fn read_tidy_csv(path: &Path) -> Result<Vec<TidyRow>, TidyError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| TidyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        let row: TidyRow = row.map_err(|source| TidyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn write_tidy_csv(path: &Path, rows: &[TidyRow]) -> Result<(), TidyError> {
    let mut writer = csv::Writer::from_path(path).map_err(|source| TidyError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    for row in rows {
        writer.serialize(row).map_err(|source| TidyError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    writer.flush().map_err(|source| TidyError::Write {
        path: path.to_path_buf(),
        source: csv::Error::from(source),
    })
}
