//! Flattens the DEFRA "flat format" conversion-factor workbook into the tidy
//! CSV consumed by the generators.
//!
//! The workbook carries one row per (activity, gas) pair; only the aggregate
//! "kg CO2e" rows are kept so downstream joins see a single factor per
//! activity. Per-gas CH4/N2O breakdown rows are dropped here.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use thiserror::Error;
use tracing::{debug, info};

use crate::defra::tidy::{write_tidy_csv, TidyError, TidyRow};

/// Default workbook filename, as published by DEFRA.
pub const DEFAULT_WORKBOOK_PATH: &str = "ghg-conversion-factors-2025-flat-format.xlsx";
/// Sheet holding the flat factor table.
pub const FACTORS_SHEET: &str = "Factors by Category";

/// The sheet opens with a five-row preamble; the header row is row index 5.
const HEADER_ROW_OFFSET: usize = 5;
/// Gas/unit value marking an aggregate CO2e row.
const CO2E_GAS_UNIT: &str = "kg CO2e";

const COL_CATEGORY: &str = "Level 1";
const COL_SUBCATEGORY: &str = "Level 2";
const COL_DETAIL: &str = "Level 3";
const COL_ACTIVITY: &str = "Level 4";
const COL_DESCRIPTION: &str = "Column Text";
const COL_UNIT: &str = "UOM";
const COL_GAS_UNIT: &str = "GHG/Unit";
const COL_FACTOR: &str = "GHG Conversion Factor 2025";

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Missing column '{column}' in header row {row}")]
    MissingColumn { column: &'static str, row: usize },

    #[error(transparent)]
    Tidy(#[from] TidyError),
}

/// Parser for the DEFRA conversion-factor workbook.
pub struct FactorWorkbook {
    workbook_path: String,
}

impl FactorWorkbook {
    pub fn new(workbook_path: impl Into<String>) -> Self {
        Self {
            workbook_path: workbook_path.into(),
        }
    }

    /// Open the workbook and extract the cleaned factor rows from the
    /// "Factors by Category" sheet.
    pub fn extract_rows(&self) -> Result<Vec<TidyRow>, PreprocessError> {
        info!("Reading workbook {}", self.workbook_path);
        let mut workbook: Xlsx<BufReader<File>> = match open_workbook(&self.workbook_path) {
            Ok(wb) => wb,
            Err(e) => return Err(PreprocessError::WorkbookOpen(e.to_string())),
        };
        let range = match workbook.worksheet_range(FACTORS_SHEET) {
            Ok(range) => range,
            Err(_) => return Err(PreprocessError::SheetNotFound(FACTORS_SHEET.to_string())),
        };
        rows_from_range(&range)
    }
}

/// Extract tidy rows from the factor sheet.
///
/// Rows missing a category or a numeric factor are dropped, as are rows for
/// individual gases. Column positions are resolved by header name so inserted
/// columns do not shift the mapping.
pub fn rows_from_range(range: &Range<Data>) -> Result<Vec<TidyRow>, PreprocessError> {
    let columns = header_positions(range, HEADER_ROW_OFFSET);
    let category_col = columns.require(COL_CATEGORY)?;
    let subcategory_col = columns.require(COL_SUBCATEGORY)?;
    let detail_col = columns.require(COL_DETAIL)?;
    let activity_col = columns.require(COL_ACTIVITY)?;
    let description_col = columns.require(COL_DESCRIPTION)?;
    let unit_col = columns.require(COL_UNIT)?;
    let gas_unit_col = columns.require(COL_GAS_UNIT)?;
    let factor_col = columns.require(COL_FACTOR)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for row_idx in (HEADER_ROW_OFFSET + 1)..range.height() {
        let category = match cell_str(range, row_idx, category_col) {
            Some(value) => value,
            None => {
                skipped += 1;
                continue;
            }
        };
        let factor = match cell_f64(range, row_idx, factor_col) {
            Some(value) if value.is_finite() => value,
            _ => {
                skipped += 1;
                continue;
            }
        };
        let gas_unit = cell_str(range, row_idx, gas_unit_col).unwrap_or_default();
        if gas_unit != CO2E_GAS_UNIT {
            skipped += 1;
            continue;
        }

        rows.push(TidyRow {
            category,
            subcategory: cell_str(range, row_idx, subcategory_col),
            detail: cell_str(range, row_idx, detail_col),
            activity: cell_str(range, row_idx, activity_col),
            description: cell_str(range, row_idx, description_col),
            unit: cell_str(range, row_idx, unit_col),
            emission_factor: Some(factor),
        });
    }

    debug!("Dropped {} non-CO2e or incomplete rows", skipped);
    info!("Extracted {} aggregate CO2e factor rows", rows.len());
    Ok(rows)
}

struct HeaderMap {
    positions: HashMap<String, usize>,
    row: usize,
}

impl HeaderMap {
    fn require(&self, column: &'static str) -> Result<usize, PreprocessError> {
        self.positions
            .get(column)
            .copied()
            .ok_or(PreprocessError::MissingColumn {
                column,
                row: self.row,
            })
    }
}

fn header_positions(range: &Range<Data>, row: usize) -> HeaderMap {
    let mut positions = HashMap::new();
    for col in 0..range.width() {
        if let Some(Data::String(name)) = range.get((row, col)) {
            positions.insert(name.trim().to_string(), col);
        }
    }
    HeaderMap { positions, row }
}

/// Cell as trimmed text, `None` when empty. Numeric cells are rendered the
/// way they display, so numeric level values still survive as categories.
fn cell_str(range: &Range<Data>, row: usize, col: usize) -> Option<String> {
    match range.get((row, col)) {
        Some(Data::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(Data::Int(i)) => Some(i.to_string()),
        Some(Data::Float(f)) => {
            if f.fract() == 0.0 {
                Some(format!("{f:.0}"))
            } else {
                Some(f.to_string())
            }
        }
        Some(Data::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

/// Cell as a number; text cells are parsed so exported-as-text factors count.
fn cell_f64(range: &Range<Data>, row: usize, col: usize) -> Option<f64> {
    match range.get((row, col)) {
        Some(Data::Float(f)) => Some(*f),
        Some(Data::Int(i)) => Some(*i as f64),
        Some(Data::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Run the full pre-processing step: workbook in, tidy CSV out.
///
/// Returns the number of rows written.
pub fn preprocess_workbook(
    workbook_path: &Path,
    tidy_path: &Path,
) -> Result<usize, PreprocessError> {
    let workbook = FactorWorkbook::new(workbook_path.to_string_lossy());
    let rows = workbook.extract_rows()?;
    write_tidy_csv(tidy_path, &rows)?;
    info!(
        "Processed DEFRA data saved to {} ({} rows)",
        tidy_path.display(),
        rows.len()
    );
    Ok(rows.len())
}
