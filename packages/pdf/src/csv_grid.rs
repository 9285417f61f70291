//! CSV-backed table grids.
//!
//! External table engines (or an earlier `--dump-grid` run) leave the table
//! of a page as a CSV file without meaningful headers. Dumps written by
//! dataframe libraries carry a synthetic header row of column indices
//! (`0,1,2,...`), which is dropped on read.

use std::path::{Path, PathBuf};

use plan_assets_allocation_models::RawGrid;
use plan_assets_allocation_models::source::{TableSource, TableSourceError};

use crate::PdfError;

/// Reads a grid from a headerless CSV file.
///
/// Rows may have different lengths.
///
/// # Errors
///
/// Returns [`PdfError::Csv`] if the file cannot be opened or parsed.
pub fn read_grid_csv(path: &Path) -> Result<RawGrid, PdfError> {
    let csv_error = |source| PdfError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        rows.push(record.iter().map(str::to_owned).collect::<Vec<_>>());
    }

    if rows.first().is_some_and(|row| is_index_header(row)) {
        rows.remove(0);
    }

    log::debug!("Read {} grid rows from {}", rows.len(), path.display());

    Ok(RawGrid::new(rows))
}

/// Writes a grid as headerless CSV.
///
/// # Errors
///
/// Returns [`PdfError::Csv`] if the file cannot be created or written.
pub fn write_grid_csv(grid: &RawGrid, path: &Path) -> Result<(), PdfError> {
    let csv_error = |source| PdfError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    for row in grid.rows() {
        writer.write_record(row).map_err(csv_error)?;
    }

    writer.flush().map_err(|source| PdfError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Whether a row is a `0,1,2,...` column-index header.
fn is_index_header(row: &[String]) -> bool {
    row.len() > 1
        && row
            .iter()
            .enumerate()
            .all(|(idx, cell)| cell.trim() == idx.to_string())
}

/// A table grid stored as CSV, served for any page number.
#[derive(Debug, Clone)]
pub struct CsvGrid {
    path: PathBuf,
}

impl CsvGrid {
    /// Points at a grid CSV file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TableSource for CsvGrid {
    fn extract_table(&self, page_number: u32) -> Result<RawGrid, TableSourceError> {
        let grid = read_grid_csv(&self.path).map_err(|e| TableSourceError::ExtractionFailed {
            page: page_number,
            message: e.to_string(),
        })?;

        if grid.is_empty() {
            return Err(TableSourceError::ExtractionFailed {
                page: page_number,
                message: format!("{} holds no cells", self.path.display()),
            });
        }

        Ok(grid)
    }
}
