#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! PDF backends for plan asset extraction.
//!
//! Annual reports are only published as PDFs. This crate provides the two
//! capabilities the extraction core consumes:
//!
//! - [`PdfDocument`] extracts per-page text with pure-Rust text extraction
//!   ([`pdf_extract`]) and rebuilds a table grid from a page's text layout
//!   ([`text_grid`]).
//! - [`csv_grid::CsvGrid`] serves a grid that an external extraction engine
//!   already dumped to CSV.
//!
//! [`download`] fetches the report PDFs themselves.

pub mod csv_grid;
pub mod download;
pub mod text_grid;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use plan_assets_allocation_models::RawGrid;
use plan_assets_allocation_models::source::{
    PageTextSource, TableSource, TableSourceError, page_index,
};

use crate::text_grid::GridLayout;

/// Errors specific to PDF handling.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// An HTTP request to download a PDF failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Status code returned.
        status: reqwest::StatusCode,
        /// Requested URL.
        url: String,
    },

    /// PDF text extraction failed.
    #[error("PDF extraction error in {path}: {message}")]
    Extraction {
        /// Document that failed.
        path: String,
        /// Backend error description.
        message: String,
    },

    /// Reading or writing a CSV grid failed.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// File being read or written.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// A loaded annual report.
///
/// Page text is extracted once when the document is opened; table grids are
/// built lazily and memoised so each page is turned into a grid at most once.
#[derive(Debug)]
pub struct PdfDocument {
    path: PathBuf,
    pages: Vec<String>,
    layout: GridLayout,
    grids: RefCell<BTreeMap<u32, RawGrid>>,
}

impl PdfDocument {
    /// Reads and extracts the PDF at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Io`] if the file cannot be read, or
    /// [`PdfError::Extraction`] if its text cannot be extracted.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| PdfError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(path, &bytes)
    }

    /// Extracts an in-memory PDF. `path` is only used for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Extraction`] if the text cannot be extracted.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: &[u8]) -> Result<Self, PdfError> {
        let path = path.into();
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
            PdfError::Extraction {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        })?;

        log::debug!(
            "Extracted text from {} pages of {}",
            pages.len(),
            path.display()
        );

        Ok(Self::from_pages(path, pages))
    }

    /// Wraps page texts that were extracted elsewhere.
    #[must_use]
    pub fn from_pages(path: impl Into<PathBuf>, pages: Vec<String>) -> Self {
        Self {
            path: path.into(),
            pages,
            layout: GridLayout::default(),
            grids: RefCell::new(BTreeMap::new()),
        }
    }

    /// Path the document was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn page(&self, page_number: u32) -> Result<&str, TableSourceError> {
        page_index(page_number, self.pages.len())
            .map(|idx| self.pages[idx].as_str())
            .ok_or(TableSourceError::PageOutOfRange {
                page: page_number,
                page_count: self.pages.len(),
            })
    }
}

impl PageTextSource for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page_number: u32) -> Result<String, TableSourceError> {
        self.page(page_number).map(str::to_owned)
    }
}

impl TableSource for PdfDocument {
    fn extract_table(&self, page_number: u32) -> Result<RawGrid, TableSourceError> {
        if let Some(grid) = self.grids.borrow().get(&page_number) {
            return Ok(grid.clone());
        }

        let text = self.page(page_number)?;
        let grid = text_grid::grid_from_text(text, &self.layout);

        if grid.column_count() < 2 {
            return Err(TableSourceError::ExtractionFailed {
                page: page_number,
                message: format!(
                    "no column structure found in {} ({} text rows)",
                    self.path.display(),
                    grid.row_count()
                ),
            });
        }

        log::info!(
            "Extracted table from page {page_number}: {} rows x {} columns",
            grid.row_count(),
            grid.column_count()
        );

        self.grids.borrow_mut().insert(page_number, grid.clone());
        Ok(grid)
    }
}
