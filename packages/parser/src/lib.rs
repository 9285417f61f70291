#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Extraction of the Swiss defined benefit plan asset table.
//!
//! The pipeline runs in fixed order:
//!
//! 1. [`locator`] finds the page by keywords and a date marker.
//! 2. The [`TableSource`] turns that page into a [`RawGrid`].
//! 3. [`header`] finds the reporting-year columns.
//! 4. [`offset`] finds each year's allocation column.
//! 5. [`classifier`] walks the rows through the section state machine.
//! 6. [`aggregate`] derives aggregates and validates each year.
//! 7. [`assemble`] emits one [`YearRecord`] per year, newest first.
//!
//! Fatal problems are [`ParseError`]s tagged with their [`Stage`];
//! everything recoverable ends up in the record's warnings.

pub mod aggregate;
pub mod assemble;
pub mod classifier;
pub mod config;
pub mod error;
pub mod header;
pub mod labels;
pub mod locator;
pub mod numbers;
pub mod offset;
pub mod report;

use plan_assets_allocation_models::source::{PageTextSource, TableSource};
use plan_assets_allocation_models::{PageMatch, RawGrid, YearRecord};

pub use config::ParserConfig;
pub use error::{ParseError, Stage};

use crate::classifier::YearColumn;

/// Result of a full extraction run for one report.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Page the table was read from.
    pub page: PageMatch,
    /// Raw grid as extracted.
    pub grid: RawGrid,
    /// One record per year, most recent first.
    pub records: Vec<YearRecord>,
}

/// Locates the table, extracts it, and parses every year.
///
/// Page text and table grids may come from different backends.
///
/// # Errors
///
/// Returns the first fatal [`ParseError`] raised by any stage.
pub fn extract_year_records<P, T>(
    pages: &P,
    tables: &T,
    config: &ParserConfig,
) -> Result<Extraction, ParseError>
where
    P: PageTextSource + ?Sized,
    T: TableSource + ?Sized,
{
    let page = locator::locate_page(pages, &config.locator)?;
    extract_on_page(tables, page, config)
}

/// Extracts and parses the table on an already chosen page.
///
/// The table source is called exactly once.
///
/// # Errors
///
/// Returns [`ParseError::Extraction`] if the grid cannot be extracted, or
/// any fatal error from parsing.
pub fn extract_on_page<T>(
    tables: &T,
    page: PageMatch,
    config: &ParserConfig,
) -> Result<Extraction, ParseError>
where
    T: TableSource + ?Sized,
{
    let grid = tables
        .extract_table(page.page_number)
        .map_err(|source| ParseError::Extraction {
            page: page.page_number,
            source,
        })?;

    log::info!(
        "Page {}: grid of {} rows x {} columns",
        page.page_number,
        grid.row_count(),
        grid.column_count()
    );

    let records = parse_grid_with_warnings(&grid, page.page_number, &page.warnings, config)?;

    Ok(Extraction {
        page,
        grid,
        records,
    })
}

/// Parses an extracted grid into year records.
///
/// # Errors
///
/// Returns [`ParseError::NoYearsFound`], [`ParseError::IncompleteTable`],
/// [`ParseError::AmbiguousLeafMatch`] or a configuration error.
pub fn parse_grid(
    grid: &RawGrid,
    page_number: u32,
    config: &ParserConfig,
) -> Result<Vec<YearRecord>, ParseError> {
    parse_grid_with_warnings(grid, page_number, &[], config)
}

fn parse_grid_with_warnings(
    grid: &RawGrid,
    page_number: u32,
    page_warnings: &[String],
    config: &ParserConfig,
) -> Result<Vec<YearRecord>, ParseError> {
    let markers = header::find_year_markers(grid, &config.header)?;
    assemble::require_years(&markers, page_number)?;

    let columns: Vec<YearColumn> = markers
        .into_iter()
        .map(|marker| YearColumn {
            detected: offset::detect_offset(grid, &marker, &config.offset),
            marker,
        })
        .collect();

    let classification = classifier::classify_rows(grid, page_number, &columns, config)?;
    assemble::assemble_records(page_number, page_warnings, &columns, classification, config)
}
