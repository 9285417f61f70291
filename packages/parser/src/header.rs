//! Year marker scan over the table header.

use plan_assets_allocation_models::{RawGrid, YearMarker};

use crate::ParseError;
use crate::config::{HeaderConfig, compile_year_pattern};
use crate::labels::{is_table_content, normalize_label};

/// Index of the first table body row, or the row count when no row is
/// recognised. Rows before it form the header region.
#[must_use]
pub fn content_start(grid: &RawGrid) -> usize {
    (0..grid.row_count())
        .find(|&row| is_table_content(&normalize_label(grid.label(row))))
        .unwrap_or_else(|| grid.row_count())
}

/// Expands a two-digit year to 20yy.
#[must_use]
pub const fn normalize_year(year: i32) -> i32 {
    if year < 100 { 2000 + year } else { year }
}

/// Finds reporting-year columns in the header region.
///
/// Only value columns (index 1 and up) are searched, in row-major order.
/// The first marker for a year wins and at most `max_years` markers are
/// returned. An empty result is not an error here.
///
/// # Errors
///
/// Returns [`ParseError::InvalidConfig`] if the date pattern is invalid.
pub fn find_year_markers(
    grid: &RawGrid,
    config: &HeaderConfig,
) -> Result<Vec<YearMarker>, ParseError> {
    let date_re = compile_year_pattern("header.date_pattern", &config.date_pattern)?;
    let header_end = content_start(grid);
    let mut markers: Vec<YearMarker> = Vec::new();

    'rows: for row_index in 0..header_end {
        for col_index in 1..grid.rows()[row_index].len() {
            let Some(year) = date_re
                .captures(grid.cell(row_index, col_index))
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<i32>().ok())
                .map(normalize_year)
            else {
                continue;
            };

            if markers.iter().any(|m| m.year == year) {
                log::debug!("Ignoring repeated year marker {year} at ({row_index}, {col_index})");
                continue;
            }

            log::info!("Found year marker {year} at row {row_index}, column {col_index}");
            markers.push(YearMarker {
                year,
                row_index,
                col_index,
            });

            if markers.len() >= config.max_years {
                break 'rows;
            }
        }
    }

    Ok(markers)
}
