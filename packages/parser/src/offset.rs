//! Allocation column detection.
//!
//! The allocation percentage column sits a few columns right of its year
//! marker; how many depends on the layout of the year. Candidates are
//! tried in preference order against the header cells around the marker.

use plan_assets_allocation_models::{ColumnOffset, OffsetConfidence, RawGrid, YearMarker};

use crate::config::OffsetConfig;

/// Outcome of offset detection for one year marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedOffset {
    /// Offset from the marker column to the allocation column.
    pub offset: ColumnOffset,
    /// Whether header text confirmed the offset.
    pub confidence: OffsetConfidence,
    /// Set when the default was used.
    pub warning: Option<String>,
}

impl DetectedOffset {
    /// Absolute allocation column for `marker`.
    #[must_use]
    pub const fn allocation_column(&self, marker: &YearMarker) -> usize {
        marker.col_index + self.offset.get()
    }
}

/// Determines the allocation column offset for `marker`.
///
/// A candidate is accepted when some cell in its column, within
/// `rows_above` rows above and `rows_below` rows below the marker row,
/// contains every header token. Otherwise the default offset is returned
/// with a warning; detection never fails.
#[must_use]
pub fn detect_offset(grid: &RawGrid, marker: &YearMarker, config: &OffsetConfig) -> DetectedOffset {
    let tokens: Vec<String> = config
        .header_tokens
        .iter()
        .map(|t| t.to_lowercase())
        .collect();
    let first_row = marker.row_index.saturating_sub(config.rows_above);
    let last_row = (marker.row_index + config.rows_below).min(grid.row_count().saturating_sub(1));

    for &candidate in &config.candidates {
        let col = marker.col_index + candidate.get();
        let confirmed = (first_row..=last_row).any(|row| {
            let cell = grid.cell(row, col).to_lowercase();
            !cell.is_empty() && tokens.iter().all(|t| cell.contains(t.as_str()))
        });

        if confirmed {
            log::info!(
                "{}: allocation column at offset {candidate} (column {col})",
                marker.year
            );
            return DetectedOffset {
                offset: candidate,
                confidence: OffsetConfidence::Detected,
                warning: None,
            };
        }
    }

    let warning = format!(
        "{}: no allocation header found near column {}; using default offset {}",
        marker.year, marker.col_index, config.default_offset
    );
    log::warn!("{warning}");

    DetectedOffset {
        offset: config.default_offset,
        confidence: OffsetConfidence::Defaulted,
        warning: Some(warning),
    }
}
