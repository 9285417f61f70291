//! Raw table grid as produced by a table-extraction engine.
//!
//! Engines do not guarantee rectangular output, so every accessor treats
//! missing cells as empty instead of failing.

use serde::{Deserialize, Serialize};

/// Rows of cell strings, read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGrid {
    rows: Vec<Vec<String>>,
}

impl RawGrid {
    /// Wraps extracted rows.
    #[must_use]
    pub const fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Builds a grid from borrowed cells. Mostly useful for fixtures.
    #[must_use]
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// All rows in order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Whether the grid has no cells at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    /// Returns the trimmed cell at `(row, col)`, or `""` when the row is
    /// shorter than `col` or does not exist.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map_or("", |c| c.trim())
    }

    /// Returns the row label (first cell).
    #[must_use]
    pub fn label(&self, row: usize) -> &str {
        self.cell(row, 0)
    }
}
