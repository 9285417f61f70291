//! Section-tracking row classifier.
//!
//! A single pass over the grid, top to bottom, driven by the transition
//! table in [`crate::labels`]. The section state is owned by the pass and
//! only changes on structural rows; leaf rows never move it.

use std::collections::{BTreeMap, BTreeSet};

use plan_assets_allocation_models::{
    AssetClass, AssetClassValue, RawGrid, SectionState, YearMarker,
};

use crate::ParseError;
use crate::config::ParserConfig;
use crate::labels::{Action, leaf_candidates, normalize_label, transition_for};
use crate::numbers::{CellValue, parse_cell};
use crate::offset::DetectedOffset;

/// A reporting year and the columns its values are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearColumn {
    /// Year marker found in the header.
    pub marker: YearMarker,
    /// Allocation column offset for the marker.
    pub detected: DetectedOffset,
}

impl YearColumn {
    /// Column holding allocation percentages.
    #[must_use]
    pub const fn allocation_column(&self) -> usize {
        self.detected.allocation_column(&self.marker)
    }

    /// Column holding fair values, `shift` columns left of the allocation
    /// column.
    #[must_use]
    pub const fn fair_value_column(&self, shift: usize) -> Option<usize> {
        self.allocation_column().checked_sub(shift)
    }
}

/// Everything read for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearValues {
    /// Reporting year.
    pub year: i32,
    /// Leaf values, at most one per class.
    pub values: BTreeMap<AssetClass, AssetClassValue>,
    /// Fair value on the summary row, if readable.
    pub total_assets: Option<f64>,
    /// Values found on section header rows.
    pub subtotals: BTreeMap<SectionState, f64>,
    /// Recoverable issues, in row order.
    pub warnings: Vec<String>,
}

impl YearValues {
    fn new(year: i32) -> Self {
        Self {
            year,
            values: BTreeMap::new(),
            total_assets: None,
            subtotals: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, message: String) {
        log::warn!("{message}");
        self.warnings.push(message);
    }
}

/// Result of a complete walk.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// One entry per year column, in column order.
    pub years: Vec<YearValues>,
    /// Leaf classes that had a row in the table.
    pub seen_rows: BTreeSet<AssetClass>,
}

/// Walks the grid and collects values for every year column.
///
/// # Errors
///
/// Returns [`ParseError::AmbiguousLeafMatch`] if a label matches several
/// leaf classes, or [`ParseError::IncompleteTable`] if the grid ends before
/// the summary row or (with `require_all_leaves`) the summary row comes
/// before every leaf row has been seen.
pub fn classify_rows(
    grid: &RawGrid,
    page_number: u32,
    columns: &[YearColumn],
    config: &ParserConfig,
) -> Result<Classification, ParseError> {
    let mut walk = Walk {
        grid,
        columns,
        config,
        state: SectionState::Top,
        seen_rows: BTreeSet::new(),
        years: columns.iter().map(|c| YearValues::new(c.marker.year)).collect(),
    };

    for row in config.header.skip_rows..grid.row_count() {
        let raw = grid.label(row);
        if raw.is_empty() {
            continue;
        }
        let label = normalize_label(raw);

        match transition_for(walk.state, &label) {
            Some(Action::Finish) => {
                walk.finish(row, page_number)?;
                break;
            }
            Some(Action::TopLevelLeaf(class)) => {
                walk.state = SectionState::Top;
                walk.record_leaf(row, raw, class);
            }
            Some(Action::Enter(next)) => {
                log::debug!("Row {row}: {raw:?} enters {next}");
                walk.state = next;
                walk.record_subtotal(row, next);
            }
            None => match leaf_candidates(walk.state, &label).as_slice() {
                [] => log::debug!("Row {row}: {raw:?} ignored in {}", walk.state),
                [class] => walk.record_leaf(row, raw, *class),
                candidates => {
                    return Err(ParseError::AmbiguousLeafMatch {
                        row,
                        label: raw.to_owned(),
                        candidates: candidates.to_vec(),
                    });
                }
            },
        }
    }

    if walk.state != SectionState::Done {
        return Err(ParseError::IncompleteTable {
            page: page_number,
            reason: "grid ended before the total fair value of plan assets row".to_owned(),
        });
    }

    Ok(Classification {
        years: walk.years,
        seen_rows: walk.seen_rows,
    })
}

struct Walk<'a> {
    grid: &'a RawGrid,
    columns: &'a [YearColumn],
    config: &'a ParserConfig,
    state: SectionState,
    seen_rows: BTreeSet<AssetClass>,
    years: Vec<YearValues>,
}

impl Walk<'_> {
    fn record_leaf(&mut self, row: usize, raw: &str, class: AssetClass) {
        let is_main_section = self.state.is_main_section();
        log::debug!(
            "Row {row}: {raw:?} -> {class} ({}, {})",
            self.state,
            if is_main_section { "main" } else { "nested" }
        );
        if !self.seen_rows.insert(class) {
            for year in &mut self.years {
                year.warn(format!(
                    "{}: duplicate {class} row {row} ({raw:?}) ignored; first occurrence kept",
                    year.year
                ));
            }
            return;
        }

        let zero_eligible = self.config.validation.zero_eligible.contains(&class);

        for (column, year) in self.columns.iter().zip(self.years.iter_mut()) {
            let col = column.allocation_column();
            let percentage = match parse_cell(self.grid.cell(row, col)) {
                CellValue::Number(n) => n,
                CellValue::Blank if zero_eligible => {
                    year.warn(format!("{}: {class} is blank on row {row}; read as 0", year.year));
                    0.0
                }
                CellValue::Blank => {
                    year.warn(format!(
                        "{}: {class} is blank on row {row} (column {col})",
                        year.year
                    ));
                    continue;
                }
                CellValue::Text(text) => {
                    year.warn(format!(
                        "{}: {class} on row {row} has unreadable value {text:?}",
                        year.year
                    ));
                    continue;
                }
            };

            year.values.insert(
                class,
                AssetClassValue {
                    asset_class: class,
                    year: year.year,
                    percentage,
                    is_main_section,
                },
            );
        }
    }

    fn record_subtotal(&mut self, row: usize, section: SectionState) {
        for (column, year) in self.columns.iter().zip(self.years.iter_mut()) {
            let cell = self.grid.cell(row, column.allocation_column());
            if let Some(value) = parse_cell(cell).as_number() {
                log::debug!("{}: {section} subtotal {value}", year.year);
                year.subtotals.entry(section).or_insert(value);
            }
        }
    }

    fn finish(&mut self, row: usize, page_number: u32) -> Result<(), ParseError> {
        let missing: Vec<&str> = AssetClass::LEAVES
            .iter()
            .filter(|class| !self.seen_rows.contains(*class))
            .map(AsRef::as_ref)
            .collect();

        if !missing.is_empty() {
            let reason = format!(
                "total fair value row {row} reached before rows for {}",
                missing.join(", ")
            );
            if self.config.validation.require_all_leaves {
                return Err(ParseError::IncompleteTable {
                    page: page_number,
                    reason,
                });
            }
            for year in &mut self.years {
                year.warn(format!("{}: {reason}", year.year));
            }
        }

        let shift = self.config.offset.fair_value_shift;
        for (column, year) in self.columns.iter().zip(self.years.iter_mut()) {
            let cell = column
                .fair_value_column(shift)
                .map_or("", |col| self.grid.cell(row, col));
            match parse_cell(cell) {
                CellValue::Number(total) => {
                    log::info!("{}: total fair value of plan assets {total}", year.year);
                    year.total_assets = Some(total);
                }
                _ => year.warn(format!(
                    "{}: total fair value of plan assets unreadable on row {row} ({cell:?})",
                    year.year
                )),
            }
        }

        self.state = SectionState::Done;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use plan_assets_allocation_models::{ColumnOffset, OffsetConfidence};

    use super::*;

    fn column(year: i32, col_index: usize) -> YearColumn {
        YearColumn {
            marker: YearMarker {
                year,
                row_index: 0,
                col_index,
            },
            detected: DetectedOffset {
                offset: ColumnOffset::new(2).unwrap(),
                confidence: OffsetConfidence::Detected,
                warning: None,
            },
        }
    }

    /// Label, fair value and allocation for one year at columns 0, 2, 3.
    fn grid(rows: &[(&str, &str, &str)]) -> RawGrid {
        RawGrid::from_rows(rows.iter().map(|(label, total, pct)| vec![*label, "", *total, *pct]))
    }

    fn full_table() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("Cash and cash equivalents", "1,569", "3"),
            ("Equity securities", "", ""),
            ("Domestic", "5,224", "10"),
            ("Foreign", "7,836", "15"),
            ("Bonds", "", ""),
            ("Domestic, AAA to BBB-", "10,448", "20"),
            ("Foreign, AAA to BBB-", "2,612", "5"),
            ("Real estate / property", "", ""),
            ("Domestic", "6,269", "12"),
            ("Foreign", "", "\u{2013}"),
            ("Investment funds", "16,195", "31"),
            ("Equity", "", ""),
            ("Domestic", "1,045", "2"),
            ("Foreign", "4,179", "8"),
            ("Bonds", "", ""),
            ("Domestic, AAA to BBB-", "1,567", "3"),
            ("Domestic, below BBB-", "522", "1"),
            ("Foreign, AAA to BBB-", "2,090", "4"),
            ("Foreign, below BBB-", "1,045", "2"),
            ("Real estate", "", ""),
            ("Domestic", "2,090", "4"),
            ("Foreign", "522", "1"),
            ("Other", "3,134", "6"),
            ("Other investments", "1,567", "3"),
            ("Total fair value of plan assets", "52,241", "100"),
        ]
    }

    fn classify(rows: &[(&str, &str, &str)]) -> Result<Classification, ParseError> {
        classify_rows(&grid(rows), 9, &[column(2024, 1)], &ParserConfig::default())
    }

    #[test]
    fn classifies_every_leaf_once() {
        let result = classify(&full_table()).unwrap();
        let year = &result.years[0];

        assert_eq!(year.values.len(), 17);
        assert_eq!(result.seen_rows.len(), 17);
        assert_eq!(year.total_assets, Some(52_241.0));
        assert!(
            (year.values[&AssetClass::ForeignEquitySecurities].percentage - 15.0).abs()
                < f64::EPSILON
        );
        assert!(
            (year.values[&AssetClass::DomesticBondsJunk].percentage - 1.0).abs() < f64::EPSILON
        );
        assert_eq!(year.subtotals.get(&SectionState::InvestmentFunds), Some(&31.0));
    }

    #[test]
    fn fund_subsections_are_nested() {
        let result = classify(&full_table()).unwrap();
        let values = &result.years[0].values;

        assert!(values[&AssetClass::DomesticEquitySecurities].is_main_section);
        assert!(!values[&AssetClass::DomesticEquities].is_main_section);
        assert!(!values[&AssetClass::ForeignRealEstateInvestments].is_main_section);
        assert!(values[&AssetClass::OtherInvestments].is_main_section);
    }

    #[test]
    fn zero_eligible_blank_reads_as_zero_with_warning() {
        let result = classify(&full_table()).unwrap();
        let year = &result.years[0];
        assert!(year.values[&AssetClass::ForeignRealEstate].percentage.abs() < f64::EPSILON);
        assert!(
            year.warnings
                .iter()
                .any(|w| w.contains("FOREIGNREALESTATE is blank") && w.contains("read as 0"))
        );
    }

    #[test]
    fn blank_required_leaf_is_a_warning_without_value() {
        let mut rows = full_table();
        rows[0] = ("Cash and cash equivalents", "", "");
        let result = classify(&rows).unwrap();
        let year = &result.years[0];
        assert!(!year.values.contains_key(&AssetClass::Cash));
        assert!(year.warnings.iter().any(|w| w.contains("CASH is blank")));
    }

    #[test]
    fn first_duplicate_wins() {
        let mut rows = full_table();
        rows.insert(1, ("Cash and cash equivalents", "999", "9"));
        let result = classify(&rows).unwrap();
        let year = &result.years[0];
        assert!((year.values[&AssetClass::Cash].percentage - 3.0).abs() < f64::EPSILON);
        assert!(year.warnings.iter().any(|w| w.contains("duplicate CASH")));
    }

    #[test]
    fn duplicate_after_blank_first_row_is_ignored() {
        let mut rows = full_table();
        rows[0] = ("Cash and cash equivalents", "", "");
        rows.insert(23, ("Cash and cash equivalents", "999", "9"));
        let result = classify(&rows).unwrap();
        let year = &result.years[0];
        assert!(!year.values.contains_key(&AssetClass::Cash));
        assert!(year.warnings.iter().any(|w| w.contains("CASH is blank")));
        assert!(year.warnings.iter().any(|w| w.contains("duplicate CASH row 23")));
    }

    #[test]
    fn early_total_row_is_incomplete() {
        let mut rows = full_table();
        rows.insert(4, ("Total fair value of plan assets", "52,241", "100"));
        let err = classify(&rows).unwrap_err();
        assert!(matches!(err, ParseError::IncompleteTable { page: 9, .. }));
        assert!(err.to_string().contains("NONINVESTDOMESTICBONDS"));
    }

    #[test]
    fn early_total_row_can_be_tolerated() {
        let mut rows = full_table();
        rows.insert(4, ("Total fair value of plan assets", "52,241", "100"));
        let mut config = ParserConfig::default();
        config.validation.require_all_leaves = false;
        let result = classify_rows(&grid(&rows), 9, &[column(2024, 1)], &config).unwrap();
        assert_eq!(result.years[0].values.len(), 3);
        assert!(result.years[0].warnings.iter().any(|w| w.contains("reached before rows")));
    }

    #[test]
    fn missing_total_row_is_incomplete() {
        let mut rows = full_table();
        rows.pop();
        let err = classify(&rows).unwrap_err();
        assert!(matches!(err, ParseError::IncompleteTable { .. }));
    }

    #[test]
    fn ambiguous_label_fails_fast() {
        let mut rows = full_table();
        rows[2] = ("Domestic and foreign", "5,224", "10");
        let err = classify(&rows).unwrap_err();
        match err {
            ParseError::AmbiguousLeafMatch { row, candidates, .. } => {
                assert_eq!(row, 2);
                assert_eq!(
                    candidates,
                    vec![
                        AssetClass::DomesticEquitySecurities,
                        AssetClass::ForeignEquitySecurities
                    ]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rows_after_total_are_ignored() {
        let mut rows = full_table();
        rows.push(("Cash and cash equivalents", "1", "50"));
        let result = classify(&rows).unwrap();
        assert!((result.years[0].values[&AssetClass::Cash].percentage - 3.0).abs() < f64::EPSILON);
        assert!(result.years[0].warnings.iter().all(|w| !w.contains("duplicate")));
    }
}
