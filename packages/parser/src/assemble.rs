//! Year record assembly.

use std::collections::BTreeMap;

use plan_assets_allocation_models::{AssetClass, YearMarker, YearRecord};

use crate::ParseError;
use crate::aggregate::{compute_aggregates, validate_year};
use crate::classifier::{Classification, YearColumn};
use crate::config::ParserConfig;

/// Fails when the header held no year marker.
///
/// # Errors
///
/// Returns [`ParseError::NoYearsFound`] if `markers` is empty.
pub const fn require_years(markers: &[YearMarker], page_number: u32) -> Result<(), ParseError> {
    if markers.is_empty() {
        Err(ParseError::NoYearsFound { page: page_number })
    } else {
        Ok(())
    }
}

/// Builds one record per year column, most recent year first.
///
/// Each record's warnings are, in order: `page_warnings`, the offset
/// fallback warning, classification warnings, then validation warnings.
///
/// # Errors
///
/// Returns [`ParseError::InvalidAggregate`] if the aggregate table is
/// invalid.
pub fn assemble_records(
    page_number: u32,
    page_warnings: &[String],
    columns: &[YearColumn],
    classification: Classification,
    config: &ParserConfig,
) -> Result<Vec<YearRecord>, ParseError> {
    let mut records = Vec::with_capacity(columns.len());

    for (column, year) in columns.iter().zip(classification.years) {
        let mut allocations: BTreeMap<AssetClass, f64> = BTreeMap::new();
        let mut missing = Vec::new();

        for &class in AssetClass::LEAVES {
            if let Some(value) = year.values.get(&class) {
                allocations.insert(class, value.percentage);
            } else {
                missing.push(class);
                allocations.insert(class, 0.0);
            }
        }

        let validation = validate_year(
            year.year,
            &allocations,
            &missing,
            year.total_assets,
            &config.validation,
        );
        allocations.extend(compute_aggregates(&year.values, config)?);

        let mut warnings = page_warnings.to_vec();
        warnings.extend(column.detected.warning.iter().cloned());
        warnings.extend(year.warnings);
        warnings.extend(validation.warnings);

        records.push(YearRecord {
            year: year.year,
            total_assets: year.total_assets.unwrap_or(0.0),
            allocations,
            subtotals: year.subtotals,
            page_number,
            offset: column.detected.offset,
            offset_confidence: column.detected.confidence,
            validation: plan_assets_allocation_models::Validation {
                percentage_sum: validation.percentage_sum,
                in_tolerance: validation.in_tolerance,
                warnings,
            },
        });
    }

    records.sort_by(|a, b| b.year.cmp(&a.year));

    for record in &records {
        log::info!(
            "{}: total assets {} USD m, {} classes, {} warnings",
            record.year,
            record.total_assets,
            record.allocations.len(),
            record.validation.warnings.len()
        );
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use plan_assets_allocation_models::{
        AssetClassValue, ColumnOffset, OffsetConfidence, SectionState,
    };

    use super::*;
    use crate::classifier::YearValues;
    use crate::offset::DetectedOffset;

    fn column(year: i32, col_index: usize, warning: Option<&str>) -> YearColumn {
        YearColumn {
            marker: YearMarker {
                year,
                row_index: 0,
                col_index,
            },
            detected: DetectedOffset {
                offset: ColumnOffset::new(2).unwrap(),
                confidence: if warning.is_some() {
                    OffsetConfidence::Defaulted
                } else {
                    OffsetConfidence::Detected
                },
                warning: warning.map(str::to_owned),
            },
        }
    }

    fn year_values(year: i32, cash: f64) -> YearValues {
        let mut values = BTreeMap::new();
        values.insert(
            AssetClass::Cash,
            AssetClassValue {
                asset_class: AssetClass::Cash,
                year,
                percentage: cash,
                is_main_section: true,
            },
        );
        YearValues {
            year,
            values,
            total_assets: Some(50_000.0),
            subtotals: BTreeMap::from([(SectionState::InvestmentFunds, 31.0)]),
            warnings: vec![format!("{year}: classifier note")],
        }
    }

    #[test]
    fn no_markers_is_fatal() {
        let err = require_years(&[], 12).unwrap_err();
        assert!(matches!(err, ParseError::NoYearsFound { page: 12 }));
        assert_eq!(err.stage(), crate::Stage::Assembly);
    }

    #[test]
    fn orders_years_descending_with_all_tags() {
        let columns = [column(2023, 1, None), column(2024, 4, None)];
        let classification = Classification {
            years: vec![year_values(2023, 3.0), year_values(2024, 4.0)],
            seen_rows: BTreeSet::new(),
        };

        let records =
            assemble_records(5, &[], &columns, classification, &ParserConfig::default()).unwrap();

        assert_eq!(records.iter().map(|r| r.year).collect::<Vec<_>>(), vec![2024, 2023]);
        assert_eq!(records[0].allocations.len(), 20);
        assert!((records[0].allocation(AssetClass::Cash) - 4.0).abs() < f64::EPSILON);
        assert!(records[0].allocation(AssetClass::Other).abs() < f64::EPSILON);
        assert_eq!(records[0].page_number, 5);
        assert_eq!(records[1].subtotals[&SectionState::InvestmentFunds], 31.0);
    }

    #[test]
    fn warnings_keep_stage_order() {
        let columns = [column(2024, 1, Some("2024: offset fallback"))];
        let classification = Classification {
            years: vec![year_values(2024, 100.0)],
            seen_rows: BTreeSet::new(),
        };

        let records = assemble_records(
            5,
            &["AmbiguousMatch: pages [5, 1]".to_owned()],
            &columns,
            classification,
            &ParserConfig::default(),
        )
        .unwrap();
        let warnings = &records[0].validation.warnings;

        assert!(warnings[0].starts_with("AmbiguousMatch"));
        assert_eq!(warnings[1], "2024: offset fallback");
        assert_eq!(warnings[2], "2024: classifier note");
        assert!(warnings[3].contains("missing asset classes"));
        assert!(records[0].validation.in_tolerance);
        assert_eq!(records[0].offset_confidence, OffsetConfidence::Defaulted);
    }
}
