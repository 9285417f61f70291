//! Cross-report merging.
//!
//! Consecutive annual reports overlap: the 2024 report restates 2023. When
//! two reports carry the same year, the record from the later report wins.

use std::collections::BTreeMap;
use std::path::PathBuf;

use plan_assets_allocation_models::YearRecord;

/// The records extracted from one report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecords {
    /// Report the records came from.
    pub source: PathBuf,
    /// Publication year of the report, if known. Reports without one lose
    /// every conflict.
    pub report_year: Option<i32>,
    pub records: Vec<YearRecord>,
}

/// Merges records across reports, one per year, ordered by ascending year.
///
/// Among reports with the same report year, the one listed last wins.
#[must_use]
pub fn merge_reports(reports: &[ReportRecords]) -> Vec<YearRecord> {
    let mut by_year: BTreeMap<i32, (Option<i32>, &ReportRecords, &YearRecord)> = BTreeMap::new();

    for report in reports {
        for record in &report.records {
            let existing = by_year
                .get(&record.year)
                .map(|&(year, source, _)| (year, source));

            match existing {
                Some((existing_year, existing)) if existing_year > report.report_year => {
                    log::debug!(
                        "{}: keeping figures from {} over {}",
                        record.year,
                        existing.source.display(),
                        report.source.display()
                    );
                    continue;
                }
                Some((_, existing)) => log::info!(
                    "{}: figures from {} replace {}",
                    record.year,
                    report.source.display(),
                    existing.source.display()
                ),
                None => {}
            }
            by_year.insert(record.year, (report.report_year, report, record));
        }
    }

    by_year
        .into_values()
        .map(|(_, _, record)| record.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use plan_assets_allocation_models::{ColumnOffset, OffsetConfidence, Validation};

    use super::*;

    fn record(year: i32, total_assets: f64) -> YearRecord {
        YearRecord {
            year,
            total_assets,
            allocations: BTreeMap::new(),
            subtotals: BTreeMap::new(),
            page_number: 1,
            offset: ColumnOffset::new(2).unwrap(),
            offset_confidence: OffsetConfidence::Detected,
            validation: Validation {
                percentage_sum: 100.0,
                in_tolerance: true,
                warnings: Vec::new(),
            },
        }
    }

    fn report(name: &str, report_year: Option<i32>, records: Vec<YearRecord>) -> ReportRecords {
        ReportRecords {
            source: PathBuf::from(name),
            report_year,
            records,
        }
    }

    #[test]
    fn later_report_restates_overlapping_year() {
        let reports = [
            report("ar2024.pdf", Some(2024), vec![record(2024, 52_241.0), record(2023, 54_404.0)]),
            report("ar2023.pdf", Some(2023), vec![record(2023, 53_000.0), record(2022, 51_000.0)]),
        ];

        let merged = merge_reports(&reports);

        assert_eq!(merged.iter().map(|r| r.year).collect::<Vec<_>>(), vec![2022, 2023, 2024]);
        assert!((merged[1].total_assets - 54_404.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_report_year_loses() {
        let reports = [
            report("ar2023.pdf", Some(2023), vec![record(2023, 53_000.0)]),
            report("scan.pdf", None, vec![record(2023, 1.0)]),
        ];

        let merged = merge_reports(&reports);
        assert!((merged[0].total_assets - 53_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equal_report_years_keep_last_listed() {
        let reports = [
            report("a.pdf", Some(2024), vec![record(2024, 1.0)]),
            report("b.pdf", Some(2024), vec![record(2024, 2.0)]),
        ];

        let merged = merge_reports(&reports);
        assert!((merged[0].total_assets - 2.0).abs() < f64::EPSILON);
    }
}
