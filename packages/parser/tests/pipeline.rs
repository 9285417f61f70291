use std::path::Path;

use plan_assets_allocation_models::source::{PageTexts, TableSource, TableSourceError};
use plan_assets_allocation_models::{AssetClass, OffsetConfidence, RawGrid, YearRecord};
use plan_assets_parser::{ParseError, ParserConfig, Stage, extract_year_records, parse_grid};
use plan_assets_pdf::csv_grid::{CsvGrid, read_grid_csv};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/two_year_table.csv");

const TABLE_PAGE: &str = "Note 26 Post-employment benefit plans (continued)\n\
    Composition and fair value of Swiss defined benefit plan assets\n\
    USD m 31.12.24 31.12.23\n";

fn report_pages() -> PageTexts {
    PageTexts(vec![
        "UBS Group AG Annual Report 2024".to_owned(),
        "Contents\nNote 26 Post-employment benefit plans".to_owned(),
        "Consolidated income statement".to_owned(),
        TABLE_PAGE.to_owned(),
        "Glossary".to_owned(),
    ])
}

fn fixture_rows() -> Vec<Vec<String>> {
    read_grid_csv(Path::new(FIXTURE)).unwrap().rows().to_vec()
}

fn row_index(rows: &[Vec<String>], label: &str, nth: usize) -> usize {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row[0] == label)
        .nth(nth)
        .map(|(idx, _)| idx)
        .unwrap()
}

fn parse_rows(rows: Vec<Vec<String>>) -> Result<Vec<YearRecord>, ParseError> {
    parse_grid(&RawGrid::new(rows), 4, &ParserConfig::default())
}

fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

/// Counts table source calls.
struct CountingSource {
    inner: CsvGrid,
    calls: std::cell::Cell<u32>,
}

impl TableSource for CountingSource {
    fn extract_table(&self, page_number: u32) -> Result<RawGrid, TableSourceError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.extract_table(page_number)
    }
}

#[test]
fn two_year_report_yields_ordered_validated_records() {
    let tables = CountingSource {
        inner: CsvGrid::new(FIXTURE),
        calls: std::cell::Cell::new(0),
    };
    let extraction =
        extract_year_records(&report_pages(), &tables, &ParserConfig::default()).unwrap();

    assert_eq!(tables.calls.get(), 1);
    assert_eq!(extraction.page.page_number, 4);
    assert!(extraction.page.warnings.is_empty());

    let records = &extraction.records;
    assert_eq!(records.iter().map(|r| r.year).collect::<Vec<_>>(), vec![2024, 2023]);

    let (y2024, y2023) = (&records[0], &records[1]);
    approx(y2024.total_assets, 52_241.0);
    approx(y2023.total_assets, 54_404.0);
    approx(y2024.validation.percentage_sum, 99.0);
    approx(y2023.validation.percentage_sum, 100.0);
    assert!(y2024.validation.in_tolerance);
    assert!(y2023.validation.in_tolerance);

    approx(y2024.allocation(AssetClass::Bonds), 25.0);
    approx(y2024.allocation(AssetClass::Equities), 25.0);
    approx(y2024.allocation(AssetClass::RealEstate), 12.0);
    approx(y2023.allocation(AssetClass::Bonds), 25.0);
    approx(y2023.allocation(AssetClass::Equities), 26.0);
    approx(y2023.allocation(AssetClass::RealEstate), 12.0);

    assert_eq!(y2024.allocations.len(), 20);
    assert_eq!(y2024.offset.get(), 2);
    assert_eq!(y2024.offset_confidence, OffsetConfidence::Detected);
    assert_eq!(y2024.rounded_allocations()[&AssetClass::ForeignEquitySecurities], 15);
    approx(
        y2024.subtotals[&plan_assets_allocation_models::SectionState::InvestmentFunds],
        31.0,
    );

    assert_eq!(y2024.validation.warnings.len(), 1);
    assert!(y2024.validation.warnings[0].contains("FOREIGNREALESTATE is blank"));
    assert!(y2023.validation.warnings.is_empty());
}

#[test]
fn sum_of_exactly_hundred_has_no_tolerance_warning() {
    let mut rows = fixture_rows();
    let cash = row_index(&rows, "Cash and cash equivalents", 0);
    rows[cash][3] = "4".to_owned();

    let records = parse_rows(rows).unwrap();
    approx(records[0].validation.percentage_sum, 100.0);
    assert!(records[0].validation.in_tolerance);
    assert!(
        records[0]
            .validation
            .warnings
            .iter()
            .all(|w| !w.contains("percentage sum"))
    );
}

#[test]
fn sum_of_hundred_and_five_warns_with_delta() {
    let mut rows = fixture_rows();
    let cash = row_index(&rows, "Cash and cash equivalents", 0);
    rows[cash][6] = "8".to_owned();

    let records = parse_rows(rows).unwrap();
    let y2023 = &records[1];
    approx(y2023.validation.percentage_sum, 105.0);
    assert!(!y2023.validation.in_tolerance);
    assert!(!y2023.validation.passed());
    assert!(
        y2023
            .validation
            .warnings
            .iter()
            .any(|w| w.contains("percentage sum 105%") && w.contains("delta +5%"))
    );
}

#[test]
fn missing_allocation_header_falls_back_to_default_offset() {
    let mut rows = fixture_rows();
    rows[1][3] = "%".to_owned();
    rows[1][6] = "%".to_owned();

    let records = parse_rows(rows).unwrap();
    for record in &records {
        assert_eq!(record.offset.get(), 2);
        assert_eq!(record.offset_confidence, OffsetConfidence::Defaulted);
        assert!(
            record
                .validation
                .warnings
                .iter()
                .any(|w| w.contains("using default offset +2"))
        );
    }
    approx(records[0].allocation(AssetClass::Cash), 3.0);
}

#[test]
fn total_row_before_all_leaves_is_fatal() {
    let mut rows = fixture_rows();
    let total = rows.last().unwrap().clone();
    let bonds = row_index(&rows, "Bonds", 0);
    rows.insert(bonds, total);

    let err = parse_rows(rows).unwrap_err();
    assert!(matches!(err, ParseError::IncompleteTable { page: 4, .. }));
    assert_eq!(err.stage(), Stage::Classification);
}

#[test]
fn fund_subsection_values_stay_out_of_aggregates() {
    let mut rows = fixture_rows();
    let fund_domestic_equity = row_index(&rows, "Domestic", 2);
    rows[fund_domestic_equity][3] = "40".to_owned();

    let records = parse_rows(rows).unwrap();
    approx(records[0].allocation(AssetClass::DomesticEquities), 40.0);
    approx(records[0].allocation(AssetClass::Equities), 25.0);
}

#[test]
fn duplicate_leaf_keeps_first_occurrence() {
    let mut rows = fixture_rows();
    let foreign_bonds = row_index(&rows, "Foreign, AAA to BBB-", 0);
    let mut duplicate = rows[foreign_bonds].clone();
    duplicate[3] = "50".to_owned();
    rows.insert(foreign_bonds + 1, duplicate);

    let records = parse_rows(rows).unwrap();
    approx(records[0].allocation(AssetClass::NonInvestForeignBondsRated), 5.0);
    assert!(
        records[0]
            .validation
            .warnings
            .iter()
            .any(|w| w.contains("duplicate NONINVESTFOREIGNBONDSRATED"))
    );
}

#[test]
fn pipeline_is_idempotent() {
    let run = || {
        let extraction = extract_year_records(
            &report_pages(),
            &CsvGrid::new(FIXTURE),
            &ParserConfig::default(),
        )
        .unwrap();
        serde_json::to_string(&extraction.records).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn report_without_table_is_not_found() {
    let pages = PageTexts(vec!["Annual Report 2024".to_owned(), "Glossary".to_owned()]);
    let err = extract_year_records(&pages, &CsvGrid::new(FIXTURE), &ParserConfig::default())
        .unwrap_err();
    assert!(matches!(err, ParseError::NotFound { pages_scanned: 2 }));
    assert_eq!(err.stage(), Stage::PageLocation);
}

#[test]
fn header_without_dates_has_no_years() {
    let mut rows = fixture_rows();
    rows[0] = vec![String::new(); 7];

    let err = parse_rows(rows).unwrap_err();
    assert!(matches!(err, ParseError::NoYearsFound { page: 4 }));
    assert!(err.to_string().starts_with("[assembly]"));
}

#[test]
fn failing_table_source_is_an_extraction_error() {
    let err = extract_year_records(
        &report_pages(),
        &CsvGrid::new("/nonexistent/table.csv"),
        &ParserConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::Extraction { page: 4, .. }));
}
