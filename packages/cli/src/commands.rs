//! Subcommand implementations.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use indicatif::MultiProgress;
use plan_assets_allocation_models::source::TableSource;
use plan_assets_allocation_models::{PageMatch, YearRecord};
use plan_assets_export::{ExportConfig, ReportRecords, merge_reports, write_bundle};
use plan_assets_parser::ParserConfig;
use plan_assets_parser::report::detect_report_year;
use plan_assets_pdf::PdfDocument;
use plan_assets_pdf::csv_grid::{CsvGrid, write_grid_csv};

use crate::progress;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Flags of the `parse` subcommand.
pub struct ParseOptions {
    pub table_csv: Option<PathBuf>,
    pub page: Option<u32>,
    pub json: bool,
    pub dump_grid: Option<PathBuf>,
}

/// Extracts page text off the async runtime.
async fn open_document(
    multi: &MultiProgress,
    pdf: PathBuf,
) -> Result<PdfDocument, Box<dyn std::error::Error>> {
    let spinner = progress::spinner(multi, &format!("Reading {}", pdf.display()));
    let document = tokio::task::spawn_blocking(move || PdfDocument::open(pdf)).await??;
    spinner.finish_and_clear();
    Ok(document)
}

/// Prints the located page and the evidence for it.
pub async fn locate(multi: &MultiProgress, pdf: PathBuf, config: &ParserConfig) -> CmdResult {
    let document = open_document(multi, pdf).await?;
    let page = plan_assets_parser::locator::locate_page(&document, &config.locator)?;

    println!("Page:        {}", page.page_number);
    println!("Candidates:  {:?}", page.candidate_pages);
    println!(
        "Keywords:    {}",
        page.matched_keywords.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    for snippet in &page.confidence_evidence {
        println!("  ...{snippet}...");
    }
    for warning in &page.warnings {
        println!("Warning: {warning}");
    }

    Ok(())
}

/// Parses one report and prints its year records.
pub async fn parse(
    multi: &MultiProgress,
    pdf: PathBuf,
    options: &ParseOptions,
    config: &ParserConfig,
) -> CmdResult {
    let document = open_document(multi, pdf).await?;
    let report_year = detect_report_year(document.path(), &document);

    let page = match options.page {
        Some(page_number) => {
            log::info!("Using page {page_number} as given");
            PageMatch {
                page_number,
                matched_keywords: BTreeSet::new(),
                confidence_evidence: Vec::new(),
                candidate_pages: vec![page_number],
                warnings: Vec::new(),
            }
        }
        None => plan_assets_parser::locator::locate_page(&document, &config.locator)?,
    };

    let csv_grid;
    let tables: &dyn TableSource = match &options.table_csv {
        Some(path) => {
            csv_grid = CsvGrid::new(path);
            &csv_grid
        }
        None => &document,
    };

    let extraction = plan_assets_parser::extract_on_page(tables, page, config)?;

    if let Some(path) = &options.dump_grid {
        write_grid_csv(&extraction.grid, path)?;
        log::info!("Grid written to {}", path.display());
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&extraction.records)?);
    } else {
        if let Some(year) = report_year {
            println!("Annual report {year}, page {}", extraction.page.page_number);
        }
        for record in &extraction.records {
            print_record(record);
        }
    }

    Ok(())
}

fn print_record(record: &YearRecord) {
    println!();
    println!(
        "{}: total assets {} USD m, sum {}% ({}), offset {} ({})",
        record.year,
        record.total_assets,
        record.validation.percentage_sum,
        if record.validation.in_tolerance { "ok" } else { "out of tolerance" },
        record.offset,
        record.offset_confidence,
    );
    for (class, pct) in record.rounded_allocations() {
        println!("  {:<32} {pct:>4}", class.as_ref());
    }
    for warning in &record.validation.warnings {
        println!("  warning: {warning}");
    }
}

/// Parses every report, merges the years and writes the export bundle.
///
/// A report that fails to parse is logged and skipped unless `fail_fast`
/// is set.
pub async fn export(
    multi: &MultiProgress,
    pdfs: Vec<PathBuf>,
    output_dir: &Path,
    fail_fast: bool,
    config: &ParserConfig,
    export_config: &ExportConfig,
) -> CmdResult {
    let bar = progress::steps_bar(multi, "Reports", pdfs.len() as u64);
    let mut reports = Vec::new();
    let mut failed = Vec::new();

    for pdf in pdfs {
        bar.set_message(pdf.display().to_string());
        match parse_report(multi, pdf.clone(), config).await {
            Ok(report) => reports.push(report),
            Err(e) if !fail_fast => {
                log::error!("Skipping {}: {e}", pdf.display());
                failed.push(pdf);
            }
            Err(e) => return Err(e),
        }
        bar.inc(1);
    }
    bar.finish_with_message("Reports parsed");

    if reports.is_empty() {
        return Err("no report could be parsed".into());
    }

    let records = merge_reports(&reports);
    let bundle = write_bundle(
        &records,
        export_config,
        output_dir,
        chrono::Local::now().naive_local(),
    )?;

    println!("Years:    {}", years_label(&records));
    println!("DATA:     {}", bundle.data_file.display());
    println!("META:     {}", bundle.meta_file.display());
    println!("ZIP:      {}", bundle.zip_file.display());
    println!("Latest:   {}", bundle.latest_dir.display());
    if !failed.is_empty() {
        println!("Skipped {} report(s):", failed.len());
        for pdf in &failed {
            println!("  {}", pdf.display());
        }
    }

    Ok(())
}

async fn parse_report(
    multi: &MultiProgress,
    pdf: PathBuf,
    config: &ParserConfig,
) -> Result<ReportRecords, Box<dyn std::error::Error>> {
    let document = open_document(multi, pdf).await?;
    let report_year = detect_report_year(document.path(), &document);
    let extraction = plan_assets_parser::extract_year_records(&document, &document, config)?;

    Ok(ReportRecords {
        source: document.path().to_path_buf(),
        report_year,
        records: extraction.records,
    })
}

fn years_label(records: &[YearRecord]) -> String {
    records
        .iter()
        .map(|record| record.year.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Downloads one report per year.
pub async fn download(
    multi: &MultiProgress,
    url_template: &str,
    years: &[i32],
    dir: &Path,
) -> CmdResult {
    let spinner = progress::spinner(multi, &format!("Downloading {} report(s)", years.len()));
    let reports = plan_assets_pdf::download::download_reports(url_template, years, dir).await?;
    spinner.finish_and_clear();

    for report in &reports {
        println!("{}: {}", report.year, report.path.display());
    }

    Ok(())
}
