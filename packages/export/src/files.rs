//! DATA and META file layouts.

use std::path::Path;

use plan_assets_allocation_models::YearRecord;

use crate::series::{Series, series_catalog};
use crate::{ExportConfig, ExportError};

/// Header row of the META file.
pub const META_COLUMNS: [&str; 16] = [
    "CODE",
    "DESCRIPTION",
    "FREQUENCY",
    "MULTIPLIER",
    "AGGREGATION_TYPE",
    "UNIT_TYPE",
    "DATA_TYPE",
    "DATA_UNIT",
    "SEASONALLY_ADJUSTED",
    "ANNUALIZED",
    "PROVIDER_MEASURE_URL",
    "PROVIDER",
    "SOURCE",
    "SOURCE_DESCRIPTION",
    "COUNTRY",
    "DATASET",
];

/// DATA rows: series codes, series descriptions, then one row per year in
/// ascending order. The first column holds the year and is blank in the two
/// header rows.
#[must_use]
pub fn data_rows(records: &[YearRecord], config: &ExportConfig) -> Vec<Vec<String>> {
    let catalog = series_catalog();

    let codes: Vec<String> = std::iter::once(String::new())
        .chain(catalog.iter().map(|series| series.code(config)))
        .collect();
    let descriptions: Vec<String> = std::iter::once(String::new())
        .chain(catalog.iter().map(Series::description))
        .collect();
    let mut rows = vec![codes, descriptions];

    let mut sorted: Vec<&YearRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.year);

    for record in sorted {
        rows.push(
            std::iter::once(record.year.to_string())
                .chain(
                    catalog
                        .iter()
                        .map(|series| series.rounded_value(record).to_string()),
                )
                .collect(),
        );
    }

    rows
}

/// META rows: the column header, then one row per series.
#[must_use]
pub fn meta_rows(config: &ExportConfig) -> Vec<Vec<String>> {
    let meta = &config.metadata;
    let mut rows = vec![META_COLUMNS.iter().map(|&c| c.to_owned()).collect()];

    for series in series_catalog() {
        rows.push(vec![
            series.code(config),
            series.description(),
            meta.frequency.clone(),
            meta.multiplier.to_string(),
            meta.aggregation_type.clone(),
            meta.unit_type.clone(),
            meta.data_type.clone(),
            meta.data_unit.clone(),
            meta.seasonally_adjusted.clone(),
            meta.annualized.to_string(),
            meta.provider_measure_url.clone(),
            meta.provider.clone(),
            meta.source.clone(),
            meta.source_description.clone(),
            meta.country.clone(),
            config.dataset.clone(),
        ]);
    }

    rows
}

fn write_rows(path: &Path, rows: &[Vec<String>]) -> Result<(), ExportError> {
    let csv_err = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for row in rows {
        writer.write_record(row).map_err(csv_err)?;
    }
    writer.flush().map_err(ExportError::io(path))?;
    Ok(())
}

/// Writes the DATA file.
///
/// # Errors
///
/// Returns [`ExportError::Empty`] if `records` is empty, or
/// [`ExportError::Csv`] if the file cannot be written.
pub fn write_data_file(
    path: &Path,
    records: &[YearRecord],
    config: &ExportConfig,
) -> Result<(), ExportError> {
    if records.is_empty() {
        return Err(ExportError::Empty);
    }
    write_rows(path, &data_rows(records, config))?;
    log::info!("DATA file written: {} ({} years)", path.display(), records.len());
    Ok(())
}

/// Writes the META file.
///
/// # Errors
///
/// Returns [`ExportError::Csv`] if the file cannot be written.
pub fn write_meta_file(path: &Path, config: &ExportConfig) -> Result<(), ExportError> {
    write_rows(path, &meta_rows(config))?;
    log::info!("META file written: {}", path.display());
    Ok(())
}
