//! Run directories, zip archives and the `latest` copy.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use plan_assets_allocation_models::YearRecord;

use crate::files::{write_data_file, write_meta_file};
use crate::{ExportConfig, ExportError};

/// Name of the directory holding copies of the most recent bundle.
pub const LATEST_DIR: &str = "latest";

/// Paths of everything one export run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    /// `<output>/<YYYYMMDD_HHMMSS>`
    pub run_dir: PathBuf,
    pub data_file: PathBuf,
    pub meta_file: PathBuf,
    pub zip_file: PathBuf,
    /// `<output>/latest`
    pub latest_dir: PathBuf,
}

/// Writes DATA, META and the zip archive for `records` under a run
/// directory named after `run_at`, then refreshes `<output_dir>/latest`.
///
/// # Errors
///
/// Returns [`ExportError::Empty`] if there are no records, or an I/O, CSV
/// or zip error if any file cannot be written.
pub fn write_bundle(
    records: &[YearRecord],
    config: &ExportConfig,
    output_dir: &Path,
    run_at: NaiveDateTime,
) -> Result<ExportBundle, ExportError> {
    if records.is_empty() {
        return Err(ExportError::Empty);
    }

    let run_dir = output_dir.join(run_at.format("%Y%m%d_%H%M%S").to_string());
    std::fs::create_dir_all(&run_dir).map_err(ExportError::io(&run_dir))?;

    let stem = config.file_stem();
    let date = run_at.format("%Y%m%d").to_string();

    let data_file = run_dir.join(format!("{stem}_DATA_{date}.csv"));
    let meta_file = run_dir.join(format!("{stem}_META_{date}.csv"));
    let zip_file = run_dir.join(format!("{stem}_{date}.zip"));

    write_data_file(&data_file, records, config)?;
    write_meta_file(&meta_file, config)?;
    write_zip(&zip_file, &[&data_file, &meta_file])?;

    let latest_dir = output_dir.join(LATEST_DIR);
    std::fs::create_dir_all(&latest_dir).map_err(ExportError::io(&latest_dir))?;
    for (from, name) in [
        (&data_file, format!("{stem}_DATA_latest.csv")),
        (&meta_file, format!("{stem}_META_latest.csv")),
        (&zip_file, format!("{stem}_latest.zip")),
    ] {
        let to = latest_dir.join(name);
        std::fs::copy(from, &to).map_err(ExportError::io(&to))?;
    }
    log::info!("Files also copied to {}", latest_dir.display());

    Ok(ExportBundle {
        run_dir,
        data_file,
        meta_file,
        zip_file,
        latest_dir,
    })
}

/// Archives `files` (deflated) under their bare file names.
fn write_zip(zip_path: &Path, files: &[&Path]) -> Result<(), ExportError> {
    let zip_err = |source| ExportError::Zip {
        path: zip_path.to_path_buf(),
        source,
    };

    let file = std::fs::File::create(zip_path).map_err(ExportError::io(zip_path))?;
    let mut zip_writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let contents = std::fs::read(path).map_err(ExportError::io(*path))?;
        zip_writer.start_file(name, options).map_err(zip_err)?;
        zip_writer
            .write_all(&contents)
            .map_err(ExportError::io(zip_path))?;
    }

    zip_writer.finish().map_err(zip_err)?;
    log::info!("Zip archive written: {}", zip_path.display());
    Ok(())
}
