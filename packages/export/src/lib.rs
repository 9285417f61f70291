#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Time-series export of extracted year records.
//!
//! Records from one or more annual reports are merged per year, written as
//! a DATA file (one column per series, one row per year) and a META file
//! (one row per series), and bundled into a zip archive inside a
//! timestamped run directory. The bundle is also copied to `latest/`.

pub mod bundle;
pub mod config;
pub mod files;
pub mod merge;
pub mod series;

use std::path::PathBuf;

pub use bundle::{ExportBundle, write_bundle};
pub use config::ExportConfig;
pub use merge::{ReportRecords, merge_reports};
pub use series::{Series, series_catalog};

/// Errors that can occur while writing export files.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// File system failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization failure.
    #[error("CSV error writing {path}: {source}")]
    Csv {
        /// File being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },

    /// Zip archive failure.
    #[error("Zip error writing {path}: {source}")]
    Zip {
        /// Archive being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: zip::result::ZipError,
    },

    /// The export configuration could not be parsed.
    #[error("Invalid export configuration: {message}")]
    InvalidConfig {
        /// What was wrong.
        message: String,
    },

    /// There was nothing to export.
    #[error("No year records to export")]
    Empty,
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
