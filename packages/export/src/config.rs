//! Dataset naming and series metadata.
//!
//! Defaults are embedded from `config/default.toml`. Override files are
//! merged over the defaults, so they only need the keys they change.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ExportError;

const DEFAULT_TOML: &str = include_str!("config/default.toml");

/// Export configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Dataset identifier used in series codes and file names.
    pub dataset: String,
    /// Leading component of every output file name.
    pub file_prefix: String,
    /// Values copied into each META row.
    pub metadata: SeriesMetadata,
}

/// Per-series metadata columns shared by all series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesMetadata {
    pub frequency: String,
    pub multiplier: u32,
    pub aggregation_type: String,
    pub unit_type: String,
    pub data_type: String,
    pub data_unit: String,
    pub seasonally_adjusted: String,
    pub annualized: bool,
    pub provider_measure_url: String,
    pub provider: String,
    pub source: String,
    pub source_description: String,
    pub country: String,
}

fn default_table() -> toml::Table {
    DEFAULT_TOML
        .parse()
        .unwrap_or_else(|e| panic!("Failed to parse embedded export default.toml: {e}"))
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        toml::Value::Table(default_table())
            .try_into()
            .unwrap_or_else(|e| {
                panic!("Embedded export default.toml does not match ExportConfig: {e}")
            })
    }
}

impl ExportConfig {
    /// Parses an override document on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidConfig`] if the document is not valid
    /// TOML, does not match the schema, or leaves `dataset` empty.
    pub fn from_toml_str(s: &str) -> Result<Self, ExportError> {
        let overrides: toml::Table = toml::de::from_str(s).map_err(|e| ExportError::InvalidConfig {
            message: e.to_string(),
        })?;

        let mut table = default_table();
        merge_tables(&mut table, overrides);

        let config: Self =
            toml::Value::Table(table)
                .try_into()
                .map_err(|e: toml::de::Error| ExportError::InvalidConfig {
                    message: e.to_string(),
                })?;

        if config.dataset.trim().is_empty() {
            return Err(ExportError::InvalidConfig {
                message: "dataset must not be empty".to_owned(),
            });
        }

        Ok(config)
    }

    /// Loads an override file.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the file cannot be read, or
    /// [`ExportError::InvalidConfig`] if its contents are invalid.
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        let contents = std::fs::read_to_string(path).map_err(ExportError::io(path))?;
        log::info!("Loading export configuration from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// `{prefix}_{dataset}` stem shared by every output file name.
    #[must_use]
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.file_prefix, self.dataset)
    }
}
