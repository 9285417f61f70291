//! Extraction settings.
//!
//! Defaults are embedded from `config/default.toml`; an override file only
//! needs the keys it changes. Overrides are merged into the default table
//! key by key (arrays are replaced whole) before deserializing.

use std::collections::BTreeSet;
use std::path::Path;

use plan_assets_allocation_models::{AssetClass, ColumnOffset};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ParseError;

const DEFAULT_TOML: &str = include_str!("config/default.toml");

/// Complete parser configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Page search settings.
    pub locator: LocatorConfig,
    /// Year marker scan settings.
    pub header: HeaderConfig,
    /// Allocation column detection settings.
    pub offset: OffsetConfig,
    /// Consistency check bounds.
    pub validation: ValidationConfig,
    /// Aggregate constituent table.
    pub aggregates: Vec<AggregateDefinition>,
}

/// How the target page is recognised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Each group lists alternatives; a page matches when every group has
    /// at least one alternative in its text.
    pub keyword_groups: Vec<Vec<String>>,
    /// Date marker that must also appear on the page.
    pub date_pattern: String,
    /// Search from the last page towards the first.
    pub search_backward: bool,
}

/// How year markers are found in the table header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderConfig {
    /// Year marker pattern; the first capture group holds a two- or
    /// four-digit year.
    pub date_pattern: String,
    /// Maximum number of reporting years to read.
    pub max_years: usize,
    /// Leading grid rows the classifier skips.
    pub skip_rows: usize,
}

/// How the allocation column is located relative to a year marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetConfig {
    /// Offsets to try, in preference order.
    pub candidates: Vec<ColumnOffset>,
    /// Offset used when no candidate is confirmed by header text.
    pub default_offset: ColumnOffset,
    /// Tokens a header cell must all contain (case-insensitive).
    pub header_tokens: Vec<String>,
    /// Rows above the marker row to inspect.
    pub rows_above: usize,
    /// Rows below the marker row to inspect.
    pub rows_below: usize,
    /// Columns between the fair value column and the allocation column.
    pub fair_value_shift: usize,
}

/// Bounds for the per-year consistency checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Lowest accepted sum of leaf percentages.
    pub percentage_min: f64,
    /// Highest accepted sum of leaf percentages.
    pub percentage_max: f64,
    /// Lowest plausible total assets (USD millions).
    pub total_assets_min: f64,
    /// Highest plausible total assets (USD millions).
    pub total_assets_max: f64,
    /// Treat a leaf row missing from the table as fatal.
    pub require_all_leaves: bool,
    /// Leaves whose blank or dash cells read as zero.
    pub zero_eligible: BTreeSet<AssetClass>,
}

/// One aggregate and the leaves it sums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateDefinition {
    /// Aggregate class.
    pub aggregate: AssetClass,
    /// Main-section leaves summed into it.
    pub constituents: Vec<AssetClass>,
}

fn default_table() -> toml::Table {
    DEFAULT_TOML
        .parse()
        .unwrap_or_else(|e| panic!("Failed to parse embedded default.toml: {e}"))
}

/// Recursively overlays `overrides` onto `base`.
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

impl Default for ParserConfig {
    fn default() -> Self {
        toml::Value::Table(default_table())
            .try_into()
            .unwrap_or_else(|e| panic!("Embedded default.toml does not match ParserConfig: {e}"))
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        ParserConfig::default().locator
    }
}

impl Default for HeaderConfig {
    fn default() -> Self {
        ParserConfig::default().header
    }
}

impl Default for OffsetConfig {
    fn default() -> Self {
        ParserConfig::default().offset
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ParserConfig::default().validation
    }
}

impl ParserConfig {
    /// Parses a TOML override on top of the defaults and checks it.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidConfig`] if the TOML is malformed or the
    /// settings are inconsistent.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ParseError> {
        let invalid = |e: toml::de::Error| ParseError::InvalidConfig {
            message: e.to_string(),
        };

        let overrides: toml::Table = toml_str.parse().map_err(invalid)?;
        let mut table = default_table();
        merge_tables(&mut table, overrides);

        let config: Self = toml::Value::Table(table).try_into().map_err(invalid)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidConfig`] if the file cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        let text = std::fs::read_to_string(path).map_err(|e| ParseError::InvalidConfig {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded parser configuration from {}", path.display());
        Ok(config)
    }

    /// Checks settings that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<(), ParseError> {
        let invalid = |message: String| Err(ParseError::InvalidConfig { message });

        if self.locator.keyword_groups.iter().any(Vec::is_empty) {
            return invalid("locator.keyword_groups contains an empty group".to_owned());
        }
        compile_year_pattern("locator.date_pattern", &self.locator.date_pattern)?;
        compile_year_pattern("header.date_pattern", &self.header.date_pattern)?;
        if self.header.max_years == 0 {
            return invalid("header.max_years must be at least 1".to_owned());
        }
        if self.offset.candidates.is_empty() {
            return invalid("offset.candidates must not be empty".to_owned());
        }
        if self.offset.fair_value_shift == 0 {
            return invalid("offset.fair_value_shift must be at least 1".to_owned());
        }
        if self.validation.percentage_min > self.validation.percentage_max {
            return invalid(format!(
                "validation.percentage_min ({}) exceeds percentage_max ({})",
                self.validation.percentage_min, self.validation.percentage_max
            ));
        }
        if self.validation.total_assets_min > self.validation.total_assets_max {
            return invalid(format!(
                "validation.total_assets_min ({}) exceeds total_assets_max ({})",
                self.validation.total_assets_min, self.validation.total_assets_max
            ));
        }

        let mut seen = BTreeSet::new();
        for definition in &self.aggregates {
            if !definition.aggregate.is_aggregate() {
                return invalid(format!(
                    "{} is not an aggregate class",
                    definition.aggregate
                ));
            }
            if !seen.insert(definition.aggregate) {
                return invalid(format!("aggregate {} defined twice", definition.aggregate));
            }
        }

        Ok(())
    }

    /// Constituents configured for `aggregate`, empty when undefined.
    #[must_use]
    pub fn constituents(&self, aggregate: AssetClass) -> &[AssetClass] {
        self.aggregates
            .iter()
            .find(|d| d.aggregate == aggregate)
            .map_or(&[], |d| d.constituents.as_slice())
    }
}

/// Compiles a pattern that must capture a year in group 1.
///
/// # Errors
///
/// Returns [`ParseError::InvalidConfig`] if the pattern does not compile or
/// has no capture group.
pub fn compile_year_pattern(key: &str, pattern: &str) -> Result<Regex, ParseError> {
    let regex = Regex::new(pattern).map_err(|e| ParseError::InvalidConfig {
        message: format!("{key}: {e}"),
    })?;
    if regex.captures_len() < 2 {
        return Err(ParseError::InvalidConfig {
            message: format!("{key}: pattern needs a capture group for the year"),
        });
    }
    Ok(regex)
}
