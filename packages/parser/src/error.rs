//! Fatal extraction errors.
//!
//! Recoverable conditions never surface here; they are appended to the
//! warnings of the affected year record. Every error names the pipeline
//! stage that raised it.

use plan_assets_allocation_models::AssetClass;
use plan_assets_allocation_models::source::TableSourceError;
use strum_macros::{AsRefStr, Display};

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    /// Searching page text for the target table.
    PageLocation,
    /// Reading page text or the raw table grid.
    Extraction,
    /// Walking grid rows through the section state machine.
    Classification,
    /// Deriving aggregate classes from leaf values.
    Aggregation,
    /// Building year records from classified values.
    Assembly,
    /// Loading or checking configuration.
    Configuration,
}

/// Errors that abort extraction for one report.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// No page satisfied the locator predicate.
    #[error(
        "[{}] no page matched the table keywords ({pages_scanned} pages scanned)",
        Stage::PageLocation
    )]
    NotFound {
        /// Number of pages searched.
        pages_scanned: usize,
    },

    /// Page text or table extraction failed.
    #[error("[{}] page {page}: {source}", Stage::Extraction)]
    Extraction {
        /// 1-based page number.
        page: u32,
        /// Backend error.
        source: TableSourceError,
    },

    /// No year marker was found in the table's header region.
    #[error(
        "[{}] no year markers found in the header of the table on page {page}",
        Stage::Assembly
    )]
    NoYearsFound {
        /// 1-based page number.
        page: u32,
    },

    /// The grid ended, or the summary row appeared, before the table was
    /// complete.
    #[error("[{}] incomplete table on page {page}: {reason}", Stage::Classification)]
    IncompleteTable {
        /// 1-based page number.
        page: u32,
        /// What was missing.
        reason: String,
    },

    /// A row label matched more than one leaf class.
    #[error(
        "[{}] row {row} label {label:?} matches several asset classes: {}",
        Stage::Classification,
        join_classes(.candidates)
    )]
    AmbiguousLeafMatch {
        /// 0-based grid row.
        row: usize,
        /// Raw row label.
        label: String,
        /// Every class the label matched.
        candidates: Vec<AssetClass>,
    },

    /// An aggregate definition references something other than leaf
    /// classes.
    #[error("[{}] aggregate {aggregate} cannot include {constituent}", Stage::Aggregation)]
    InvalidAggregate {
        /// Aggregate being computed.
        aggregate: AssetClass,
        /// Offending constituent.
        constituent: AssetClass,
    },

    /// The configuration is malformed or inconsistent.
    #[error("[{}] {message}", Stage::Configuration)]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl ParseError {
    /// Stage that raised this error.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::NotFound { .. } => Stage::PageLocation,
            Self::Extraction { .. } => Stage::Extraction,
            Self::NoYearsFound { .. } => Stage::Assembly,
            Self::IncompleteTable { .. } | Self::AmbiguousLeafMatch { .. } => {
                Stage::Classification
            }
            Self::InvalidAggregate { .. } => Stage::Aggregation,
            Self::InvalidConfig { .. } => Stage::Configuration,
        }
    }
}

fn join_classes(classes: &[AssetClass]) -> String {
    classes
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_prefixed_with_stage() {
        let err = ParseError::NotFound { pages_scanned: 412 };
        assert_eq!(err.stage(), Stage::PageLocation);
        assert_eq!(
            err.to_string(),
            "[page-location] no page matched the table keywords (412 pages scanned)"
        );
    }

    #[test]
    fn ambiguous_match_lists_candidates() {
        let err = ParseError::AmbiguousLeafMatch {
            row: 7,
            label: "Domestic and foreign".to_owned(),
            candidates: vec![
                AssetClass::DomesticEquitySecurities,
                AssetClass::ForeignEquitySecurities,
            ],
        };
        assert_eq!(err.stage(), Stage::Classification);
        assert!(err.to_string().starts_with("[classification] row 7"));
        assert!(
            err.to_string()
                .ends_with("DOMESTICEQUITYSECURITIES, FOREIGNEQUITYSECURITIES")
        );
    }

    #[test]
    fn extraction_errors_keep_the_backend_message() {
        let err = ParseError::Extraction {
            page: 3,
            source: TableSourceError::PageOutOfRange {
                page: 3,
                page_count: 2,
            },
        };
        assert_eq!(err.stage(), Stage::Extraction);
        assert!(err.to_string().contains("out of range"));
    }
}
