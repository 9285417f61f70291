#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Asset-class taxonomy and record types for pension plan asset extraction.
//!
//! This crate defines the canonical vocabulary shared by every stage of the
//! extraction pipeline: the 17 leaf asset classes found in the Swiss defined
//! benefit plan asset table, the 3 aggregate classes derived from them, the
//! section hierarchy the table is organised in, and the per-year records the
//! pipeline produces.
//!
//! The two capabilities the core consumes from the outside world (page text
//! and raw table extraction) are defined in [`source`] so that the parser does
//! not depend on any particular PDF backend.

pub mod grid;
pub mod source;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use grid::RawGrid;

/// An asset-class tag as published in the output series.
///
/// The first 17 variants are leaf classes read directly from table rows; the
/// last three are aggregates derived from leaf values and never parsed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum AssetClass {
    /// Cash and cash equivalents
    Cash,
    /// Equity securities, domestic
    DomesticEquitySecurities,
    /// Equity securities, foreign
    ForeignEquitySecurities,
    /// Bonds outside investment funds, domestic, AAA to BBB-
    NonInvestDomesticBonds,
    /// Bonds outside investment funds, foreign, AAA to BBB-
    NonInvestForeignBondsRated,
    /// Real estate / property, domestic
    DomesticRealEstate,
    /// Real estate / property, foreign
    ForeignRealEstate,
    /// Investment funds, equity, domestic
    DomesticEquities,
    /// Investment funds, equity, foreign
    ForeignEquities,
    /// Investment funds, bonds, domestic, AAA to BBB-
    DomesticBonds,
    /// Investment funds, bonds, domestic, below BBB-
    DomesticBondsJunk,
    /// Investment funds, bonds, foreign, AAA to BBB-
    ForeignBondsRated,
    /// Investment funds, bonds, foreign, below BBB-
    ForeignBondsJunk,
    /// Investment funds, real estate, domestic
    DomesticRealEstateInvestments,
    /// Investment funds, real estate, foreign
    ForeignRealEstateInvestments,
    /// Investment funds, other
    Other,
    /// Other investments (top level)
    OtherInvestments,
    /// Aggregate: main-section bonds
    Bonds,
    /// Aggregate: main-section equity securities
    Equities,
    /// Aggregate: main-section real estate
    RealEstate,
}

impl AssetClass {
    /// The 17 leaf classes, in output-series order.
    pub const LEAVES: &[Self] = &[
        Self::Cash,
        Self::DomesticEquitySecurities,
        Self::ForeignEquitySecurities,
        Self::NonInvestDomesticBonds,
        Self::NonInvestForeignBondsRated,
        Self::DomesticRealEstate,
        Self::ForeignRealEstate,
        Self::DomesticEquities,
        Self::ForeignEquities,
        Self::DomesticBonds,
        Self::DomesticBondsJunk,
        Self::ForeignBondsRated,
        Self::ForeignBondsJunk,
        Self::DomesticRealEstateInvestments,
        Self::ForeignRealEstateInvestments,
        Self::Other,
        Self::OtherInvestments,
    ];

    /// The 3 aggregate classes, in output-series order.
    pub const AGGREGATES: &[Self] = &[Self::Bonds, Self::Equities, Self::RealEstate];

    /// Returns all 20 classes: leaves first, then aggregates.
    #[must_use]
    pub fn all() -> impl Iterator<Item = Self> {
        Self::LEAVES.iter().chain(Self::AGGREGATES).copied()
    }

    /// Whether this class is read from a table row.
    #[must_use]
    pub const fn is_leaf(self) -> bool {
        !self.is_aggregate()
    }

    /// Whether this class is derived from leaf values.
    #[must_use]
    pub const fn is_aggregate(self) -> bool {
        matches!(self, Self::Bonds | Self::Equities | Self::RealEstate)
    }

    /// Human-readable description used in output series metadata.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Cash => "Cash and cash equivalents",
            Self::DomesticEquitySecurities => "Equity securities, Domestic",
            Self::ForeignEquitySecurities => "Equity securities, Foreign",
            Self::NonInvestDomesticBonds => "Non investment fund Domestic, AAA to BBB-",
            Self::NonInvestForeignBondsRated => "Non investment fund Foreign, AAA to BBB-",
            Self::DomesticRealEstate => "Real estate / property, Domestic",
            Self::ForeignRealEstate => "Real estate / property, Foreign",
            Self::DomesticEquities => "Equity, Domestic",
            Self::ForeignEquities => "Equity, Foreign",
            Self::DomesticBonds => "Bonds, Domestic, AAA to BBB-",
            Self::DomesticBondsJunk => "Bonds, Domestic, below BBB-",
            Self::ForeignBondsRated => "Bonds, Foreign, AAA to BBB-",
            Self::ForeignBondsJunk => "Bonds, Foreign, below BBB-",
            Self::DomesticRealEstateInvestments => "Domestic Real estate Investments",
            Self::ForeignRealEstateInvestments => "Foreign Real estate Investments",
            Self::Other => "Other",
            Self::OtherInvestments => "Other Investments",
            Self::Bonds => "Bonds",
            Self::Equities => "Equity",
            Self::RealEstate => "Real estate / property",
        }
    }
}

/// Position of the row classifier inside the table's section hierarchy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionState {
    /// Outside any section (cash, other investments).
    Top,
    /// Inside "Equity securities".
    EquitySecurities,
    /// Inside the main "Bonds" section.
    Bonds,
    /// Inside "Real estate / property".
    RealEstate,
    /// Inside "Investment funds", before any subsection.
    InvestmentFunds,
    /// Inside "Investment funds" → "Equity".
    InvestmentFundsEquity,
    /// Inside "Investment funds" → "Bonds".
    InvestmentFundsBonds,
    /// Inside "Investment funds" → "Real estate".
    InvestmentFundsRealEstate,
    /// The summary row has been consumed.
    Done,
}

impl SectionState {
    /// Whether the state lies anywhere under "Investment funds".
    #[must_use]
    pub const fn is_investment_funds(self) -> bool {
        matches!(
            self,
            Self::InvestmentFunds
                | Self::InvestmentFundsEquity
                | Self::InvestmentFundsBonds
                | Self::InvestmentFundsRealEstate
        )
    }

    /// Whether leaf values read in this state belong to a main section.
    ///
    /// Only the `INVESTMENT_FUNDS_*` substates are nested; every other state
    /// (including `INVESTMENT_FUNDS` itself) is top-level.
    #[must_use]
    pub const fn is_main_section(self) -> bool {
        !matches!(
            self,
            Self::InvestmentFundsEquity
                | Self::InvestmentFundsBonds
                | Self::InvestmentFundsRealEstate
        )
    }
}

/// The page chosen to hold the target table, with the evidence for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMatch {
    /// 1-based page number.
    pub page_number: u32,
    /// Keyword alternatives that were found on the page.
    pub matched_keywords: BTreeSet<String>,
    /// Text snippets around each matched keyword and date marker, in
    /// document order.
    pub confidence_evidence: Vec<String>,
    /// Every page that satisfied the predicate, in search order.
    pub candidate_pages: Vec<u32>,
    /// Recoverable issues found while locating the page.
    pub warnings: Vec<String>,
}

/// A reporting-year column header found in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearMarker {
    /// Four-digit year.
    pub year: i32,
    /// Grid row holding the marker.
    pub row_index: usize,
    /// Grid column holding the marker.
    pub col_index: usize,
}

/// Displacement from a year marker's column to that year's allocation
/// percentage column. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct ColumnOffset(usize);

impl ColumnOffset {
    /// Creates an offset, rejecting zero.
    #[must_use]
    pub const fn new(value: usize) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    /// Returns the raw displacement.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<usize> for ColumnOffset {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "column offset must be at least 1".to_owned())
    }
}

impl From<ColumnOffset> for usize {
    fn from(offset: ColumnOffset) -> Self {
        offset.0
    }
}

impl std::fmt::Display for ColumnOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "+{}", self.0)
    }
}

/// How a [`ColumnOffset`] was obtained.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OffsetConfidence {
    /// Confirmed by an allocation header cell.
    Detected,
    /// No header confirmed any candidate; the configured default was used.
    Defaulted,
}

/// A leaf value read from one table row for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetClassValue {
    /// Leaf tag the row was classified as.
    pub asset_class: AssetClass,
    /// Reporting year of the column the value came from.
    pub year: i32,
    /// Allocation percentage.
    pub percentage: f64,
    /// `false` when read inside an investment-funds subsection.
    pub is_main_section: bool,
}

/// Outcome of the consistency checks for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    /// Sum of all 17 leaf percentages.
    pub percentage_sum: f64,
    /// Whether `percentage_sum` lies within the configured tolerance.
    pub in_tolerance: bool,
    /// Every recoverable issue attached to this year, in detection order.
    pub warnings: Vec<String>,
}

impl Validation {
    /// Pass/fail summary for downstream consumers.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.in_tolerance
    }
}

/// One normalized year of plan asset allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRecord {
    /// Reporting year.
    pub year: i32,
    /// Total fair value of plan assets in USD millions.
    pub total_assets: f64,
    /// All 20 asset-class tags mapped to percentages.
    pub allocations: BTreeMap<AssetClass, f64>,
    /// Values carried by section header rows (e.g. the investment funds
    /// subtotal). Informational only; never part of aggregates.
    pub subtotals: BTreeMap<SectionState, f64>,
    /// Page the table was read from.
    pub page_number: u32,
    /// Allocation column displacement used for this year.
    pub offset: ColumnOffset,
    /// Whether `offset` was confirmed by header text.
    pub offset_confidence: OffsetConfidence,
    /// Consistency check results.
    pub validation: Validation,
}

impl YearRecord {
    /// Returns the percentage for `class`, or zero when absent.
    #[must_use]
    pub fn allocation(&self, class: AssetClass) -> f64 {
        self.allocations.get(&class).copied().unwrap_or(0.0)
    }

    /// Percentages rounded to whole numbers for presentation.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn rounded_allocations(&self) -> BTreeMap<AssetClass, i64> {
        self.allocations
            .iter()
            .map(|(class, pct)| (*class, pct.round() as i64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn tags_serialize_as_concatenated_uppercase() {
        assert_eq!(
            AssetClass::DomesticEquitySecurities.to_string(),
            "DOMESTICEQUITYSECURITIES"
        );
        assert_eq!(
            AssetClass::NonInvestForeignBondsRated.as_ref(),
            "NONINVESTFOREIGNBONDSRATED"
        );
        assert_eq!(
            AssetClass::from_str("FOREIGNREALESTATEINVESTMENTS").unwrap(),
            AssetClass::ForeignRealEstateInvestments
        );
        assert_eq!(
            serde_json::to_string(&AssetClass::RealEstate).unwrap(),
            "\"REALESTATE\""
        );
    }

    #[test]
    fn has_seventeen_leaves_and_three_aggregates() {
        assert_eq!(AssetClass::LEAVES.len(), 17);
        assert_eq!(AssetClass::AGGREGATES.len(), 3);
        assert_eq!(AssetClass::all().count(), 20);
        assert!(AssetClass::LEAVES.iter().all(|c| c.is_leaf()));
        assert!(AssetClass::AGGREGATES.iter().all(|c| c.is_aggregate()));
    }

    #[test]
    fn only_fund_substates_are_nested() {
        assert!(SectionState::Top.is_main_section());
        assert!(SectionState::Bonds.is_main_section());
        assert!(SectionState::InvestmentFunds.is_main_section());
        assert!(!SectionState::InvestmentFundsBonds.is_main_section());
        assert!(!SectionState::InvestmentFundsEquity.is_main_section());
        assert!(!SectionState::InvestmentFundsRealEstate.is_main_section());
        assert_eq!(
            SectionState::InvestmentFundsRealEstate.to_string(),
            "INVESTMENT_FUNDS_REAL_ESTATE"
        );
    }

    #[test]
    fn column_offset_rejects_zero() {
        assert!(ColumnOffset::new(0).is_none());
        assert_eq!(ColumnOffset::new(2).unwrap().get(), 2);
        assert!(serde_json::from_str::<ColumnOffset>("0").is_err());
        assert_eq!(ColumnOffset::new(3).unwrap().to_string(), "+3");
    }
}
