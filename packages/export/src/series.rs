//! The fixed catalogue of exported series.
//!
//! Column order in the DATA file is part of the published format: total
//! assets first, then the 17 leaf allocations, then the 3 aggregates.

use plan_assets_allocation_models::{AssetClass, YearRecord};
use strum::{AsRefStr, Display};

use crate::ExportConfig;

const DESCRIPTION_PREFIX: &str = "Post-employment benefit plans";

/// What a series measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Metric {
    /// Total fair value of plan assets, USD millions.
    Level,
    /// Share of plan assets, percent.
    ActualAllocation,
}

/// Series adjustment component of the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Adjustment {
    None,
    Indirect,
}

/// Subject of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesAsset {
    /// Total fair value of plan assets.
    Total,
    /// One allocation class.
    Class(AssetClass),
}

/// One exported time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Series {
    pub asset: SeriesAsset,
    pub metric: Metric,
    pub adjustment: Adjustment,
}

impl Series {
    const fn allocation(class: AssetClass) -> Self {
        Self {
            asset: SeriesAsset::Class(class),
            metric: Metric::ActualAllocation,
            adjustment: match class {
                AssetClass::Other => Adjustment::Indirect,
                _ => Adjustment::None,
            },
        }
    }

    /// Asset component of the code (`TOTAL`, `CASH`, ...).
    #[must_use]
    pub fn asset_code(&self) -> &str {
        match &self.asset {
            SeriesAsset::Total => "TOTAL",
            SeriesAsset::Class(class) => class.as_ref(),
        }
    }

    /// Series code, e.g. `UBS.CASH.ACTUALALLOCATION.NONE.A.1@UBS`.
    #[must_use]
    pub fn code(&self, config: &ExportConfig) -> String {
        format!(
            "{dataset}.{asset}.{metric}.{adjustment}.{frequency}.1@{dataset}",
            dataset = config.dataset,
            asset = self.asset_code(),
            metric = self.metric,
            adjustment = self.adjustment,
            frequency = config.metadata.frequency,
        )
    }

    #[must_use]
    pub fn description(&self) -> String {
        match self.asset {
            SeriesAsset::Total => {
                format!("{DESCRIPTION_PREFIX}, Total fair value of plan asset")
            }
            SeriesAsset::Class(class) => {
                format!("{DESCRIPTION_PREFIX}, Actual Allocation, {}", class.description())
            }
        }
    }

    /// This series' value in `record`, rounded to a whole number.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn rounded_value(&self, record: &YearRecord) -> i64 {
        let value = match self.asset {
            SeriesAsset::Total => record.total_assets,
            SeriesAsset::Class(class) => record.allocation(class),
        };
        value.round() as i64
    }
}

/// All 21 series in DATA column order.
#[must_use]
pub fn series_catalog() -> Vec<Series> {
    std::iter::once(Series {
        asset: SeriesAsset::Total,
        metric: Metric::Level,
        adjustment: Adjustment::None,
    })
    .chain(AssetClass::all().map(Series::allocation))
    .collect()
}
