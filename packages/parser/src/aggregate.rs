//! Aggregate classes and per-year consistency checks.

use std::collections::BTreeMap;

use plan_assets_allocation_models::{AssetClass, AssetClassValue, Validation};

use crate::ParseError;
use crate::config::{ParserConfig, ValidationConfig};

/// Sums main-section constituents into each configured aggregate.
///
/// Aggregates without a definition are zero. Nested values (read inside an
/// investment-funds subsection) never contribute.
///
/// # Errors
///
/// Returns [`ParseError::InvalidAggregate`] if a constituent is not a leaf
/// class.
pub fn compute_aggregates(
    values: &BTreeMap<AssetClass, AssetClassValue>,
    config: &ParserConfig,
) -> Result<BTreeMap<AssetClass, f64>, ParseError> {
    let mut aggregates = BTreeMap::new();

    for &aggregate in AssetClass::AGGREGATES {
        let mut sum = 0.0;
        for &constituent in config.constituents(aggregate) {
            if !constituent.is_leaf() {
                return Err(ParseError::InvalidAggregate {
                    aggregate,
                    constituent,
                });
            }
            match values.get(&constituent) {
                Some(value) if value.is_main_section => sum += value.percentage,
                Some(_) => log::debug!("{aggregate}: skipping nested {constituent}"),
                None => {}
            }
        }
        aggregates.insert(aggregate, sum);
    }

    log::info!(
        "Aggregates: bonds {}%, equities {}%, real estate {}%",
        aggregates[&AssetClass::Bonds],
        aggregates[&AssetClass::Equities],
        aggregates[&AssetClass::RealEstate]
    );

    Ok(aggregates)
}

/// Checks one year's leaf percentages and total assets.
///
/// `leaves` holds all 17 leaf classes (absent ones already defaulted to
/// zero), `missing` names the classes that were absent. Every problem is a
/// warning; nothing here is fatal.
#[must_use]
pub fn validate_year(
    year: i32,
    leaves: &BTreeMap<AssetClass, f64>,
    missing: &[AssetClass],
    total_assets: Option<f64>,
    config: &ValidationConfig,
) -> Validation {
    let mut warnings = Vec::new();
    let mut warn = |message: String| {
        log::warn!("{message}");
        warnings.push(message);
    };

    let percentage_sum: f64 = AssetClass::LEAVES
        .iter()
        .map(|class| leaves.get(class).copied().unwrap_or(0.0))
        .sum();
    let in_tolerance =
        (config.percentage_min..=config.percentage_max).contains(&percentage_sum);

    if in_tolerance {
        log::info!("{year}: percentage sum {percentage_sum}% within tolerance");
    } else {
        warn(format!(
            "{year}: percentage sum {percentage_sum}% outside [{}, {}] (delta {:+}%)",
            config.percentage_min,
            config.percentage_max,
            percentage_sum - 100.0
        ));
    }

    match total_assets {
        Some(total) if (config.total_assets_min..=config.total_assets_max).contains(&total) => {}
        Some(total) => warn(format!(
            "{year}: total assets {total} USD m outside plausible range [{}, {}]",
            config.total_assets_min, config.total_assets_max
        )),
        None => warn(format!("{year}: total assets missing; reported as 0")),
    }

    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(AsRef::as_ref).collect();
        warn(format!(
            "{year}: missing asset classes defaulted to 0: {}",
            names.join(", ")
        ));
    }

    Validation {
        percentage_sum,
        in_tolerance,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(
        asset_class: AssetClass,
        percentage: f64,
        is_main_section: bool,
    ) -> (AssetClass, AssetClassValue) {
        (
            asset_class,
            AssetClassValue {
                asset_class,
                year: 2024,
                percentage,
                is_main_section,
            },
        )
    }

    /// Seventeen leaves summing to `total`: sixteen at 5 and cash taking
    /// the rest.
    fn leaves(total: f64) -> BTreeMap<AssetClass, f64> {
        AssetClass::LEAVES
            .iter()
            .map(|&class| {
                let pct = if class == AssetClass::Cash { total - 80.0 } else { 5.0 };
                (class, pct)
            })
            .collect()
    }

    #[test]
    fn sums_only_main_section_constituents() {
        let values: BTreeMap<_, _> = [
            value(AssetClass::NonInvestDomesticBonds, 20.0, true),
            value(AssetClass::NonInvestForeignBondsRated, 5.0, true),
            value(AssetClass::DomesticBonds, 3.0, false),
            value(AssetClass::DomesticEquitySecurities, 10.0, true),
            value(AssetClass::ForeignEquitySecurities, 16.0, false),
        ]
        .into_iter()
        .collect();

        let aggregates = compute_aggregates(&values, &ParserConfig::default()).unwrap();
        assert!((aggregates[&AssetClass::Bonds] - 25.0).abs() < f64::EPSILON);
        assert!((aggregates[&AssetClass::Equities] - 10.0).abs() < f64::EPSILON);
        assert!(aggregates[&AssetClass::RealEstate].abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_aggregate_constituents() {
        let mut config = ParserConfig::default();
        config.aggregates[0].constituents.push(AssetClass::Equities);
        let err = compute_aggregates(&BTreeMap::new(), &config).unwrap_err();
        assert!(matches!(err, ParseError::InvalidAggregate { .. }));
        assert_eq!(err.stage(), crate::Stage::Aggregation);
    }

    #[test]
    fn exact_hundred_is_in_tolerance_without_warnings() {
        let validation = validate_year(
            2024,
            &leaves(100.0),
            &[],
            Some(52_241.0),
            &ValidationConfig::default(),
        );
        assert!(validation.in_tolerance);
        assert!(validation.passed());
        assert!((validation.percentage_sum - 100.0).abs() < f64::EPSILON);
        assert!(validation.warnings.is_empty());
    }

    #[test]
    fn out_of_tolerance_warning_states_delta() {
        let validation = validate_year(
            2024,
            &leaves(105.0),
            &[],
            Some(52_241.0),
            &ValidationConfig::default(),
        );
        assert!(!validation.in_tolerance);
        assert_eq!(validation.warnings.len(), 1);
        assert!(validation.warnings[0].contains("105"));
        assert!(validation.warnings[0].contains("delta +5%"));
    }

    #[test]
    fn implausible_and_missing_totals_warn() {
        let config = ValidationConfig::default();
        let low = validate_year(2024, &leaves(100.0), &[], Some(52.0), &config);
        assert!(low.warnings[0].contains("outside plausible range"));
        let none = validate_year(2024, &leaves(100.0), &[], None, &config);
        assert!(none.warnings[0].contains("total assets missing"));
    }

    #[test]
    fn lists_missing_classes() {
        let validation = validate_year(
            2023,
            &leaves(100.0),
            &[AssetClass::Cash, AssetClass::Other],
            Some(54_404.0),
            &ValidationConfig::default(),
        );
        assert_eq!(
            validation.warnings,
            vec!["2023: missing asset classes defaulted to 0: CASH, OTHER"]
        );
    }
}
