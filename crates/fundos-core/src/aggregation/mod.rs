//! Percentage-of-fund aggregation.
//!
//! Converts raw holdings into one row per (fund, asset type) carrying the
//! share of the fund's total market value held in that asset type.
//!
//! The pipeline runs in order:
//!
//! 1. [`normalize_social_names`]: absent social names become [`MISSING_SOCIAL_NAME`]
//! 2. [`fund_totals`]: market value summed by fund
//! 3. [`join_fund_totals`]: each holding gets its fund total and its share
//! 4. [`project`]: retained columns only, value columns under canonical names
//! 5. [`group_percentages`]: shares summed per (fund, asset type)
//! 6. [`drop_value_columns`]: only the keys and the percentage remain
//!
//! All functions are pure. [`aggregate`] runs the whole pipeline.
//!
//! # Example
//!
//! ```rust
//! use fundos_core::prelude::*;
//!
//! let rows = vec![
//!     HoldingRecord::new("F1", "A", dec!(100)),
//!     HoldingRecord::new("F1", "B", dec!(300)),
//!     HoldingRecord::new("F2", "A", dec!(50)),
//! ];
//!
//! let output = aggregate(&rows, &TransformConfig::canonical()).unwrap();
//! assert_eq!(output.len(), 3);
//! assert_eq!(output[1].fund_id, "F1");
//! assert_eq!(output[1].asset_type.as_deref(), Some("B"));
//! assert!((output[1].percentage_of_fund - 0.75).abs() < 1e-12);
//! ```

mod grouping;
mod join;
mod normalize;
mod totals;

pub use grouping::*;
pub use join::*;
pub use normalize::*;
pub use totals::*;

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::TransformConfig;
use crate::error::FundosResult;
use crate::types::{AggregatedRecord, HoldingRecord};

/// Computes the percentage of each fund held in each asset type.
///
/// The configuration is validated before any row is read. Empty input gives
/// empty output. The output is sorted by the configured group keys.
///
/// # Errors
///
/// - Configuration error if the column mapping is incoherent
/// - Data integrity error if a row has no fund identifier, has no asset type
///   while null categories are not allowed, or belongs to a fund whose total
///   is zero under [`ZeroTotalPolicy::Reject`](crate::config::ZeroTotalPolicy::Reject)
pub fn aggregate(
    records: &[HoldingRecord],
    config: &TransformConfig,
) -> FundosResult<Vec<AggregatedRecord>> {
    let plan = config.projection_plan()?;
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let normalized = normalize_social_names(records);
    let totals = fund_totals(&normalized)?;
    let joined = join_fund_totals(&normalized, &totals, config)?;
    let projected = project(&joined, &plan);
    let grouped = group_percentages(&projected, &plan)?;
    let output = drop_value_columns(grouped, &plan);

    debug!(
        holdings = records.len(),
        funds = totals.len(),
        groups = output.len(),
        "aggregated holdings"
    );

    Ok(output)
}

/// Sum of the output percentages per fund.
///
/// For funds with a positive total and non-negative holdings every entry is
/// 1.0 up to rounding.
#[must_use]
pub fn conservation_report(records: &[AggregatedRecord]) -> BTreeMap<String, f64> {
    let mut sums = BTreeMap::new();
    for r in records {
        *sums.entry(r.fund_id.clone()).or_insert(0.0) += r.percentage_of_fund;
    }
    sums
}
