//! Join of fund totals onto holdings and the percentage computation.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::warn;

use super::{FundTotals, NormalizedHolding};
use crate::config::{TransformConfig, ZeroTotalPolicy};
use crate::error::{FundosError, FundosResult};

/// A holding with its fund's total and its share of that total.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedHolding<'a> {
    /// Position of the row in the input.
    pub row: usize,
    /// Fund identifier.
    pub fund_id: &'a str,
    /// Social name, already normalized.
    pub social_name: &'a str,
    /// Asset category.
    pub asset_type: Option<&'a str>,
    /// Market value of the holding.
    pub market_value: Decimal,
    /// Total market value of the fund.
    pub fund_total: Decimal,
    /// `market_value / fund_total`.
    pub percentage: f64,
}

/// Looks up each holding's fund total and computes its share.
///
/// A zero fund total is never reported as a zero share: depending on
/// [`TransformConfig::zero_total_policy`] it is either rejected or carried
/// as a non-finite value.
pub fn join_fund_totals<'a>(
    holdings: &[NormalizedHolding<'a>],
    totals: &FundTotals<'a>,
    config: &TransformConfig,
) -> FundosResult<Vec<JoinedHolding<'a>>> {
    let mut joined = Vec::with_capacity(holdings.len());
    let mut propagated = 0usize;

    for h in holdings {
        let record = h.record;
        let fund_id = record.fund_id.as_deref().ok_or_else(|| {
            FundosError::data_integrity(None, Some(h.row), "row has no fund identifier")
        })?;

        let asset_type = record.asset_type.as_deref();
        if asset_type.is_none() && !config.allow_null_asset_type {
            return Err(FundosError::data_integrity(
                Some(fund_id),
                Some(h.row),
                "row has no asset type",
            ));
        }

        let fund_total = totals.get(fund_id).copied().ok_or_else(|| {
            FundosError::data_integrity(Some(fund_id), Some(h.row), "fund has no total")
        })?;

        let percentage = if fund_total.is_zero() {
            match config.zero_total_policy {
                ZeroTotalPolicy::Reject => {
                    return Err(FundosError::data_integrity(
                        Some(fund_id),
                        Some(h.row),
                        "fund total market value is zero",
                    ))
                }
                ZeroTotalPolicy::Propagate => {
                    propagated += 1;
                    record.market_value.to_f64().unwrap_or(f64::NAN) / 0.0
                }
            }
        } else {
            record
                .market_value
                .checked_div(fund_total)
                .and_then(|share| share.to_f64())
                .ok_or_else(|| {
                    FundosError::data_integrity(
                        Some(fund_id),
                        Some(h.row),
                        "share of fund total is not representable",
                    )
                })?
        };

        joined.push(JoinedHolding {
            row: h.row,
            fund_id,
            social_name: h.social_name,
            asset_type,
            market_value: record.market_value,
            fund_total,
            percentage,
        });
    }

    if propagated > 0 {
        warn!(
            rows = propagated,
            "holdings of zero-total funds carry non-finite percentages"
        );
    }

    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{fund_totals, normalize_social_names};
    use crate::types::HoldingRecord;
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn join(
        records: &[HoldingRecord],
        config: &TransformConfig,
    ) -> FundosResult<Vec<(String, f64)>> {
        let normalized = normalize_social_names(records);
        let totals = fund_totals(&normalized)?;
        Ok(join_fund_totals(&normalized, &totals, config)?
            .into_iter()
            .map(|j| (j.fund_id.to_string(), j.percentage))
            .collect())
    }

    #[test]
    fn test_percentages() {
        let records = vec![
            HoldingRecord::new("F1", "A", dec!(100)),
            HoldingRecord::new("F1", "B", dec!(300)),
            HoldingRecord::new("F2", "A", dec!(50)),
        ];

        let joined = join(&records, &TransformConfig::canonical()).unwrap();

        assert_relative_eq!(joined[0].1, 0.25);
        assert_relative_eq!(joined[1].1, 0.75);
        assert_relative_eq!(joined[2].1, 1.0);
    }

    #[test]
    fn test_joined_columns() {
        let records = vec![
            HoldingRecord::new("F1", "A", dec!(100)),
            HoldingRecord::new("F1", "B", dec!(300)),
        ];
        let normalized = normalize_social_names(&records);
        let totals = fund_totals(&normalized).unwrap();

        let joined = join_fund_totals(&normalized, &totals, &TransformConfig::canonical()).unwrap();

        assert_eq!(joined[1].market_value, dec!(300));
        assert_eq!(joined[1].fund_total, dec!(400));
        assert_eq!(joined[1].social_name, "Sem denominacao social NaN");
    }

    #[test]
    fn test_zero_total_rejected() {
        let records = vec![
            HoldingRecord::new("F1", "A", dec!(100)),
            HoldingRecord::new("F0", "A", dec!(0)),
        ];

        let err = join(&records, &TransformConfig::canonical()).unwrap_err();
        assert_eq!(
            err,
            FundosError::data_integrity(Some("F0"), Some(1), "fund total market value is zero")
        );
    }

    #[test]
    fn test_zero_total_propagated() {
        let records = vec![HoldingRecord::new("F0", "A", dec!(0))];
        let config = TransformConfig::canonical().with_zero_total_policy(ZeroTotalPolicy::Propagate);

        let joined = join(&records, &config).unwrap();
        assert!(joined[0].1.is_nan());
    }

    #[test]
    fn test_zero_total_with_offsetting_values() {
        let records = vec![
            HoldingRecord::new("F0", "A", dec!(10)),
            HoldingRecord::new("F0", "B", dec!(-10)),
        ];
        let config = TransformConfig::canonical().with_zero_total_policy(ZeroTotalPolicy::Propagate);

        let joined = join(&records, &config).unwrap();
        assert_eq!(joined[0].1, f64::INFINITY);
        assert_eq!(joined[1].1, f64::NEG_INFINITY);
    }

    #[test]
    fn test_null_asset_type() {
        let records = vec![HoldingRecord::new("F1", "A", dec!(1)).without_asset_type()];

        let err = join(&records, &TransformConfig::canonical()).unwrap_err();
        assert!(err.is_data_integrity());
        assert!(err.to_string().contains("no asset type"));

        let config = TransformConfig::canonical().with_null_asset_type(true);
        assert_eq!(join(&records, &config).unwrap().len(), 1);
    }
}
