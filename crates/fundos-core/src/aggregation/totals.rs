//! Fund total market value.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::NormalizedHolding;
use crate::error::{FundosError, FundosResult};

/// Total market value per fund identifier.
pub type FundTotals<'a> = BTreeMap<&'a str, Decimal>;

/// Sums market value by fund.
///
/// Every row must carry a fund identifier; the first row without one is
/// reported by index.
pub fn fund_totals<'a>(holdings: &[NormalizedHolding<'a>]) -> FundosResult<FundTotals<'a>> {
    let mut totals = FundTotals::new();

    for h in holdings {
        let fund_id = h.record.fund_id.as_deref().ok_or_else(|| {
            FundosError::data_integrity(None, Some(h.row), "row has no fund identifier")
        })?;

        let total = totals.entry(fund_id).or_insert(Decimal::ZERO);
        *total = total.checked_add(h.record.market_value).ok_or_else(|| {
            FundosError::data_integrity(Some(fund_id), Some(h.row), "fund total overflows")
        })?;
    }

    Ok(totals)
}
