//! Projection, final grouping and removal of the intermediate value columns.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::JoinedHolding;
use crate::config::{ColumnRole, ProjectionPlan};
use crate::error::{FundosError, FundosResult};
use crate::types::AggregatedRecord;

/// A cell of a projected row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectedCell<'a> {
    /// Grouping key value.
    Key(Option<&'a str>),
    /// Market value, summed within a group.
    Value(Decimal),
    /// Share of the fund, summed within a group.
    Share(f64),
}

/// A joined holding reduced to the retained columns, in plan order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedRow<'a> {
    /// Position of the row in the input.
    pub row: usize,
    /// Cells aligned with [`ProjectionPlan::columns`].
    pub cells: Vec<ProjectedCell<'a>>,
}

/// One group, keyed by fund and asset type and optionally by social name,
/// with its summed columns.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRow<'a> {
    /// Key values in group key order.
    pub key: Vec<Option<&'a str>>,
    /// Sum of the shares.
    pub percentage: f64,
    /// Sum of the holding values, when retained.
    pub holding_value: Option<Decimal>,
    /// Sum of the joined fund totals, when retained.
    pub fund_total: Option<Decimal>,
    /// Number of holdings in the group.
    pub count: usize,
}

/// Keeps only the planned columns of each joined holding.
#[must_use]
pub fn project<'a>(joined: &[JoinedHolding<'a>], plan: &ProjectionPlan) -> Vec<ProjectedRow<'a>> {
    joined
        .iter()
        .map(|j| ProjectedRow {
            row: j.row,
            cells: plan
                .columns()
                .iter()
                .map(|c| match c.role {
                    ColumnRole::FundId => ProjectedCell::Key(Some(j.fund_id)),
                    ColumnRole::AssetType => ProjectedCell::Key(j.asset_type),
                    ColumnRole::SocialName => ProjectedCell::Key(Some(j.social_name)),
                    ColumnRole::Percentage => ProjectedCell::Share(j.percentage),
                    ColumnRole::HoldingValue => ProjectedCell::Value(j.market_value),
                    ColumnRole::FundTotal => ProjectedCell::Value(j.fund_total),
                })
                .collect(),
        })
        .collect()
}

/// Groups projected rows by the composite key and sums the other columns.
///
/// Rows sharing a key are summed, never overwritten. Groups come out sorted
/// by key, so the result does not depend on input order.
pub fn group_percentages<'a>(
    rows: &[ProjectedRow<'a>],
    plan: &ProjectionPlan,
) -> FundosResult<Vec<GroupedRow<'a>>> {
    let key_positions = plan.group_key_positions();
    let share_pos = plan.position(ColumnRole::Percentage);
    let value_pos = plan.position(ColumnRole::HoldingValue);
    let total_pos = plan.position(ColumnRole::FundTotal);

    let mut groups: BTreeMap<Vec<Option<&'a str>>, GroupedRow<'a>> = BTreeMap::new();

    for row in rows {
        let key: Vec<Option<&'a str>> = key_positions
            .iter()
            .map(|&i| match row.cells[i] {
                ProjectedCell::Key(k) => k,
                _ => None,
            })
            .collect();

        let group = groups.entry(key.clone()).or_insert_with(|| GroupedRow {
            key,
            percentage: 0.0,
            holding_value: value_pos.map(|_| Decimal::ZERO),
            fund_total: total_pos.map(|_| Decimal::ZERO),
            count: 0,
        });

        group.count += 1;
        if let Some(ProjectedCell::Share(share)) = share_pos.map(|i| row.cells[i]) {
            group.percentage += share;
        }
        add_value(&mut group.holding_value, value_pos, row)?;
        add_value(&mut group.fund_total, total_pos, row)?;
    }

    Ok(groups.into_values().collect())
}

fn add_value(
    sum: &mut Option<Decimal>,
    pos: Option<usize>,
    row: &ProjectedRow<'_>,
) -> FundosResult<()> {
    if let (Some(acc), Some(ProjectedCell::Value(v))) = (sum.as_mut(), pos.map(|i| row.cells[i])) {
        *acc = acc.checked_add(v).ok_or_else(|| {
            FundosError::data_integrity(None, Some(row.row), "grouped market value overflows")
        })?;
    }
    Ok(())
}

/// Drops the summed value columns, keeping the keys and the percentage.
#[must_use]
pub fn drop_value_columns(
    grouped: Vec<GroupedRow<'_>>,
    plan: &ProjectionPlan,
) -> Vec<AggregatedRecord> {
    let roles: Vec<ColumnRole> = plan.group_key_columns().map(|c| c.role).collect();

    grouped
        .into_iter()
        .map(|g| {
            let mut fund_id = "";
            let mut asset_type = None;
            let mut social_name = None;
            for (value, role) in g.key.iter().zip(&roles) {
                match role {
                    ColumnRole::FundId => fund_id = value.unwrap_or_default(),
                    ColumnRole::SocialName => social_name = value.map(str::to_string),
                    _ => asset_type = value.map(str::to_string),
                }
            }
            let mut record = AggregatedRecord::new(fund_id, asset_type, g.percentage);
            record.social_name = social_name;
            record
        })
        .collect()
}
