//! Raw holdings table and its typed rows.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::TransformConfig;
use crate::error::{FundosError, FundosResult};

/// One row of the raw disclosure table, typed by logical role.
///
/// Rows are produced by a source reader for the duration of one run and
/// consumed by [`aggregate`](crate::aggregation::aggregate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingRecord {
    /// Fund identifier. Not unique across rows.
    pub fund_id: Option<String>,

    /// Registered name of the fund, when disclosed.
    pub social_name: Option<String>,

    /// Asset category of the holding.
    pub asset_type: Option<String>,

    /// Market value of the position.
    pub market_value: Decimal,

    /// Remaining columns of the source row, untouched by the aggregation.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl HoldingRecord {
    /// Creates a record with a fund, an asset type and a market value.
    #[must_use]
    pub fn new(
        fund_id: impl Into<String>,
        asset_type: impl Into<String>,
        market_value: Decimal,
    ) -> Self {
        Self {
            fund_id: Some(fund_id.into()),
            social_name: None,
            asset_type: Some(asset_type.into()),
            market_value,
            attributes: BTreeMap::new(),
        }
    }

    /// Sets the social name.
    #[must_use]
    pub fn with_social_name(mut self, name: impl Into<String>) -> Self {
        self.social_name = Some(name.into());
        self
    }

    /// Clears the fund identifier.
    #[must_use]
    pub fn without_fund_id(mut self) -> Self {
        self.fund_id = None;
        self
    }

    /// Clears the asset type.
    #[must_use]
    pub fn without_asset_type(mut self) -> Self {
        self.asset_type = None;
        self
    }

    /// Adds a pass-through attribute.
    #[must_use]
    pub fn with_attribute(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(column.into(), value.into());
        self
    }
}

/// A raw table: a header and rows of optional text cells.
///
/// This is the shape a source reader hands to the transform. Cells are kept
/// as text until [`HoldingTable::records`] resolves them through a
/// [`TransformConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawHoldingTable")]
pub struct HoldingTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

#[derive(Deserialize)]
struct RawHoldingTable {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Option<String>>>,
}

impl TryFrom<RawHoldingTable> for HoldingTable {
    type Error = FundosError;

    fn try_from(raw: RawHoldingTable) -> FundosResult<Self> {
        let mut table = Self::new(raw.columns);
        for row in raw.rows {
            table.push_row(row)?;
        }
        Ok(table)
    }
}

impl HoldingTable {
    /// Creates an empty table with the given header.
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in order, each aligned with [`columns`](Self::columns).
    #[must_use]
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column in the header.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Appends a row. Empty strings are stored as absent cells.
    pub fn push_row(&mut self, row: Vec<Option<String>>) -> FundosResult<()> {
        if row.len() != self.columns.len() {
            return Err(FundosError::data_integrity(
                None,
                Some(self.rows.len()),
                format!(
                    "row has {} cells but the header has {} columns",
                    row.len(),
                    self.columns.len()
                ),
            ));
        }
        self.rows.push(
            row.into_iter()
                .map(|cell| cell.filter(|c| !c.is_empty()))
                .collect(),
        );
        Ok(())
    }

    /// Appends another table below this one.
    ///
    /// The header becomes the union of both headers, in first-seen order.
    /// Cells for columns a table did not carry are absent.
    pub fn append(&mut self, other: HoldingTable) {
        let mut mapping = Vec::with_capacity(other.columns.len());
        for column in &other.columns {
            let idx = match self.column_index(column) {
                Some(idx) => idx,
                None => {
                    self.columns.push(column.clone());
                    for row in &mut self.rows {
                        row.push(None);
                    }
                    self.columns.len() - 1
                }
            };
            mapping.push(idx);
        }

        let width = self.columns.len();
        for row in other.rows {
            let mut merged = vec![None; width];
            for (cell, &idx) in row.into_iter().zip(&mapping) {
                merged[idx] = cell;
            }
            self.rows.push(merged);
        }
    }

    /// Resolves every row into a [`HoldingRecord`].
    ///
    /// The configured role columns are checked against the header first, so
    /// an unknown column fails before any row is read. A market value cell
    /// that is absent or not a decimal number is reported with its row index.
    pub fn records(&self, config: &TransformConfig) -> FundosResult<Vec<HoldingRecord>> {
        config.check_schema(&self.columns)?;

        let fund_idx = self.index_of(&config.fund_id_column)?;
        let name_idx = self.index_of(&config.social_name_column)?;
        let type_idx = self.index_of(&config.asset_type_column)?;
        let value_idx = self.index_of(&config.raw_value_column)?;

        self.rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| {
                let fund_id = row[fund_idx].clone();
                let market_value = match row[value_idx].as_deref() {
                    Some(raw) => parse_decimal(raw).ok_or_else(|| {
                        FundosError::data_integrity(
                            fund_id.as_deref(),
                            Some(row_idx),
                            format!(
                                "'{}' is not a decimal in column '{}'",
                                raw, config.raw_value_column
                            ),
                        )
                    })?,
                    None => {
                        return Err(FundosError::data_integrity(
                            fund_id.as_deref(),
                            Some(row_idx),
                            format!("missing value in column '{}'", config.raw_value_column),
                        ))
                    }
                };

                let attributes = self
                    .columns
                    .iter()
                    .zip(row)
                    .enumerate()
                    .filter(|(i, _)| ![fund_idx, name_idx, type_idx, value_idx].contains(i))
                    .filter_map(|(_, (col, cell))| cell.as_ref().map(|c| (col.clone(), c.clone())))
                    .collect();

                Ok(HoldingRecord {
                    fund_id,
                    social_name: row[name_idx].clone(),
                    asset_type: row[type_idx].clone(),
                    market_value,
                    attributes,
                })
            })
            .collect()
    }

    fn index_of(&self, column: &str) -> FundosResult<usize> {
        self.column_index(column)
            .ok_or_else(|| FundosError::configuration(column, "column not present in input"))
    }
}

/// Parses a decimal cell, accepting plain and scientific notation.
fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some((*v).to_string())).collect()
    }

    fn cda_table() -> HoldingTable {
        let mut table = HoldingTable::new(
            ["CNPJ_FUNDO", "DENOM_SOCIAL", "TP_APLIC", "VL_MERC_POS_FINAL", "DT_COMPTC"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        table
            .push_row(cells(&["F1", "Fundo Um", "Acoes", "100.50", "2024-01-31"]))
            .unwrap();
        table
            .push_row(vec![
                Some("F2".into()),
                Some(String::new()),
                Some("Titulos Publicos".into()),
                Some("2.5E+3".into()),
                None,
            ])
            .unwrap();
        table
    }

    #[test]
    fn test_push_row_width_mismatch() {
        let mut table = HoldingTable::new(vec!["A".into(), "B".into()]);
        let err = table.push_row(cells(&["only one"])).unwrap_err();
        assert!(err.is_data_integrity());
        assert!(table.is_empty());
    }

    #[test]
    fn test_deserialize_checks_row_width() {
        let table: HoldingTable =
            serde_json::from_str(r#"{"columns":["A","B"],"rows":[["a",""]]}"#).unwrap();
        assert_eq!(table.rows()[0], vec![Some("a".into()), None]);

        let err = serde_json::from_str::<HoldingTable>(r#"{"columns":["A","B"],"rows":[["a"]]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("1 cells but the header has 2 columns"));
    }

    #[test]
    fn test_records_resolve_roles() {
        let config = TransformConfig::cvm_default();
        let records = cda_table().records(&config).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fund_id.as_deref(), Some("F1"));
        assert_eq!(records[0].social_name.as_deref(), Some("Fundo Um"));
        assert_eq!(records[0].asset_type.as_deref(), Some("Acoes"));
        assert_eq!(records[0].market_value, dec!(100.50));
        assert_eq!(
            records[0].attributes.get("DT_COMPTC").map(String::as_str),
            Some("2024-01-31")
        );

        // Empty cells become absent values
        assert_eq!(records[1].social_name, None);
        assert_eq!(records[1].market_value, dec!(2500));
        assert!(records[1].attributes.is_empty());
    }

    #[test]
    fn test_records_unknown_column() {
        let mut config = TransformConfig::cvm_default();
        config.asset_type_column = "TP_ATIVO".into();

        let err = cda_table().records(&config).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("TP_ATIVO"));
    }

    #[test]
    fn test_records_bad_value() {
        let mut table = cda_table();
        table
            .push_row(cells(&["F3", "Fundo Tres", "Acoes", "n/a", "2024-01-31"]))
            .unwrap();

        let err = table.records(&TransformConfig::cvm_default()).unwrap_err();
        assert_eq!(
            err,
            FundosError::data_integrity(
                Some("F3"),
                Some(2),
                "'n/a' is not a decimal in column 'VL_MERC_POS_FINAL'"
            )
        );
    }

    #[test]
    fn test_records_missing_value() {
        let mut table = cda_table();
        table
            .push_row(vec![Some("F4".into()), None, Some("Acoes".into()), None, None])
            .unwrap();

        let err = table.records(&TransformConfig::cvm_default()).unwrap_err();
        assert!(err.is_data_integrity());
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_append_unions_headers() {
        let mut first = HoldingTable::new(vec!["A".into(), "B".into()]);
        first.push_row(cells(&["a1", "b1"])).unwrap();

        let mut second = HoldingTable::new(vec!["B".into(), "C".into()]);
        second.push_row(cells(&["b2", "c2"])).unwrap();

        first.append(second);

        assert_eq!(first.columns(), &["A", "B", "C"]);
        assert_eq!(first.len(), 2);
        assert_eq!(
            first.rows()[0],
            vec![Some("a1".into()), Some("b1".into()), None]
        );
        assert_eq!(
            first.rows()[1],
            vec![None, Some("b2".into()), Some("c2".into())]
        );
    }

    #[test]
    fn test_builder() {
        let record = HoldingRecord::new("F1", "Acoes", dec!(10))
            .with_social_name("Fundo")
            .with_attribute("DT_COMPTC", "2024-01-31");
        assert_eq!(record.social_name.as_deref(), Some("Fundo"));
        assert_eq!(record.attributes.len(), 1);

        let record = record.without_fund_id().without_asset_type();
        assert!(record.fund_id.is_none());
        assert!(record.asset_type.is_none());
    }
}
