//! Aggregated output rows and their physical column layout.

use serde::{Deserialize, Serialize};

/// One output row: the share of a fund held in one asset type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    /// Fund identifier.
    pub fund_id: String,

    /// Asset category. Absent only when null categories are allowed.
    pub asset_type: Option<String>,

    /// Social name of the fund, present only when it is a grouping key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_name: Option<String>,

    /// Sum of the value shares of the fund's holdings of this type,
    /// as a fraction of 1.0. Non-finite when the fund total was zero and the
    /// configuration propagates it.
    pub percentage_of_fund: f64,
}

impl AggregatedRecord {
    /// Creates a new output row.
    #[must_use]
    pub fn new(
        fund_id: impl Into<String>,
        asset_type: Option<String>,
        percentage_of_fund: f64,
    ) -> Self {
        Self {
            fund_id: fund_id.into(),
            asset_type,
            social_name: None,
            percentage_of_fund,
        }
    }

    /// Sets the social name.
    #[must_use]
    pub fn with_social_name(mut self, name: impl Into<String>) -> Self {
        self.social_name = Some(name.into());
        self
    }

    /// Value of one output field.
    #[must_use]
    pub fn value(&self, field: OutputField) -> OutputValue<'_> {
        match field {
            OutputField::FundId => OutputValue::Text(Some(&self.fund_id)),
            OutputField::AssetType => OutputValue::Text(self.asset_type.as_deref()),
            OutputField::SocialName => OutputValue::Text(self.social_name.as_deref()),
            OutputField::Percentage => OutputValue::Number(self.percentage_of_fund),
        }
    }
}

/// Logical field of an [`AggregatedRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputField {
    /// The fund identifier.
    FundId,
    /// The asset category.
    AssetType,
    /// The fund's social name.
    SocialName,
    /// The percentage of fund.
    Percentage,
}

/// A borrowed cell of an output row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputValue<'a> {
    /// A text cell, possibly absent.
    Text(Option<&'a str>),
    /// A numeric cell.
    Number(f64),
}

/// Physical column names and order of the output table.
///
/// Derived from the transform configuration so that writers emit the same
/// names the source feed used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputColumns {
    columns: Vec<(String, OutputField)>,
}

impl OutputColumns {
    /// Creates a column layout.
    #[must_use]
    pub fn new(columns: Vec<(String, OutputField)>) -> Self {
        Self { columns }
    }

    /// Canonical layout: `fund_id`, `asset_type`, `percentage_of_fund`.
    #[must_use]
    pub fn canonical() -> Self {
        Self::new(vec![
            ("fund_id".to_string(), OutputField::FundId),
            ("asset_type".to_string(), OutputField::AssetType),
            ("percentage_of_fund".to_string(), OutputField::Percentage),
        ])
    }

    /// Column names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Columns with their fields, in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, OutputField)> {
        self.columns.iter().map(|(name, field)| (name.as_str(), *field))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if there are no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Default for OutputColumns {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_lookup() {
        let record = AggregatedRecord::new("F1", Some("A".into()), 0.25);
        assert_eq!(record.value(OutputField::FundId), OutputValue::Text(Some("F1")));
        assert_eq!(record.value(OutputField::AssetType), OutputValue::Text(Some("A")));
        assert_eq!(record.value(OutputField::Percentage), OutputValue::Number(0.25));

        let record = AggregatedRecord::new("F1", None, 1.0);
        assert_eq!(record.value(OutputField::AssetType), OutputValue::Text(None));
        assert_eq!(record.value(OutputField::SocialName), OutputValue::Text(None));

        let record = record.with_social_name("Fundo");
        assert_eq!(record.value(OutputField::SocialName), OutputValue::Text(Some("Fundo")));
    }

    #[test]
    fn test_canonical_columns() {
        let columns = OutputColumns::default();
        assert_eq!(
            columns.names(),
            vec!["fund_id", "asset_type", "percentage_of_fund"]
        );
        assert_eq!(columns.len(), 3);
    }

    #[test]
    fn test_serde() {
        let record = AggregatedRecord::new("F1", Some("A".into()), 0.5);
        let json = serde_json::to_string(&record).unwrap();
        let parsed: AggregatedRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, parsed);
    }
}
