//! Transform configuration.
//!
//! [`TransformConfig`] maps logical roles onto physical column names so the
//! aggregation never names a column of the source feed directly. Validation
//! happens in two passes: [`Validate::validate`] checks the configuration is
//! coherent on its own, and [`TransformConfig::check_schema`] checks it
//! against the header of a fetched table.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{FundosError, FundosResult, Validate, ValidationError};
use crate::types::{OutputColumns, OutputField};

/// What to do with holdings of a fund whose total market value is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroTotalPolicy {
    /// Fail with a data integrity error naming the fund and row.
    #[default]
    Reject,

    /// Carry the non-finite percentage (NaN or infinity) into the output.
    Propagate,
}

impl std::fmt::Display for ZeroTotalPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reject => write!(f, "reject"),
            Self::Propagate => write!(f, "propagate"),
        }
    }
}

/// Role a column plays after the fund totals are joined onto the holdings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnRole {
    /// Fund identifier (grouping key).
    FundId,
    /// Asset category (grouping key).
    AssetType,
    /// Social name after normalization (optional grouping key).
    SocialName,
    /// Share of the fund's value (summed).
    Percentage,
    /// Market value of the holding (summed, then dropped).
    HoldingValue,
    /// Total market value of the fund (summed, then dropped).
    FundTotal,
}

impl ColumnRole {
    /// Returns true for the roles that form the grouping key.
    #[must_use]
    pub fn is_key(&self) -> bool {
        matches!(self, Self::FundId | Self::AssetType | Self::SocialName)
    }
}

/// Column mapping for the percentage-of-fund transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Column holding the fund's registered name.
    pub social_name_column: String,

    /// Column holding the fund identifier.
    pub fund_id_column: String,

    /// Column the computed percentage is written to.
    pub percentage_column: String,

    /// Column holding the holding's market value in the raw feed. Also the
    /// canonical name the joined holding value is renamed to.
    pub raw_value_column: String,

    /// Name of the holding's own value after the join.
    pub joined_value_column_left: String,

    /// Name of the joined fund total.
    pub joined_value_column_right: String,

    /// Columns kept after the join, in order.
    pub retained_columns: Vec<String>,

    /// Renames applied to the retained columns.
    #[serde(default)]
    pub rename_map: BTreeMap<String, String>,

    /// Grouping key of the output, by post-rename name. The order is the
    /// sort order of the output.
    pub group_keys: Vec<String>,

    /// Canonical name the joined fund total is renamed to.
    pub fund_total_value_column: String,

    /// Column holding the asset category.
    pub asset_type_column: String,

    /// Handling of funds whose total market value is zero.
    #[serde(default)]
    pub zero_total_policy: ZeroTotalPolicy,

    /// Accept rows without an asset category as their own group.
    #[serde(default)]
    pub allow_null_asset_type: bool,
}

impl TransformConfig {
    /// Column mapping for the CVM CDA holdings feed.
    #[must_use]
    pub fn cvm_default() -> Self {
        Self {
            social_name_column: "DENOM_SOCIAL".into(),
            fund_id_column: "CNPJ_FUNDO".into(),
            percentage_column: "PERCENTUAL_ATIVO".into(),
            raw_value_column: "VL_MERC_POS_FINAL".into(),
            joined_value_column_left: "VL_MERC_POS_FINAL_x".into(),
            joined_value_column_right: "VL_MERC_POS_FINAL_y".into(),
            retained_columns: vec![
                "CNPJ_FUNDO".into(),
                "TP_APLIC".into(),
                "VL_MERC_POS_FINAL_x".into(),
                "VL_MERC_POS_FINAL_y".into(),
                "PERCENTUAL_ATIVO".into(),
            ],
            rename_map: BTreeMap::from([
                ("VL_MERC_POS_FINAL_x".into(), "VL_MERC_POS_FINAL".into()),
                ("VL_MERC_POS_FINAL_y".into(), "VL_MERC_FUNDO".into()),
            ]),
            group_keys: vec!["CNPJ_FUNDO".into(), "TP_APLIC".into()],
            fund_total_value_column: "VL_MERC_FUNDO".into(),
            asset_type_column: "TP_APLIC".into(),
            zero_total_policy: ZeroTotalPolicy::Reject,
            allow_null_asset_type: false,
        }
    }

    /// Column mapping using the logical role names as column names.
    #[must_use]
    pub fn canonical() -> Self {
        Self {
            social_name_column: "social_name".into(),
            fund_id_column: "fund_id".into(),
            percentage_column: "percentage_of_fund".into(),
            raw_value_column: "market_value".into(),
            joined_value_column_left: "market_value_x".into(),
            joined_value_column_right: "market_value_y".into(),
            retained_columns: vec![
                "fund_id".into(),
                "asset_type".into(),
                "market_value_x".into(),
                "market_value_y".into(),
                "percentage_of_fund".into(),
            ],
            rename_map: BTreeMap::from([
                ("market_value_x".into(), "market_value".into()),
                ("market_value_y".into(), "fund_market_value".into()),
            ]),
            group_keys: vec!["fund_id".into(), "asset_type".into()],
            fund_total_value_column: "fund_market_value".into(),
            asset_type_column: "asset_type".into(),
            zero_total_policy: ZeroTotalPolicy::Reject,
            allow_null_asset_type: false,
        }
    }

    /// Sets the zero-total policy.
    #[must_use]
    pub fn with_zero_total_policy(mut self, policy: ZeroTotalPolicy) -> Self {
        self.zero_total_policy = policy;
        self
    }

    /// Sets whether rows without an asset category are accepted.
    #[must_use]
    pub fn with_null_asset_type(mut self, allow: bool) -> Self {
        self.allow_null_asset_type = allow;
        self
    }

    /// Role of a post-join column, if it has one.
    #[must_use]
    pub fn role_of(&self, column: &str) -> Option<ColumnRole> {
        if column == self.fund_id_column {
            Some(ColumnRole::FundId)
        } else if column == self.asset_type_column {
            Some(ColumnRole::AssetType)
        } else if column == self.social_name_column {
            Some(ColumnRole::SocialName)
        } else if column == self.percentage_column {
            Some(ColumnRole::Percentage)
        } else if column == self.joined_value_column_left {
            Some(ColumnRole::HoldingValue)
        } else if column == self.joined_value_column_right {
            Some(ColumnRole::FundTotal)
        } else {
            None
        }
    }

    /// Name of a retained column after renaming.
    #[must_use]
    pub fn renamed<'a>(&'a self, column: &'a str) -> &'a str {
        self.rename_map
            .get(column)
            .map(String::as_str)
            .unwrap_or(column)
    }

    /// Checks that every raw-feed column the mapping refers to exists.
    pub fn check_schema(&self, columns: &[String]) -> FundosResult<()> {
        let errors: Vec<ValidationError> = [
            ("social_name_column", &self.social_name_column),
            ("fund_id_column", &self.fund_id_column),
            ("raw_value_column", &self.raw_value_column),
            ("asset_type_column", &self.asset_type_column),
        ]
        .into_iter()
        .filter(|(_, column)| !columns.iter().any(|c| c == *column))
        .map(|(field, column)| {
            ValidationError::new(field, format!("column '{column}' not present in input"))
        })
        .collect();

        into_result(errors)
    }

    /// Resolves the retained columns into a projection plan.
    pub fn projection_plan(&self) -> FundosResult<ProjectionPlan> {
        self.validate_or_error()?;

        let columns: Vec<PlannedColumn> = self
            .retained_columns
            .iter()
            .filter_map(|source| {
                self.role_of(source).map(|role| PlannedColumn {
                    source: source.clone(),
                    name: self.renamed(source).to_string(),
                    role,
                })
            })
            .collect();

        let group_keys = self
            .group_keys
            .iter()
            .filter_map(|key| columns.iter().position(|c| c.role.is_key() && &c.name == key))
            .collect();

        Ok(ProjectionPlan {
            columns,
            group_keys,
        })
    }

    /// Physical layout of the output: the group keys, then the percentage.
    ///
    /// The social name only appears when it is retained and grouped on.
    pub fn output_columns(&self) -> FundosResult<OutputColumns> {
        let plan = self.projection_plan()?;
        let mut columns: Vec<(String, OutputField)> = plan
            .group_key_columns()
            .map(|c| {
                let field = match c.role {
                    ColumnRole::FundId => OutputField::FundId,
                    ColumnRole::SocialName => OutputField::SocialName,
                    _ => OutputField::AssetType,
                };
                (c.name.clone(), field)
            })
            .collect();
        columns.push((
            self.renamed(&self.percentage_column).to_string(),
            OutputField::Percentage,
        ));
        Ok(OutputColumns::new(columns))
    }

    fn required_names(&self) -> [(&'static str, &String); 8] {
        [
            ("social_name_column", &self.social_name_column),
            ("fund_id_column", &self.fund_id_column),
            ("percentage_column", &self.percentage_column),
            ("raw_value_column", &self.raw_value_column),
            ("joined_value_column_left", &self.joined_value_column_left),
            ("joined_value_column_right", &self.joined_value_column_right),
            ("fund_total_value_column", &self.fund_total_value_column),
            ("asset_type_column", &self.asset_type_column),
        ]
    }
}

impl Validate for TransformConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for (field, value) in self.required_names() {
            if value.trim().is_empty() {
                errors.push(ValidationError::new(field, "column name must not be empty"));
            }
        }
        if !errors.is_empty() {
            return errors;
        }

        // Post-join columns must be distinguishable by name
        let joined = [
            ("fund_id_column", &self.fund_id_column),
            ("asset_type_column", &self.asset_type_column),
            ("social_name_column", &self.social_name_column),
            ("percentage_column", &self.percentage_column),
            ("joined_value_column_left", &self.joined_value_column_left),
            ("joined_value_column_right", &self.joined_value_column_right),
        ];
        for (i, (field, value)) in joined.iter().enumerate() {
            if let Some((other, _)) = joined[..i].iter().find(|(_, v)| v == value) {
                errors.push(ValidationError::new(
                    *field,
                    format!("column '{value}' is already used by {other}"),
                ));
            }
        }

        // Retained columns
        if self.retained_columns.is_empty() {
            errors.push(ValidationError::new(
                "retained_columns",
                "at least one column must be retained",
            ));
        }
        let mut seen = BTreeSet::new();
        for column in &self.retained_columns {
            if !seen.insert(column.as_str()) {
                errors.push(ValidationError::new(
                    "retained_columns",
                    format!("column '{column}' is listed twice"),
                ));
            } else if self.role_of(column).is_none() {
                errors.push(ValidationError::new(
                    "retained_columns",
                    format!("column '{column}' is neither a grouping key nor a summable value"),
                ));
            }
        }
        for (field, required) in [
            ("fund_id_column", &self.fund_id_column),
            ("asset_type_column", &self.asset_type_column),
            ("percentage_column", &self.percentage_column),
        ] {
            if !self.retained_columns.contains(required) {
                errors.push(ValidationError::new(
                    "retained_columns",
                    format!("must retain {field} '{required}'"),
                ));
            }
        }

        // Renames
        for (from, to) in &self.rename_map {
            if !self.retained_columns.contains(from) {
                errors.push(ValidationError::new(
                    "rename_map",
                    format!("renamed column '{from}' is not retained"),
                ));
            }
            if to.trim().is_empty() {
                errors.push(ValidationError::new(
                    "rename_map",
                    format!("column '{from}' is renamed to an empty name"),
                ));
            }
        }
        for (source, canonical, field) in [
            (
                &self.joined_value_column_left,
                &self.raw_value_column,
                "raw_value_column",
            ),
            (
                &self.joined_value_column_right,
                &self.fund_total_value_column,
                "fund_total_value_column",
            ),
        ] {
            if self.retained_columns.contains(source) && self.renamed(source) != canonical.as_str()
            {
                errors.push(ValidationError::new(
                    "rename_map",
                    format!("'{source}' must be renamed to {field} '{canonical}'"),
                ));
            }
        }
        let mut names = BTreeSet::new();
        for column in &seen {
            let name = self.renamed(column);
            if !names.insert(name) {
                errors.push(ValidationError::new(
                    "rename_map",
                    format!("more than one retained column is named '{name}'"),
                ));
            }
        }

        // Group keys
        if self.group_keys.is_empty() {
            errors.push(ValidationError::new("group_keys", "must not be empty"));
        }
        let mut key_roles: BTreeSet<ColumnRole> = BTreeSet::new();
        for key in &self.group_keys {
            let role = self
                .retained_columns
                .iter()
                .find(|c| self.renamed(c) == key.as_str())
                .and_then(|c| self.role_of(c));
            match role {
                Some(role) if role.is_key() => {
                    if !key_roles.insert(role) {
                        errors.push(ValidationError::new(
                            "group_keys",
                            format!("key '{key}' repeats a grouping role"),
                        ));
                    }
                }
                Some(_) => errors.push(ValidationError::new(
                    "group_keys",
                    format!("'{key}' is a summed value, not a key"),
                )),
                None => errors.push(ValidationError::new(
                    "group_keys",
                    format!("'{key}' is not a retained column"),
                )),
            }
        }
        let has_required = key_roles.contains(&ColumnRole::FundId)
            && key_roles.contains(&ColumnRole::AssetType);
        if !self.group_keys.is_empty() && !has_required {
            errors.push(ValidationError::new(
                "group_keys",
                "must group by both the fund and the asset type",
            ));
        }
        // A retained key column that is not grouped on has no value per group
        if self.retained_columns.contains(&self.social_name_column)
            && !key_roles.contains(&ColumnRole::SocialName)
        {
            errors.push(ValidationError::new(
                "group_keys",
                format!(
                    "retained social name '{}' must be a group key",
                    self.renamed(&self.social_name_column)
                ),
            ));
        }

        errors
    }
}

fn into_result(mut errors: Vec<ValidationError>) -> FundosResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => {
            let err = errors.remove(0);
            Err(FundosError::configuration(err.field, err.message))
        }
        _ => Err(FundosError::MultipleConfiguration(errors)),
    }
}

/// A retained column with its post-rename name and role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedColumn {
    /// Name after the join.
    pub source: String,
    /// Name after renaming.
    pub name: String,
    /// Role of the column.
    pub role: ColumnRole,
}

/// Retained columns in order, with the positions of the grouping keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionPlan {
    columns: Vec<PlannedColumn>,
    group_keys: Vec<usize>,
}

impl ProjectionPlan {
    /// Retained columns in order.
    #[must_use]
    pub fn columns(&self) -> &[PlannedColumn] {
        &self.columns
    }

    /// Grouping key columns, in key order.
    pub fn group_key_columns(&self) -> impl Iterator<Item = &PlannedColumn> {
        self.group_keys.iter().map(|&i| &self.columns[i])
    }

    /// Positions of the grouping key columns, in key order.
    #[must_use]
    pub fn group_key_positions(&self) -> &[usize] {
        &self.group_keys
    }

    /// Position of the first retained column with a role.
    #[must_use]
    pub fn position(&self, role: ColumnRole) -> Option<usize> {
        self.columns.iter().position(|c| c.role == role)
    }
}
