//! Error types for the holdings transform.
//!
//! Two families of failure are distinguished: configuration problems, which
//! are detected before any row is touched, and data integrity problems, which
//! point at the offending fund and row.

use thiserror::Error;

/// Result type for transform operations.
pub type FundosResult<T> = Result<T, FundosError>;

/// Errors that can occur while configuring or running the transform.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FundosError {
    /// A column mapping is missing, empty or refers to an unknown column.
    #[error("Configuration error in '{field}': {message}")]
    Configuration {
        /// The configuration field at fault.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Several configuration problems found in one validation pass.
    #[error("Multiple configuration errors: {}", join_errors(.0))]
    MultipleConfiguration(Vec<ValidationError>),

    /// A row cannot be aggregated as given.
    #[error("Data integrity error{}{}: {reason}", fmt_fund(.fund_id), fmt_row(.row))]
    DataIntegrity {
        /// Fund the offending row belongs to, when known.
        fund_id: Option<String>,
        /// Zero-based index of the offending row in the input, when known.
        row: Option<usize>,
        /// The reason the row was rejected.
        reason: String,
    },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn fmt_fund(fund_id: &Option<String>) -> String {
    fund_id
        .as_ref()
        .map(|f| format!(" for fund '{f}'"))
        .unwrap_or_default()
}

fn fmt_row(row: &Option<usize>) -> String {
    row.map(|r| format!(" at row {r}")).unwrap_or_default()
}

impl FundosError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a data integrity error located at a row.
    #[must_use]
    pub fn data_integrity(
        fund_id: Option<&str>,
        row: Option<usize>,
        reason: impl Into<String>,
    ) -> Self {
        Self::DataIntegrity {
            fund_id: fund_id.map(str::to_string),
            row,
            reason: reason.into(),
        }
    }

    /// Returns true for the configuration family of errors.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::MultipleConfiguration(_)
        )
    }

    /// Returns true for data integrity errors.
    #[must_use]
    pub fn is_data_integrity(&self) -> bool {
        matches!(self, Self::DataIntegrity { .. })
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Field that failed validation.
    pub field: String,
    /// Validation error message.
    pub message: String,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Trait for validatable configurations.
pub trait Validate {
    /// Validates the configuration.
    ///
    /// Returns a list of validation errors, or an empty vector if valid.
    fn validate(&self) -> Vec<ValidationError>;

    /// Returns true if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Validates and returns an error if invalid.
    fn validate_or_error(&self) -> FundosResult<()> {
        let mut errors = self.validate();
        match errors.len() {
            0 => Ok(()),
            1 => {
                let err = errors.remove(0);
                Err(FundosError::Configuration {
                    field: err.field,
                    message: err.message,
                })
            }
            _ => Err(FundosError::MultipleConfiguration(errors)),
        }
    }
}
