//! Error types for the batch job.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use fundos_core::FundosError;
use fundos_traits::TraitError;

/// Result type for job operations.
pub type EtlResult<T> = Result<T, EtlError>;

/// Collaborator stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the raw table.
    Fetch,
    /// Storing the output.
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Write => write!(f, "write"),
        }
    }
}

/// Coarse classification of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad column mapping, config file or period.
    Configuration,
    /// A row cannot be aggregated.
    DataIntegrity,
    /// The source or the sink failed.
    UpstreamFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::DataIntegrity => write!(f, "data_integrity"),
            ErrorKind::UpstreamFailure => write!(f, "upstream_failure"),
        }
    }
}

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum EtlError {
    /// The transform configuration is incoherent or does not fit the input.
    #[error(transparent)]
    Configuration(FundosError),

    /// The input violates an aggregation precondition.
    #[error(transparent)]
    DataIntegrity(FundosError),

    /// A source or sink call failed; the error is passed through unchanged.
    #[error("{stage} stage failed: {source}")]
    UpstreamFailure {
        /// Which collaborator failed.
        stage: Stage,
        /// The collaborator's error.
        source: TraitError,
    },

    /// The config file cannot be read or parsed.
    #[error("Cannot load config file '{}': {message}", .path.display())]
    ConfigFile {
        /// Path of the file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
}

impl EtlError {
    /// Tag a collaborator error with its stage.
    pub fn upstream(stage: Stage, source: TraitError) -> Self {
        Self::UpstreamFailure { stage, source }
    }

    /// Create a configuration error.
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration(FundosError::configuration(field, message))
    }

    /// Classification of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EtlError::Configuration(_) | EtlError::ConfigFile { .. } => ErrorKind::Configuration,
            EtlError::DataIntegrity(_) => ErrorKind::DataIntegrity,
            EtlError::UpstreamFailure { .. } => ErrorKind::UpstreamFailure,
        }
    }
}

impl From<FundosError> for EtlError {
    fn from(e: FundosError) -> Self {
        if e.is_configuration() {
            EtlError::Configuration(e)
        } else {
            EtlError::DataIntegrity(e)
        }
    }
}
