//! Application configuration.
//!
//! Loaded from a YAML file with four sections:
//!
//! ```yaml
//! logging:
//!   level: info
//!   json: false
//! source:
//!   kind: directory        # or zip_file, http_zip
//!   dir: ./data/cda
//!   prefix: cda_fi_BLC_
//!   member_indices: [1, 2]
//!   delimiter: ";"
//!   year: 2023
//!   month: 6
//! target:
//!   root: ./out
//!   key_prefix: cda/fi_
//!   format: parquet
//! transformer_args:
//!   social_name_column: DENOM_SOCIAL
//!   # ...
//! ```
//!
//! Every section but `source` and `target` may be omitted;
//! `transformer_args` then defaults to the CVM feed mapping.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use fundos_core::{OutputColumns, TransformConfig, Validate, ValidationError};
use fundos_ext_file::{CsvHoldingSource, FileObjectStore, TargetFormat, ZipHoldingSource};
use fundos_traits::{ReportingPeriod, SourceReader};

use crate::error::{EtlError, EtlResult};

/// Top-level configuration of one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where the raw members are read from
    pub source: SourceConfig,

    /// Where the output is stored
    pub target: TargetConfig,

    /// Column mapping of the transform
    #[serde(default = "TransformConfig::cvm_default")]
    pub transformer_args: TransformConfig,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of text
    #[serde(default)]
    pub json: bool,
}

/// How the members of a batch are reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Extracted member files in `dir`
    #[default]
    Directory,
    /// `<dir>/<archive_prefix><YYYYMM>.zip`
    ZipFile,
    /// `<url><YYYYMM>.zip`, downloaded on each run
    HttpZip,
}

/// Source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Layout of the batch
    #[serde(default)]
    pub kind: SourceKind,

    /// Directory holding the members or the archives
    #[serde(default)]
    pub dir: PathBuf,

    /// File name prefix of each archive
    #[serde(default = "default_archive_prefix")]
    pub archive_prefix: String,

    /// Archive URL up to the period
    #[serde(default)]
    pub url: Option<String>,

    /// Download timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// File name prefix of each member
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Numbered members making up one batch
    #[serde(default = "default_member_indices")]
    pub member_indices: Vec<u32>,

    /// Field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Reporting year, unless given on the command line
    pub year: Option<u16>,

    /// Reporting month, unless given on the command line
    pub month: Option<u8>,
}

/// Object store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Root directory of the store
    pub root: PathBuf,

    /// Prefix of every object key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Serialization format
    #[serde(default)]
    pub format: TargetFormat,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_prefix() -> String {
    "cda_fi_BLC_".to_string()
}

fn default_archive_prefix() -> String {
    "cda_fi_".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_member_indices() -> Vec<u32> {
    vec![1, 2]
}

fn default_delimiter() -> char {
    ';'
}

fn default_key_prefix() -> String {
    "cda/fi_".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> EtlResult<Self> {
        let path = path.as_ref();
        let config_file_error = |message: String| EtlError::ConfigFile {
            path: path.to_path_buf(),
            message,
        };

        let content =
            std::fs::read_to_string(path).map_err(|e| config_file_error(e.to_string()))?;
        Self::from_yaml(&content).map_err(|e| match e {
            EtlError::ConfigFile { message, .. } => config_file_error(message),
            other => other,
        })
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> EtlResult<Self> {
        serde_yaml::from_str(content).map_err(|e| EtlError::ConfigFile {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })
    }

    /// Reporting period, preferring explicit values over the file's.
    pub fn period(&self, year: Option<u16>, month: Option<u8>) -> EtlResult<ReportingPeriod> {
        let year = year
            .or(self.source.year)
            .ok_or_else(|| EtlError::configuration("source.year", "no reporting year given"))?;
        let month = month
            .or(self.source.month)
            .ok_or_else(|| EtlError::configuration("source.month", "no reporting month given"))?;

        ReportingPeriod::new(year, month)
            .map_err(|e| EtlError::configuration("source", e.to_string()))
    }

    /// Output column layout derived from the transform mapping.
    pub fn output_columns(&self) -> EtlResult<OutputColumns> {
        Ok(self.transformer_args.output_columns()?)
    }

    /// Source for the configured kind.
    pub fn source_reader(&self) -> Box<dyn SourceReader> {
        let source = &self.source;
        match source.kind {
            SourceKind::Directory => Box::new(self.directory_source()),
            SourceKind::ZipFile => Box::new(
                ZipHoldingSource::from_dir(
                    &source.dir,
                    source.archive_prefix.clone(),
                    source.prefix.clone(),
                )
                .with_member_indices(source.member_indices.clone())
                .with_delimiter(source.delimiter as u8),
            ),
            SourceKind::HttpZip => Box::new(
                ZipHoldingSource::from_url(
                    source.url.clone().unwrap_or_default(),
                    source.prefix.clone(),
                )
                .with_member_indices(source.member_indices.clone())
                .with_delimiter(source.delimiter as u8)
                .with_timeout(Duration::from_secs(source.timeout_secs)),
            ),
        }
    }

    /// Source reading extracted members from the configured directory.
    pub fn directory_source(&self) -> CsvHoldingSource {
        CsvHoldingSource::new(&self.source.dir, self.source.prefix.clone())
            .with_member_indices(self.source.member_indices.clone())
            .with_delimiter(self.source.delimiter as u8)
    }

    /// Object store writing under the configured root.
    pub fn sink_writer(&self) -> EtlResult<FileObjectStore> {
        Ok(FileObjectStore::new(
            &self.target.root,
            self.target.format,
            self.output_columns()?,
        ))
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors: Vec<ValidationError> = self
            .transformer_args
            .validate()
            .into_iter()
            .map(|e| ValidationError::new(format!("transformer_args.{}", e.field), e.message))
            .collect();

        if self.logging.level.trim().is_empty() {
            errors.push(ValidationError::new("logging.level", "must not be empty"));
        }

        match self.source.kind {
            SourceKind::Directory | SourceKind::ZipFile => {
                if self.source.dir.as_os_str().is_empty() {
                    errors.push(ValidationError::new(
                        "source.dir",
                        format!("required for the {:?} source", self.source.kind),
                    ));
                }
            }
            SourceKind::HttpZip => {
                let url = self.source.url.as_deref().unwrap_or_default();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    errors.push(ValidationError::new(
                        "source.url",
                        "an http(s) URL is required for the http_zip source",
                    ));
                }
                if self.source.timeout_secs == 0 {
                    errors.push(ValidationError::new(
                        "source.timeout_secs",
                        "must be positive",
                    ));
                }
            }
        }

        if self.source.member_indices.is_empty() {
            errors.push(ValidationError::new(
                "source.member_indices",
                "at least one member file is required",
            ));
        }
        let delimiter = self.source.delimiter;
        if !delimiter.is_ascii() || matches!(delimiter, '"' | '\n' | '\r') {
            errors.push(ValidationError::new(
                "source.delimiter",
                format!("'{}' cannot be used as a field delimiter", delimiter.escape_default()),
            ));
        }
        if let Some(month) = self.source.month {
            if !(1..=12).contains(&month) {
                errors.push(ValidationError::new(
                    "source.month",
                    format!("must be between 1 and 12, got {month}"),
                ));
            }
        }

        let escapes = Path::new(&self.target.key_prefix)
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            errors.push(ValidationError::new(
                "target.key_prefix",
                "must be a relative path inside the store",
            ));
        }

        errors
    }
}
