//! # Fundos ETL
//!
//! Batch job computing, for every fund in a monthly holdings disclosure,
//! the share of its market value held in each asset type.
//!
//! A run fetches the raw table of one [`ReportingPeriod`], aggregates it
//! with [`fundos_core::aggregate`] and stores the result under a
//! time-stamped key:
//!
//! ```ignore
//! let config = AppConfig::from_file("config/fundos.yaml")?;
//! let job = EtlJob::new(config.source_reader(), config.sink_writer()?, config.transformer_args.clone())
//!     .with_key_prefix(config.target.key_prefix.clone());
//! let report = job.run(config.period(None, None)?)?;
//! ```
//!
//! The `fundos` binary wraps this with a command-line interface.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod config;
pub mod error;
pub mod job;

pub use clock::{target_key, Clock, FixedClock, SystemClock, KEY_TIMESTAMP_FORMAT};
pub use config::{AppConfig, LoggingConfig, SourceConfig, SourceKind, TargetConfig};
pub use error::{ErrorKind, EtlError, EtlResult, Stage};
pub use job::{EtlJob, RunReport};

pub use fundos_traits::ReportingPeriod;
