//! # Fundos Traits
//!
//! Trait definitions for the fundos ETL.
//!
//! This crate contains ONLY the seams between the pure transform and the
//! outside world. All implementations are in separate extension crates.
//!
//! ## Module Structure
//!
//! - [`source`]: Traits for holdings sources (one raw table per period)
//! - [`sink`]: Traits for output sinks (one object per run)
//! - [`period`]: The reporting period a run is scoped to
//!
//! ## Dependency Injection
//!
//! The orchestrator uses these traits via dependency injection:
//!
//! ```ignore
//! EtlJob::new(impl SourceReader, impl SinkWriter, transform_config)
//!     .with_key_prefix("cda/fi_")
//!     .run(ReportingPeriod::new(2023, 6)?)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod period;
pub mod sink;
pub mod source;

// Re-export commonly used types
pub use error::TraitError;
pub use period::ReportingPeriod;
pub use sink::SinkWriter;
pub use source::SourceReader;
