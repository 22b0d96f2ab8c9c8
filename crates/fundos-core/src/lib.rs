//! # Fundos Core
//!
//! Holdings data model and the percentage-of-fund transform for periodic
//! fund-holdings disclosures.
//!
//! ## Design Philosophy
//!
//! - **Pure functions**: the transform takes rows and a configuration and
//!   returns rows, with no I/O
//! - **Role-based columns**: [`TransformConfig`] maps logical roles onto the
//!   physical columns of the source feed
//! - **Loud anomalies**: missing keys and zero fund totals are reported with
//!   the fund and row, never coerced to a default
//! - **Stable output**: groups are sorted by key through ordered maps
//!
//! ## Quick Start
//!
//! ```rust
//! use fundos_core::prelude::*;
//!
//! let rows = vec![
//!     HoldingRecord::new("F1", "A", dec!(50)),
//!     HoldingRecord::new("F1", "A", dec!(50)),
//!     HoldingRecord::new("F1", "B", dec!(100)),
//! ];
//!
//! let output = aggregate(&rows, &TransformConfig::canonical()).unwrap();
//! assert_eq!(output.len(), 2);
//! assert_eq!(output[0].percentage_of_fund, 0.5);
//! ```
//!
//! ## Module Overview
//!
//! - [`aggregation`] - The transform pipeline and its stages
//! - [`config`] - Column mapping, policies and validation
//! - [`error`] - Error types
//! - [`types`] - Raw table, holding and output records

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregation;
pub mod config;
pub mod error;
pub mod types;

// Re-export error types at crate root
pub use error::{FundosError, FundosResult, Validate, ValidationError};

// Re-export main types
pub use config::{ColumnRole, PlannedColumn, ProjectionPlan, TransformConfig, ZeroTotalPolicy};
pub use types::{
    AggregatedRecord, HoldingRecord, HoldingTable, OutputColumns, OutputField, OutputValue,
};

// Re-export the transform entry points
pub use aggregation::{aggregate, conservation_report, MISSING_SOCIAL_NAME};

/// Prelude module for convenient imports.
///
/// ```rust
/// use fundos_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::aggregation::{aggregate, conservation_report, MISSING_SOCIAL_NAME};
    pub use crate::config::{TransformConfig, ZeroTotalPolicy};
    pub use crate::error::{FundosError, FundosResult, Validate};
    pub use crate::types::{AggregatedRecord, HoldingRecord, HoldingTable, OutputColumns};

    // Re-export commonly used types from dependencies
    pub use rust_decimal::Decimal;
    pub use rust_decimal_macros::dec;
}
