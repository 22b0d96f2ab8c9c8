//! Domain types for the holdings transform.
//!
//! - [`HoldingTable`]: the raw table a source reader produces
//! - [`HoldingRecord`]: one raw row typed by logical role
//! - [`AggregatedRecord`]: one (fund, asset type) output row
//! - [`OutputColumns`]: physical names and order of the output columns

mod aggregated;
mod holding;

pub use aggregated::{AggregatedRecord, OutputColumns, OutputField, OutputValue};
pub use holding::{HoldingRecord, HoldingTable};
