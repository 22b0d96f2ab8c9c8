//! Output sink traits.
//!
//! A [`SinkWriter`] serializes the aggregated table and stores it under a
//! key built by the caller. Writers know their physical column layout from
//! construction.

use fundos_core::AggregatedRecord;

use crate::error::TraitError;

/// Trait for output sinks.
pub trait SinkWriter: Send + Sync {
    /// Store the rows as one object under `key`.
    fn write(&self, rows: &[AggregatedRecord], key: &str) -> Result<(), TraitError>;

    /// File extension appended to keys, including the dot.
    fn extension(&self) -> &str;
}

impl<T: SinkWriter + ?Sized> SinkWriter for &T {
    fn write(&self, rows: &[AggregatedRecord], key: &str) -> Result<(), TraitError> {
        (**self).write(rows, key)
    }

    fn extension(&self) -> &str {
        (**self).extension()
    }
}

impl<T: SinkWriter + ?Sized> SinkWriter for Box<T> {
    fn write(&self, rows: &[AggregatedRecord], key: &str) -> Result<(), TraitError> {
        (**self).write(rows, key)
    }

    fn extension(&self) -> &str {
        (**self).extension()
    }
}
