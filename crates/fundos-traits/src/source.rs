//! Holdings source traits.
//!
//! A [`SourceReader`] hands the transform one raw table per reporting
//! period. How many physical files back that table, and how they are
//! fetched, is the reader's concern.

use fundos_core::HoldingTable;

use crate::error::TraitError;
use crate::period::ReportingPeriod;

/// Trait for holdings sources.
pub trait SourceReader: Send + Sync {
    /// Fetch the combined raw table for a period.
    ///
    /// Any failure aborts the run; the caller does not retry.
    fn fetch(&self, period: ReportingPeriod) -> Result<HoldingTable, TraitError>;

    /// Short name used in log events.
    fn name(&self) -> &str {
        "source"
    }
}

impl<T: SourceReader + ?Sized> SourceReader for &T {
    fn fetch(&self, period: ReportingPeriod) -> Result<HoldingTable, TraitError> {
        (**self).fetch(period)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: SourceReader + ?Sized> SourceReader for Box<T> {
    fn fetch(&self, period: ReportingPeriod) -> Result<HoldingTable, TraitError> {
        (**self).fetch(period)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
