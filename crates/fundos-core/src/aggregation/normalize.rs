//! Missing social name normalization.

use crate::types::HoldingRecord;

/// Placeholder for a fund whose social name was not disclosed.
pub const MISSING_SOCIAL_NAME: &str = "Sem denominacao social NaN";

/// A holding whose social name is guaranteed to be present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedHolding<'a> {
    /// Position of the row in the input.
    pub row: usize,
    /// The underlying record.
    pub record: &'a HoldingRecord,
    /// The disclosed social name, or [`MISSING_SOCIAL_NAME`].
    pub social_name: &'a str,
}

/// Replaces every absent social name with [`MISSING_SOCIAL_NAME`].
#[must_use]
pub fn normalize_social_names(records: &[HoldingRecord]) -> Vec<NormalizedHolding<'_>> {
    records
        .iter()
        .enumerate()
        .map(|(row, record)| NormalizedHolding {
            row,
            record,
            social_name: record.social_name.as_deref().unwrap_or(MISSING_SOCIAL_NAME),
        })
        .collect()
}
