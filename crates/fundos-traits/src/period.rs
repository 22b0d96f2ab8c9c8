//! Reporting period of a disclosure batch.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TraitError;

/// Year and month identifying one disclosure batch.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct ReportingPeriod {
    year: u16,
    month: u8,
}

#[derive(Deserialize)]
struct RawPeriod {
    year: u16,
    month: u8,
}

impl TryFrom<RawPeriod> for ReportingPeriod {
    type Error = TraitError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        Self::new(raw.year, raw.month)
    }
}

impl ReportingPeriod {
    /// Create a period, rejecting months outside 1..=12 and years outside
    /// 1000..=9999.
    pub fn new(year: u16, month: u8) -> Result<Self, TraitError> {
        if !(1..=12).contains(&month) {
            return Err(TraitError::InvalidInput(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        if !(1000..=9999).contains(&year) {
            return Err(TraitError::InvalidInput(format!(
                "year must have four digits, got {year}"
            )));
        }
        Ok(Self { year, month })
    }

    /// Year of the period.
    pub fn year(&self) -> u16 {
        self.year
    }

    /// Month of the period, 1 to 12.
    pub fn month(&self) -> u8 {
        self.month
    }

    /// The `YYYYMM` form used in batch file names.
    pub fn yyyymm(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
