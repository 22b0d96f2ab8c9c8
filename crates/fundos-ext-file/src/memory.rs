//! In-memory source and sink.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use fundos_core::{AggregatedRecord, HoldingTable};
use fundos_traits::{ReportingPeriod, SinkWriter, SourceReader, TraitError};

/// Serves a fixed table for every period.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    table: HoldingTable,
    unavailable: Option<String>,
}

impl InMemorySource {
    /// Create a source returning `table`.
    pub fn new(table: HoldingTable) -> Self {
        Self {
            table,
            unavailable: None,
        }
    }

    /// Create a source whose every fetch fails.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            table: HoldingTable::default(),
            unavailable: Some(reason.into()),
        }
    }
}

impl SourceReader for InMemorySource {
    fn fetch(&self, _period: ReportingPeriod) -> Result<HoldingTable, TraitError> {
        match &self.unavailable {
            Some(reason) => Err(TraitError::SourceNotAvailable(reason.clone())),
            None => Ok(self.table.clone()),
        }
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

/// Keeps written objects in memory, keyed by object key.
#[derive(Debug, Default)]
pub struct InMemorySink {
    objects: Mutex<BTreeMap<String, Vec<AggregatedRecord>>>,
    rejected: Option<String>,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink whose every write fails.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            objects: Mutex::default(),
            rejected: Some(reason.into()),
        }
    }

    /// Keys written so far, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }

    /// Rows stored under a key.
    pub fn get(&self, key: &str) -> Option<Vec<AggregatedRecord>> {
        self.objects.lock().get(key).cloned()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    /// Returns true if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

impl SinkWriter for InMemorySink {
    fn write(&self, rows: &[AggregatedRecord], key: &str) -> Result<(), TraitError> {
        if let Some(reason) = &self.rejected {
            return Err(TraitError::IoError(reason.clone()));
        }
        self.objects.lock().insert(key.to_string(), rows.to_vec());
        Ok(())
    }

    fn extension(&self) -> &str {
        ""
    }
}
