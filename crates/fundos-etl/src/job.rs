//! The batch job: fetch, aggregate, store.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use fundos_core::{aggregate, conservation_report, TransformConfig, Validate};
use fundos_traits::{ReportingPeriod, SinkWriter, SourceReader};

use crate::clock::{target_key, Clock, SystemClock};
use crate::error::{EtlError, EtlResult, Stage};

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Period processed.
    pub period: ReportingPeriod,
    /// Rows in the fetched table.
    pub input_rows: usize,
    /// Rows written.
    pub output_rows: usize,
    /// Distinct funds in the output.
    pub funds: usize,
    /// Key the output was stored under.
    pub key: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the output was stored.
    pub finished_at: DateTime<Utc>,
}

/// One source, one transform mapping, one sink.
///
/// A run is a full recompute of one period. Any failed stage aborts it; no
/// stage is retried and nothing partial is stored.
pub struct EtlJob<S, W> {
    source: S,
    sink: W,
    config: TransformConfig,
    key_prefix: String,
    clock: Box<dyn Clock>,
}

impl<S: SourceReader, W: SinkWriter> EtlJob<S, W> {
    /// Create a job with an empty key prefix and the system clock.
    pub fn new(source: S, sink: W, config: TransformConfig) -> Self {
        Self {
            source,
            sink,
            config,
            key_prefix: String::new(),
            clock: Box::new(SystemClock),
        }
    }

    /// Set the prefix of the output key.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Replace the clock used for keys and timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// The sink, for inspection after a run.
    pub fn sink(&self) -> &W {
        &self.sink
    }

    /// Run the job for one period.
    pub fn run(&self, period: ReportingPeriod) -> EtlResult<RunReport> {
        info!(%period, source = self.source.name(), "starting run");

        self.run_stages(period).map_err(|e| {
            error!(%period, kind = %e.kind(), error = %e, "run failed");
            e
        })
    }

    fn run_stages(&self, period: ReportingPeriod) -> EtlResult<RunReport> {
        let started_at = self.clock.now();
        self.config.validate_or_error()?;

        let timer = Instant::now();
        let table = self
            .source
            .fetch(period)
            .map_err(|e| EtlError::upstream(Stage::Fetch, e))?;
        info!(
            rows = table.len(),
            columns = table.columns().len(),
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "fetch complete"
        );

        let timer = Instant::now();
        let records = table.records(&self.config)?;
        let output = aggregate(&records, &self.config)?;
        let report = conservation_report(&output);
        info!(
            holdings = records.len(),
            groups = output.len(),
            funds = report.len(),
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "transform complete"
        );
        for (fund, total) in report.iter().filter(|(_, t)| (**t - 1.0).abs() > 1e-9) {
            debug!(fund = %fund, total, "fund percentages do not sum to one");
        }

        let timer = Instant::now();
        let key = target_key(&self.key_prefix, self.clock.now(), self.sink.extension());
        self.sink
            .write(&output, &key)
            .map_err(|e| EtlError::upstream(Stage::Write, e))?;
        info!(
            key = %key,
            rows = output.len(),
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "write complete"
        );

        Ok(RunReport {
            period,
            input_rows: table.len(),
            output_rows: output.len(),
            funds: report.len(),
            key,
            started_at,
            finished_at: self.clock.now(),
        })
    }
}
