//! Execution engine module
//!
//! The pagination driver: fetch, extract, project, accumulate, decide.
//!
//! # Overview
//!
//! The engine module provides:
//! - `PaginationDriver` - Drains one paged source into a `ResultSet`
//! - `DriverConfig` - Retry and logging configuration
//! - `DrainOutcome` - Result set, stop reason, failure and statistics
//!
//! Pages are fetched strictly in sequence: each request's offset depends on
//! the rows accumulated from every page before it.

mod types;

pub use types::{DrainOutcome, DrainStats, DriverConfig};

use crate::error::{Error, Result};
use crate::extract::RecordExtractor;
use crate::http::PageSource;
use crate::pagination::{NextPage, StopReason, TerminationPolicy, TerminationState};
use crate::request::RequestSpec;
use crate::rows::{Accumulator, ColumnProjector};
use crate::types::{JsonValue, Record};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drains a paged source until the termination policy says stop
pub struct PaginationDriver {
    /// Page source
    source: Arc<dyn PageSource>,
    /// Response extractor
    extractor: Box<dyn RecordExtractor>,
    /// Termination policy
    policy: TerminationPolicy,
    /// Driver configuration
    config: DriverConfig,
}

impl PaginationDriver {
    /// Create a new driver
    pub fn new(source: Arc<dyn PageSource>, extractor: Box<dyn RecordExtractor>) -> Self {
        Self {
            source,
            extractor,
            policy: TerminationPolicy::default(),
            config: DriverConfig::default(),
        }
    }

    /// Set the termination policy
    #[must_use]
    pub fn with_policy(mut self, policy: TerminationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set driver configuration
    #[must_use]
    pub fn with_config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }

    /// Fetch every page of `spec` and return the accumulated rows
    ///
    /// Never panics and never discards what was collected: on failure the
    /// outcome carries the partial result alongside the error.
    pub async fn drain(&self, spec: RequestSpec) -> DrainOutcome {
        let start = Instant::now();
        let mut stats = DrainStats::default();
        let mut accumulator = Accumulator::new();

        let run = self.run(spec, &mut accumulator, &mut stats).await;

        stats.duration_ms = start.elapsed().as_millis() as u64;
        let (reason, error) = match run {
            Ok(StopReason::PageLimit) => (
                StopReason::PageLimit,
                self.policy
                    .max_pages
                    .map(|max_pages| Error::PageLimit { max_pages }),
            ),
            Ok(reason) => (reason, None),
            Err(err) => (StopReason::Failed, Some(err)),
        };

        match &error {
            None => info!(
                "Drain finished ({reason}): {} rows from {} pages",
                accumulator.len(),
                stats.pages_fetched
            ),
            Some(err) => warn!(
                "Drain stopped ({reason}) with {} rows after {} pages: {err}",
                accumulator.len(),
                stats.pages_fetched
            ),
        }

        DrainOutcome {
            result: accumulator.into_result(),
            reason,
            error,
            stats,
        }
    }

    async fn run(
        &self,
        spec: RequestSpec,
        accumulator: &mut Accumulator,
        stats: &mut DrainStats,
    ) -> Result<StopReason> {
        spec.validate()?;

        let projector = ColumnProjector::new(spec.columns.iter().cloned());
        let mut state = TerminationState::new();
        let mut current = spec;

        loop {
            stats.last_offset = current.offset().map(str::to_string);
            let body = self.fetch_with_retry(&current, stats).await?;
            stats.pages_fetched += 1;

            let records = self.extractor.extract(&body)?;
            self.preview(stats.pages_fetched, &records);

            let projected = projector.project(records)?;
            let merge = accumulator.merge(projected)?;
            stats.rows_received += merge.received;
            stats.duplicates += merge.duplicates();

            info!(
                "Page {}: {} records, {} new, now at {} rows",
                stats.pages_fetched,
                merge.received,
                merge.added(),
                merge.after
            );

            match self.policy.evaluate(&mut state, &merge) {
                NextPage::Continue { offset } => {
                    current = current.with_offset(offset);
                }
                NextPage::Done(reason) => return Ok(reason),
            }
        }
    }

    /// Fetch one page, retrying transient failures with backoff
    async fn fetch_with_retry(&self, spec: &RequestSpec, stats: &mut DrainStats) -> Result<JsonValue> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            let (result, retry_after) = match self.source.fetch(&spec.url, &spec.params).await {
                Ok(page) => {
                    let retry_after = page.retry_after;
                    (page.into_body(), retry_after)
                }
                Err(err) => (Err(err), None),
            };

            let err = match result {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }
            if attempt >= max_retries {
                if max_retries == 0 {
                    return Err(err);
                }
                return Err(Error::MaxRetriesExceeded {
                    max_retries,
                    last: Box::new(err),
                });
            }

            let delay = retry_after
                .unwrap_or_else(|| self.config.backoff(attempt))
                .min(self.config.max_backoff);
            warn!(
                "Request failed ({err}), attempt {}/{}, retrying in {:?}",
                attempt + 1,
                max_retries + 1,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
            stats.retries += 1;
        }
    }

    fn preview(&self, page: usize, records: &[Record]) {
        if self.config.preview_rows == 0 {
            debug!("Page {page}: extracted {} records", records.len());
            return;
        }
        for record in records.iter().take(self.config.preview_rows) {
            info!("Page {page} preview: {}", JsonValue::Object(record.clone()));
        }
    }
}

impl std::fmt::Debug for PaginationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationDriver")
            .field("policy", &self.policy)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
