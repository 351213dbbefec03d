//! Engine types
//!
//! Driver configuration, run statistics and the outcome of a drain.

use crate::error::{Error, Result};
use crate::pagination::StopReason;
use crate::rows::ResultSet;
use crate::types::BackoffType;
use std::time::Duration;

/// Configuration for the pagination driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Retries per page for transient transport failures
    pub max_retries: u32,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Records of each page to log at info level (0 disables)
    pub preview_rows: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_type: BackoffType::Exponential,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            preview_rows: 0,
        }
    }
}

impl DriverConfig {
    /// Create a new driver config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max retries
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set backoff configuration
    #[must_use]
    pub fn with_backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.backoff_type = backoff_type;
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Log the first `rows` records of every page
    #[must_use]
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Calculate backoff delay for a given attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        let delay = match self.backoff_type {
            BackoffType::Constant => self.initial_backoff,
            BackoffType::Linear => self.initial_backoff.saturating_mul(attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.initial_backoff.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.max_backoff)
    }
}

/// Statistics from one drain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Pages fetched successfully
    pub pages_fetched: usize,
    /// Retried requests
    pub retries: usize,
    /// Records received, duplicates included
    pub rows_received: usize,
    /// Records dropped as duplicates
    pub duplicates: usize,
    /// Offset parameter value of the last request made
    pub last_offset: Option<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Everything a drain produced, including partial results on failure
#[derive(Debug)]
pub struct DrainOutcome {
    /// Accumulated rows; `None` when the first page was empty or failed
    pub result: Option<ResultSet>,
    /// Why the run stopped
    pub reason: StopReason,
    /// The failure that stopped the run, if any
    pub error: Option<Error>,
    /// Run statistics
    pub stats: DrainStats,
}

impl DrainOutcome {
    /// Whether the source was drained without error
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.reason.is_exhausted()
    }

    /// Number of unique rows collected
    pub fn row_count(&self) -> usize {
        self.result.as_ref().map_or(0, ResultSet::len)
    }

    /// Convert into the result set, discarding partial results on failure
    pub fn into_result(self) -> Result<Option<ResultSet>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result),
        }
    }
}
