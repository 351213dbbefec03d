//! Run manifests
//!
//! A small JSON document written next to each job's output describing how the
//! run went, so a partial or failed harvest is visible without reading logs.

use crate::engine::DrainOutcome;
use crate::error::{Error, Result, ResultExt};
use crate::pagination::StopReason;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Summary of one job run
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    /// Job name
    pub job: String,
    /// Endpoint URL
    pub url: String,
    /// Data file written, if any
    pub output: Option<PathBuf>,
    /// Unique rows harvested
    pub rows: usize,
    /// Rows written after transforms
    pub rows_written: usize,
    /// Pages fetched
    pub pages: usize,
    /// Retried requests
    pub retries: usize,
    /// Duplicate rows dropped
    pub duplicates: usize,
    /// Why the run stopped
    pub stop_reason: StopReason,
    /// Whether the source was drained without error
    pub complete: bool,
    /// Failure message, if any
    pub error: Option<String>,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run end
    pub finished_at: DateTime<Utc>,
    /// Elapsed milliseconds spent draining
    pub duration_ms: u64,
}

impl RunManifest {
    /// Build a manifest from a drain outcome
    pub fn from_outcome(
        job: impl Into<String>,
        url: impl Into<String>,
        outcome: &DrainOutcome,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            job: job.into(),
            url: url.into(),
            output: None,
            rows: outcome.row_count(),
            rows_written: 0,
            pages: outcome.stats.pages_fetched,
            retries: outcome.stats.retries,
            duplicates: outcome.stats.duplicates,
            stop_reason: outcome.reason,
            complete: outcome.is_complete(),
            error: outcome.error.as_ref().map(ToString::to_string),
            started_at,
            finished_at: Utc::now(),
            duration_ms: outcome.stats.duration_ms,
        }
    }

    /// Record the written file
    #[must_use]
    pub fn with_output(mut self, path: PathBuf, rows_written: usize) -> Self {
        self.output = Some(path);
        self.rows_written = rows_written;
        self
    }

    /// Record a failure after the drain, such as a transform or write error
    #[must_use]
    pub fn with_error(mut self, error: &Error) -> Self {
        self.complete = false;
        self.error = Some(error.to_string());
        self
    }

    /// Manifest path for a data file path
    pub fn path_for(target: &Path) -> PathBuf {
        let mut name = target
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".manifest.json");
        target.with_file_name(name)
    }

    /// Write the manifest as pretty JSON
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write manifest {}", path.as_ref().display()))
    }
}
