//! Loader types
//!
//! Declarative job file types for YAML parsing.

use crate::engine::DriverConfig;
use crate::extract::ResponseShape;
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::pagination::TerminationPolicy;
use crate::request::RequestSpec;
use crate::transform::TransformDefinition;
use crate::types::{param_string, BackoffType, JsonValue, OffsetStrategy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

// ============================================================================
// Job File
// ============================================================================

/// Top-level job file: shared settings plus the jobs that use them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct JobFile {
    /// Name of this job set
    #[serde(default)]
    pub name: Option<String>,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpDefinition,
    /// Pagination driver configuration
    #[serde(default)]
    pub driver: DriverDefinition,
    /// Job definitions
    pub jobs: Vec<JobDefinition>,
}

impl JobFile {
    /// Find a job by name
    pub fn job(&self, name: &str) -> Option<&JobDefinition> {
        self.jobs.iter().find(|j| j.name == name)
    }

    /// Job names, in file order
    pub fn job_names(&self) -> Vec<&str> {
        self.jobs.iter().map(|j| j.name.as_str()).collect()
    }

    /// HTTP client configuration for every job in this file
    pub fn client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder().timeout(Duration::from_secs(self.http.timeout_secs));

        builder = match &self.http.rate_limit {
            Some(limit) => builder.rate_limit(limit.clone()),
            None => builder.no_rate_limit(),
        };
        if let Some(agent) = &self.http.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        for (key, value) in &self.http.headers {
            builder = builder.header(key.clone(), value.clone());
        }

        builder.build()
    }

    /// Driver configuration for one job, applying its overrides
    pub fn driver_config(&self, job: &JobDefinition) -> DriverConfig {
        DriverConfig::new()
            .with_max_retries(self.http.max_retries)
            .with_backoff(
                self.http.backoff,
                Duration::from_millis(self.http.initial_backoff_ms),
                Duration::from_millis(self.http.max_backoff_ms),
            )
            .with_preview_rows(job.preview_rows.unwrap_or(self.driver.preview_rows))
    }

    /// Termination policy for one job, applying its overrides
    pub fn policy(&self, job: &JobDefinition) -> TerminationPolicy {
        let policy = TerminationPolicy::new().with_offset_strategy(job.offset_strategy);
        match job.max_pages.or(self.driver.max_pages) {
            Some(max) => policy.with_max_pages(max),
            None => policy,
        }
    }
}

// ============================================================================
// HTTP Definition
// ============================================================================

/// HTTP client and retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HttpDefinition {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum retries per page
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Backoff between retries
    #[serde(default)]
    pub backoff: BackoffType,
    /// First retry delay in milliseconds
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    /// Longest retry delay in milliseconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
    /// Rate limit; absent disables limiting
    #[serde(default = "default_rate_limit")]
    pub rate_limit: Option<RateLimiterConfig>,
    /// User agent
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Headers sent with every request (e.g. `X-App-Token`)
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for HttpDefinition {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            backoff: BackoffType::default(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            rate_limit: default_rate_limit(),
            user_agent: None,
            headers: HashMap::new(),
        }
    }
}

fn default_timeout() -> u64 {
    120
}

fn default_retries() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    500
}

fn default_max_backoff() -> u64 {
    60_000
}

#[allow(clippy::unnecessary_wraps)]
fn default_rate_limit() -> Option<RateLimiterConfig> {
    Some(RateLimiterConfig::default())
}

// ============================================================================
// Driver Definition
// ============================================================================

/// Pagination limits and logging shared by all jobs in a file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DriverDefinition {
    /// Maximum pages per job
    #[serde(default)]
    pub max_pages: Option<u32>,
    /// Records of each page to log
    #[serde(default)]
    pub preview_rows: usize,
}

// ============================================================================
// Job Definition
// ============================================================================

/// One paged ingestion job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct JobDefinition {
    /// Job name, unique within its file
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Endpoint URL
    pub url: String,
    /// Fixed query parameters; scalars are rendered as strings
    #[serde(default)]
    pub params: BTreeMap<String, JsonValue>,
    /// Name of the offset query parameter
    pub offset_param: String,
    /// Columns to keep, in output order
    pub columns: Vec<String>,
    /// Response body shape
    #[serde(default)]
    pub shape: ResponseShape,
    /// How the next offset is derived
    #[serde(default)]
    pub offset_strategy: OffsetStrategy,
    /// Output file name, relative to the output directory
    pub output: String,
    /// Per-job page cap
    #[serde(default)]
    pub max_pages: Option<u32>,
    /// Per-job preview row count
    #[serde(default)]
    pub preview_rows: Option<usize>,
    /// Cleanups applied to the rows before writing
    #[serde(default, skip_serializing_if = "TransformDefinition::is_empty")]
    pub transform: TransformDefinition,
}

impl JobDefinition {
    /// Build the initial request for this job
    pub fn request_spec(&self) -> RequestSpec {
        let params = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), param_string(v)))
            .collect();

        RequestSpec::new(&self.url, &self.offset_param, &self.columns).with_params(params)
    }
}
