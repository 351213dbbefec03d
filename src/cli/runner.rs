//! CLI runner - executes commands

use crate::catalog::list_builtin_info;
use crate::cli::commands::{Cli, Commands};
use crate::engine::PaginationDriver;
use crate::error::{Error, Result};
use crate::http::{HttpClient, PageSource};
use crate::loader::{load_jobs, JobDefinition, JobFile};
use crate::output::{
    OutputFormat, OutputWriter, ParquetCompression, ParquetWriterConfig, RunManifest,
};
use crate::rows::ResultSet;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};

/// Options for a harvest run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Jobs to run; empty runs all
    pub only: Vec<String>,
    /// Directory receiving output files
    pub out_dir: PathBuf,
    /// Output file format
    pub format: OutputFormat,
    /// Parquet compression codec
    pub compression: ParquetCompression,
    /// Overwrite existing output
    pub force: bool,
    /// Jobs harvested at the same time
    pub concurrency: usize,
    /// Page cap overriding the job file
    pub max_pages: Option<u32>,
    /// Preview rows overriding the job file
    pub preview: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            only: Vec::new(),
            out_dir: PathBuf::from("data"),
            format: OutputFormat::Json,
            compression: ParquetCompression::default(),
            force: false,
            concurrency: 2,
            max_pages: None,
            preview: None,
        }
    }
}

/// How a job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Drained and written
    Complete,
    /// Output already existed
    Skipped,
    /// Stopped early; nothing written
    Failed,
}

/// Result of one job, as reported on stdout
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    /// Job name
    pub job: String,
    /// How the job ended
    pub status: JobStatus,
    /// Rows written
    pub rows: usize,
    /// Pages fetched
    pub pages: usize,
    /// Output file
    pub output: Option<PathBuf>,
    /// Failure message
    pub error: Option<String>,
}

impl JobSummary {
    fn skipped(job: &JobDefinition, output: PathBuf) -> Self {
        Self {
            job: job.name.clone(),
            status: JobStatus::Skipped,
            rows: 0,
            pages: 0,
            output: Some(output),
            error: None,
        }
    }

    fn failed(job: &JobDefinition, pages: usize, error: &Error) -> Self {
        Self {
            job: job.name.clone(),
            status: JobStatus::Failed,
            rows: 0,
            pages,
            output: None,
            error: Some(error.to_string()),
        }
    }
}

/// Run the selected jobs of a job file against live endpoints
pub async fn harvest(file: &JobFile, options: &RunOptions) -> Result<Vec<JobSummary>> {
    let client: Arc<dyn PageSource> = Arc::new(HttpClient::with_config(file.client_config())?);
    harvest_with(file, options, client).await
}

/// Run the selected jobs of a job file using the given page source
pub async fn harvest_with(
    file: &JobFile,
    options: &RunOptions,
    source: Arc<dyn PageSource>,
) -> Result<Vec<JobSummary>> {
    let selected = select_jobs(file, &options.only)?;
    let writer = OutputWriter::new(&options.out_dir, options.format)
        .with_force(options.force)
        .with_parquet_config(ParquetWriterConfig::new().with_compression(options.compression));

    info!(
        "Harvesting {} jobs into {} ({} at a time)",
        selected.len(),
        options.out_dir.display(),
        options.concurrency.max(1)
    );

    let summaries = stream::iter(selected)
        .map(|job| {
            let span = info_span!("job", name = %job.name);
            run_job(file, job, options, Arc::clone(&source), &writer).instrument(span)
        })
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;

    Ok(summaries)
}

/// Resolve `--only` names against the file, keeping file order
fn select_jobs<'a>(file: &'a JobFile, only: &[String]) -> Result<Vec<&'a JobDefinition>> {
    if only.is_empty() {
        return Ok(file.jobs.iter().collect());
    }

    if let Some(unknown) = only.iter().find(|name| file.job(name).is_none()) {
        return Err(Error::config(format!(
            "Unknown job '{unknown}'. Available: {}",
            file.job_names().join(", ")
        )));
    }

    Ok(file
        .jobs
        .iter()
        .filter(|job| only.contains(&job.name))
        .collect())
}

async fn run_job(
    file: &JobFile,
    job: &JobDefinition,
    options: &RunOptions,
    source: Arc<dyn PageSource>,
    writer: &OutputWriter,
) -> JobSummary {
    let target = writer.target(&job.output);
    if writer.should_skip(&job.output) {
        info!("Output {} exists, skipping", target.display());
        return JobSummary::skipped(job, target);
    }

    let mut policy = file.policy(job);
    if let Some(max_pages) = options.max_pages {
        policy = policy.with_max_pages(max_pages);
    }
    let mut config = file.driver_config(job);
    if let Some(rows) = options.preview {
        config = config.with_preview_rows(rows);
    }

    info!("Requesting data from {}", job.url);
    let started_at = Utc::now();
    let driver = PaginationDriver::new(source, job.shape.extractor())
        .with_policy(policy)
        .with_config(config);
    let mut outcome = driver.drain(job.request_spec()).await;

    let manifest = RunManifest::from_outcome(&job.name, &job.url, &outcome, started_at);
    let manifest_path = RunManifest::path_for(&target);
    let pages = outcome.stats.pages_fetched;

    if let Some(err) = outcome.error.take() {
        error!("Job failed after {pages} pages: {err}");
        if let Err(e) = manifest.write(&manifest_path) {
            warn!("Failed to write manifest: {e}");
        }
        return JobSummary::failed(job, pages, &err);
    }

    let result = outcome
        .result
        .take()
        .unwrap_or_else(|| ResultSet::new(job.columns.clone()));

    let written = job
        .transform
        .apply(result)
        .and_then(|rows| writer.write(&job.output, &rows).map(|path| (path, rows.len())));

    match written {
        Ok((path, rows)) => {
            let manifest = manifest.with_output(path.clone(), rows);
            if let Err(e) = manifest.write(&manifest_path) {
                warn!("Failed to write manifest: {e}");
            }
            JobSummary {
                job: job.name.clone(),
                status: JobStatus::Complete,
                rows,
                pages,
                output: Some(path),
                error: None,
            }
        }
        Err(err) => {
            error!("Failed to save output: {err}");
            if let Err(e) = manifest.with_error(&err).write(&manifest_path) {
                warn!("Failed to write manifest: {e}");
            }
            JobSummary::failed(job, pages, &err)
        }
    }
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run {
                jobs,
                only,
                out_dir,
                format,
                compression,
                force,
                concurrency,
                max_pages,
                preview,
            } => {
                let options = RunOptions {
                    only: only.clone(),
                    out_dir: out_dir.clone(),
                    format: *format,
                    compression: *compression,
                    force: *force,
                    concurrency: *concurrency,
                    max_pages: *max_pages,
                    preview: *preview,
                };
                self.run_jobs(jobs, &options).await
            }
            Commands::List => {
                self.list_job_sets();
                Ok(())
            }
            Commands::Validate { jobs } => self.validate(jobs),
            Commands::Show { jobs } => self.show(jobs),
        }
    }

    async fn run_jobs(&self, jobs: &str, options: &RunOptions) -> Result<()> {
        let file = load_jobs(jobs)?;
        let summaries = harvest(&file, options).await?;

        for summary in &summaries {
            self.output_message(&json!({ "type": "JOB", "job": summary }));
        }

        let failed = summaries
            .iter()
            .filter(|s| s.status == JobStatus::Failed)
            .count();
        if failed > 0 {
            return Err(Error::Other(format!(
                "{failed} of {} jobs failed",
                summaries.len()
            )));
        }
        Ok(())
    }

    fn list_job_sets(&self) {
        let sets: Vec<Value> = list_builtin_info()
            .into_iter()
            .map(|info| {
                json!({
                    "name": info.name,
                    "description": info.description,
                    "aliases": info.aliases,
                    "cities": info.cities
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "JOB_SETS",
            "job_sets": sets
        }));
    }

    fn validate(&self, jobs: &str) -> Result<()> {
        let file = load_jobs(jobs)?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Job file '{}' is valid with {} jobs",
                    file.name.as_deref().unwrap_or(jobs),
                    file.jobs.len()
                )
            }
        }));

        Ok(())
    }

    fn show(&self, jobs: &str) -> Result<()> {
        let file = load_jobs(jobs)?;
        self.output_message(&json!({
            "type": "JOB_FILE",
            "job_file": file
        }));
        Ok(())
    }

    fn output_message(&self, msg: &Value) {
        let text = if self.cli.pretty {
            serde_json::to_string_pretty(msg)
        } else {
            serde_json::to_string(msg)
        };
        println!("{}", text.unwrap_or_default());
    }
}
