//! YAML parser for job files
//!
//! Parses and validates job files.
//! Supports both built-in job sets (by name) and custom YAML files (by path).

use crate::catalog;
use crate::error::{Error, Result};
use crate::extract::ResponseShape;
use crate::loader::types::{JobDefinition, JobFile};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Load a job file from a built-in name or a file path
///
/// This function first checks if the input is a built-in job set name
/// (e.g., "crashes"), then falls back to loading from a file path.
///
/// # Examples
///
/// ```ignore
/// // Load built-in job set by name
/// let jobs = load_jobs("requests-311")?;
///
/// // Load custom job file
/// let jobs = load_jobs("./my-city.yaml")?;
/// ```
pub fn load_jobs(path: impl AsRef<Path>) -> Result<JobFile> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    if !path_str.contains('/')
        && !path_str.contains('\\')
        && !path_str.ends_with(".yaml")
        && !path_str.ends_with(".yml")
    {
        if let Some(yaml) = catalog::get_builtin(&path_str) {
            return load_jobs_from_str(yaml);
        }
    }

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::config(format!(
                "Job file '{}' not found. Built-in job sets: {}. Or provide a path to a YAML file.",
                path.display(),
                catalog::list_builtin().join(", ")
            ))
        } else {
            Error::config(format!(
                "Failed to read job file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_jobs_from_str(&content)
}

/// Load a job file from a YAML string
pub fn load_jobs_from_str(yaml: &str) -> Result<JobFile> {
    let file: JobFile = serde_yaml::from_str(yaml)?;

    validate_job_file(&file)?;
    Ok(file)
}

/// Validate a job file
fn validate_job_file(file: &JobFile) -> Result<()> {
    if file.jobs.is_empty() {
        return Err(Error::config("Job file must define at least one job"));
    }

    if file.http.timeout_secs == 0 {
        return Err(Error::invalid_value("http.timeout_secs", "must be positive"));
    }
    if let Some(limit) = &file.http.rate_limit {
        if limit.requests_per_second == 0 {
            return Err(Error::invalid_value(
                "http.rate_limit.requests_per_second",
                "must be positive",
            ));
        }
    }
    if file.driver.max_pages == Some(0) {
        return Err(Error::invalid_value("driver.max_pages", "must be positive"));
    }

    let mut names = HashSet::new();
    let mut outputs = HashSet::new();
    for job in &file.jobs {
        validate_job(job)?;

        if !names.insert(job.name.as_str()) {
            return Err(Error::config(format!("Duplicate job name '{}'", job.name)));
        }
        // Writers replace the extension, so `a.json` and `a.jsonl` land on one file
        if !outputs.insert(output_stem(&job.output)) {
            return Err(Error::config(format!(
                "Jobs share the output file '{}'",
                job.output
            )));
        }
    }

    Ok(())
}

/// Validate a job definition
fn validate_job(job: &JobDefinition) -> Result<()> {
    if job.name.trim().is_empty() {
        return Err(Error::config("Job name cannot be empty"));
    }

    job.request_spec()
        .validate()
        .map_err(|e| Error::config(format!("Job '{}': {e}", job.name)))?;

    if job.max_pages == Some(0) {
        return Err(Error::config(format!(
            "Job '{}' max_pages must be positive",
            job.name
        )));
    }

    if let ResponseShape::NestedGeo { field, .. } = &job.shape {
        if field.is_empty() {
            return Err(Error::config(format!(
                "Job '{}' nested_geo shape needs a field",
                job.name
            )));
        }
    }

    for column in job.transform.columns() {
        if !job.columns.iter().any(|c| c == column) {
            return Err(Error::config(format!(
                "Job '{}' transform uses column '{column}' which is not harvested",
                job.name
            )));
        }
    }

    let output = Path::new(&job.output);
    let escapes = output
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if job.output.is_empty() || escapes {
        return Err(Error::config(format!(
            "Job '{}' output must be a relative path inside the output directory, got '{}'",
            job.name, job.output
        )));
    }

    Ok(())
}

/// Output path with `.` components and the extension removed
fn output_stem(output: &str) -> PathBuf {
    Path::new(output)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect::<PathBuf>()
        .with_extension("")
}
