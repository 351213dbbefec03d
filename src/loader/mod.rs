//! YAML Loader module
//!
//! Parse ingestion job definitions from YAML files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `JobFile` - Shared HTTP and driver settings plus a list of jobs
//! - `JobDefinition` - One paged endpoint and where its rows go
//! - YAML parsing with validation

mod parser;
mod types;

pub use parser::{load_jobs, load_jobs_from_str};
pub use types::{DriverDefinition, HttpDefinition, JobDefinition, JobFile};
