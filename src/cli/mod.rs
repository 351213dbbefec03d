//! CLI module
//!
//! Command-line interface for running harvest jobs.
//!
//! # Commands
//!
//! - `run` - Harvest jobs and write their output
//! - `list` - List built-in job sets
//! - `validate` - Check a job file
//! - `show` - Print a job file with defaults applied

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::{harvest, harvest_with, JobStatus, JobSummary, RunOptions, Runner};
