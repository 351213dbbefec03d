//! CLI commands and argument parsing

use crate::output::{OutputFormat, ParquetCompression};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Paginated harvester for municipal open-data portals
#[derive(Parser, Debug)]
#[command(name = "civic-harvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pretty-print JSON messages
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Harvest every job in a job file
    Run {
        /// Job file (YAML) or built-in job set name
        jobs: String,

        /// Jobs to run (comma-separated, empty = all)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Directory receiving output files
        #[arg(short, long, default_value = "data")]
        out_dir: PathBuf,

        /// Output file format: json, jsonl or parquet
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Parquet compression: snappy, zstd or none
        #[arg(long, default_value = "snappy")]
        compression: ParquetCompression,

        /// Re-harvest jobs whose output already exists
        #[arg(long)]
        force: bool,

        /// Jobs harvested at the same time
        #[arg(long, default_value = "2")]
        concurrency: usize,

        /// Page cap per job, overriding the job file
        #[arg(long)]
        max_pages: Option<u32>,

        /// Log the first N records of every page
        #[arg(long)]
        preview: Option<usize>,
    },

    /// List built-in job sets
    List,

    /// Validate a job file
    Validate {
        /// Job file (YAML) or built-in job set name
        jobs: String,
    },

    /// Print a job file with defaults applied
    Show {
        /// Job file (YAML) or built-in job set name
        jobs: String,
    },
}
