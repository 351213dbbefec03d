//! Output module
//!
//! Persists harvested result sets.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Inferring Arrow schemas from result sets
//! - Writing JSON, JSON Lines and Parquet files
//! - Skipping outputs that already exist
//! - Writing per-job run manifests

mod manifest;
mod schema;
mod writer;

pub use manifest::RunManifest;
pub use schema::{infer_schema, result_to_batches};
pub use writer::{
    write_json, write_jsonl, write_parquet, OutputFormat, OutputWriter, ParquetCompression,
    ParquetWriterConfig,
};
