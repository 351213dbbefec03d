//! Result set writers
//!
//! Writes a `ResultSet` as a JSON array of records, JSON Lines, or Parquet.
//! Files are written under a temporary name and renamed into place, so an
//! interrupted run never leaves a file that a later run would skip.

use super::schema::result_to_batches;
use crate::error::{Error, Result};
use crate::rows::ResultSet;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

// ============================================================================
// Output Format
// ============================================================================

/// On-disk format for harvested rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One JSON array of records
    #[default]
    Json,
    /// One JSON record per line
    Jsonl,
    /// Apache Parquet
    Parquet,
}

impl OutputFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Jsonl => "jsonl",
            Self::Parquet => "parquet",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::Jsonl),
            "parquet" => Ok(Self::Parquet),
            other => Err(Error::invalid_value(
                "format",
                format!("unknown output format '{other}' (expected json, jsonl or parquet)"),
            )),
        }
    }
}

// ============================================================================
// Parquet Configuration
// ============================================================================

/// Parquet compression codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParquetCompression {
    /// Snappy
    #[default]
    Snappy,
    /// Zstandard at its default level
    Zstd,
    /// No compression
    Uncompressed,
}

impl FromStr for ParquetCompression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "snappy" => Ok(Self::Snappy),
            "zstd" => Ok(Self::Zstd),
            "none" | "uncompressed" => Ok(Self::Uncompressed),
            other => Err(Error::invalid_value(
                "compression",
                format!("unknown compression '{other}' (expected snappy, zstd or none)"),
            )),
        }
    }
}

/// Configuration for Parquet output
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 1024 * 1024, // 1M rows
        }
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set row group size
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Set the compression codec
    #[must_use]
    pub fn with_compression(mut self, compression: ParquetCompression) -> Self {
        self.compression = match compression {
            ParquetCompression::Snappy => Compression::SNAPPY,
            ParquetCompression::Zstd => Compression::ZSTD(parquet::basic::ZstdLevel::default()),
            ParquetCompression::Uncompressed => Compression::UNCOMPRESSED,
        };
        self
    }

    /// Use ZSTD compression
    #[must_use]
    pub fn zstd(self) -> Self {
        self.with_compression(ParquetCompression::Zstd)
    }

    /// Use no compression
    #[must_use]
    pub fn uncompressed(self) -> Self {
        self.with_compression(ParquetCompression::Uncompressed)
    }

    /// Get row group size
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

// ============================================================================
// Format Writers
// ============================================================================

/// Write the result set as a JSON array of records
pub fn write_json(path: impl AsRef<Path>, result: &ResultSet) -> Result<usize> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer(&mut out, result)?;
    out.flush()?;
    Ok(result.len())
}

/// Write the result set as JSON Lines
pub fn write_jsonl(path: impl AsRef<Path>, result: &ResultSet) -> Result<usize> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    for record in result.records() {
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(result.len())
}

/// Write the result set as a Parquet file
pub fn write_parquet(
    path: impl AsRef<Path>,
    result: &ResultSet,
    config: &ParquetWriterConfig,
) -> Result<usize> {
    let batches = result_to_batches(result, config.row_group_size)?;
    let schema = batches
        .first()
        .map(|b| b.schema())
        .ok_or_else(|| Error::output("No batches to write"))?;

    let file = File::create(path.as_ref()).map_err(|e| Error::Output {
        message: format!("Failed to create file: {e}"),
    })?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(config.build_properties()))
        .map_err(|e| Error::Output {
            message: format!("Failed to create Parquet writer: {e}"),
        })?;

    let mut rows = 0;
    for batch in &batches {
        writer.write(batch).map_err(|e| Error::Output {
            message: format!("Failed to write batch: {e}"),
        })?;
        rows += batch.num_rows();
    }

    writer.close().map_err(|e| Error::Output {
        message: format!("Failed to close Parquet writer: {e}"),
    })?;
    Ok(rows)
}

// ============================================================================
// Output Directory
// ============================================================================

/// Where and how a job's rows are persisted
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
    format: OutputFormat,
    force: bool,
    parquet: ParquetWriterConfig,
}

impl OutputWriter {
    /// Create a writer for `dir` in the given format
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
            force: false,
            parquet: ParquetWriterConfig::default(),
        }
    }

    /// Overwrite existing files instead of skipping
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set Parquet options
    #[must_use]
    pub fn with_parquet_config(mut self, config: ParquetWriterConfig) -> Self {
        self.parquet = config;
        self
    }

    /// Output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Final path for a job's output name, with the extension set by format
    pub fn target(&self, output: &str) -> PathBuf {
        self.dir.join(output).with_extension(self.format.extension())
    }

    /// Whether a job's output should be skipped because it already exists
    pub fn should_skip(&self, output: &str) -> bool {
        !self.force && self.target(output).exists()
    }

    /// Write a result set, replacing any existing file. Returns the final path.
    pub fn write(&self, output: &str, result: &ResultSet) -> Result<PathBuf> {
        let target = self.target(output);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let partial = partial_path(&target);
        let written = match self.format {
            OutputFormat::Json => write_json(&partial, result),
            OutputFormat::Jsonl => write_jsonl(&partial, result),
            OutputFormat::Parquet => write_parquet(&partial, result, &self.parquet),
        };
        let rows = match written {
            Ok(rows) => rows,
            Err(err) => {
                // Best effort; the original error is what matters
                let _ = fs::remove_file(&partial);
                return Err(err);
            }
        };

        fs::rename(&partial, &target)?;
        debug!("Renamed {} to {}", partial.display(), target.display());
        info!("Wrote {rows} rows to {}", target.display());
        Ok(target)
    }
}

/// Temporary sibling path used while writing
fn partial_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    target.with_file_name(name)
}
