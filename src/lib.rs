// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # civic-harvest
//!
//! Paginated ingestion of municipal open-data APIs (Socrata SODA, ArcGIS
//! FeatureServer, Carto SQL) into deduplicated, column-projected result sets.
//!
//! ## Features
//!
//! - **Offset Pagination**: One termination rule for every provider: stop on an
//!   empty page or on a page that adds no new rows
//! - **Response Shapes**: Flat arrays, enveloped features, nested coordinates
//! - **Deduplication**: Full-row dedup with a schema fixed by the first page
//! - **Retries**: Transient transport failures retried with bounded backoff
//! - **Output**: JSON, JSON Lines or Parquet, skipping outputs that exist
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use civic_harvest::{PaginationDriver, RequestSpec, ResponseShape, HttpClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> civic_harvest::Result<()> {
//!     let client = Arc::new(HttpClient::new()?);
//!     let driver = PaginationDriver::new(client, ResponseShape::Flat.extractor());
//!
//!     let spec = RequestSpec::new(
//!         "https://data.cityofchicago.org/resource/85ca-t3if.json",
//!         "$offset",
//!         ["crash_record_id", "latitude", "longitude"],
//!     )
//!     .param("$limit", "50000");
//!
//!     let rows = driver.drain(spec).await.into_result()?;
//!     println!("{} rows", rows.map_or(0, |r| r.len()));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        PaginationDriver                          │
//! │   fetch → extract → project → accumulate → decide (loop)         │
//! └──────────────────────────────────────────────────────────────────┘
//!                                 │
//! ┌───────────┬─────────────┬─────┴───────┬─────────────┬───────────┐
//! │   HTTP    │   Extract   │  Projector  │ Accumulator │  Policy   │
//! ├───────────┼─────────────┼─────────────┼─────────────┼───────────┤
//! │ GET       │ Flat        │ Columns     │ Dedup       │ Empty     │
//! │ Timeout   │ Enveloped   │ Schema err  │ Fixed schema│ No growth │
//! │ Rate Limit│ NestedGeo   │             │             │ Page cap  │
//! └───────────┴─────────────┴─────────────┴─────────────┴───────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Request specification for one paged endpoint
pub mod request;

/// HTTP page fetching with rate limiting
pub mod http;

/// Response extraction per provider shape
pub mod extract;

/// Column projection and deduplicating accumulation
pub mod rows;

/// Termination policy
pub mod pagination;

/// Pagination driver
pub mod engine;

/// YAML loader for job files
pub mod loader;

/// Built-in job sets
pub mod catalog;

/// Post-harvest row transforms
pub mod transform;

/// JSON/Parquet output
pub mod output;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use engine::{DrainOutcome, DriverConfig, PaginationDriver};
pub use extract::{RecordExtractor, ResponseShape};
pub use http::{HttpClient, HttpClientConfig, PageSource};
pub use loader::{load_jobs, load_jobs_from_str, JobFile};
pub use pagination::{StopReason, TerminationPolicy};
pub use request::RequestSpec;
pub use rows::ResultSet;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
