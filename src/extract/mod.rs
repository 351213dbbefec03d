//! Response extraction module
//!
//! Supports: flat arrays, enveloped features (ArcGIS, Carto), nested geo records
//!
//! # Overview
//!
//! Providers disagree on where the rows live in a response body. Each
//! extractor turns one decoded page into a homogeneous list of records with
//! only top-level scalar fields. An empty list means the provider has no
//! more data.

mod extractors;
mod types;

pub use extractors::{EnvelopedExtractor, FlatExtractor, NestedGeoExtractor};
pub use types::{RecordExtractor, ResponseShape};
