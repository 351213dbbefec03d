//! Extractor implementations
//!
//! Each extractor handles one provider response shape.

use super::types::RecordExtractor;
use crate::error::{Error, Result};
use crate::types::{JsonValue, Record};

// ============================================================================
// Flat Extractor
// ============================================================================

/// The body itself is the array of records
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatExtractor;

impl RecordExtractor for FlatExtractor {
    fn extract(&self, page: &JsonValue) -> Result<Vec<Record>> {
        let items = as_array(page, "response body")?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| as_record(item, i))
            .collect()
    }
}

// ============================================================================
// Enveloped Extractor
// ============================================================================

/// Records wrapped in a collection, optionally one level deeper per element
///
/// ArcGIS: `{"features": [{"attributes": {...}}, ...]}`
/// Carto SQL: `{"rows": [{...}, ...]}` (no attributes key)
#[derive(Debug, Clone)]
pub struct EnvelopedExtractor {
    /// Key holding the collection
    collection: String,
    /// Key holding each element's record
    attributes: Option<String>,
}

impl EnvelopedExtractor {
    /// Create a new enveloped extractor
    pub fn new(collection: impl Into<String>, attributes: Option<String>) -> Self {
        Self {
            collection: collection.into(),
            attributes,
        }
    }

    /// ArcGIS FeatureServer query responses
    pub fn arcgis() -> Self {
        Self::new("features", Some("attributes".to_string()))
    }
}

impl RecordExtractor for EnvelopedExtractor {
    fn extract(&self, page: &JsonValue) -> Result<Vec<Record>> {
        let JsonValue::Object(envelope) = page else {
            return Err(Error::extraction(format!(
                "expected an object with '{}', got {}",
                self.collection,
                kind(page)
            )));
        };

        let Some(collection) = envelope.get(&self.collection) else {
            // ArcGIS reports query failures as 200 {"error": {...}}
            if let Some(error) = envelope.get("error") {
                return Err(Error::extraction(format!("provider error: {error}")));
            }
            return Err(Error::extraction(format!(
                "response has no '{}' collection",
                self.collection
            )));
        };

        let items = as_array(collection, &self.collection)?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| match &self.attributes {
                Some(key) => {
                    let inner = item.get(key).ok_or_else(|| {
                        Error::extraction(format!("element {i} has no '{key}' mapping"))
                    })?;
                    as_record(inner, i)
                }
                None => as_record(item, i),
            })
            .collect()
    }
}

// ============================================================================
// Nested Geo Extractor
// ============================================================================

/// A flat array whose coordinates are nested under one key
///
/// `{"id": 1, "location_1": {"latitude": "34.05", "longitude": "-118.24"}}`
/// becomes `{"id": 1, "latitude": "34.05", "longitude": "-118.24"}`.
#[derive(Debug, Clone)]
pub struct NestedGeoExtractor {
    field: String,
    latitude_key: String,
    longitude_key: String,
    latitude_column: String,
    longitude_column: String,
}

impl NestedGeoExtractor {
    /// Create an extractor lifting `latitude`/`longitude` out of `field`
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            latitude_key: "latitude".to_string(),
            longitude_key: "longitude".to_string(),
            latitude_column: "latitude".to_string(),
            longitude_column: "longitude".to_string(),
        }
    }

    /// Set the coordinate keys inside the sub-object
    #[must_use]
    pub fn with_keys(mut self, latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        self.latitude_key = latitude.into();
        self.longitude_key = longitude.into();
        self
    }

    /// Set the top-level column names the coordinates are lifted into
    #[must_use]
    pub fn with_columns(
        mut self,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
    ) -> Self {
        self.latitude_column = latitude.into();
        self.longitude_column = longitude.into();
        self
    }

    fn lift(&self, mut record: Record, row: usize) -> Result<Record> {
        let nested = record.remove(&self.field).ok_or_else(|| {
            Error::extraction(format!("record {row} has no '{}' field", self.field))
        })?;

        let coordinate = |key: &str| {
            nested.get(key).cloned().ok_or_else(|| {
                Error::extraction(format!(
                    "record {row}: '{}' has no '{key}' value",
                    self.field
                ))
            })
        };
        let latitude = coordinate(&self.latitude_key)?;
        let longitude = coordinate(&self.longitude_key)?;

        record.insert(self.latitude_column.clone(), latitude);
        record.insert(self.longitude_column.clone(), longitude);
        Ok(record)
    }
}

impl RecordExtractor for NestedGeoExtractor {
    fn extract(&self, page: &JsonValue) -> Result<Vec<Record>> {
        let records = FlatExtractor.extract(page)?;
        records
            .into_iter()
            .enumerate()
            .map(|(i, record)| self.lift(record, i))
            .collect()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn as_array<'a>(value: &'a JsonValue, what: &str) -> Result<&'a Vec<JsonValue>> {
    value.as_array().ok_or_else(|| {
        Error::extraction(format!("expected {what} to be an array, got {}", kind(value)))
    })
}

fn as_record(value: &JsonValue, row: usize) -> Result<Record> {
    match value {
        JsonValue::Object(map) => Ok(map.clone()),
        other => Err(Error::extraction(format!(
            "element {row} is {}, not an object",
            kind(other)
        ))),
    }
}

fn kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
