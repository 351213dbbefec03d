//! Extractor types and traits

use super::extractors::{EnvelopedExtractor, FlatExtractor, NestedGeoExtractor};
use crate::error::Result;
use crate::types::{JsonValue, Record};
use serde::{Deserialize, Serialize};

/// Shape of a provider's response body, as written in job configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseShape {
    /// The body is a JSON array of records (Socrata SODA)
    #[default]
    Flat,

    /// The body wraps records in a collection (ArcGIS `features[].attributes`)
    Enveloped {
        /// Key of the collection in the body
        #[serde(default = "default_collection")]
        collection: String,
        /// Key of the record inside each element; `None` means the element is the record
        #[serde(default = "default_attributes")]
        attributes: Option<String>,
    },

    /// A flat array where coordinates sit in a sub-object that must be lifted
    NestedGeo {
        /// Key of the sub-object holding the coordinates
        field: String,
        /// Latitude key inside the sub-object
        #[serde(default = "default_latitude")]
        latitude_key: String,
        /// Longitude key inside the sub-object
        #[serde(default = "default_longitude")]
        longitude_key: String,
        /// Top-level column receiving the latitude
        #[serde(default = "default_latitude")]
        latitude_column: String,
        /// Top-level column receiving the longitude
        #[serde(default = "default_longitude")]
        longitude_column: String,
    },
}

fn default_collection() -> String {
    "features".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_attributes() -> Option<String> {
    Some("attributes".to_string())
}

fn default_latitude() -> String {
    "latitude".to_string()
}

fn default_longitude() -> String {
    "longitude".to_string()
}

impl ResponseShape {
    /// ArcGIS FeatureServer shape: `features[].attributes`
    pub fn arcgis() -> Self {
        Self::Enveloped {
            collection: default_collection(),
            attributes: default_attributes(),
        }
    }

    /// Nested geo shape with default coordinate names
    pub fn nested_geo(field: impl Into<String>) -> Self {
        Self::NestedGeo {
            field: field.into(),
            latitude_key: default_latitude(),
            longitude_key: default_longitude(),
            latitude_column: default_latitude(),
            longitude_column: default_longitude(),
        }
    }

    /// Build the extractor for this shape
    pub fn extractor(&self) -> Box<dyn RecordExtractor> {
        match self {
            Self::Flat => Box::new(FlatExtractor),
            Self::Enveloped {
                collection,
                attributes,
            } => Box::new(EnvelopedExtractor::new(collection, attributes.clone())),
            Self::NestedGeo {
                field,
                latitude_key,
                longitude_key,
                latitude_column,
                longitude_column,
            } => Box::new(
                NestedGeoExtractor::new(field)
                    .with_keys(latitude_key, longitude_key)
                    .with_columns(latitude_column, longitude_column),
            ),
        }
    }
}

/// Trait for turning a decoded page into records
pub trait RecordExtractor: Send + Sync {
    /// Extract the page's records. An empty vector signals exhaustion.
    fn extract(&self, page: &JsonValue) -> Result<Vec<Record>>;
}
