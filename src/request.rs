//! Request specification for one paged endpoint
//!
//! A `RequestSpec` is an immutable value. Advancing to the next page produces
//! a new spec via [`RequestSpec::with_offset`], so a spec handed to the driver
//! is never mutated behind the caller's back.

use crate::error::{Error, Result};
use crate::types::ParamMap;
use url::Url;

/// Everything needed to address one paged data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    /// Base URL of the endpoint
    pub url: String,
    /// Static query parameters plus the current offset, once set
    pub params: ParamMap,
    /// Name of the query parameter carrying the pagination offset
    pub offset_param: String,
    /// Columns to retain, in output order
    pub columns: Vec<String>,
}

impl RequestSpec {
    /// Create a new spec with no static parameters
    pub fn new(
        url: impl Into<String>,
        offset_param: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            url: url.into(),
            params: ParamMap::new(),
            offset_param: offset_param.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a static query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Replace all static query parameters
    #[must_use]
    pub fn with_params(mut self, params: ParamMap) -> Self {
        self.params = params;
        self
    }

    /// Return a copy of this spec with the offset parameter set to `offset`
    #[must_use]
    pub fn with_offset(&self, offset: usize) -> Self {
        let mut next = self.clone();
        next.params
            .insert(self.offset_param.clone(), offset.to_string());
        next
    }

    /// Current value of the offset parameter, if present
    pub fn offset(&self) -> Option<&str> {
        self.params.get(&self.offset_param).map(String::as_str)
    }

    /// Check the spec is usable before any request is made
    pub fn validate(&self) -> Result<()> {
        let parsed = Url::parse(&self.url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "url",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }
        if self.offset_param.trim().is_empty() {
            return Err(Error::missing_field("offset_param"));
        }
        if self.columns.is_empty() {
            return Err(Error::missing_field("columns"));
        }
        let mut seen = std::collections::HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.as_str()) {
                return Err(Error::invalid_value(
                    "columns",
                    format!("duplicate column '{column}'"),
                ));
            }
        }
        Ok(())
    }
}
