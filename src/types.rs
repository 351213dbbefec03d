//! Common types used throughout civic-harvest
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// A single record: field name to scalar value, in provider order
pub type Record = JsonObject;

/// Query parameter mapping, kept sorted so request URLs are reproducible
pub type ParamMap = BTreeMap<String, String>;

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Offset Strategy
// ============================================================================

/// How the offset for the next page is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetStrategy {
    /// Offset is the number of unique rows accumulated so far.
    /// Tolerates providers that repeat rows across page boundaries.
    #[default]
    UniqueRows,
    /// Offset is the number of raw rows received so far, duplicates included
    RowsReceived,
}

// ============================================================================
// Utilities
// ============================================================================

/// Render a JSON scalar the way it should appear in a query string
pub fn param_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}
