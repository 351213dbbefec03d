//! Post-harvest row transforms
//!
//! Two cleanups applied to a drained `ResultSet` before it is written:
//! keeping only rows whose text column mentions a relevant term, and converting
//! degrees-minutes-seconds coordinates (`"39 57:29.5"`) to decimal degrees.

use crate::error::{Error, Result};
use crate::rows::ResultSet;
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};

/// Decimal places kept after DMS conversion
const DECIMAL_PLACES: i32 = 5;

/// Transforms configured on a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransformDefinition {
    /// Keep only rows whose column mentions one of the terms
    #[serde(default)]
    pub relevant: Option<RelevantFilter>,
    /// Columns holding DMS coordinates to convert
    #[serde(default)]
    pub dms: Vec<DmsColumn>,
}

/// Case-insensitive substring filter on one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevantFilter {
    /// Column to search
    pub column: String,
    /// Terms, any of which makes a row relevant
    pub terms: Vec<String>,
}

/// One DMS coordinate column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmsColumn {
    /// Column to convert
    pub column: String,
    /// Flip the sign after conversion (western longitudes stored unsigned)
    #[serde(default)]
    pub negate: bool,
}

impl TransformDefinition {
    /// Whether no transform is configured
    pub fn is_empty(&self) -> bool {
        self.relevant.is_none() && self.dms.is_empty()
    }

    /// Column names this definition reads
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.relevant
            .iter()
            .map(|r| r.column.as_str())
            .chain(self.dms.iter().map(|d| d.column.as_str()))
    }

    /// Apply the filter, then the conversions
    ///
    /// Rows that become identical after conversion collapse into one.
    pub fn apply(&self, result: ResultSet) -> Result<ResultSet> {
        if self.is_empty() {
            return Ok(result);
        }

        let filter = match &self.relevant {
            Some(filter) => Some((
                column_index(&result, &filter.column)?,
                lowercase_terms(&filter.terms),
            )),
            None => None,
        };
        let conversions = self
            .dms
            .iter()
            .map(|d| Ok((column_index(&result, &d.column)?, d.negate)))
            .collect::<Result<Vec<_>>>()?;

        let (columns, rows) = result.into_parts();
        let mut out = ResultSet::new(columns);
        for (row_index, mut row) in rows.into_iter().enumerate() {
            if let Some((index, terms)) = &filter {
                if !is_relevant(&row[*index], terms) {
                    continue;
                }
            }
            for (index, negate) in &conversions {
                row[*index] = convert_cell(&row[*index], *negate).map_err(|reason| {
                    Error::transform(format!(
                        "row {row_index}, column '{}': {reason}",
                        out.columns()[*index]
                    ))
                })?;
            }
            out.insert(row);
        }

        Ok(out)
    }
}

/// Convert `"deg min:sec"` to decimal degrees, rounded to five places
pub fn to_decimal(dms: &str) -> Result<f64> {
    parse_dms(dms).ok_or_else(|| Error::transform(not_dms(dms)))
}

fn parse_dms(dms: &str) -> Option<f64> {
    let mut parts = dms.split_whitespace();
    let (Some(degrees), Some(rest), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    let (minutes, seconds) = rest.split_once(':')?;

    let parse = |s: &str| s.parse::<f64>().ok();
    let value = parse(degrees)? + parse(minutes)? / 60.0 + parse(seconds)? / 3600.0;

    let scale = 10f64.powi(DECIMAL_PLACES);
    Some((value * scale).round() / scale)
}

fn not_dms(text: &str) -> String {
    format!("'{text}' is not 'deg min:sec'")
}

/// Whether a cell's text contains any of the (lowercase) terms, ignoring case
pub fn is_relevant(value: &JsonValue, terms: &[String]) -> bool {
    let text = match value {
        JsonValue::String(s) => s.to_lowercase(),
        JsonValue::Null => return false,
        other => other.to_string().to_lowercase(),
    };
    terms.iter().any(|term| text.contains(term.as_str()))
}

fn lowercase_terms(terms: &[String]) -> Vec<String> {
    terms.iter().map(|t| t.to_lowercase()).collect()
}

fn column_index(result: &ResultSet, column: &str) -> Result<usize> {
    result.column_index(column).ok_or_else(|| {
        Error::invalid_value(
            "transform",
            format!("column '{column}' is not among the harvested columns"),
        )
    })
}

fn convert_cell(value: &JsonValue, negate: bool) -> std::result::Result<JsonValue, String> {
    let decimal = match value {
        JsonValue::String(s) => parse_dms(s).ok_or_else(|| not_dms(s))?,
        JsonValue::Number(n) => n.as_f64().unwrap_or_default(),
        JsonValue::Null => return Ok(JsonValue::Null),
        other => return Err(format!("unexpected value {other}")),
    };
    let signed = if negate { -decimal } else { decimal };
    Ok(JsonValue::from(signed))
}
