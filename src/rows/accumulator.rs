//! Deduplicating accumulation of projected pages

use crate::error::{Error, Result};
use crate::types::{JsonValue, Record};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::collections::HashSet;

/// Separator between cell encodings in a row key.
/// JSON escapes control characters, so it never appears inside a cell.
const CELL_SEPARATOR: char = '\u{1f}';

// ============================================================================
// Result Set
// ============================================================================

/// Ordered rows over a fixed column list, with no two rows equal
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<JsonValue>>,
    seen: HashSet<String>,
}

impl ResultSet {
    /// Create an empty result set with a fixed schema
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Column names, in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows as cell vectors aligned with [`columns`](Self::columns)
    pub fn rows(&self) -> &[Vec<JsonValue>] {
        &self.rows
    }

    /// Number of unique rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the set holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows as column-to-value records
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.rows.iter().map(|row| {
            self.columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect()
        })
    }

    /// Whether a row with exactly these cells is present
    pub fn contains_row(&self, row: &[JsonValue]) -> bool {
        self.seen.contains(&row_key(row))
    }

    /// Position of a column, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Split into columns and rows
    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<JsonValue>>) {
        (self.columns, self.rows)
    }

    /// Insert a row unless an identical one exists. Returns whether it was new.
    pub(crate) fn insert(&mut self, row: Vec<JsonValue>) -> bool {
        if self.seen.insert(row_key(&row)) {
            self.rows.push(row);
            true
        } else {
            false
        }
    }
}

impl Serialize for ResultSet {
    /// Serializes as an array of records, the JSON "records" orientation
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for record in self.records() {
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}

fn row_key(row: &[JsonValue]) -> String {
    let mut key = String::new();
    for cell in row {
        push_canonical(&mut key, cell);
        key.push(CELL_SEPARATOR);
    }
    key
}

/// Append a rendering of `value` on which equal values agree
///
/// `Display` keeps object insertion order and the sign of `-0.0`, while
/// `Value` equality ignores both.
fn push_canonical(key: &mut String, value: &JsonValue) {
    match value {
        JsonValue::Number(n) if n.is_f64() && n.as_f64() == Some(0.0) => key.push_str("0.0"),
        JsonValue::Array(items) => {
            key.push('[');
            for item in items {
                push_canonical(key, item);
                key.push(',');
            }
            key.push(']');
        }
        JsonValue::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            key.push('{');
            for (name, item) in entries {
                key.push_str(&format!("{name:?}:"));
                push_canonical(key, item);
                key.push(',');
            }
            key.push('}');
        }
        scalar => key.push_str(&scalar.to_string()),
    }
}

// ============================================================================
// Accumulator
// ============================================================================

/// Size of the result set around one merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Rows in the page
    pub received: usize,
    /// Result size before the merge
    pub before: usize,
    /// Result size after the merge
    pub after: usize,
}

impl MergeOutcome {
    /// Whether the merge added at least one row
    pub fn grew(&self) -> bool {
        self.after > self.before
    }

    /// Rows added by the merge
    pub fn added(&self) -> usize {
        self.after - self.before
    }

    /// Rows in the page that were already present
    pub fn duplicates(&self) -> usize {
        self.received - self.added()
    }
}

/// Merges projected pages into a result set
///
/// The first record merged fixes the schema. Every later record is projected
/// onto that schema; a missing column rejects the whole page.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    result: Option<ResultSet>,
}

impl Accumulator {
    /// Create an empty accumulator with no schema yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Current number of unique rows
    pub fn len(&self) -> usize {
        self.result.as_ref().map_or(0, ResultSet::len)
    }

    /// Whether no rows have been accumulated
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The fixed schema, once a record has been merged
    pub fn columns(&self) -> Option<&[String]> {
        self.result.as_ref().map(ResultSet::columns)
    }

    /// Merge one page. The page is applied entirely or not at all.
    pub fn merge(&mut self, page: Vec<Record>) -> Result<MergeOutcome> {
        let before = self.len();
        let received = page.len();

        let Some(first) = page.first() else {
            return Ok(MergeOutcome {
                received,
                before,
                after: before,
            });
        };

        let columns = match &self.result {
            Some(result) => result.columns.clone(),
            None => first.keys().cloned().collect::<Vec<_>>(),
        };

        let rows = page
            .into_iter()
            .enumerate()
            .map(|(row, mut record)| {
                columns
                    .iter()
                    .map(|column| {
                        record
                            .remove(column)
                            .ok_or_else(|| Error::schema(column, row))
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let result = self.result.get_or_insert_with(|| ResultSet::new(columns));
        for row in rows {
            result.insert(row);
        }

        Ok(MergeOutcome {
            received,
            before,
            after: result.len(),
        })
    }

    /// Borrow the result set, if any record has been merged
    pub fn result(&self) -> Option<&ResultSet> {
        self.result.as_ref()
    }

    /// Consume the accumulator, yielding the result set if any record was merged
    pub fn into_result(self) -> Option<ResultSet> {
        self.result
    }
}
