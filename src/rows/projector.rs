//! Column projection

use crate::error::{Error, Result};
use crate::types::Record;

/// Restricts records to a fixed, ordered set of columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnProjector {
    columns: Vec<String>,
}

impl ColumnProjector {
    /// Create a projector for the given columns
    pub fn new(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// The columns this projector keeps, in output order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Project every record, preserving row order
    ///
    /// A column absent from any record is a schema error; nothing is filled in.
    pub fn project(&self, records: Vec<Record>) -> Result<Vec<Record>> {
        records
            .into_iter()
            .enumerate()
            .map(|(row, record)| self.project_one(record, row))
            .collect()
    }

    fn project_one(&self, mut record: Record, row: usize) -> Result<Record> {
        let mut projected = Record::new();
        for column in &self.columns {
            let value = record
                .remove(column)
                .ok_or_else(|| Error::schema(column, row))?;
            projected.insert(column.clone(), value);
        }
        Ok(projected)
    }
}
