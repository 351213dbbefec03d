//! Arrow schema inference and ResultSet to Arrow conversion
//!
//! Columns keep the result set's order. Each column's type is inferred from
//! all of its cells; columns with no non-null cell become nullable strings.

use crate::error::{Error, Result};
use crate::rows::ResultSet;
use crate::types::JsonValue;
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Infer an Arrow schema for a result set
pub fn infer_schema(result: &ResultSet) -> Schema {
    let fields: Vec<Field> = result
        .columns()
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let dtype = result
                .rows()
                .iter()
                .map(|row| infer_type(&row[index]))
                .fold(DataType::Null, |acc, t| merge_types(&acc, &t));
            let dtype = if dtype == DataType::Null {
                DataType::Utf8
            } else {
                dtype
            };
            Field::new(name, dtype, true) // All fields nullable
        })
        .collect();

    Schema::new(fields)
}

/// Convert a result set to Arrow RecordBatches of at most `batch_size` rows
///
/// An empty result set produces a single empty batch so the schema survives.
pub fn result_to_batches(result: &ResultSet, batch_size: usize) -> Result<Vec<RecordBatch>> {
    let schema = Arc::new(infer_schema(result));

    if result.is_empty() {
        return Ok(vec![RecordBatch::new_empty(schema)]);
    }

    result
        .rows()
        .chunks(batch_size.max(1))
        .map(|chunk| {
            let columns = schema
                .fields()
                .iter()
                .enumerate()
                .map(|(index, field)| {
                    let values: Vec<&JsonValue> = chunk.iter().map(|row| &row[index]).collect();
                    build_array(&values, field.data_type())
                })
                .collect();

            RecordBatch::try_new(Arc::clone(&schema), columns).map_err(|e| Error::Output {
                message: format!("Failed to create RecordBatch: {e}"),
            })
        })
        .collect()
}

/// Infer Arrow DataType from a JSON value
fn infer_type(value: &JsonValue) -> DataType {
    match value {
        JsonValue::Null => DataType::Null,
        JsonValue::Bool(_) => DataType::Boolean,
        JsonValue::Number(n) => {
            if n.is_i64() {
                DataType::Int64
            } else {
                DataType::Float64
            }
        }
        // Nested values are kept as their JSON text
        JsonValue::String(_) | JsonValue::Array(_) | JsonValue::Object(_) => DataType::Utf8,
    }
}

/// Merge two data types into a compatible type
fn merge_types(type1: &DataType, type2: &DataType) -> DataType {
    match (type1, type2) {
        (a, b) if a == b => a.clone(),

        // Null can merge with anything
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),

        // Numbers can merge (prefer Float64 for mixed)
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }

        // Different types -> fall back to String
        _ => DataType::Utf8,
    }
}

/// Build an Arrow array from one column's cells
fn build_array(values: &[&JsonValue], data_type: &DataType) -> ArrayRef {
    match data_type {
        DataType::Boolean => {
            let arr: BooleanArray = values.iter().map(|v| v.as_bool()).collect();
            Arc::new(arr)
        }

        DataType::Int64 => {
            let arr: Int64Array = values.iter().map(|v| v.as_i64()).collect();
            Arc::new(arr)
        }

        DataType::Float64 => {
            let arr: Float64Array = values.iter().map(|v| v.as_f64()).collect();
            Arc::new(arr)
        }

        _ => {
            let arr: StringArray = values
                .iter()
                .map(|v| match v {
                    JsonValue::Null => None,
                    JsonValue::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect();
            Arc::new(arr)
        }
    }
}
