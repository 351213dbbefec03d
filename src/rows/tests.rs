//! Tests for rows module

use super::*;
use crate::error::Error;
use crate::types::Record;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn records(value: Value) -> Vec<Record> {
    serde_json::from_value(value).unwrap()
}

fn row(id: &str, kind: &str) -> Value {
    json!({"id": id, "type": kind})
}

// ============================================================================
// ColumnProjector Tests
// ============================================================================

#[test]
fn test_projection_keeps_requested_columns_in_order() {
    let projector = ColumnProjector::new(["requesttype", "srnumber"]);
    let page = records(json!([
        {"srnumber": "1", "status": "Closed", "requesttype": "Graffiti Removal"},
        {"srnumber": "2", "status": "Open", "requesttype": "Dead Animal Removal"}
    ]));

    let projected = projector.project(page).unwrap();

    assert_eq!(projected.len(), 2);
    let keys: Vec<_> = projected[0].keys().cloned().collect();
    assert_eq!(keys, vec!["requesttype", "srnumber"]);
    assert_eq!(projected[1]["srnumber"], "2");
    assert!(projected[1].get("status").is_none());
}

#[test]
fn test_projection_is_idempotent() {
    let projector = ColumnProjector::new(["id", "latitude", "longitude"]);
    let page = records(json!([
        {"id": 1, "latitude": "41.8", "longitude": "-87.6", "extra": true},
        {"id": 2, "latitude": null, "longitude": null, "extra": false}
    ]));

    let once = projector.project(page).unwrap();
    let twice = projector.project(once.clone()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_projection_missing_column_is_schema_error() {
    let projector = ColumnProjector::new(["id", "latitude"]);
    let page = records(json!([{"id": 1, "latitude": 1.0}, {"id": 2}]));

    let err = projector.project(page).unwrap_err();
    match err {
        Error::Schema { column, row } => {
            assert_eq!(column, "latitude");
            assert_eq!(row, 1);
        }
        other => panic!("Expected schema error, got {other}"),
    }
}

#[test]
fn test_projection_keeps_explicit_nulls() {
    let projector = ColumnProjector::new(["id", "latitude"]);
    let projected = projector
        .project(records(json!([{"id": 1, "latitude": null}])))
        .unwrap();
    assert_eq!(projected[0]["latitude"], Value::Null);
}

#[test]
fn test_projection_of_empty_page() {
    let projector = ColumnProjector::new(["id"]);
    assert!(projector.project(Vec::new()).unwrap().is_empty());
    assert_eq!(projector.columns(), ["id".to_string()]);
}

// ============================================================================
// Accumulator Tests
// ============================================================================

#[test]
fn test_first_page_fixes_schema() {
    let mut acc = Accumulator::new();
    assert!(acc.columns().is_none());

    acc.merge(records(json!([row("A", "graffiti")]))).unwrap();
    assert_eq!(
        acc.columns().unwrap(),
        ["id".to_string(), "type".to_string()]
    );
}

#[test]
fn test_merge_deduplicates_full_rows() {
    let mut acc = Accumulator::new();

    let first = acc
        .merge(records(json!([row("A", "x"), row("B", "x")])))
        .unwrap();
    assert_eq!(first.before, 0);
    assert_eq!(first.after, 2);
    assert!(first.grew());

    let second = acc
        .merge(records(json!([row("B", "x"), row("C", "x")])))
        .unwrap();
    assert_eq!(second.before, 2);
    assert_eq!(second.after, 3);
    assert_eq!(second.added(), 1);
    assert_eq!(second.duplicates(), 1);

    let result = acc.into_result().unwrap();
    let ids: Vec<_> = result.records().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!("A"), json!("B"), json!("C")]);
}

#[test]
fn test_dedup_matches_union_of_distinct_rows() {
    let page1 = json!([row("A", "x"), row("B", "x"), row("B", "x")]);
    let page2 = json!([row("B", "x"), row("C", "y")]);

    let mut merged = Accumulator::new();
    merged.merge(records(page1)).unwrap();
    merged.merge(records(page2)).unwrap();

    let mut union = Accumulator::new();
    union
        .merge(records(json!([row("A", "x"), row("B", "x"), row("C", "y")])))
        .unwrap();

    assert_eq!(merged.len(), union.len());
    assert_eq!(merged.len(), 3);
}

#[test]
fn test_partial_key_match_is_not_a_duplicate() {
    let mut acc = Accumulator::new();
    acc.merge(records(json!([row("A", "x")]))).unwrap();
    let outcome = acc.merge(records(json!([row("A", "y")]))).unwrap();
    assert!(outcome.grew());
    assert_eq!(acc.len(), 2);
}

#[test]
fn test_value_types_matter_for_equality() {
    let mut acc = Accumulator::new();
    acc.merge(records(json!([{"id": 1}]))).unwrap();
    acc.merge(records(json!([{"id": "1"}]))).unwrap();
    assert_eq!(acc.len(), 2);
}

#[test]
fn test_object_cells_equal_regardless_of_key_order() {
    let mut acc = Accumulator::new();
    acc.merge(records(json!([
        {"id": 1, "location": {"latitude": "41.8", "longitude": "-87.6"}}
    ])))
    .unwrap();
    let outcome = acc
        .merge(records(json!([
            {"id": 1, "location": {"longitude": "-87.6", "latitude": "41.8"}}
        ])))
        .unwrap();

    assert!(!outcome.grew());
    assert_eq!(acc.len(), 1);
}

#[test]
fn test_signed_zero_cells_are_duplicates() {
    let mut acc = Accumulator::new();
    acc.merge(records(json!([{"id": 1, "x": 0.0}]))).unwrap();
    let outcome = acc.merge(records(json!([{"id": 1, "x": -0.0}]))).unwrap();

    assert_eq!(outcome.duplicates(), 1);
    assert_eq!(acc.len(), 1);

    // Integer zero and the string "0.0" are different values
    acc.merge(records(json!([{"id": 1, "x": 0}, {"id": 1, "x": "0.0"}])))
        .unwrap();
    assert_eq!(acc.len(), 3);
}

#[test]
fn test_stagnant_page_does_not_grow() {
    let mut acc = Accumulator::new();
    acc.merge(records(json!([row("A", "x"), row("B", "x")])))
        .unwrap();
    let outcome = acc
        .merge(records(json!([row("B", "x"), row("A", "x")])))
        .unwrap();
    assert!(!outcome.grew());
    assert_eq!(outcome.duplicates(), 2);
}

#[test]
fn test_empty_page_merge_is_a_no_op() {
    let mut acc = Accumulator::new();
    let outcome = acc.merge(Vec::new()).unwrap();
    assert_eq!(outcome.before, 0);
    assert_eq!(outcome.after, 0);
    assert!(acc.into_result().is_none());
}

#[test]
fn test_later_page_missing_column_is_rejected_whole() {
    let mut acc = Accumulator::new();
    acc.merge(records(json!([row("A", "x")]))).unwrap();

    let err = acc
        .merge(records(json!([row("B", "x"), {"id": "C"}])))
        .unwrap_err();
    assert!(matches!(err, Error::Schema { ref column, row: 1 } if column == "type"));

    // Nothing from the rejected page was merged
    assert_eq!(acc.len(), 1);
}

#[test]
fn test_later_page_extra_columns_are_dropped() {
    let mut acc = Accumulator::new();
    acc.merge(records(json!([row("A", "x")]))).unwrap();
    acc.merge(records(json!([{"type": "y", "id": "B", "extra": 1}])))
        .unwrap();

    let result = acc.result().unwrap();
    assert_eq!(result.columns(), ["id".to_string(), "type".to_string()]);
    assert_eq!(result.rows()[1], vec![json!("B"), json!("y")]);
}

#[test]
fn test_failed_first_page_fixes_no_schema() {
    let mut acc = Accumulator::new();
    let err = acc.merge(records(json!([row("A", "x"), {"id": "B"}])));
    assert!(err.is_err());
    assert!(acc.columns().is_none());
}

// ============================================================================
// ResultSet Tests
// ============================================================================

#[test]
fn test_result_set_serializes_as_records() {
    let mut acc = Accumulator::new();
    acc.merge(records(json!([row("A", "x"), row("B", "y")])))
        .unwrap();
    let result = acc.into_result().unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json, json!([row("A", "x"), row("B", "y")]));
}

#[test]
fn test_result_set_contains_row() {
    let mut acc = Accumulator::new();
    acc.merge(records(json!([row("A", "x")]))).unwrap();
    let result = acc.into_result().unwrap();

    assert!(result.contains_row(&[json!("A"), json!("x")]));
    assert!(!result.contains_row(&[json!("A"), json!("y")]));
    assert!(!result.is_empty());
}

#[test]
fn test_new_result_set_is_empty() {
    let result = ResultSet::new(vec!["id".to_string()]);
    assert!(result.is_empty());
    assert_eq!(result.len(), 0);
    assert_eq!(serde_json::to_value(&result).unwrap(), json!([]));
}
