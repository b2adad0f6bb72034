//! Tests for plan module

use super::*;
use crate::error::Error;
use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn logs() -> Frame {
    let schema = Arc::new(Schema::new(vec![
        Field::new("page", DataType::Utf8, true),
        Field::new("userId", DataType::Utf8, true),
        Field::new("sessionId", DataType::Int64, true),
        Field::new("ts", DataType::Int64, true),
        Field::new("artist", DataType::Utf8, true),
        Field::new("song", DataType::Utf8, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec!["NextSong"])),
            Arc::new(StringArray::from(vec!["8"])),
            Arc::new(Int64Array::from(vec![139])),
            Arc::new(Int64Array::from(vec![1_541_105_830_796])),
            Arc::new(StringArray::from(vec!["Des'ree"])),
            Arc::new(StringArray::from(vec!["You Gotta Be"])),
        ],
    )
    .unwrap();
    Frame::values(batch)
}

fn songs() -> Frame {
    let schema = Arc::new(Schema::new(vec![
        Field::new("song_id", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, true),
        Field::new("artist_name", DataType::Utf8, true),
    ]));
    Frame::values(RecordBatch::new_empty(schema))
}

fn names(frame: &Frame) -> Vec<String> {
    frame
        .schema()
        .unwrap()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

// ============================================================================
// Expression Tests
// ============================================================================

#[test]
fn test_expr_names() {
    assert_eq!(col("ts").name(), "ts");
    assert_eq!(hour("start_time").name(), "hour(start_time)");
    assert_eq!(hour("start_time").alias("hour").name(), "hour");
    assert_eq!(
        concat([col("sessionId"), col("ts")]).name(),
        "concat(sessionId, ts)"
    );
}

#[test]
fn test_expr_types() {
    let schema = logs().schema().unwrap();
    assert_eq!(
        from_epoch_millis("ts").data_type(&schema).unwrap(),
        TIMESTAMP
    );
    assert_eq!(
        dayofweek(from_epoch_millis("ts")).data_type(&schema).unwrap(),
        DataType::Int32
    );
    assert_eq!(
        date_format(from_epoch_millis("ts"), "%Y-%m-%d %H:%M:%S")
            .data_type(&schema)
            .unwrap(),
        DataType::Utf8
    );
    assert_eq!(
        col("page")
            .equals(lit("NextSong"))
            .data_type(&schema)
            .unwrap(),
        DataType::Boolean
    );
}

#[test]
fn test_expr_type_errors() {
    let schema = logs().schema().unwrap();
    assert!(hour("ts").data_type(&schema).is_err());
    assert!(from_epoch_millis("page").data_type(&schema).is_err());
    assert!(col("page").equals(lit(1_i64)).data_type(&schema).is_err());
    assert!(col("page").and(col("song")).data_type(&schema).is_err());
}

// ============================================================================
// Schema Resolution Tests
// ============================================================================

#[test]
fn test_select_and_rename() {
    let frame = logs()
        .select([col("userId").alias("user_id"), col("ts")])
        .with_column_renamed("ts", "start_ms");
    assert_eq!(names(&frame), ["user_id", "start_ms"]);
}

#[test]
fn test_with_column_appends_and_replaces() {
    let frame = logs()
        .with_column("start_time", from_epoch_millis("ts"))
        .with_column("ts", lit("replaced"));
    let schema = frame.schema().unwrap();
    assert_eq!(schema.fields().len(), 7);
    assert_eq!(schema.field_with_name("ts").unwrap().data_type(), &DataType::Utf8);
    assert_eq!(
        schema.field_with_name("start_time").unwrap().data_type(),
        &TIMESTAMP
    );
}

#[test]
fn test_unknown_column_error() {
    let err = logs().select(["user_id"]).schema().unwrap_err();
    assert!(matches!(err, Error::ColumnNotFound { ref column, .. } if column == "user_id"));
}

#[test]
fn test_filter_requires_boolean() {
    assert!(logs().filter(col("page")).schema().is_err());
    assert!(logs()
        .filter(col("page").equals(lit("NextSong")))
        .schema()
        .is_ok());
}

#[test]
fn test_duplicate_projection_rejected() {
    assert!(logs().select(["ts", "ts"]).schema().is_err());
}

#[test]
fn test_left_join_schema_makes_right_nullable() {
    let joined = logs().join(
        &songs(),
        &[("artist", "artist_name"), ("song", "title")],
        JoinType::Left,
    );
    let schema = joined.schema().unwrap();
    assert_eq!(schema.fields().len(), 9);
    assert!(schema.field_with_name("song_id").unwrap().is_nullable());
}

#[test]
fn test_inner_join_keeps_nullability() {
    let joined = logs().join(&songs(), &[("song", "title")], JoinType::Inner);
    let schema = joined.schema().unwrap();
    assert!(!schema.field_with_name("song_id").unwrap().is_nullable());
}

#[test]
fn test_join_rejects_ambiguous_columns() {
    let err = logs()
        .join(&logs(), &[("song", "song")], JoinType::Left)
        .schema()
        .unwrap_err();
    assert!(matches!(err, Error::AmbiguousColumn { .. }));
}

#[test]
fn test_join_rejects_key_type_mismatch() {
    let err = logs()
        .join(&songs(), &[("sessionId", "title")], JoinType::Left)
        .schema()
        .unwrap_err();
    assert!(err.to_string().contains("type mismatch"));
}

#[test]
fn test_sort_unknown_column() {
    assert!(logs()
        .order_by(vec![SortKey::asc("user_id")])
        .schema()
        .is_err());
}

// ============================================================================
// Explain Tests
// ============================================================================

#[test]
fn test_explain_tree() {
    let frame = logs()
        .filter(col("page").equals(lit("NextSong")))
        .select(["userId"])
        .distinct()
        .order_by(vec![SortKey::asc("userId")]);
    assert_eq!(
        frame.explain(),
        "Sort: userId ASC\n  Distinct\n    Project: userId\n      Filter: (page = 'NextSong')\n        Values: 1 rows\n"
    );
}

#[test]
fn test_explain_join_shows_both_inputs() {
    let frame = logs().join(&songs(), &[("song", "title")], JoinType::Left);
    let explained = frame.explain();
    assert!(explained.starts_with("Join(left): song = title\n"));
    assert_eq!(explained.matches("Values").count(), 2);
}
