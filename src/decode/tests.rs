//! Tests for decoder module

use super::*;
use crate::schema::{activity_schema, catalog_schema};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema};
use std::sync::Arc;

fn rows(batches: &[arrow::record_batch::RecordBatch]) -> usize {
    batches.iter().map(|b| b.num_rows()).sum()
}

#[test]
fn test_decode_single_catalog_object() {
    let body = br#"{"num_songs": 1, "artist_id": "ARD7TVE1187B99BFB1", "artist_latitude": null, "artist_longitude": null, "artist_location": "California - LA", "artist_name": "Casual", "song_id": "SOMZWCG12A8C13C480", "title": "I Didn't Mean To", "duration": 218.93179, "year": 0}"#;

    let decoder = JsonRecordDecoder::new(catalog_schema());
    let batches = decoder.decode("song.json", body).unwrap();
    assert_eq!(rows(&batches), 1);

    let batch = &batches[0];
    let title = batch.column_by_name("title").unwrap().as_string::<i32>();
    assert_eq!(title.value(0), "I Didn't Mean To");
    let latitude = batch
        .column_by_name("artist_latitude")
        .unwrap()
        .as_primitive::<Float64Type>();
    assert!(latitude.is_null(0));
    let year = batch
        .column_by_name("year")
        .unwrap()
        .as_primitive::<Int64Type>();
    assert_eq!(year.value(0), 0);
}

#[test]
fn test_decode_pretty_printed_object() {
    let body = b"{\n  \"song_id\": \"S1\",\n  \"title\": \"T\"\n}\n";
    let batches = JsonRecordDecoder::new(catalog_schema())
        .decode("pretty.json", body)
        .unwrap();
    assert_eq!(rows(&batches), 1);
}

#[test]
fn test_decode_ndjson_log_lines() {
    let body = br#"{"artist":null,"auth":"Logged In","firstName":"Walter","gender":"M","itemInSession":0,"lastName":"Frye","length":null,"level":"free","location":"San Francisco-Oakland-Hayward, CA","method":"GET","page":"Home","registration":1540919166796.0,"sessionId":38,"song":null,"status":200,"ts":1541105830796,"userAgent":"Mozilla/5.0","userId":"39"}
{"artist":"Des'ree","auth":"Logged In","firstName":"Kaylee","gender":"F","itemInSession":1,"lastName":"Summers","length":246.30812,"level":"free","location":"Phoenix-Mesa-Scottsdale, AZ","method":"PUT","page":"NextSong","registration":1540344794796.0,"sessionId":139,"song":"You Gotta Be","status":200,"ts":1541106106796,"userAgent":"Mozilla/5.0","userId":"8"}
"#;

    let batches = JsonRecordDecoder::new(activity_schema())
        .decode("events.json", body)
        .unwrap();
    assert_eq!(rows(&batches), 2);

    let batch = &batches[0];
    let page = batch.column_by_name("page").unwrap().as_string::<i32>();
    assert_eq!(page.value(1), "NextSong");
    let ts = batch
        .column_by_name("ts")
        .unwrap()
        .as_primitive::<Int64Type>();
    assert_eq!(ts.value(0), 1_541_105_830_796);
}

#[test]
fn test_decode_coerces_numbers_into_text_columns() {
    let body = br#"{"userId": 8, "page": "NextSong"}"#;
    let batches = JsonRecordDecoder::new(activity_schema())
        .decode("events.json", body)
        .unwrap();
    let user = batches[0]
        .column_by_name("userId")
        .unwrap()
        .as_string::<i32>();
    assert_eq!(user.value(0), "8");
}

#[test]
fn test_decode_top_level_array() {
    let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, true)]));
    let batches = JsonRecordDecoder::new(schema)
        .decode("array.json", br#"[{"id": 1}, {"id": 2}, {"id": 3}]"#)
        .unwrap();
    assert_eq!(rows(&batches), 3);
}

#[test]
fn test_decode_respects_batch_size() {
    let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, true)]));
    let body = (0..5)
        .map(|i| format!("{{\"id\": {i}}}"))
        .collect::<Vec<_>>()
        .join("\n");
    let batches = JsonRecordDecoder::new(schema)
        .with_batch_size(2)
        .decode("ids.json", body.as_bytes())
        .unwrap();
    assert_eq!(batches.len(), 3);
    assert_eq!(rows(&batches), 5);
}

#[test]
fn test_decode_empty_file() {
    let batches = JsonRecordDecoder::new(catalog_schema())
        .decode("empty.json", b"  \n")
        .unwrap();
    assert!(batches.is_empty());
}

#[test]
fn test_decode_malformed_fails() {
    let err = JsonRecordDecoder::new(catalog_schema())
        .decode("broken.json", br#"{"song_id": "S1""#)
        .unwrap_err();
    assert!(err.to_string().contains("broken.json"));
}

#[test]
fn test_decode_scalar_fails() {
    assert!(JsonRecordDecoder::new(catalog_schema())
        .decode("scalar.json", b"42")
        .is_err());
}
