//! Tests for pipeline module

use super::*;
use crate::error::Error;
use crate::types::TimestampMode;
use arrow::array::{Array, AsArray};
use arrow::datatypes::{Int32Type, TimestampMicrosecondType};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use chrono::{DateTime, Datelike, Timelike};
use object_store::memory::InMemory;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_case::test_case;

const DESREE: &str = r#"{"num_songs": 1, "artist_id": "ARMJAGH1187FB546F3", "artist_latitude": 35.14968, "artist_longitude": -90.04892, "artist_location": "Memphis, TN", "artist_name": "Des'ree", "song_id": "SOINLJW12A8C13314C", "title": "You Gotta Be", "duration": 246.30812, "year": 1994}"#;

const INTRO: &str = r#"{"num_songs": 1, "artist_id": "ARNTLGG11E2835DDB9", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "Clp", "song_id": "SOUDSGM12AC9618304", "title": "Insatiable (Instrumental Version)", "duration": 266.39628, "year": 0}"#;

const EVENTS: &str = r#"{"artist":"Des'ree","auth":"Logged In","firstName":"Kaylee","gender":"F","itemInSession":1,"lastName":"Summers","length":246.30812,"level":"free","location":"Phoenix-Mesa-Scottsdale, AZ","method":"PUT","page":"NextSong","registration":1540344794796.0,"sessionId":139,"song":"You Gotta Be","status":200,"ts":1541105830796,"userAgent":"Mozilla/5.0","userId":"8"}
{"artist":null,"auth":"Logged In","firstName":"Kaylee","gender":"F","itemInSession":2,"lastName":"Summers","length":null,"level":"free","location":"Phoenix-Mesa-Scottsdale, AZ","method":"GET","page":"Home","registration":1540344794796.0,"sessionId":139,"song":null,"status":200,"ts":1541106000796,"userAgent":"Mozilla/5.0","userId":"8"}
{"artist":"Mr Oizo","auth":"Logged In","firstName":"Kaylee","gender":"F","itemInSession":3,"lastName":"Summers","length":144.03873,"level":"free","location":"Phoenix-Mesa-Scottsdale, AZ","method":"PUT","page":"NextSong","registration":1540344794796.0,"sessionId":139,"song":"Flat 55","status":200,"ts":1541106106796,"userAgent":"Mozilla/5.0","userId":"8"}
{"artist":"Des'ree","auth":"Logged In","firstName":"Sylvie","gender":"F","itemInSession":0,"lastName":"Cruz","length":246.30812,"level":"paid","location":"Washington-Arlington-Alexandria, DC-VA-MD-WV","method":"PUT","page":"NextSong","registration":1540266185796.0,"sessionId":9,"song":"You Gotta Be","status":200,"ts":1541106352796,"userAgent":"Mozilla/5.0","userId":"10"}
"#;

// ============================================================================
// Fixtures
// ============================================================================

async fn input() -> Location {
    let location = Location::from_store(Arc::new(InMemory::new()), "memory", "udacity-dend");
    for (key, body) in [
        ("song_data/A/A/A/TRAAAAW128F429D538.json", DESREE),
        // Exact duplicate of the record above
        ("song_data/A/A/B/TRAABJL12903CDCF1A.json", DESREE),
        ("song_data/A/B/C/TRABCEI128F424C983.json", INTRO),
        ("log-data/2018/11/2018-11-01-events.json", EVENTS),
        ("log-data/2018/11/notes.txt", "ignored"),
    ] {
        location.put(key, Bytes::from(body)).await.unwrap();
    }
    location
}

fn output() -> Location {
    Location::from_store(Arc::new(InMemory::new()), "memory", "lake")
}

async fn pipeline(mode: TimestampMode) -> Pipeline {
    let mut config = PipelineConfig::new("memory://udacity-dend", "memory://lake");
    config.timestamp_mode = mode;
    Pipeline::with_locations(config, input().await, output())
}

async fn table(pipeline: &Pipeline, table: OutputTable) -> RecordBatch {
    let session = Session::memory();
    let (_, frame) = pipeline
        .graphs(&session)
        .into_iter()
        .find(|(t, _)| *t == table)
        .unwrap();
    session.collect(&frame).await.unwrap()
}

fn strings(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    batch
        .column_by_name(name)
        .unwrap()
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

fn ints(batch: &RecordBatch, name: &str) -> Vec<Option<i32>> {
    batch
        .column_by_name(name)
        .unwrap()
        .as_primitive::<Int32Type>()
        .iter()
        .collect()
}

fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

// ============================================================================
// Stage Tests
// ============================================================================

#[tokio::test]
async fn test_songs_deduplicated() {
    let pipeline = pipeline(TimestampMode::default()).await;
    let songs = table(&pipeline, OutputTable::Songs).await;

    assert_eq!(songs.num_rows(), 2);
    assert_eq!(column_names(&songs), OutputTable::Songs.columns());
    assert_eq!(
        strings(&songs, "song_id"),
        vec![
            Some("SOINLJW12A8C13314C".to_string()),
            Some("SOUDSGM12AC9618304".to_string())
        ]
    );
}

#[tokio::test]
async fn test_artists_renamed_and_deduplicated() {
    let pipeline = pipeline(TimestampMode::default()).await;
    let artists = table(&pipeline, OutputTable::Artists).await;

    assert_eq!(artists.num_rows(), 2);
    assert_eq!(column_names(&artists), OutputTable::Artists.columns());
    assert_eq!(
        strings(&artists, "name"),
        vec![Some("Des'ree".to_string()), Some("Clp".to_string())]
    );
    assert!(artists.column_by_name("latitude").unwrap().is_null(1));
}

#[tokio::test]
async fn test_users_from_song_plays_only() {
    let pipeline = pipeline(TimestampMode::default()).await;
    let users = table(&pipeline, OutputTable::Users).await;

    // User 8 appears in three events (one not a song play) with identical
    // attributes, so collapses to a single row; ids sort as text
    assert_eq!(column_names(&users), OutputTable::Users.columns());
    assert_eq!(
        strings(&users, "user_id"),
        vec![Some("10".to_string()), Some("8".to_string())]
    );
    assert_eq!(
        strings(&users, "level"),
        vec![Some("paid".to_string()), Some("free".to_string())]
    );
}

#[tokio::test]
async fn test_time_table_fields_match_timestamp() {
    let pipeline = pipeline(TimestampMode::default()).await;
    let time = table(&pipeline, OutputTable::Time).await;

    assert_eq!(column_names(&time), OutputTable::Time.columns());
    assert!(time.column_by_name("start_time").is_none());
    // The Home event is excluded
    assert_eq!(time.num_rows(), 3);

    let start = time
        .column_by_name(EVENT_TIME)
        .unwrap()
        .as_primitive::<TimestampMicrosecondType>();
    let (hours, days, months, years, weekdays) = (
        ints(&time, "hour"),
        ints(&time, "day"),
        ints(&time, "month"),
        ints(&time, "year"),
        ints(&time, "weekday"),
    );
    for row in 0..time.num_rows() {
        let dt = DateTime::from_timestamp_micros(start.value(row))
            .unwrap()
            .naive_utc();
        assert_eq!(hours[row], Some(dt.hour() as i32));
        assert_eq!(days[row], Some(dt.day() as i32));
        assert_eq!(months[row], Some(dt.month() as i32));
        assert_eq!(years[row], Some(dt.year()));
        assert_eq!(
            weekdays[row],
            Some(dt.weekday().number_from_sunday() as i32)
        );
        assert_eq!(start.value(row) % 1_000_000, 0);
    }
}

#[test_case(TimestampMode::FormatRoundtrip ; "format roundtrip")]
#[test_case(TimestampMode::Truncate ; "truncate")]
#[tokio::test]
async fn test_songplays_left_join(mode: TimestampMode) {
    let pipeline = pipeline(mode).await;
    let plays = table(&pipeline, OutputTable::Songplays).await;

    assert_eq!(column_names(&plays), OutputTable::Songplays.columns());
    assert_eq!(plays.num_rows(), 3);
    assert_eq!(
        strings(&plays, "songplay_id"),
        vec![
            Some("1391541105830796".to_string()),
            Some("1391541106106796".to_string()),
            Some("91541106352796".to_string()),
        ]
    );
    // The Mr Oizo play has no catalog match
    assert_eq!(
        strings(&plays, "song_id"),
        vec![
            Some("SOINLJW12A8C13314C".to_string()),
            None,
            Some("SOINLJW12A8C13314C".to_string()),
        ]
    );
    assert!(plays.column_by_name("artist_id").unwrap().is_null(1));
    assert_eq!(ints(&plays, "year"), vec![Some(2018); 3]);
    assert_eq!(ints(&plays, "month"), vec![Some(11); 3]);
}

#[tokio::test]
async fn test_timestamp_modes_agree() {
    let roundtrip = table(
        &pipeline(TimestampMode::FormatRoundtrip).await,
        OutputTable::Time,
    )
    .await;
    let truncate = table(&pipeline(TimestampMode::Truncate).await, OutputTable::Time).await;
    assert_eq!(roundtrip, truncate);
}

#[tokio::test]
async fn test_graphs_in_write_order() {
    let pipeline = pipeline(TimestampMode::default()).await;
    let graphs = pipeline.graphs(&Session::memory());

    let order: Vec<OutputTable> = graphs.iter().map(|(t, _)| *t).collect();
    assert_eq!(order, OutputTable::ALL.to_vec());

    let (_, songplays) = &graphs[4];
    let explain = songplays.explain();
    assert!(explain.contains("Join(left): artist = artist_name AND song = title"));
    assert!(explain.contains("Filter: (page = 'NextSong')"));
}

// ============================================================================
// Run Tests
// ============================================================================

#[tokio::test]
async fn test_run_writes_all_tables() {
    let pipeline = pipeline(TimestampMode::default()).await;
    let summary = pipeline.run(&Session::memory()).await.unwrap();

    assert_eq!(summary.engine, "memory");
    let rows: Vec<(OutputTable, usize)> = summary
        .tables
        .iter()
        .map(|t| (t.table, t.write.rows))
        .collect();
    assert_eq!(
        rows,
        vec![
            (OutputTable::Songs, 2),
            (OutputTable::Artists, 2),
            (OutputTable::Users, 2),
            (OutputTable::Time, 3),
            (OutputTable::Songplays, 3),
        ]
    );

    let songs = pipeline.sink(OutputTable::Songs).location;
    let files: Vec<String> = songs
        .list_matching("**/*.parquet")
        .await
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        files,
        vec![
            "lake/songs/year=0/artist_id=ARNTLGG11E2835DDB9/part-00000.parquet".to_string(),
            "lake/songs/year=1994/artist_id=ARMJAGH1187FB546F3/part-00000.parquet".to_string(),
        ]
    );

    let songplays = summary.table(OutputTable::Songplays).unwrap();
    assert_eq!(songplays.write.partitions, 1);
    let artists = summary.table(OutputTable::Artists).unwrap();
    assert_eq!(artists.write.files, 1);
    assert_eq!(artists.write.partitions, 0);
}

#[tokio::test]
async fn test_rerun_overwrites() {
    let pipeline = pipeline(TimestampMode::default()).await;
    let session = Session::memory();

    let first = pipeline.run(&session).await.unwrap();
    let listing = |table| {
        let location = pipeline.sink(table).location;
        async move { location.list_matching("**/*").await.unwrap() }
    };
    let before = listing(OutputTable::Time).await;

    let second = pipeline.run(&session).await.unwrap();
    let after = listing(OutputTable::Time).await;

    assert_eq!(before, after);
    for (a, b) in first.tables.iter().zip(&second.tables) {
        assert_eq!(a.write, b.write);
    }
}

#[tokio::test]
async fn test_run_without_inputs_fails() {
    let config = PipelineConfig::new("memory://empty", "memory://lake");
    let empty = Location::from_store(Arc::new(InMemory::new()), "memory", "empty");
    let pipeline = Pipeline::with_locations(config, empty, output());

    let err = pipeline.run(&Session::memory()).await.unwrap_err();
    assert!(matches!(err, Error::NoInputFiles { .. }));
}

#[test]
fn test_from_config_requires_bases() {
    let err = Pipeline::from_config(PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { .. }));
}
