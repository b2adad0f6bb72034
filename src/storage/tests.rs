//! Tests for storage module

use super::*;
use bytes::Bytes;
use object_store::memory::InMemory;
use std::sync::Arc;
use test_case::test_case;

// ============================================================================
// Glob Tests
// ============================================================================

#[test_case("song_data/*/*/*/*.json", "song_data/A/B/C/TRABCEI128F424C983.json", true ; "nested song file")]
#[test_case("song_data/*/*/*/*.json", "song_data/A/B/TRABCEI128F424C983.json", false ; "too shallow")]
#[test_case("song_data/*/*/*/*.json", "song_data/A/B/C/D/x.json", false ; "star does not cross slash")]
#[test_case("log-data/*/*/*.json", "log-data/2018/11/2018-11-01-events.json", true ; "log file")]
#[test_case("log-data/*/*/*.json", "log-data/2018/11/notes.txt", false ; "wrong extension")]
#[test_case("data/**/*.json", "data/a/b/c.json", true ; "double star spans directories")]
#[test_case("data/**/*.json", "data/c.json", true ; "double star matches zero directories")]
#[test_case("logs/2018-1?.json", "logs/2018-11.json", true ; "question mark")]
#[test_case("logs/file.json", "logs/file.json", true ; "literal")]
#[test_case("logs/file.json", "logs/fileXjson", false ; "dot is literal")]
fn test_glob_matching(pattern: &str, key: &str, expected: bool) {
    let glob = Glob::new(pattern).unwrap();
    assert_eq!(glob.is_match(key), expected);
}

#[test]
fn test_glob_literal_prefix() {
    assert_eq!(
        Glob::new("song_data/*/*/*/*.json").unwrap().literal_prefix(),
        "song_data"
    );
    assert_eq!(Glob::new("*.json").unwrap().literal_prefix(), "");
    assert_eq!(Glob::new("a/b/file.json").unwrap().literal_prefix(), "a/b");
}

#[test]
fn test_glob_rejects_empty() {
    assert!(Glob::new("").is_err());
}

// ============================================================================
// Location Tests
// ============================================================================

fn memory_location(prefix: &str) -> Location {
    Location::from_store(Arc::new(InMemory::new()), "memory", prefix)
}

#[test]
fn test_parse_local_path() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().to_str().unwrap();
    let location = Location::parse(path).unwrap();
    assert_eq!(location.scheme(), "file");
    assert!(!location.is_cloud());
    assert_eq!(location.url(), path.trim_end_matches('/'));
}

#[test]
fn test_parse_missing_local_path() {
    let temp_dir = tempfile::tempdir().unwrap();
    let missing = temp_dir.path().join("nope");
    assert!(Location::parse(missing.to_str().unwrap()).is_err());
}

#[test]
fn test_create_local_path() {
    let temp_dir = tempfile::tempdir().unwrap();
    let target = temp_dir.path().join("out/lake");
    let location = Location::create(target.to_str().unwrap()).unwrap();
    assert!(target.is_dir());
    assert_eq!(location.local_path().unwrap(), target);
}

#[test]
fn test_child_url() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().to_str().unwrap();
    let location = Location::parse(path).unwrap();
    let songs = location.child("songs");
    assert_eq!(songs.url(), format!("{path}/songs"));
    assert_eq!(songs.prefix(), "songs");
    assert_eq!(
        songs.url_of("year=2018/part-00000.parquet"),
        format!("{path}/songs/year=2018/part-00000.parquet")
    );
}

#[test]
fn test_memory_location_url() {
    let location = memory_location("lake").child("users");
    assert_eq!(location.url(), "memory://lake/users");
    assert!(!location.is_cloud());
}

#[tokio::test]
async fn test_list_matching_sorted() {
    let location = memory_location("input");
    for key in [
        "song_data/B/A/A/TRBAA.json",
        "song_data/A/A/A/TRAAA.json",
        "song_data/A/A/A/notes.txt",
        "log-data/2018/11/events.json",
    ] {
        location.put(key, Bytes::from_static(b"{}")).await.unwrap();
    }

    let files = location
        .list_matching("song_data/*/*/*/*.json")
        .await
        .unwrap();
    let keys: Vec<String> = files.iter().map(ToString::to_string).collect();
    assert_eq!(
        keys,
        [
            "input/song_data/A/A/A/TRAAA.json",
            "input/song_data/B/A/A/TRBAA.json"
        ]
    );
}

#[tokio::test]
async fn test_get_roundtrip() {
    let location = memory_location("");
    location
        .put("a/b.json", Bytes::from_static(b"{\"x\":1}"))
        .await
        .unwrap();
    let files = location.list_matching("a/*.json").await.unwrap();
    assert_eq!(files.len(), 1);
    let data = location.get(&files[0]).await.unwrap();
    assert_eq!(&data[..], b"{\"x\":1}");
}

#[tokio::test]
async fn test_clear_only_touches_prefix() {
    let root = memory_location("lake");
    let songs = root.child("songs");
    let users = root.child("users");
    songs
        .put("year=2018/part-00000.parquet", Bytes::from_static(b"a"))
        .await
        .unwrap();
    songs
        .put("year=2019/part-00000.parquet", Bytes::from_static(b"b"))
        .await
        .unwrap();
    users
        .put("part-00000.parquet", Bytes::from_static(b"c"))
        .await
        .unwrap();

    assert_eq!(songs.clear().await.unwrap(), 2);
    assert!(songs.list_matching("**/*").await.unwrap().is_empty());
    assert_eq!(users.list_matching("*.parquet").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_clear_missing_local_prefix() {
    let temp_dir = tempfile::tempdir().unwrap();
    let location = Location::parse(temp_dir.path().to_str().unwrap()).unwrap();
    assert_eq!(location.child("never_written").clear().await.unwrap(), 0);
}
