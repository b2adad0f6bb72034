//! Input record schemas and column names

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Catalog (song metadata) field names
pub mod catalog {
    pub const SONG_ID: &str = "song_id";
    pub const TITLE: &str = "title";
    pub const ARTIST_ID: &str = "artist_id";
    pub const ARTIST_NAME: &str = "artist_name";
    pub const ARTIST_LOCATION: &str = "artist_location";
    pub const ARTIST_LATITUDE: &str = "artist_latitude";
    pub const ARTIST_LONGITUDE: &str = "artist_longitude";
    pub const YEAR: &str = "year";
    pub const DURATION: &str = "duration";
    pub const NUM_SONGS: &str = "num_songs";
}

/// Activity (event log) field names
pub mod activity {
    pub const ARTIST: &str = "artist";
    pub const AUTH: &str = "auth";
    pub const FIRST_NAME: &str = "firstName";
    pub const GENDER: &str = "gender";
    pub const ITEM_IN_SESSION: &str = "itemInSession";
    pub const LAST_NAME: &str = "lastName";
    pub const LENGTH: &str = "length";
    pub const LEVEL: &str = "level";
    pub const LOCATION: &str = "location";
    pub const METHOD: &str = "method";
    pub const PAGE: &str = "page";
    pub const REGISTRATION: &str = "registration";
    pub const SESSION_ID: &str = "sessionId";
    pub const SONG: &str = "song";
    pub const STATUS: &str = "status";
    pub const TS: &str = "ts";
    pub const USER_AGENT: &str = "userAgent";
    pub const USER_ID: &str = "userId";

    /// Page value marking a song play
    pub const NEXT_SONG: &str = "NextSong";
}

/// Output column names shared by several tables
pub mod output {
    pub const SONG_ID: &str = "song_id";
    pub const ARTIST_ID: &str = "artist_id";
    pub const NAME: &str = "name";
    pub const LOCATION: &str = "location";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const USER_ID: &str = "user_id";
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const START_TIME: &str = "start_time";
    pub const HOUR: &str = "hour";
    pub const DAY: &str = "day";
    pub const WEEKDAY: &str = "weekday";
    pub const MONTH: &str = "month";
    pub const YEAR: &str = "year";
    pub const SONGPLAY_ID: &str = "songplay_id";
    pub const SESSION_ID: &str = "session_id";
    pub const USER_AGENT: &str = "user_agent";
}

static CATALOG_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| {
    Arc::new(Schema::new(vec![
        Field::new(catalog::NUM_SONGS, DataType::Int64, true),
        Field::new(catalog::ARTIST_ID, DataType::Utf8, true),
        Field::new(catalog::ARTIST_LATITUDE, DataType::Float64, true),
        Field::new(catalog::ARTIST_LONGITUDE, DataType::Float64, true),
        Field::new(catalog::ARTIST_LOCATION, DataType::Utf8, true),
        Field::new(catalog::ARTIST_NAME, DataType::Utf8, true),
        Field::new(catalog::SONG_ID, DataType::Utf8, true),
        Field::new(catalog::TITLE, DataType::Utf8, true),
        Field::new(catalog::DURATION, DataType::Float64, true),
        Field::new(catalog::YEAR, DataType::Int64, true),
    ]))
});

static ACTIVITY_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| {
    Arc::new(Schema::new(vec![
        Field::new(activity::ARTIST, DataType::Utf8, true),
        Field::new(activity::AUTH, DataType::Utf8, true),
        Field::new(activity::FIRST_NAME, DataType::Utf8, true),
        Field::new(activity::GENDER, DataType::Utf8, true),
        Field::new(activity::ITEM_IN_SESSION, DataType::Int64, true),
        Field::new(activity::LAST_NAME, DataType::Utf8, true),
        Field::new(activity::LENGTH, DataType::Float64, true),
        Field::new(activity::LEVEL, DataType::Utf8, true),
        Field::new(activity::LOCATION, DataType::Utf8, true),
        Field::new(activity::METHOD, DataType::Utf8, true),
        Field::new(activity::PAGE, DataType::Utf8, true),
        Field::new(activity::REGISTRATION, DataType::Float64, true),
        Field::new(activity::SESSION_ID, DataType::Int64, true),
        Field::new(activity::SONG, DataType::Utf8, true),
        Field::new(activity::STATUS, DataType::Int64, true),
        Field::new(activity::TS, DataType::Int64, true),
        Field::new(activity::USER_AGENT, DataType::Utf8, true),
        Field::new(activity::USER_ID, DataType::Utf8, true),
    ]))
});

/// Schema of a catalog record
pub fn catalog_schema() -> SchemaRef {
    Arc::clone(&CATALOG_SCHEMA)
}

/// Schema of an activity record
///
/// `userId` is text in the raw logs (empty for logged-out events).
pub fn activity_schema() -> SchemaRef {
    Arc::clone(&ACTIVITY_SCHEMA)
}
