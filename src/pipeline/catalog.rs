//! Catalog stage: songs and artists dimensions

use crate::plan::{col, Frame};
use crate::schema::{catalog, output};

/// Songs dimension: one row per distinct track record
pub fn songs_table(records: &Frame) -> Frame {
    records
        .select([
            catalog::SONG_ID,
            catalog::TITLE,
            catalog::ARTIST_ID,
            catalog::YEAR,
            catalog::DURATION,
        ])
        .distinct()
}

/// Artists dimension: one row per distinct artist record
pub fn artists_table(records: &Frame) -> Frame {
    records
        .select([
            col(catalog::ARTIST_ID),
            col(catalog::ARTIST_NAME).alias(output::NAME),
            col(catalog::ARTIST_LOCATION).alias(output::LOCATION),
            col(catalog::ARTIST_LATITUDE).alias(output::LATITUDE),
            col(catalog::ARTIST_LONGITUDE).alias(output::LONGITUDE),
        ])
        .distinct()
}
