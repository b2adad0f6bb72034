//! Fact stage: songplays

use super::activity::EVENT_TIME;
use crate::plan::{col, concat, month, year, Frame, JoinType};
use crate::schema::{activity, catalog, output};

/// Songplays fact table
///
/// `plays` must already carry the event time column. Plays with no
/// matching catalog record are kept with null song and artist ids. The
/// songplay id is the session id and raw `ts` joined as text, so distinct
/// pairs can collide (session 1 at ts 23 and session 12 at ts 3).
pub fn songplays_table(plays: &Frame, tracks: &Frame) -> Frame {
    plays
        .join(
            tracks,
            &[
                (activity::ARTIST, catalog::ARTIST_NAME),
                (activity::SONG, catalog::TITLE),
            ],
            JoinType::Left,
        )
        .with_column(
            output::SONGPLAY_ID,
            concat([activity::SESSION_ID, activity::TS]),
        )
        .select([
            col(output::SONGPLAY_ID),
            col(EVENT_TIME),
            col(activity::USER_ID).alias(output::USER_ID),
            col(activity::LEVEL),
            col(catalog::SONG_ID),
            col(catalog::ARTIST_ID),
            col(activity::SESSION_ID).alias(output::SESSION_ID),
            col(activity::LOCATION),
            col(activity::USER_AGENT).alias(output::USER_AGENT),
        ])
        .with_column(output::MONTH, month(EVENT_TIME))
        .with_column(output::YEAR, year(EVENT_TIME))
        .with_column_renamed(EVENT_TIME, output::START_TIME)
        .distinct()
}
