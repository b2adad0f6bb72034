//! Activity stage: song-play filter, users and time dimensions

use crate::plan::{
    col, date_format, dayofmonth, dayofweek, from_epoch_millis, hour, lit, month, to_timestamp,
    year, Expr, Frame, SortKey,
};
use crate::schema::{activity, output};
use crate::types::TimestampMode;

/// Column holding the event time derived from `ts`
pub const EVENT_TIME: &str = "timestamp";

/// Text form the event time passes through in `FormatRoundtrip` mode
pub const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Keep only song-play events
pub fn song_plays_only(events: &Frame) -> Frame {
    events.filter(col(activity::PAGE).equals(lit(activity::NEXT_SONG)))
}

/// Users dimension, ordered by user id
///
/// User ids are text, so the order is lexicographic.
pub fn users_table(plays: &Frame) -> Frame {
    plays
        .select([
            col(activity::USER_ID).alias(output::USER_ID),
            col(activity::FIRST_NAME).alias(output::FIRST_NAME),
            col(activity::LAST_NAME).alias(output::LAST_NAME),
            col(activity::GENDER),
            col(activity::LEVEL),
        ])
        .distinct()
        .order_by(vec![SortKey::asc(output::USER_ID)])
}

/// Expression deriving the event time from epoch milliseconds
pub fn event_time(mode: TimestampMode) -> Expr {
    let truncated = from_epoch_millis(activity::TS);
    match mode {
        TimestampMode::Truncate => truncated,
        TimestampMode::FormatRoundtrip => to_timestamp(
            date_format(truncated, EVENT_TIME_FORMAT),
            EVENT_TIME_FORMAT,
        ),
    }
}

/// Add the [`EVENT_TIME`] column
pub fn with_event_time(plays: &Frame, mode: TimestampMode) -> Frame {
    plays.with_column(EVENT_TIME, event_time(mode))
}

/// Time dimension: every distinct event time with its calendar fields
///
/// The event time keeps its [`EVENT_TIME`] name here; only the fact table
/// calls it `start_time`.
pub fn time_table(plays: &Frame) -> Frame {
    plays
        .select([
            col(EVENT_TIME),
            hour(EVENT_TIME).alias(output::HOUR),
            dayofmonth(EVENT_TIME).alias(output::DAY),
            month(EVENT_TIME).alias(output::MONTH),
            year(EVENT_TIME).alias(output::YEAR),
            dayofweek(EVENT_TIME).alias(output::WEEKDAY),
        ])
        .distinct()
}
