//! Declarative transformation graphs
//!
//! Stages of the job are written against [`Frame`], a lazily evaluated
//! relational plan, so the same definitions can be executed by any
//! [`Engine`](crate::engine::Engine).
//!
//! ```rust,ignore
//! use songplay_etl::plan::{col, lit, Frame};
//!
//! let plays = logs
//!     .filter(col("page").equals(lit("NextSong")))
//!     .select(["userId", "firstName", "lastName", "gender", "level"])
//!     .distinct();
//! println!("{}", plays.explain());
//! ```

mod expr;
mod frame;
mod io;

pub use expr::{
    col, concat, date_format, dayofmonth, dayofweek, from_epoch_millis, hour, lit, month,
    to_timestamp, year, DatePart, Expr, Operator, ScalarValue, TIMESTAMP,
};
pub use frame::{Frame, JoinType, Plan, SortKey};
pub use io::{Sink, Source};

#[cfg(test)]
mod tests;
