//! Helpers for the timestamps stored with expenses and budgets.
//!
//! Timestamps are kept in UTC without an offset, matching what SQLite's
//! `CURRENT_TIMESTAMP` produces. Fractional seconds are written only when
//! present, so whole-second values look exactly like SQLite's own.

use time::{
    OffsetDateTime, PrimitiveDateTime, format_description::BorrowedFormatItem,
    macros::format_description,
};

const SECONDS_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const SUBSECONDS_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");

/// The current UTC time truncated to whole seconds.
pub fn now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    let now = now.replace_nanosecond(0).unwrap_or(now);

    PrimitiveDateTime::new(now.date(), now.time())
}

/// Format `timestamp` the way SQLite prints `CURRENT_TIMESTAMP`, followed by
/// the fractional seconds if there are any.
pub fn format(timestamp: &PrimitiveDateTime) -> String {
    let format = if timestamp.nanosecond() == 0 {
        SECONDS_FORMAT
    } else {
        SUBSECONDS_FORMAT
    };

    timestamp
        .format(format)
        .unwrap_or_else(|_| timestamp.to_string())
}
