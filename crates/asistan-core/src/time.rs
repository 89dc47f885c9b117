//! Local-time helpers. Timestamps are stored as unix seconds (UTC) and shown
//! in the user's fixed UTC offset.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

/// Unix epoch timestamp in seconds.
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}

/// Fixed offset for a whole-hour UTC offset. Out-of-range offsets fall back to UTC.
pub fn offset(tz_offset_hours: i32) -> FixedOffset {
    FixedOffset::east_opt(tz_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
}

/// Current time in the given offset.
pub fn local_now(tz_offset_hours: i32) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset(tz_offset_hours))
}

/// Convert a unix timestamp to local time.
pub fn to_local(ts: i64, tz_offset_hours: i32) -> DateTime<FixedOffset> {
    let tz = offset(tz_offset_hours);
    tz.timestamp_opt(ts, 0)
        .single()
        .unwrap_or_else(|| Utc::now().with_timezone(&tz))
}

/// Format a unix timestamp as `DD.MM.YYYY HH:MM` in local time.
pub fn format_local(ts: i64, tz_offset_hours: i32) -> String {
    to_local(ts, tz_offset_hours)
        .format("%d.%m.%Y %H:%M")
        .to_string()
}

/// Today's calendar date in local time.
pub fn local_today(tz_offset_hours: i32) -> NaiveDate {
    local_now(tz_offset_hours).date_naive()
}
