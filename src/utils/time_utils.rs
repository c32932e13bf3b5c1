use chrono::{DateTime, NaiveDate};

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const STANDARD_TIME_FORMAT: &str = "%Y-%m-%d";
}

/// Parse an ISO-8601 calendar date string (`2024-01-31`).
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, TimeUtils::STANDARD_TIME_FORMAT).ok()
}

/// Calendar date of an epoch-milliseconds timestamp, in UTC.
pub fn epoch_ms_to_date(epoch_ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(epoch_ms).map(|dt| dt.date_naive())
}

pub fn how_many_seconds_ago(past_timestamp_ms: i64, now_timestamp_ms: i64) -> i64 {
    (now_timestamp_ms - past_timestamp_ms) / TimeUtils::MS_IN_S
}
