// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and parsing.
//!
//! Location records carry their wall-clock date and time as zero-padded
//! strings (`YYYY-MM-DD`, `HH:MM`), so most helpers here convert between
//! those strings and chrono values.

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, SecondsFormat, Timelike,
    Utc,
};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current UTC time formatted for storage.
///
/// Millisecond precision keeps "newest first" ordering stable for writes
/// issued within the same second.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// Parse an `HH:MM` time of day.
pub fn parse_hhmm(time: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(time.trim(), "%H:%M").ok()
}

/// Minutes elapsed since midnight for an `HH:MM` string.
pub fn minutes_since_midnight(time: &str) -> Option<i64> {
    parse_hhmm(time).map(|t| i64::from(t.hour()) * 60 + i64::from(t.minute()))
}

/// Format a time of day as zero-padded `HH:MM`.
pub fn format_hhmm(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Rewrite a parseable date as zero-padded `YYYY-MM-DD`. Anything else
/// comes back trimmed, so validation still sees the original text.
pub fn canonical_date(date: &str) -> String {
    parse_date(date)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| date.trim().to_string())
}

/// Rewrite a parseable time as zero-padded `HH:MM`.
pub fn canonical_hhmm(time: &str) -> String {
    parse_hhmm(time)
        .map(format_hhmm)
        .unwrap_or_else(|| time.trim().to_string())
}

/// Wall-clock "now" at the event, given its offset from UTC in minutes.
pub fn event_now(offset_minutes: i32) -> NaiveDateTime {
    let offset = offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());
    Utc::now().with_timezone(&offset).naive_local()
}
