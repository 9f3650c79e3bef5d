// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Temporal status of locations.
//!
//! "Expired" is derived from a location's `date`/`time`/`endTime` against
//! the festival wall clock; it is never persisted. Incomplete records are
//! never treated as expired.

use crate::models::{LocationType, UserLocation};
use crate::time_utils::{format_hhmm, minutes_since_midnight, parse_date};
use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

/// How long a `current` location stays fresh after its start time.
pub const CURRENT_GRACE_MINUTES: i64 = 120;

/// Whether a location is in the past relative to `now`.
pub fn is_expired(location: &UserLocation, now: NaiveDateTime) -> bool {
    let Some(date) = parse_date(&location.date) else {
        return false;
    };
    if location.time.is_empty() {
        return false;
    }

    let today = now.date();
    if date < today {
        return true;
    }
    if date > today {
        return false;
    }

    match location.location_type {
        LocationType::Scheduled => {
            let end = location
                .end_time
                .as_deref()
                .filter(|t| !t.is_empty())
                .unwrap_or(&location.time);
            // Zero-padded HH:MM strings order the same as the times they name
            end < format_hhmm(now.time()).as_str()
        }
        LocationType::Current => {
            let Some(start) = minutes_since_midnight(&location.time) else {
                return false;
            };
            let now_minutes = i64::from(now.hour() * 60 + now.minute());
            now_minutes - start > CURRENT_GRACE_MINUTES
        }
    }
}

/// Whether a location's date falls inside the retention window.
///
/// The window reaches back `retention_days` from `now`, and a record
/// counts from the start of its day, so the day exactly `retention_days`
/// back drops out once that midnight passes. Records without a parseable
/// date are outside it.
pub fn within_retention(location: &UserLocation, now: NaiveDateTime, retention_days: i64) -> bool {
    let Some(date) = parse_date(&location.date) else {
        return false;
    };
    date.and_time(NaiveTime::MIN) >= now - Duration::days(retention_days)
}
