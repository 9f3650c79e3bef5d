// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User location model: "current" and "scheduled" pins on the festival map.

use crate::map::MapPoint;
use crate::time_utils::{canonical_date, canonical_hhmm, parse_date, parse_hhmm};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

/// Kind of location pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum LocationType {
    /// Where the user is now. At most one active per user.
    Current,
    /// A planned meeting point. Any number may be active.
    Scheduled,
}

impl LocationType {
    pub fn as_str(self) -> &'static str {
        match self {
            LocationType::Current => "current",
            LocationType::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "current" => Ok(LocationType::Current),
            "scheduled" => Ok(LocationType::Scheduled),
            other => Err(format!("unknown location type: {other}")),
        }
    }
}

/// Stored location record in Firestore (`userLocations` collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserLocation {
    /// Document ID
    pub id: String,
    /// Owner UID
    pub user_id: String,
    /// Unscaled map-space coordinates
    pub x: f64,
    pub y: f64,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,
    /// Start time, `HH:MM`
    #[serde(default)]
    pub time: String,
    /// End time, `HH:MM` (scheduled only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Free-text place label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub location_type: LocationType,
    pub is_active: bool,
    /// Last write (RFC3339)
    pub timestamp: String,
}

impl UserLocation {
    /// Build a fresh active record from validated input.
    pub fn from_input(id: String, user_id: &str, input: LocationInput, now: &str) -> Self {
        let end_time = match input.location_type {
            LocationType::Scheduled => input.end_time,
            LocationType::Current => None,
        };
        Self {
            id,
            user_id: user_id.to_string(),
            x: input.x,
            y: input.y,
            date: input.date,
            time: input.time,
            end_time,
            comment: input.comment,
            location: input.location,
            location_type: input.location_type,
            is_active: true,
            timestamp: now.to_string(),
        }
    }

    pub fn position(&self) -> MapPoint {
        MapPoint {
            x: self.x,
            y: self.y,
        }
    }

    pub fn is_active_current(&self) -> bool {
        self.is_active && self.location_type == LocationType::Current
    }

    /// Apply a partial update in place.
    ///
    /// Empty strings clear the optional text fields. Switching to `current`
    /// drops any end time.
    pub fn apply_patch(&mut self, patch: LocationPatch, now: &str) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(time) = patch.time {
            self.time = time;
        }
        if let Some(end_time) = patch.end_time {
            self.end_time = non_blank(end_time);
        }
        if let Some(comment) = patch.comment {
            self.comment = non_blank(comment);
        }
        if let Some(location) = patch.location {
            self.location = non_blank(location);
        }
        if let Some(location_type) = patch.location_type {
            self.location_type = location_type;
        }
        if self.location_type == LocationType::Current {
            self.end_time = None;
        }
        self.timestamp = now.to_string();
    }
}

/// Request body for creating a location.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LocationInput {
    #[validate(custom(function = "validate_coordinate"))]
    pub x: f64,
    #[validate(custom(function = "validate_coordinate"))]
    pub y: f64,
    #[validate(custom(function = "validate_date"))]
    pub date: String,
    #[validate(custom(function = "validate_time"))]
    pub time: String,
    #[validate(custom(function = "validate_time"))]
    pub end_time: Option<String>,
    #[validate(length(max = 200))]
    pub comment: Option<String>,
    #[validate(length(max = 50))]
    pub location: Option<String>,
    pub location_type: LocationType,
}

impl LocationInput {
    /// Trim free text, turn blanks into `None` and zero-pad date and times.
    pub fn normalized(self) -> Self {
        Self {
            date: canonical_date(&self.date),
            time: canonical_hhmm(&self.time),
            end_time: self.end_time.and_then(non_blank).map(|t| canonical_hhmm(&t)),
            comment: self.comment.and_then(non_blank),
            location: self.location.and_then(non_blank),
            ..self
        }
    }
}

/// Request body for updating a location. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LocationPatch {
    #[validate(custom(function = "validate_coordinate"))]
    pub x: Option<f64>,
    #[validate(custom(function = "validate_coordinate"))]
    pub y: Option<f64>,
    #[validate(custom(function = "validate_date"))]
    pub date: Option<String>,
    #[validate(custom(function = "validate_time"))]
    pub time: Option<String>,
    #[validate(custom(function = "validate_optional_time"))]
    pub end_time: Option<String>,
    #[validate(length(max = 200))]
    pub comment: Option<String>,
    #[validate(length(max = 50))]
    pub location: Option<String>,
    pub location_type: Option<LocationType>,
}

impl LocationPatch {
    /// Patch that only moves the marker.
    pub fn move_to(point: MapPoint) -> Self {
        Self {
            x: Some(point.x),
            y: Some(point.y),
            ..Default::default()
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            date: self.date.map(|d| canonical_date(&d)),
            time: self.time.map(|t| canonical_hhmm(&t)),
            end_time: self.end_time.map(|t| canonical_hhmm(&t)),
            comment: self.comment.map(|c| c.trim().to_string()),
            location: self.location.map(|l| l.trim().to_string()),
            ..self
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn validate_coordinate(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("coordinate_not_finite"))
    }
}

pub(crate) fn validate_date(value: &str) -> Result<(), ValidationError> {
    parse_date(value)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("date_format"))
}

pub(crate) fn validate_time(value: &str) -> Result<(), ValidationError> {
    parse_hhmm(value)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("time_format"))
}

/// Like `validate_time`, but an empty string (meaning "clear") is allowed.
fn validate_optional_time(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Ok(())
    } else {
        validate_time(value)
    }
}
