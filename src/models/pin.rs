// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Legacy friend pin: a single named marker with no lifecycle.

use super::location::validate_time;
use crate::time_utils::canonical_hhmm;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Stored friend pin (`locations` collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FriendPin {
    pub id: String,
    pub friend_name: String,
    pub x: f64,
    pub y: f64,
    /// `HH:MM`
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation time (RFC3339)
    pub timestamp: String,
    /// Creator UID
    pub user_id: String,
    pub user_display_name: String,
}

/// Request body for dropping a friend pin.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PinInput {
    #[validate(length(min = 1, max = 50))]
    pub friend_name: String,
    pub x: f64,
    pub y: f64,
    #[validate(custom(function = "validate_time"))]
    pub time: String,
    #[validate(length(max = 200))]
    pub description: Option<String>,
}

impl PinInput {
    pub fn normalized(self) -> Self {
        Self {
            friend_name: self.friend_name.trim().to_string(),
            time: canonical_hhmm(&self.time),
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            ..self
        }
    }

    pub fn into_pin(self, id: String, user_id: &str, user_display_name: &str, now: &str) -> FriendPin {
        FriendPin {
            id,
            friend_name: self.friend_name,
            x: self.x,
            y: self.y,
            time: self.time,
            description: self.description,
            timestamp: now.to_string(),
            user_id: user_id.to_string(),
            user_display_name: user_display_name.to_string(),
        }
    }
}
