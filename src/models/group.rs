// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Group model: a named set of users sharing a join code.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Stored group record (`groups` collection).
///
/// Membership itself lives on `UserProfile::group_ids`; the group only keeps
/// a count, which is updated in the same transaction as the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Group {
    pub id: String,
    pub name: String,
    /// Unique 6-character join code
    pub code: String,
    /// Creator UID
    pub created_by: String,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Create-group request body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GroupInput {
    #[validate(length(min = 1, max = 30))]
    pub name: String,
}

/// Join-by-code request body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JoinGroupInput {
    #[validate(length(min = 1, max = 16))]
    pub code: String,
}

/// Normalise a user-typed join code for lookup.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
