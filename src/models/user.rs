// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Display name used when a profile cannot be found.
pub const UNKNOWN_USER_NAME: &str = "Unknown User";

/// User profile stored in Firestore (`users` collection, keyed by UID).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredUserProfile")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    /// Auth UID (also used as document ID)
    pub uid: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub libe_city_name: Option<String>,
    /// Setup flow finished; gates access to the map
    pub profile_completed: bool,
    /// Groups this user belongs to (order irrelevant)
    pub group_ids: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// On-disk shape, which may still carry the deprecated singular `groupId`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUserProfile {
    uid: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    libe_city_name: Option<String>,
    #[serde(default)]
    profile_completed: bool,
    #[serde(default)]
    group_ids: Vec<String>,
    #[serde(default)]
    group_id: Option<String>,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: String,
}

impl From<StoredUserProfile> for UserProfile {
    fn from(stored: StoredUserProfile) -> Self {
        let mut group_ids = stored.group_ids;
        if let Some(legacy) = stored.group_id.filter(|g| !g.is_empty()) {
            if !group_ids.contains(&legacy) {
                group_ids.push(legacy);
            }
        }
        Self {
            uid: stored.uid,
            display_name: stored.display_name,
            avatar_url: stored.avatar_url,
            libe_city_name: stored.libe_city_name,
            profile_completed: stored.profile_completed,
            group_ids,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}

impl UserProfile {
    /// Stand-in for a profile that could not be loaded.
    pub fn placeholder(uid: &str) -> Self {
        Self {
            uid: uid.to_string(),
            display_name: UNKNOWN_USER_NAME.to_string(),
            avatar_url: None,
            libe_city_name: None,
            profile_completed: false,
            group_ids: Vec::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    pub fn is_member_of(&self, group_id: &str) -> bool {
        self.group_ids.iter().any(|g| g == group_id)
    }

    /// True if the two profiles share at least one group.
    pub fn shares_group_with(&self, other: &UserProfile) -> bool {
        self.group_ids.iter().any(|g| other.is_member_of(g))
    }

    pub fn apply_patch(&mut self, patch: ProfilePatch, now: &str) {
        if let Some(display_name) = patch.display_name {
            self.display_name = display_name;
        }
        if let Some(libe_city_name) = patch.libe_city_name {
            self.libe_city_name = Some(libe_city_name).filter(|s| !s.is_empty());
        }
        if let Some(avatar_url) = patch.avatar_url {
            self.avatar_url = Some(avatar_url).filter(|s| !s.is_empty());
        }
        self.updated_at = now.to_string();
    }
}

/// Setup-flow request body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    #[validate(length(min = 1, max = 50))]
    pub display_name: String,
    #[validate(length(max = 50))]
    pub libe_city_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileInput {
    pub fn normalized(self) -> Self {
        Self {
            display_name: self.display_name.trim().to_string(),
            libe_city_name: self
                .libe_city_name
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            avatar_url: self
                .avatar_url
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }

    pub fn into_profile(self, uid: &str, now: &str) -> UserProfile {
        UserProfile {
            uid: uid.to_string(),
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            libe_city_name: self.libe_city_name,
            profile_completed: true,
            group_ids: Vec::new(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }
}

/// Edit-dialog request body. Empty strings clear optional fields.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[validate(length(min = 1, max = 50))]
    pub display_name: Option<String>,
    #[validate(length(max = 50))]
    pub libe_city_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfilePatch {
    pub fn normalized(self) -> Self {
        Self {
            display_name: self.display_name.map(|s| s.trim().to_string()),
            libe_city_name: self.libe_city_name.map(|s| s.trim().to_string()),
            avatar_url: self.avatar_url.map(|s| s.trim().to_string()),
        }
    }
}
