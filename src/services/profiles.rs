// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profiles and the shared profile cache.
//!
//! Profile resolution is split in two:
//! - `resolve_profiles` is pure: it reads a borrowed snapshot, fetches the
//!   ids the snapshot lacks and returns a new merged map.
//! - `ProfileCache::resolve` is the only place that writes the shared cache.
//!
//! A cached entry is never replaced by a failed or missing fetch. Ids that
//! cannot be loaded resolve to a placeholder, which is cached too.

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::user::{ProfileInput, ProfilePatch};
use crate::models::UserProfile;
use crate::time_utils::now_rfc3339;
use dashmap::DashMap;
use futures_util::{stream, StreamExt};
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use validator::Validate;

/// Profiles keyed by uid.
pub type ProfileMap = HashMap<String, UserProfile>;

/// Upper bound on profile fetches in flight for one resolution.
const MAX_CONCURRENT_FETCHES: usize = 16;

/// Resolve every id in `ids` against `cache`, fetching only the misses.
///
/// Fetches run concurrently and complete in any order. Not-found results
/// and fetch errors are logged and resolved to `UserProfile::placeholder`.
/// The returned map holds every cached entry plus one entry per requested id.
pub async fn resolve_profiles<I, F, Fut>(ids: I, cache: &ProfileMap, fetch: F) -> ProfileMap
where
    I: IntoIterator<Item = String>,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Option<UserProfile>>>,
{
    let missing: BTreeSet<String> = ids
        .into_iter()
        .filter(|id| !cache.contains_key(id))
        .collect();

    let fetched: Vec<(String, Result<Option<UserProfile>>)> = stream::iter(missing)
        .map(|uid| {
            let pending = fetch(uid.clone());
            async move { (uid, pending.await) }
        })
        .buffer_unordered(MAX_CONCURRENT_FETCHES)
        .collect()
        .await;

    let mut merged = cache.clone();
    for (uid, outcome) in fetched {
        let profile = match outcome {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::debug!(uid = %uid, "Profile not found, using placeholder");
                UserProfile::placeholder(&uid)
            }
            Err(e) => {
                tracing::debug!(uid = %uid, error = %e, "Profile fetch failed, using placeholder");
                UserProfile::placeholder(&uid)
            }
        };
        merged.insert(uid, profile);
    }
    merged
}

/// Process-wide profile cache shared by all requests.
#[derive(Clone, Default)]
pub struct ProfileCache {
    entries: Arc<DashMap<String, UserProfile>>,
}

impl ProfileCache {
    pub fn get(&self, uid: &str) -> Option<UserProfile> {
        self.entries.get(uid).map(|entry| entry.clone())
    }

    /// Record a freshly written profile.
    pub fn store(&self, profile: UserProfile) {
        self.entries.insert(profile.uid.clone(), profile);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of the cached entries for the given ids.
    fn snapshot<'a>(&self, ids: impl IntoIterator<Item = &'a String>) -> ProfileMap {
        ids.into_iter()
            .filter_map(|uid| self.get(uid).map(|p| (uid.clone(), p)))
            .collect()
    }

    /// Resolve profiles for `ids`, loading misses from the database.
    pub async fn resolve(&self, db: &Database, ids: BTreeSet<String>) -> ProfileMap {
        let snapshot = self.snapshot(&ids);
        let resolved = resolve_profiles(ids, &snapshot, |uid| {
            let db = db.clone();
            async move { db.get_profile(&uid).await }
        })
        .await;

        for (uid, profile) in &resolved {
            // A profile stored concurrently by a write wins over what we fetched
            self.entries
                .entry(uid.clone())
                .or_insert_with(|| profile.clone());
        }
        resolved
    }
}

/// Profile setup and editing.
#[derive(Clone)]
pub struct ProfileService {
    db: Database,
    cache: ProfileCache,
}

impl ProfileService {
    pub fn new(db: Database, cache: ProfileCache) -> Self {
        Self { db, cache }
    }

    /// The caller's own profile, straight from the database.
    pub async fn get(&self, uid: &str) -> Result<UserProfile> {
        self.db
            .get_profile(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile for {}", uid)))
    }

    /// First-login setup. Fails if a profile already exists.
    pub async fn create(&self, uid: &str, input: ProfileInput) -> Result<UserProfile> {
        let input = input.normalized();
        input.validate()?;

        if self.db.get_profile(uid).await?.is_some() {
            return Err(AppError::Conflict(format!("Profile for {} already exists", uid)));
        }

        let profile = input.into_profile(uid, &now_rfc3339());
        self.db.put_profile(&profile).await?;
        self.cache.store(profile.clone());

        tracing::info!(uid, "Profile created");
        Ok(profile)
    }

    pub async fn update(&self, uid: &str, patch: ProfilePatch) -> Result<UserProfile> {
        let patch = patch.normalized();
        patch.validate()?;

        let mut profile = self.get(uid).await?;
        profile.apply_patch(patch, &now_rfc3339());
        self.db.put_profile(&profile).await?;
        self.cache.store(profile.clone());

        tracing::info!(uid, "Profile updated");
        Ok(profile)
    }

    /// Point the profile at a new avatar, returning the URL it replaced.
    pub async fn set_avatar_url(&self, uid: &str, url: &str) -> Result<(UserProfile, Option<String>)> {
        let mut profile = self.get(uid).await?;
        let previous = profile.avatar_url.replace(url.to_string());
        profile.updated_at = now_rfc3339();
        self.db.put_profile(&profile).await?;
        self.cache.store(profile.clone());
        Ok((profile, previous))
    }
}
