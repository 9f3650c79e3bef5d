// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Festival Locator: share where you are on the festival map.
//!
//! This crate provides the backend API for placing current and scheduled
//! locations on an image map, resolving the profiles of their owners,
//! filtering what each viewer sees, and managing small join-code groups.

pub mod config;
pub mod db;
pub mod error;
pub mod map;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use services::{
    AvatarService, BlobStore, GroupService, LocationService, ProfileCache, ProfileService,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub profile_cache: ProfileCache,
    pub profiles: ProfileService,
    pub locations: LocationService,
    pub groups: GroupService,
    pub avatars: AvatarService,
}

impl AppState {
    /// Wire up all services around one database and profile cache.
    pub fn new(config: Config, db: Database, blobs: BlobStore) -> Self {
        let profile_cache = ProfileCache::default();
        let profiles = ProfileService::new(db.clone(), profile_cache.clone());
        let locations = LocationService::new(
            db.clone(),
            profile_cache.clone(),
            config.location_retention_days,
        );
        let groups = GroupService::new(db.clone(), profile_cache.clone());
        let avatars = AvatarService::new(blobs, profiles.clone());

        Self {
            config,
            db,
            profile_cache,
            profiles,
            locations,
            groups,
            avatars,
        }
    }

    /// Festival wall-clock "now".
    pub fn event_now(&self) -> chrono::NaiveDateTime {
        time_utils::event_now(self.config.event_utc_offset_minutes)
    }
}
