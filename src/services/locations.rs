// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location lifecycle.
//!
//! Each user has at most one active `current` location and any number of
//! active `scheduled` ones. Writing a `current` location (by creating one or
//! by switching a scheduled one over) deactivates the user's previous
//! current location in the same transaction as the write. If that
//! transaction fails nothing is written.

use crate::db::{new_document_id, Database, WriteMode};
use crate::error::{AppError, Result};
use crate::map::MapPoint;
use crate::models::{LocationInput, LocationPatch, LocationType, UserLocation};
use crate::services::expiry::{is_expired, within_retention};
use crate::services::filters::{apply_filters, date_options, FilterContext, LocationFilters};
use crate::services::profiles::{ProfileCache, ProfileMap};
use crate::time_utils::now_rfc3339;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;
use validator::Validate;

/// A location as shown on the map.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationView {
    #[serde(flatten)]
    pub location: UserLocation,
    pub expired: bool,
}

/// Everything the map needs to render one refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationListing {
    pub locations: Vec<LocationView>,
    /// Owners of the listed locations plus the viewer
    pub profiles: ProfileMap,
    /// Distinct dates across all retained locations, ascending
    pub date_options: Vec<String>,
    /// Viewer's own active scheduled locations
    pub my_scheduled_count: usize,
}

#[derive(Clone)]
pub struct LocationService {
    db: Database,
    profiles: ProfileCache,
    retention_days: i64,
}

impl LocationService {
    pub fn new(db: Database, profiles: ProfileCache, retention_days: i64) -> Self {
        Self {
            db,
            profiles,
            retention_days,
        }
    }

    /// Write a location, enforcing the single-current rule.
    async fn persist(&self, location: &UserLocation, mode: WriteMode) -> Result<()> {
        if location.is_active_current() {
            let deactivated = self
                .db
                .replace_current_location_atomic(location, mode)
                .await?;
            if deactivated > 0 {
                tracing::info!(
                    user_id = %location.user_id,
                    location_id = %location.id,
                    deactivated,
                    "Superseded previous current location"
                );
            }
        } else if mode == WriteMode::MustExist {
            self.db.update_user_location(location).await?;
        } else {
            self.db.put_user_location(location).await?;
        }
        Ok(())
    }

    pub async fn create(&self, uid: &str, input: LocationInput) -> Result<UserLocation> {
        let input = input.normalized();
        input.validate()?;

        let location = UserLocation::from_input(new_document_id()?, uid, input, &now_rfc3339());
        self.persist(&location, WriteMode::Upsert).await.inspect_err(|e| {
            tracing::error!(user_id = uid, error = %e, "Failed to save location");
        })?;

        tracing::info!(
            user_id = uid,
            location_id = %location.id,
            location_type = %location.location_type,
            "Location created"
        );
        Ok(location)
    }

    /// Load a location the caller owns.
    async fn owned(&self, uid: &str, id: &str) -> Result<UserLocation> {
        let location = self
            .db
            .get_user_location(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Location {}", id)))?;
        if location.user_id != uid {
            return Err(AppError::Forbidden(format!(
                "Location {} belongs to another user",
                id
            )));
        }
        Ok(location)
    }

    pub async fn update(&self, uid: &str, id: &str, patch: LocationPatch) -> Result<UserLocation> {
        let patch = patch.normalized();
        patch.validate()?;

        let mut location = self.owned(uid, id).await?;
        let was = location.location_type;
        location.apply_patch(patch, &now_rfc3339());
        self.persist(&location, WriteMode::MustExist).await?;

        if was != location.location_type {
            tracing::info!(
                user_id = uid,
                location_id = id,
                from = %was,
                to = %location.location_type,
                "Location type changed"
            );
        }
        Ok(location)
    }

    /// Drag-move a marker to new map coordinates.
    pub async fn move_to(&self, uid: &str, id: &str, point: MapPoint) -> Result<UserLocation> {
        self.update(uid, id, LocationPatch::move_to(point)).await
    }

    /// Hard delete; the record is removed, not deactivated.
    pub async fn delete(&self, uid: &str, id: &str) -> Result<()> {
        self.owned(uid, id).await?;
        self.db.delete_user_location(id).await?;
        tracing::info!(user_id = uid, location_id = id, "Location deleted");
        Ok(())
    }

    /// Active locations within the retention window, filtered for `viewer_uid`.
    pub async fn list(
        &self,
        viewer_uid: &str,
        filters: &LocationFilters,
        now: NaiveDateTime,
    ) -> Result<LocationListing> {
        let retained: Vec<UserLocation> = self
            .db
            .list_active_user_locations()
            .await?
            .into_iter()
            .filter(|l| within_retention(l, now, self.retention_days))
            .collect();

        let my_scheduled_count = retained
            .iter()
            .filter(|l| l.user_id == viewer_uid && l.location_type == LocationType::Scheduled)
            .count();
        let date_options = date_options(&retained);

        let mut ids: BTreeSet<String> = retained.iter().map(|l| l.user_id.clone()).collect();
        ids.insert(viewer_uid.to_string());
        let profiles = self.profiles.resolve(&self.db, ids).await;

        let ctx = FilterContext {
            viewer: profiles.get(viewer_uid),
            profiles: &profiles,
        };
        let locations = apply_filters(retained, filters, &ctx)
            .into_iter()
            .map(|location| LocationView {
                expired: is_expired(&location, now),
                location,
            })
            .collect();

        Ok(LocationListing {
            locations,
            profiles,
            date_options,
            my_scheduled_count,
        })
    }
}
