// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store.
//!
//! Used for local development and tests. A single lock guards all
//! collections, so every operation (including the multi-document ones) is
//! trivially atomic.

use super::{LeaveOutcome, WriteMode};
use crate::error::{AppError, Result};
use crate::models::{FriendPin, Group, LocationType, UserLocation, UserProfile};
use crate::time_utils::now_rfc3339;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Collections {
    users: HashMap<String, UserProfile>,
    groups: HashMap<String, Group>,
    user_locations: HashMap<String, UserLocation>,
    pins: HashMap<String, FriendPin>,
}

/// Process-local store with the same contract as Firestore.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Collections>>,
    /// Number of upcoming write operations to reject
    failing_writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Reject the next `count` write operations with a database error.
    ///
    /// Lets tests exercise the persistence-failure path.
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<()> {
        let rejected = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            Err(AppError::Database("write rejected".to_string()))
        } else {
            Ok(())
        }
    }

    // ─── Profiles ────────────────────────────────────────────────

    pub async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        Ok(self.inner.lock().await.users.get(uid).cloned())
    }

    pub async fn put_profile(&self, profile: &UserProfile) -> Result<()> {
        self.check_write()?;
        self.inner
            .lock()
            .await
            .users
            .insert(profile.uid.clone(), profile.clone());
        Ok(())
    }

    // ─── Groups ──────────────────────────────────────────────────

    pub async fn get_group(&self, group_id: &str) -> Result<Option<Group>> {
        Ok(self.inner.lock().await.groups.get(group_id).cloned())
    }

    pub async fn find_group_by_code(&self, code: &str) -> Result<Option<Group>> {
        Ok(self
            .inner
            .lock()
            .await
            .groups
            .values()
            .find(|g| g.code == code)
            .cloned())
    }

    pub async fn create_group_atomic(&self, group: &Group, creator_uid: &str) -> Result<()> {
        let mut db = self.inner.lock().await;
        if !db.users.contains_key(creator_uid) {
            return Err(AppError::NotFound(format!("User {} not found", creator_uid)));
        }
        self.check_write()?;

        db.groups.insert(group.id.clone(), group.clone());
        if let Some(profile) = db.users.get_mut(creator_uid) {
            if !profile.is_member_of(&group.id) {
                profile.group_ids.push(group.id.clone());
            }
            profile.updated_at = group.created_at.clone();
        }
        Ok(())
    }

    pub async fn join_group_atomic(&self, group_id: &str, uid: &str) -> Result<Group> {
        let mut db = self.inner.lock().await;
        let mut group = db
            .groups
            .get(group_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", group_id)))?;
        let mut profile = db
            .users
            .get(uid)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))?;
        if profile.is_member_of(group_id) {
            return Err(AppError::Conflict(format!("Already a member of {}", group_id)));
        }
        self.check_write()?;

        let now = now_rfc3339();
        group.member_count += 1;
        group.updated_at = now.clone();
        profile.group_ids.push(group_id.to_string());
        profile.updated_at = now;

        db.groups.insert(group.id.clone(), group.clone());
        db.users.insert(profile.uid.clone(), profile);
        Ok(group)
    }

    pub async fn leave_group_atomic(&self, group_id: &str, uid: &str) -> Result<LeaveOutcome> {
        let mut db = self.inner.lock().await;
        let mut profile = db
            .users
            .get(uid)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))?;
        if !profile.is_member_of(group_id) {
            return Err(AppError::NotFound(format!("Not a member of {}", group_id)));
        }
        self.check_write()?;

        let now = now_rfc3339();
        let existing = db.groups.get(group_id).cloned();
        let outcome = match existing {
            None => LeaveOutcome::GroupMissing,
            Some(group) if group.member_count <= 1 => {
                db.groups.remove(group_id);
                LeaveOutcome::GroupDeleted
            }
            Some(mut group) => {
                group.member_count -= 1;
                group.updated_at = now.clone();
                let remaining = group.member_count;
                db.groups.insert(group.id.clone(), group);
                LeaveOutcome::Left { remaining }
            }
        };

        profile.group_ids.retain(|g| g != group_id);
        profile.updated_at = now;
        db.users.insert(profile.uid.clone(), profile);
        Ok(outcome)
    }

    // ─── User Locations ──────────────────────────────────────────

    pub async fn get_user_location(&self, id: &str) -> Result<Option<UserLocation>> {
        Ok(self.inner.lock().await.user_locations.get(id).cloned())
    }

    pub async fn list_active_user_locations(&self) -> Result<Vec<UserLocation>> {
        let db = self.inner.lock().await;
        Ok(newest_first(
            db.user_locations.values().filter(|l| l.is_active).cloned(),
        ))
    }

    pub async fn list_user_locations(&self, uid: &str) -> Result<Vec<UserLocation>> {
        let db = self.inner.lock().await;
        Ok(newest_first(
            db.user_locations
                .values()
                .filter(|l| l.user_id == uid)
                .cloned(),
        ))
    }

    pub async fn replace_current_location_atomic(
        &self,
        location: &UserLocation,
        mode: WriteMode,
    ) -> Result<usize> {
        let mut db = self.inner.lock().await;
        self.check_write()?;
        if mode == WriteMode::MustExist && !db.user_locations.contains_key(&location.id) {
            return Err(AppError::NotFound(format!("Location {}", location.id)));
        }

        let mut deactivated = 0;
        for existing in db.user_locations.values_mut() {
            if existing.id != location.id
                && existing.user_id == location.user_id
                && existing.is_active
                && existing.location_type == LocationType::Current
            {
                existing.is_active = false;
                deactivated += 1;
            }
        }
        db.user_locations
            .insert(location.id.clone(), location.clone());
        Ok(deactivated)
    }

    pub async fn put_user_location(&self, location: &UserLocation) -> Result<()> {
        self.check_write()?;
        self.inner
            .lock()
            .await
            .user_locations
            .insert(location.id.clone(), location.clone());
        Ok(())
    }

    pub async fn update_user_location(&self, location: &UserLocation) -> Result<()> {
        let mut db = self.inner.lock().await;
        self.check_write()?;
        match db.user_locations.get_mut(&location.id) {
            Some(existing) => {
                *existing = location.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Location {}", location.id))),
        }
    }

    pub async fn delete_user_location(&self, id: &str) -> Result<()> {
        self.check_write()?;
        self.inner.lock().await.user_locations.remove(id);
        Ok(())
    }

    // ─── Friend Pins ─────────────────────────────────────────────

    pub async fn get_pin(&self, id: &str) -> Result<Option<FriendPin>> {
        Ok(self.inner.lock().await.pins.get(id).cloned())
    }

    pub async fn list_pins(&self, uid: Option<&str>) -> Result<Vec<FriendPin>> {
        let db = self.inner.lock().await;
        let mut pins: Vec<FriendPin> = db
            .pins
            .values()
            .filter(|p| uid.map_or(true, |u| p.user_id == u))
            .cloned()
            .collect();
        pins.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(pins)
    }

    pub async fn put_pin(&self, pin: &FriendPin) -> Result<()> {
        self.check_write()?;
        self.inner
            .lock()
            .await
            .pins
            .insert(pin.id.clone(), pin.clone());
        Ok(())
    }

    pub async fn delete_pin(&self, id: &str) -> Result<()> {
        self.check_write()?;
        self.inner.lock().await.pins.remove(id);
        Ok(())
    }
}

fn newest_first(locations: impl Iterator<Item = UserLocation>) -> Vec<UserLocation> {
    let mut out: Vec<UserLocation> = locations.collect();
    out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
    out
}
