// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! `Database` is the single persistence handle the services talk to. It
//! dispatches to either Firestore or a process-local in-memory store; both
//! backends implement the same typed operations with the same atomicity
//! guarantees (current-location replacement and group membership changes
//! commit as one unit).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::error::{AppError, Result};
use crate::models::{FriendPin, Group, UserLocation, UserProfile};
use ring::rand::{SecureRandom, SystemRandom};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const GROUPS: &str = "groups";
    pub const USER_LOCATIONS: &str = "userLocations";
    /// Legacy friend pins
    pub const LOCATIONS: &str = "locations";
}

/// Result of removing a member from a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Group still exists with this many members.
    Left { remaining: u32 },
    /// The last member left and the group was deleted.
    GroupDeleted,
    /// The group was already gone; only the profile was updated.
    GroupMissing,
}

/// Whether a location write may create its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create the document or overwrite it.
    Upsert,
    /// Fail with `NotFound` if the document has been deleted meanwhile.
    MustExist,
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreStore),
    Memory(MemoryStore),
}

/// Persistence handle shared by all services.
#[derive(Clone)]
pub struct Database {
    backend: Backend,
}

macro_rules! dispatch {
    ($self:ident . $method:ident ( $($arg:expr),* )) => {
        match &$self.backend {
            Backend::Firestore(store) => store.$method($($arg),*).await,
            Backend::Memory(store) => store.$method($($arg),*).await,
        }
    };
}

impl Database {
    /// Connect to Firestore (or the emulator if `FIRESTORE_EMULATOR_HOST` is set).
    pub async fn firestore(project_id: &str) -> Result<Self> {
        Ok(Self {
            backend: Backend::Firestore(FirestoreStore::new(project_id).await?),
        })
    }

    /// Wrap an in-memory store.
    pub fn memory(store: MemoryStore) -> Self {
        Self {
            backend: Backend::Memory(store),
        }
    }

    /// Fresh empty in-memory database.
    pub fn new_memory() -> Self {
        Self::memory(MemoryStore::default())
    }

    // ─── Profiles ────────────────────────────────────────────────

    pub async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        dispatch!(self.get_profile(uid))
    }

    /// Write a whole profile document.
    pub async fn put_profile(&self, profile: &UserProfile) -> Result<()> {
        dispatch!(self.put_profile(profile))
    }

    // ─── Groups ──────────────────────────────────────────────────

    pub async fn get_group(&self, group_id: &str) -> Result<Option<Group>> {
        dispatch!(self.get_group(group_id))
    }

    pub async fn find_group_by_code(&self, code: &str) -> Result<Option<Group>> {
        dispatch!(self.find_group_by_code(code))
    }

    /// Store a new group and add it to the creator's profile in one transaction.
    pub async fn create_group_atomic(&self, group: &Group, creator_uid: &str) -> Result<()> {
        dispatch!(self.create_group_atomic(group, creator_uid))
    }

    /// Increment the member count and record membership in one transaction.
    pub async fn join_group_atomic(&self, group_id: &str, uid: &str) -> Result<Group> {
        dispatch!(self.join_group_atomic(group_id, uid))
    }

    /// Decrement (or delete) the group and drop membership in one transaction.
    pub async fn leave_group_atomic(&self, group_id: &str, uid: &str) -> Result<LeaveOutcome> {
        dispatch!(self.leave_group_atomic(group_id, uid))
    }

    // ─── User Locations ──────────────────────────────────────────

    pub async fn get_user_location(&self, id: &str) -> Result<Option<UserLocation>> {
        dispatch!(self.get_user_location(id))
    }

    /// All active locations, newest first.
    pub async fn list_active_user_locations(&self) -> Result<Vec<UserLocation>> {
        dispatch!(self.list_active_user_locations())
    }

    /// Every location (active or not) owned by a user, newest first.
    pub async fn list_user_locations(&self, uid: &str) -> Result<Vec<UserLocation>> {
        dispatch!(self.list_user_locations(uid))
    }

    /// Write a location, first deactivating the owner's other active
    /// `current` locations, all in one transaction.
    ///
    /// Returns the number of records deactivated.
    pub async fn replace_current_location_atomic(
        &self,
        location: &UserLocation,
        mode: WriteMode,
    ) -> Result<usize> {
        dispatch!(self.replace_current_location_atomic(location, mode))
    }

    /// Write a whole location document.
    pub async fn put_user_location(&self, location: &UserLocation) -> Result<()> {
        dispatch!(self.put_user_location(location))
    }

    /// Overwrite a location document that must still exist.
    pub async fn update_user_location(&self, location: &UserLocation) -> Result<()> {
        dispatch!(self.update_user_location(location))
    }

    pub async fn delete_user_location(&self, id: &str) -> Result<()> {
        dispatch!(self.delete_user_location(id))
    }

    // ─── Friend Pins ─────────────────────────────────────────────

    pub async fn get_pin(&self, id: &str) -> Result<Option<FriendPin>> {
        dispatch!(self.get_pin(id))
    }

    /// All pins, newest first, optionally restricted to one creator.
    pub async fn list_pins(&self, uid: Option<&str>) -> Result<Vec<FriendPin>> {
        dispatch!(self.list_pins(uid))
    }

    pub async fn put_pin(&self, pin: &FriendPin) -> Result<()> {
        dispatch!(self.put_pin(pin))
    }

    pub async fn delete_pin(&self, id: &str) -> Result<()> {
        dispatch!(self.delete_pin(id))
    }
}

/// Generate a random 20-character document ID.
pub fn new_document_id() -> Result<String> {
    let mut bytes = [0u8; 10];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(hex::encode(bytes))
}
