// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod group;
pub mod location;
pub mod pin;
pub mod user;

pub use group::Group;
pub use location::{LocationInput, LocationPatch, LocationType, UserLocation};
pub use pin::FriendPin;
pub use user::UserProfile;
