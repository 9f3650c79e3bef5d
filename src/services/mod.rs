// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod avatar;
pub mod expiry;
pub mod filters;
pub mod groups;
pub mod locations;
pub mod profiles;

pub use avatar::{AvatarService, BlobStore, GcsBlobStore, MemoryBlobStore};
pub use filters::LocationFilters;
pub use groups::GroupService;
pub use locations::{LocationListing, LocationService, LocationView};
pub use profiles::{ProfileCache, ProfileService};
