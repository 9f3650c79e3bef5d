// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{LocationInput, LocationPatch, UserLocation};
use crate::services::{LocationFilters, LocationListing};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/locations", get(list_locations).post(create_location))
        .route(
            "/api/locations/{id}",
            patch(update_location).delete(delete_location),
        )
}

/// Active locations visible to the caller, filtered by the query string.
async fn list_locations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Query(filters), _): WithRejection<Query<LocationFilters>, AppError>,
) -> Result<Json<LocationListing>> {
    let listing = state
        .locations
        .list(&user.uid, &filters, state.event_now())
        .await?;
    Ok(Json(listing))
}

async fn create_location(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<LocationInput>,
) -> Result<(StatusCode, Json<UserLocation>)> {
    let location = state.locations.create(&user.uid, input).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

/// Edit or drag-move one of the caller's locations.
async fn update_location(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(patch): Json<LocationPatch>,
) -> Result<Json<UserLocation>> {
    Ok(Json(state.locations.update(&user.uid, &id, patch).await?))
}

async fn delete_location(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.locations.delete(&user.uid, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
