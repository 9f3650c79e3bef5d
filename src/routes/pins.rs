// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Legacy friend pin routes.
//!
//! Friend pins predate user locations: one named marker per entry, with no
//! type or active state.

use crate::db::new_document_id;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::pin::PinInput;
use crate::models::user::UNKNOWN_USER_NAME;
use crate::models::FriendPin;
use crate::time_utils::{canonical_hhmm, now_rfc3339};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/pins", get(list_pins).post(create_pin))
        .route("/api/pins/{id}", delete(delete_pin))
}

#[derive(Debug, Deserialize)]
struct PinQuery {
    #[serde(default)]
    user: Option<String>,
    /// Exact `HH:MM` match
    #[serde(default)]
    time: Option<String>,
}

/// All pins newest first, optionally narrowed to one user and one time.
async fn list_pins(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): WithRejection<Query<PinQuery>, AppError>,
) -> Result<Json<Vec<FriendPin>>> {
    let user = query.user.as_deref().filter(|u| !u.is_empty());
    let time = query
        .time
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(canonical_hhmm);

    let mut pins = state.db.list_pins(user).await?;
    if let Some(time) = time {
        pins.retain(|p| p.time == time);
    }
    Ok(Json(pins))
}

async fn create_pin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<PinInput>,
) -> Result<(StatusCode, Json<FriendPin>)> {
    let input = input.normalized();
    input.validate()?;

    // Prefer the profile name, then the identity provider's
    let display_name = match state.profiles.get(&user.uid).await {
        Ok(profile) if !profile.display_name.is_empty() => profile.display_name,
        Ok(_) => user.display_name.clone().unwrap_or_default(),
        Err(e) if e.is_not_found() => user.display_name.clone().unwrap_or_default(),
        Err(e) => return Err(e),
    };
    let display_name = if display_name.is_empty() {
        UNKNOWN_USER_NAME.to_string()
    } else {
        display_name
    };

    let pin = input.into_pin(new_document_id()?, &user.uid, &display_name, &now_rfc3339());
    state.db.put_pin(&pin).await?;

    tracing::info!(uid = %user.uid, pin_id = %pin.id, "Friend pin added");
    Ok((StatusCode::CREATED, Json(pin)))
}

async fn delete_pin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let pin = state
        .db
        .get_pin(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pin {}", id)))?;
    if pin.user_id != user.uid {
        return Err(AppError::Forbidden(format!("Pin {} belongs to another user", id)));
    }

    state.db.delete_pin(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
