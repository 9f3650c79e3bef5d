// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes: setup, edit and avatar upload.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::{ProfileInput, ProfilePatch};
use crate::models::UserProfile;
use crate::services::avatar::MAX_AVATAR_BYTES;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, HeaderMap},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).post(create_me).patch(update_me))
        .route(
            "/api/me/avatar",
            // Leave headroom so oversized uploads reach our own size check
            post(upload_avatar).layer(DefaultBodyLimit::max(MAX_AVATAR_BYTES + 64 * 1024)),
        )
}

/// Get the caller's profile (404 until setup is done).
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.profiles.get(&user.uid).await?))
}

/// First-login setup.
///
/// The identity provider's photo is used as the avatar unless one is given.
async fn create_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(mut input): Json<ProfileInput>,
) -> Result<Json<UserProfile>> {
    if input.avatar_url.is_none() {
        input.avatar_url = user.photo_url.clone();
    }
    Ok(Json(state.profiles.create(&user.uid, input).await?))
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.profiles.update(&user.uid, patch).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvatarQuery {
    #[serde(default)]
    file_name: Option<String>,
}

/// Upload a new avatar as the raw request body.
async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Query(query), _): WithRejection<Query<AvatarQuery>, AppError>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UserProfile>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Content-Type".to_string()))?;
    let file_name = query.file_name.as_deref().unwrap_or("avatar");

    let profile = state
        .avatars
        .upload(&user.uid, file_name, content_type, body.to_vec())
        .await?;
    Ok(Json(profile))
}
