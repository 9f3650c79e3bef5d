// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Group routes.

use crate::db::LeaveOutcome;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::group::{GroupInput, JoinGroupInput};
use crate::models::Group;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/groups", post(create_group))
        .route("/api/groups/mine", get(my_groups))
        .route("/api/groups/join", post(join_group))
        .route("/api/groups/{id}/leave", post(leave_group))
}

async fn my_groups(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Group>>> {
    Ok(Json(state.groups.groups_for(&user.uid).await?))
}

/// Create a group (admins only). The creator becomes its first member.
async fn create_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<GroupInput>,
) -> Result<(StatusCode, Json<Group>)> {
    if !state.config.is_admin(&user.uid) {
        tracing::warn!(uid = %user.uid, "Non-admin attempted to create a group");
        return Err(AppError::Forbidden("Only admins can create groups".to_string()));
    }
    let group = state.groups.create_group(&user.uid, input).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

async fn join_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<JoinGroupInput>,
) -> Result<Json<Group>> {
    Ok(Json(state.groups.join_by_code(&user.uid, input).await?))
}

/// Result of leaving a group.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaveResponse {
    pub group_deleted: bool,
    /// Members left behind, if the group still exists
    pub remaining_members: Option<u32>,
}

async fn leave_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<LeaveResponse>> {
    let response = match state.groups.leave(&user.uid, &id).await? {
        LeaveOutcome::Left { remaining } => LeaveResponse {
            group_deleted: false,
            remaining_members: Some(remaining),
        },
        LeaveOutcome::GroupDeleted | LeaveOutcome::GroupMissing => LeaveResponse {
            group_deleted: true,
            remaining_members: None,
        },
    };
    Ok(Json(response))
}
