// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile setup, edit and avatar upload tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use festival_locator::models::UserProfile;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{body_json, json_request};

fn avatar_request(uid: &str, content_type: &str, bytes: Vec<u8>) -> Request<Body> {
    let token = common::create_test_jwt(uid, &festival_locator::config::Config::test_default().jwt_signing_key);
    Request::builder()
        .method("POST")
        .uri("/api/me/avatar?fileName=me.png")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .unwrap()
}

#[tokio::test]
async fn test_profile_missing_until_setup() {
    let app = common::create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(json_request("GET", "/api/me", "alice", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    common::setup_profile(&app, "alice", "  Alice  ").await;

    let response = app
        .router
        .clone()
        .oneshot(json_request("GET", "/api/me", "alice", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile: UserProfile = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(profile.display_name, "Alice");
    assert!(profile.profile_completed);
    assert!(profile.group_ids.is_empty());
}

#[tokio::test]
async fn test_setup_requires_display_name() {
    let app = common::create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/me",
            "alice",
            Some(json!({ "displayName": "   " })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/me",
            "alice",
            Some(json!({ "displayName": "x".repeat(51) })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patch_updates_profile() {
    let app = common::create_test_app();
    common::setup_profile(&app, "alice", "Alice").await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/me",
            "alice",
            Some(json!({ "libeCityName": "Sapporo" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["displayName"], "Alice");
    assert_eq!(body["libeCityName"], "Sapporo");

    assert_eq!(
        app.state
            .profile_cache
            .get("alice")
            .unwrap()
            .libe_city_name
            .as_deref(),
        Some("Sapporo")
    );
}

#[tokio::test]
async fn test_avatar_upload() {
    let app = common::create_test_app();
    common::setup_profile(&app, "alice", "Alice").await;

    let response = app
        .router
        .clone()
        .oneshot(avatar_request("alice", "image/png", vec![0x89, 0x50, 0x4e, 0x47]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let url = body["avatarUrl"].as_str().unwrap();
    assert!(url.contains("avatars/alice/"));
    assert!(url.ends_with("_me.png"));
    assert_eq!(app.blobs.len(), 1);

    let response = app
        .router
        .clone()
        .oneshot(avatar_request("alice", "text/plain", vec![1, 2, 3]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.blobs.len(), 1);
}
