// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Group API tests: admin-only creation, join by code, leave.

use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{body_json, json_request, TestApp};

async fn send(app: &TestApp, method: &str, uri: &str, uid: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = app
        .router
        .clone()
        .oneshot(json_request(method, uri, uid, body))
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn test_only_admins_create_groups() {
    let app = common::create_test_app();
    common::setup_profile(&app, "bob", "Bob").await;

    let (status, body) = send(&app, "POST", "/api/groups", "bob", Some(json!({ "name": "Crew" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_group_lifecycle() {
    let app = common::create_test_app();
    common::setup_profile(&app, "admin-uid", "Admin").await;
    common::setup_profile(&app, "bob", "Bob").await;

    let (status, group) = send(
        &app,
        "POST",
        "/api/groups",
        "admin-uid",
        Some(json!({ "name": "Crew" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(group["memberCount"], 1);
    let code = group["code"].as_str().unwrap().to_string();
    let group_id = group["id"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);

    // Codes match case-insensitively
    let (status, joined) = send(
        &app,
        "POST",
        "/api/groups/join",
        "bob",
        Some(json!({ "code": code.to_lowercase() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["memberCount"], 2);

    let (status, _) = send(&app, "POST", "/api/groups/join", "bob", Some(json!({ "code": code }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, mine) = send(&app, "GET", "/api/groups/mine", "bob", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine[0]["id"], group_id.as_str());

    let leave = format!("/api/groups/{}/leave", group_id);
    let (status, body) = send(&app, "POST", &leave, "admin-uid", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "groupDeleted": false, "remainingMembers": 1 }));

    let (status, body) = send(&app, "POST", &leave, "bob", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["groupDeleted"], true);
    assert!(app.state.db.get_group(&group_id).await.unwrap().is_none());

    // The code no longer resolves
    let (status, _) = send(&app, "POST", "/api/groups/join", "bob", Some(json!({ "code": code }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_join_requires_profile() {
    let app = common::create_test_app();
    common::setup_profile(&app, "admin-uid", "Admin").await;
    let (_, group) = send(
        &app,
        "POST",
        "/api/groups",
        "admin-uid",
        Some(json!({ "name": "Crew" })),
    )
    .await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/groups/join",
        "stranger",
        Some(json!({ "code": group["code"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let stored = app
        .state
        .db
        .get_group(group["id"].as_str().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.member_count, 1);
}
