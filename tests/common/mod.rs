// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use festival_locator::config::Config;
use festival_locator::db::{Database, MemoryStore};
use festival_locator::middleware::auth::create_jwt;
use festival_locator::routes::create_router;
use festival_locator::services::{BlobStore, MemoryBlobStore};
use festival_locator::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection against the emulator.
#[allow(dead_code)]
pub async fn test_db() -> Database {
    Database::firestore("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Test app on in-memory storage.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: MemoryStore,
    pub blobs: MemoryBlobStore,
}

/// Create a test app with in-memory dependencies.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let store = MemoryStore::default();
    let blobs = MemoryBlobStore::default();
    let state = Arc::new(AppState::new(
        Config::test_default(),
        Database::memory(store.clone()),
        BlobStore::Memory(blobs.clone()),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        blobs,
    }
}

/// Create a test JWT token.
#[allow(dead_code)]
pub fn create_test_jwt(uid: &str, signing_key: &[u8]) -> String {
    create_jwt(uid, Some("Test User"), None, signing_key).unwrap()
}

/// Build a JSON request authenticated as `uid`.
#[allow(dead_code)]
pub fn json_request(
    method: &str,
    uri: &str,
    uid: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let token = create_test_jwt(uid, &Config::test_default().jwt_signing_key);
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Set up a completed profile through the API.
#[allow(dead_code)]
pub async fn setup_profile(app: &TestApp, uid: &str, display_name: &str) {
    use tower::ServiceExt;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/me",
            uid,
            Some(serde_json::json!({ "displayName": display_name })),
        ))
        .await
        .unwrap();
    assert!(response.status().is_success(), "profile setup failed");
}
