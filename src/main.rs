// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Festival Locator API Server
//!
//! Lets festival-goers share current and planned positions on the event
//! map with friends and groups.

use festival_locator::{
    config::{Config, StorageBackend},
    db::Database,
    services::{BlobStore, GcsBlobStore, MemoryBlobStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.storage_backend,
        interaction_mode = ?config.interaction_mode,
        "Starting Festival Locator API"
    );

    let (db, blobs) = match config.storage_backend {
        StorageBackend::Firestore => {
            let db = Database::firestore(&config.gcp_project_id).await?;
            let blobs = BlobStore::Gcs(GcsBlobStore::new(config.avatar_bucket.clone()).await?);
            tracing::info!(bucket = %config.avatar_bucket, "Avatar storage initialized");
            (db, blobs)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            (
                Database::new_memory(),
                BlobStore::Memory(MemoryBlobStore::default()),
            )
        }
    };

    // Build shared state
    let port = config.port;
    let state = Arc::new(AppState::new(config, db, blobs));

    // Build router
    let app = festival_locator::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("festival_locator=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
