// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The interaction mode and default pin type are resolved once here and
//! passed down rather than detected per request.

use crate::map::InteractionMode;
use crate::models::LocationType;
use std::env;

/// Which persistence backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Google Cloud Firestore (or the emulator if `FIRESTORE_EMULATOR_HOST` is set)
    Firestore,
    /// Process-local in-memory store (local development and tests)
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// UIDs allowed to create groups
    pub admin_uids: Vec<String>,
    /// Cloud Storage bucket for avatar images
    pub avatar_bucket: String,
    pub storage_backend: StorageBackend,
    /// Pin type preselected for new locations
    pub default_location_type: LocationType,
    pub interaction_mode: InteractionMode,
    /// Offset of the festival's wall clock from UTC, in minutes
    pub event_utc_offset_minutes: i32,
    /// Active locations dated further back than this are not listed
    pub location_retention_days: i64,
}

impl Config {
    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            admin_uids: vec!["admin-uid".to_string()],
            avatar_bucket: "test-project.appspot.com".to_string(),
            storage_backend: StorageBackend::Memory,
            default_location_type: LocationType::Scheduled,
            interaction_mode: InteractionMode::Desktop,
            event_utc_offset_minutes: 9 * 60,
            location_retention_days: 7,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let gcp_project_id =
            env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string());

        let storage_backend = match env::var("STORAGE_BACKEND").as_deref() {
            Ok("memory") => StorageBackend::Memory,
            Ok("firestore") | Err(_) => StorageBackend::Firestore,
            Ok(_) => return Err(ConfigError::Invalid("STORAGE_BACKEND")),
        };

        let default_location_type = match env::var("DEFAULT_LOCATION_TYPE") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid("DEFAULT_LOCATION_TYPE"))?,
            Err(_) => LocationType::Scheduled,
        };

        let interaction_mode = match env::var("INTERACTION_MODE") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid("INTERACTION_MODE"))?,
            Err(_) => InteractionMode::Desktop,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            avatar_bucket: env::var("AVATAR_BUCKET")
                .unwrap_or_else(|_| format!("{}.appspot.com", gcp_project_id)),
            gcp_project_id,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            admin_uids: parse_admin_uids(&env::var("ADMIN_UIDS").unwrap_or_default()),
            storage_backend,
            default_location_type,
            interaction_mode,
            event_utc_offset_minutes: env::var("EVENT_TIMEZONE_OFFSET_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9 * 60),
            location_retention_days: env::var("LOCATION_RETENTION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7),
        })
    }

    /// Whether the given UID has admin rights.
    pub fn is_admin(&self, uid: &str) -> bool {
        self.admin_uids.iter().any(|a| a == uid)
    }
}

/// Split a comma-separated UID list, dropping blanks.
fn parse_admin_uids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("ADMIN_UIDS", " alice , ,bob");
        env::set_var("DEFAULT_LOCATION_TYPE", "current");
        env::set_var("INTERACTION_MODE", "touch");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.admin_uids, vec!["alice", "bob"]);
        assert!(config.is_admin("bob"));
        assert!(!config.is_admin("carol"));
        assert_eq!(config.default_location_type, LocationType::Current);
        assert_eq!(config.interaction_mode, InteractionMode::Touch);
        assert_eq!(config.location_retention_days, 7);
    }

    #[test]
    fn test_parse_admin_uids_empty() {
        assert!(parse_admin_uids("").is_empty());
        assert!(parse_admin_uids(" , ").is_empty());
    }
}
