// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Avatar image storage.
//!
//! Avatars are stored under `avatars/{uid}/{millis}_{file_name}` in a
//! Cloud Storage bucket (or an in-memory store for local runs and tests).
//! Only URLs that point into our own bucket are ever deleted; avatars
//! hosted elsewhere (e.g. the identity provider's photo URL) are left alone.

use crate::error::{AppError, Result};
use crate::models::UserProfile;
use crate::services::profiles::ProfileService;
use dashmap::DashMap;
use gcloud_sdk::{GoogleAuthTokenGenerator, TokenSourceType};
use std::sync::Arc;
use std::time::Duration;

/// Largest accepted avatar upload.
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

const GCS_PUBLIC_HOST: &str = "https://storage.googleapis.com";
const STORAGE_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to obtain storage credentials: {0}")]
    Credentials(String),
    #[error("storage request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("storage returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Storage(e.to_string())
    }
}

/// Cloud Storage JSON API client using Application Default Credentials.
#[derive(Clone)]
pub struct GcsBlobStore {
    http: reqwest::Client,
    tokens: Arc<GoogleAuthTokenGenerator>,
    bucket: String,
}

impl GcsBlobStore {
    /// Resolve credentials the same way the Firestore client does:
    /// `GOOGLE_APPLICATION_CREDENTIALS`, then the gcloud well-known file,
    /// then the metadata server.
    pub async fn new(bucket: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_token_source(bucket, TokenSourceType::Default).await
    }

    pub async fn with_token_source(
        bucket: impl Into<String>,
        source: TokenSourceType,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let tokens = GoogleAuthTokenGenerator::new(source, vec![STORAGE_SCOPE.to_string()])
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load storage credentials: {}", e))?;
        Ok(Self {
            http,
            tokens: Arc::new(tokens),
            bucket: bucket.into(),
        })
    }

    fn public_prefix(&self) -> String {
        format!("{}/{}/", GCS_PUBLIC_HOST, self.bucket)
    }

    /// `Authorization` header value; the generator caches until expiry.
    async fn authorization(&self) -> std::result::Result<String, StorageError> {
        let token = self
            .tokens
            .create_token()
            .await
            .map_err(|e| StorageError::Credentials(e.to_string()))?;
        Ok(token.header_value())
    }

    async fn check(response: reqwest::Response) -> std::result::Result<(), StorageError> {
        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Status { status, body })
    }

    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> std::result::Result<String, StorageError> {
        let authorization = self.authorization().await?;
        let url = format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            GCS_PUBLIC_HOST,
            self.bucket,
            urlencoding::encode(path)
        );
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(format!("{}{}", self.public_prefix(), path))
    }

    async fn delete(&self, path: &str) -> std::result::Result<(), StorageError> {
        let authorization = self.authorization().await?;
        let url = format!(
            "{}/storage/v1/b/{}/o/{}",
            GCS_PUBLIC_HOST,
            self.bucket,
            urlencoding::encode(path)
        );
        let response = self
            .http
            .delete(&url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await?;
        // Already gone is as good as deleted
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response).await
    }
}

/// Stored object in the in-memory blob store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Process-local blob store.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    objects: Arc<DashMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    const PREFIX: &'static str = "memory://avatars/";

    pub fn get(&self, path: &str) -> Option<StoredBlob> {
        self.objects.get(path).map(|b| b.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Where avatar bytes live.
#[derive(Clone)]
pub enum BlobStore {
    Gcs(GcsBlobStore),
    Memory(MemoryBlobStore),
}

impl BlobStore {
    fn url_prefix(&self) -> String {
        match self {
            BlobStore::Gcs(gcs) => gcs.public_prefix(),
            BlobStore::Memory(_) => MemoryBlobStore::PREFIX.to_string(),
        }
    }

    /// Object path for a URL this store produced, or `None` for foreign URLs.
    pub fn path_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.url_prefix())
            .filter(|path| !path.is_empty())
            .map(str::to_string)
    }

    /// Store bytes at `path`, returning a public URL.
    pub async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        match self {
            BlobStore::Gcs(gcs) => Ok(gcs.upload(path, content_type, bytes).await?),
            BlobStore::Memory(mem) => {
                mem.objects.insert(
                    path.to_string(),
                    StoredBlob {
                        content_type: content_type.to_string(),
                        bytes,
                    },
                );
                Ok(format!("{}{}", MemoryBlobStore::PREFIX, path))
            }
        }
    }

    /// Delete the object behind `url`.
    ///
    /// Returns `false` without touching storage when the URL is not ours.
    pub async fn delete_url(&self, url: &str) -> Result<bool> {
        let Some(path) = self.path_for_url(url) else {
            tracing::debug!(url, "Not deleting externally hosted avatar");
            return Ok(false);
        };
        match self {
            BlobStore::Gcs(gcs) => gcs.delete(&path).await?,
            BlobStore::Memory(mem) => {
                mem.objects.remove(&path);
            }
        }
        Ok(true)
    }
}

/// Keep a client-supplied file name safe for use in an object path.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect();
    if cleaned.trim_matches(|c| c == '.' || c == '_').is_empty() {
        "avatar".to_string()
    } else {
        cleaned
    }
}

/// Object path for a new avatar upload.
pub fn avatar_path(uid: &str, millis: i64, file_name: &str) -> String {
    format!("avatars/{}/{}_{}", uid, millis, sanitize_file_name(file_name))
}

#[derive(Clone)]
pub struct AvatarService {
    store: BlobStore,
    profiles: ProfileService,
}

impl AvatarService {
    pub fn new(store: BlobStore, profiles: ProfileService) -> Self {
        Self { store, profiles }
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    /// Upload a new avatar and point the user's profile at it.
    ///
    /// The previous avatar is deleted best-effort if it was ours.
    pub async fn upload(
        &self,
        uid: &str,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UserProfile> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Empty avatar upload".to_string()));
        }
        if bytes.len() > MAX_AVATAR_BYTES {
            return Err(AppError::BadRequest(format!(
                "Avatar exceeds {} bytes",
                MAX_AVATAR_BYTES
            )));
        }
        if !content_type.starts_with("image/") {
            return Err(AppError::BadRequest(format!(
                "Unsupported avatar content type: {}",
                content_type
            )));
        }

        // Fail before uploading if there is no profile to attach the avatar to
        self.profiles.get(uid).await?;

        let path = avatar_path(uid, chrono::Utc::now().timestamp_millis(), file_name);
        let size = bytes.len();
        let url = self.store.upload(&path, content_type, bytes).await?;

        let (profile, previous) = match self.profiles.set_avatar_url(uid, &url).await {
            Ok(result) => result,
            Err(e) => {
                if let Err(cleanup) = self.store.delete_url(&url).await {
                    tracing::warn!(uid, error = %cleanup, "Failed to remove orphaned avatar");
                }
                return Err(e);
            }
        };

        if let Some(previous) = previous.filter(|p| *p != url) {
            if let Err(e) = self.store.delete_url(&previous).await {
                tracing::warn!(uid, url = %previous, error = %e, "Failed to delete previous avatar");
            }
        }

        tracing::info!(uid, path = %path, size, "Avatar uploaded");
        Ok(profile)
    }
}
