// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profiles, including group membership)
//! - Groups (join codes and member counts)
//! - User locations (current/scheduled pins)
//! - Locations (legacy friend pins)

use super::{LeaveOutcome, WriteMode};
use crate::db::collections;
use crate::error::AppError;
use crate::models::{FriendPin, Group, UserLocation, UserProfile};
use crate::time_utils::now_rfc3339;
use firestore::errors::{BackoffError, FirestoreError};

fn transaction_failed(e: FirestoreError) -> AppError {
    AppError::Database(format!("Transaction failed: {}", e))
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: firestore::FirestoreDb,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── Profiles ────────────────────────────────────────────────

    pub async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn put_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&profile.uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Groups ──────────────────────────────────────────────────

    pub async fn get_group(&self, group_id: &str) -> Result<Option<Group>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::GROUPS)
            .obj()
            .one(group_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn find_group_by_code(&self, code: &str) -> Result<Option<Group>, AppError> {
        let code = code.to_string();
        let groups: Vec<Group> = self
            .client
            .fluent()
            .select()
            .from(collections::GROUPS)
            .filter(move |q| q.field("code").eq(code.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(groups.into_iter().next())
    }

    /// Atomically store a new group and record the creator's membership.
    pub async fn create_group_atomic(&self, group: &Group, creator_uid: &str) -> Result<(), AppError> {
        let group = group.clone();
        let creator_uid = creator_uid.to_string();

        self.client
            .run_transaction(|db, transaction| {
                let group = group.clone();
                let creator_uid = creator_uid.clone();
                Box::pin(async move {
                    let profile: Option<UserProfile> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&creator_uid)
                        .await?;
                    let Some(mut profile) = profile else {
                        return Ok(Err(AppError::NotFound(format!(
                            "User {} not found",
                            creator_uid
                        ))));
                    };
                    if !profile.is_member_of(&group.id) {
                        profile.group_ids.push(group.id.clone());
                    }
                    profile.updated_at = group.created_at.clone();

                    db.fluent()
                        .update()
                        .in_col(collections::GROUPS)
                        .document_id(&group.id)
                        .object(&group)
                        .add_to_transaction(transaction)?;

                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&profile.uid)
                        .object(&profile)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(Ok(()))
                })
            })
            .await
            .map_err(transaction_failed)?
    }

    /// Atomically increment the member count and record membership.
    pub async fn join_group_atomic(&self, group_id: &str, uid: &str) -> Result<Group, AppError> {
        let group_id = group_id.to_string();
        let uid = uid.to_string();

        let group = self
            .client
            .run_transaction(|db, transaction| {
                let group_id = group_id.clone();
                let uid = uid.clone();
                Box::pin(async move {
                    let group: Option<Group> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::GROUPS)
                        .obj()
                        .one(&group_id)
                        .await?;
                    let profile: Option<UserProfile> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&uid)
                        .await?;

                    let (mut group, mut profile) = match (group, profile) {
                        (Some(g), Some(p)) => (g, p),
                        (None, _) => {
                            return Ok(Err(AppError::NotFound(format!(
                                "Group {} not found",
                                group_id
                            ))))
                        }
                        (_, None) => {
                            return Ok(Err(AppError::NotFound(format!("User {} not found", uid))))
                        }
                    };

                    if profile.is_member_of(&group_id) {
                        return Ok(Err(AppError::Conflict(format!(
                            "Already a member of {}",
                            group_id
                        ))));
                    }

                    let now = now_rfc3339();
                    group.member_count += 1;
                    group.updated_at = now.clone();
                    profile.group_ids.push(group_id.clone());
                    profile.updated_at = now;

                    db.fluent()
                        .update()
                        .in_col(collections::GROUPS)
                        .document_id(&group_id)
                        .object(&group)
                        .add_to_transaction(transaction)?;

                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&uid)
                        .object(&profile)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(Ok(group))
                })
            })
            .await
            .map_err(transaction_failed)??;

        tracing::info!(
            group_id = %group_id,
            uid = %uid,
            member_count = group.member_count,
            "Joined group"
        );

        Ok(group)
    }

    /// Atomically drop membership, decrementing or deleting the group.
    pub async fn leave_group_atomic(
        &self,
        group_id: &str,
        uid: &str,
    ) -> Result<LeaveOutcome, AppError> {
        let group_id = group_id.to_string();
        let uid = uid.to_string();

        let outcome = self
            .client
            .run_transaction(|db, transaction| {
                let group_id = group_id.clone();
                let uid = uid.clone();
                Box::pin(async move {
                    let profile: Option<UserProfile> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&uid)
                        .await?;
                    let Some(mut profile) = profile else {
                        return Ok(Err(AppError::NotFound(format!("User {} not found", uid))));
                    };
                    if !profile.is_member_of(&group_id) {
                        return Ok(Err(AppError::NotFound(format!(
                            "Not a member of {}",
                            group_id
                        ))));
                    }

                    let group: Option<Group> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::GROUPS)
                        .obj()
                        .one(&group_id)
                        .await?;

                    let now = now_rfc3339();
                    let outcome = match group {
                        None => LeaveOutcome::GroupMissing,
                        Some(group) if group.member_count <= 1 => {
                            db.fluent()
                                .delete()
                                .from(collections::GROUPS)
                                .document_id(&group_id)
                                .add_to_transaction(transaction)?;
                            LeaveOutcome::GroupDeleted
                        }
                        Some(mut group) => {
                            group.member_count -= 1;
                            group.updated_at = now.clone();
                            db.fluent()
                                .update()
                                .in_col(collections::GROUPS)
                                .document_id(&group_id)
                                .object(&group)
                                .add_to_transaction(transaction)?;
                            LeaveOutcome::Left {
                                remaining: group.member_count,
                            }
                        }
                    };

                    profile.group_ids.retain(|g| *g != group_id);
                    profile.updated_at = now;

                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&uid)
                        .object(&profile)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(Ok(outcome))
                })
            })
            .await
            .map_err(transaction_failed)??;

        tracing::info!(group_id = %group_id, uid = %uid, outcome = ?outcome, "Left group");

        Ok(outcome)
    }

    // ─── User Locations ──────────────────────────────────────────

    pub async fn get_user_location(&self, id: &str) -> Result<Option<UserLocation>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USER_LOCATIONS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list_active_user_locations(&self) -> Result<Vec<UserLocation>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::USER_LOCATIONS)
            .filter(|q| q.field("isActive").eq(true))
            .order_by([("timestamp", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list_user_locations(&self, uid: &str) -> Result<Vec<UserLocation>, AppError> {
        let uid = uid.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::USER_LOCATIONS)
            .filter(move |q| q.field("userId").eq(uid.clone()))
            .order_by([("timestamp", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Deactivate the owner's other active `current` locations and write
    /// this one. The lookup runs inside the transaction, so a concurrent
    /// writer forces a retry instead of leaving two active records.
    pub async fn replace_current_location_atomic(
        &self,
        location: &UserLocation,
        mode: WriteMode,
    ) -> Result<usize, AppError> {
        let location = location.clone();

        self.client
            .run_transaction(|db, transaction| {
                let location = location.clone();
                Box::pin(async move {
                    if mode == WriteMode::MustExist {
                        let existing: Option<UserLocation> = db
                            .fluent()
                            .select()
                            .by_id_in(collections::USER_LOCATIONS)
                            .obj()
                            .one(&location.id)
                            .await?;
                        if existing.is_none() {
                            return Ok(Err(AppError::NotFound(format!(
                                "Location {}",
                                location.id
                            ))));
                        }
                    }

                    let uid = location.user_id.clone();
                    let superseded: Vec<UserLocation> = db
                        .fluent()
                        .select()
                        .from(collections::USER_LOCATIONS)
                        .filter(move |q| {
                            q.for_all([
                                q.field("userId").eq(uid.clone()),
                                q.field("isActive").eq(true),
                                q.field("locationType").eq("current"),
                            ])
                        })
                        .obj()
                        .query()
                        .await?;

                    let mut deactivated = 0;
                    for mut previous in superseded {
                        if previous.id == location.id {
                            continue;
                        }
                        previous.is_active = false;
                        db.fluent()
                            .update()
                            .in_col(collections::USER_LOCATIONS)
                            .document_id(&previous.id)
                            .object(&previous)
                            .add_to_transaction(transaction)?;
                        deactivated += 1;
                    }

                    db.fluent()
                        .update()
                        .in_col(collections::USER_LOCATIONS)
                        .document_id(&location.id)
                        .object(&location)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(Ok(deactivated))
                })
            })
            .await
            .map_err(transaction_failed)?
    }

    pub async fn put_user_location(&self, location: &UserLocation) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USER_LOCATIONS)
            .document_id(&location.id)
            .object(location)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn update_user_location(&self, location: &UserLocation) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USER_LOCATIONS)
            .precondition(firestore::FirestoreWritePrecondition::Exists(true))
            .document_id(&location.id)
            .object(location)
            .execute()
            .await
            .map_err(|e| match e {
                FirestoreError::DataNotFoundError(_) => {
                    AppError::NotFound(format!("Location {}", location.id))
                }
                other => AppError::Database(other.to_string()),
            })?;
        Ok(())
    }

    pub async fn delete_user_location(&self, id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collections::USER_LOCATIONS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Friend Pins ─────────────────────────────────────────────

    pub async fn get_pin(&self, id: &str) -> Result<Option<FriendPin>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::LOCATIONS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list_pins(&self, uid: Option<&str>) -> Result<Vec<FriendPin>, AppError> {
        let query = self
            .client
            .fluent()
            .select()
            .from(collections::LOCATIONS);

        let query = if let Some(uid) = uid {
            let uid = uid.to_string();
            query.filter(move |q| q.field("userId").eq(uid.clone()))
        } else {
            query
        };

        query
            .order_by([("timestamp", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn put_pin(&self, pin: &FriendPin) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::LOCATIONS)
            .document_id(&pin.id)
            .object(pin)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn delete_pin(&self, id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collections::LOCATIONS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
