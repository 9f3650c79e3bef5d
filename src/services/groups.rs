// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Group membership.
//!
//! Membership lives on `UserProfile::group_ids` while the group keeps only a
//! member count. Every join and leave updates both in one transaction, and the
//! last member leaving deletes the group in that same transaction.

use crate::db::{new_document_id, Database, LeaveOutcome};
use crate::error::{AppError, Result};
use crate::models::group::{normalize_code, GroupInput, JoinGroupInput};
use crate::models::Group;
use crate::services::profiles::ProfileCache;
use crate::time_utils::now_rfc3339;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use validator::Validate;

/// Length of a join code.
pub const CODE_LENGTH: usize = 6;

const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Source of candidate join codes.
pub type CodeSource = Arc<dyn Fn() -> Result<String> + Send + Sync>;

/// Random uppercase alphanumeric join code.
pub fn generate_code() -> Result<String> {
    let rng = SystemRandom::new();
    let mut code = String::with_capacity(CODE_LENGTH);
    let mut buf = [0u8; 16];

    while code.len() < CODE_LENGTH {
        rng.fill(&mut buf)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
        // Reject bytes past the largest multiple of 36 to keep the draw uniform
        for &b in buf.iter().filter(|&&b| b < 252) {
            if code.len() == CODE_LENGTH {
                break;
            }
            code.push(char::from(CODE_ALPHABET[usize::from(b) % CODE_ALPHABET.len()]));
        }
    }
    Ok(code)
}

#[derive(Clone)]
pub struct GroupService {
    db: Database,
    profiles: ProfileCache,
    codes: CodeSource,
}

impl GroupService {
    pub fn new(db: Database, profiles: ProfileCache) -> Self {
        Self::with_code_source(db, profiles, Arc::new(generate_code))
    }

    pub fn with_code_source(db: Database, profiles: ProfileCache, codes: CodeSource) -> Self {
        Self {
            db,
            profiles,
            codes,
        }
    }

    /// Draw codes until one is not already taken.
    ///
    /// There is no retry bound; with 36^6 codes and a handful of groups a
    /// collision is rare.
    async fn unused_code(&self) -> Result<String> {
        loop {
            let code = (self.codes)()?;
            match self.db.find_group_by_code(&code).await? {
                None => return Ok(code),
                Some(existing) => {
                    tracing::debug!(code = %code, group_id = %existing.id, "Join code collision, retrying");
                }
            }
        }
    }

    /// Create a group with `creator_uid` as its first member.
    pub async fn create_group(&self, creator_uid: &str, input: GroupInput) -> Result<Group> {
        let input = GroupInput {
            name: input.name.trim().to_string(),
        };
        input.validate()?;

        let code = self.unused_code().await?;
        let now = now_rfc3339();
        let group = Group {
            id: new_document_id()?,
            name: input.name,
            code,
            created_by: creator_uid.to_string(),
            member_count: 1,
            created_at: now.clone(),
            updated_at: now,
        };

        self.db.create_group_atomic(&group, creator_uid).await?;
        self.refresh_profile(creator_uid).await;

        tracing::info!(group_id = %group.id, code = %group.code, creator = creator_uid, "Group created");
        Ok(group)
    }

    /// Join the group whose code matches (case-insensitively).
    pub async fn join_by_code(&self, uid: &str, input: JoinGroupInput) -> Result<Group> {
        let input = JoinGroupInput {
            code: normalize_code(&input.code),
        };
        input.validate()?;

        let group = self
            .db
            .find_group_by_code(&input.code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group with code {}", input.code)))?;

        let group = self.db.join_group_atomic(&group.id, uid).await?;
        self.refresh_profile(uid).await;
        Ok(group)
    }

    pub async fn leave(&self, uid: &str, group_id: &str) -> Result<LeaveOutcome> {
        let outcome = self.db.leave_group_atomic(group_id, uid).await?;
        self.refresh_profile(uid).await;

        if outcome == LeaveOutcome::GroupDeleted {
            tracing::info!(group_id, "Last member left, group deleted");
        }
        Ok(outcome)
    }

    /// Groups the user currently belongs to. Dangling ids are skipped.
    pub async fn groups_for(&self, uid: &str) -> Result<Vec<Group>> {
        let Some(profile) = self.db.get_profile(uid).await? else {
            return Ok(Vec::new());
        };

        let mut groups = Vec::with_capacity(profile.group_ids.len());
        for group_id in &profile.group_ids {
            match self.db.get_group(group_id).await? {
                Some(group) => groups.push(group),
                None => tracing::debug!(uid, group_id = %group_id, "Profile references missing group"),
            }
        }
        Ok(groups)
    }

    /// Reload a profile after a membership change so the cache reflects it.
    async fn refresh_profile(&self, uid: &str) {
        match self.db.get_profile(uid).await {
            Ok(Some(profile)) => self.profiles.store(profile),
            Ok(None) => {}
            Err(e) => tracing::warn!(uid, error = %e, "Failed to refresh cached profile"),
        }
    }
}
