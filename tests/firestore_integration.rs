// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (`FIRESTORE_EMULATOR_HOST`); they are skipped otherwise.

use festival_locator::db::{LeaveOutcome, WriteMode};
use festival_locator::models::{Group, LocationType, UserLocation, UserProfile};

mod common;
use common::test_db;

/// Generate a unique ID for test isolation.
fn unique_id(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

fn test_profile(uid: &str) -> UserProfile {
    UserProfile {
        display_name: "Test User".to_string(),
        profile_completed: true,
        created_at: chrono::Utc::now().to_rfc3339(),
        updated_at: chrono::Utc::now().to_rfc3339(),
        ..UserProfile::placeholder(uid)
    }
}

fn test_location(uid: &str, kind: LocationType, time: &str) -> UserLocation {
    UserLocation {
        id: unique_id("loc"),
        user_id: uid.to_string(),
        x: 100.0,
        y: 200.0,
        date: "2025-08-09".to_string(),
        time: time.to_string(),
        end_time: None,
        comment: None,
        location: None,
        location_type: kind,
        is_active: true,
        timestamp: festival_locator::time_utils::now_rfc3339(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PROFILE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_profile_round_trip() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_id("user");

    assert!(db.get_profile(&uid).await.unwrap().is_none());

    let profile = test_profile(&uid);
    db.put_profile(&profile).await.unwrap();

    let stored = db.get_profile(&uid).await.unwrap().unwrap();
    assert_eq!(stored, profile);
}

// ═══════════════════════════════════════════════════════════════════════════
// LOCATION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_replace_current_location_is_exclusive() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_id("user");

    let first = test_location(&uid, LocationType::Current, "09:00");
    let scheduled = test_location(&uid, LocationType::Scheduled, "12:00");
    db.replace_current_location_atomic(&first, WriteMode::Upsert).await.unwrap();
    db.put_user_location(&scheduled).await.unwrap();

    let second = test_location(&uid, LocationType::Current, "10:00");
    let deactivated = db.replace_current_location_atomic(&second, WriteMode::Upsert).await.unwrap();
    assert_eq!(deactivated, 1);

    let all = db.list_user_locations(&uid).await.unwrap();
    let active_current: Vec<_> = all.iter().filter(|l| l.is_active_current()).collect();
    assert_eq!(active_current.len(), 1);
    assert_eq!(active_current[0].id, second.id);
    assert!(all.iter().any(|l| l.id == scheduled.id && l.is_active));

    db.delete_user_location(&first.id).await.unwrap();
    assert!(db.get_user_location(&first.id).await.unwrap().is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// GROUP TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_group_join_and_leave_transactions() {
    require_emulator!();

    let db = test_db().await;
    let admin = unique_id("admin");
    let member = unique_id("member");
    db.put_profile(&test_profile(&admin)).await.unwrap();
    db.put_profile(&test_profile(&member)).await.unwrap();

    let now = festival_locator::time_utils::now_rfc3339();
    let group = Group {
        id: unique_id("group"),
        name: "Crew".to_string(),
        code: unique_id("C").chars().rev().take(6).collect(),
        created_by: admin.clone(),
        member_count: 1,
        created_at: now.clone(),
        updated_at: now,
    };
    db.create_group_atomic(&group, &admin).await.unwrap();

    let found = db.find_group_by_code(&group.code).await.unwrap().unwrap();
    assert_eq!(found.id, group.id);

    let joined = db.join_group_atomic(&group.id, &member).await.unwrap();
    assert_eq!(joined.member_count, 2);
    let profile = db.get_profile(&member).await.unwrap().unwrap();
    assert!(profile.is_member_of(&group.id));

    let outcome = db.leave_group_atomic(&group.id, &admin).await.unwrap();
    assert_eq!(outcome, LeaveOutcome::Left { remaining: 1 });

    let outcome = db.leave_group_atomic(&group.id, &member).await.unwrap();
    assert_eq!(outcome, LeaveOutcome::GroupDeleted);
    assert!(db.get_group(&group.id).await.unwrap().is_none());

    let profile = db.get_profile(&member).await.unwrap().unwrap();
    assert!(profile.group_ids.is_empty());
}

#[tokio::test]
async fn test_concurrent_current_writes_keep_one_active() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_id("user");

    let first = test_location(&uid, LocationType::Current, "09:00");
    let second = test_location(&uid, LocationType::Current, "09:05");
    let (a, b) = tokio::join!(
        db.replace_current_location_atomic(&first, WriteMode::Upsert),
        db.replace_current_location_atomic(&second, WriteMode::Upsert)
    );
    a.unwrap();
    b.unwrap();

    let all = db.list_user_locations(&uid).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all.iter().filter(|l| l.is_active_current()).count(), 1);
}

#[tokio::test]
async fn test_concurrent_leaves_count_every_member() {
    require_emulator!();

    let db = test_db().await;
    let admin = unique_id("admin");
    let first = unique_id("member");
    let second = unique_id("member");
    for uid in [&admin, &first, &second] {
        db.put_profile(&test_profile(uid)).await.unwrap();
    }

    let now = festival_locator::time_utils::now_rfc3339();
    let group = Group {
        id: unique_id("group"),
        name: "Crew".to_string(),
        code: unique_id("C").chars().rev().take(6).collect(),
        created_by: admin.clone(),
        member_count: 1,
        created_at: now.clone(),
        updated_at: now,
    };
    db.create_group_atomic(&group, &admin).await.unwrap();
    db.join_group_atomic(&group.id, &first).await.unwrap();
    db.join_group_atomic(&group.id, &second).await.unwrap();

    let (a, b) = tokio::join!(
        db.leave_group_atomic(&group.id, &first),
        db.leave_group_atomic(&group.id, &second)
    );
    a.unwrap();
    b.unwrap();

    let stored = db.get_group(&group.id).await.unwrap().unwrap();
    assert_eq!(stored.member_count, 1);
}

#[tokio::test]
async fn test_update_after_delete_is_not_found() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_id("user");
    let scheduled = test_location(&uid, LocationType::Scheduled, "12:00");
    db.put_user_location(&scheduled).await.unwrap();
    db.delete_user_location(&scheduled.id).await.unwrap();

    let result = db.update_user_location(&scheduled).await;
    assert!(matches!(
        result,
        Err(festival_locator::error::AppError::NotFound(_))
    ));
    assert!(db.get_user_location(&scheduled.id).await.unwrap().is_none());
}
