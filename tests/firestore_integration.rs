// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST set); otherwise they are skipped.

use chrono::{Duration, NaiveDate, Utc};
use pulse_tracker::db::{CheckinStore, ProfileStore};
use pulse_tracker::models::Profile;

mod common;
use common::{checkin_input, test_db};

/// Unique user ID for test isolation.
fn unique_user_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("user-{}", nanos)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// PROFILE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_profile_roundtrip() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();

    assert!(db.get_profile(&user_id).await.unwrap().is_none());

    let mut profile = Profile::new(&user_id, Some("Ana Lima".to_string()), Utc::now());
    profile.timezone = Some("America/Sao_Paulo".to_string());
    db.set_profile(&profile).await.unwrap();

    let stored = db.get_profile(&user_id).await.unwrap().unwrap();
    assert_eq!(stored.full_name.as_deref(), Some("Ana Lima"));
    assert_eq!(stored.timezone.as_deref(), Some("America/Sao_Paulo"));
}

// ═══════════════════════════════════════════════════════════════════════════
// CHECK-IN TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_upsert_keeps_one_row_per_day() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();
    let now = Utc::now();

    let first = db
        .upsert_checkin(&user_id, day(10), &checkin_input(6), now)
        .await
        .unwrap();
    assert!(first.is_new());

    let second = db
        .upsert_checkin(
            &user_id,
            day(10),
            &checkin_input(8),
            now + Duration::minutes(5),
        )
        .await
        .unwrap();
    assert!(!second.is_new());
    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);

    let stored = db.get_checkin(&user_id, day(10)).await.unwrap().unwrap();
    assert_eq!(stored.energy_level, 8);

    let all = db.list_checkins(&user_id, None).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_list_since_date_descending() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();
    let now = Utc::now();

    for d in [1, 8, 15, 20] {
        db.upsert_checkin(&user_id, day(d), &checkin_input(5), now)
            .await
            .unwrap();
    }

    let since = db.list_checkins(&user_id, Some(day(8))).await.unwrap();
    let dates: Vec<NaiveDate> = since.iter().map(|c| c.checkin_date).collect();
    assert_eq!(dates, vec![day(20), day(15), day(8)]);
}

#[tokio::test]
async fn test_concurrent_same_day_upserts_create_once() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();
    let now = Utc::now();

    let input_a = checkin_input(4);
    let input_b = checkin_input(9);
    let (a, b) = tokio::join!(
        db.upsert_checkin(&user_id, day(12), &input_a, now),
        db.upsert_checkin(
            &user_id,
            day(12),
            &input_b,
            now + Duration::seconds(1)
        ),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    // Exactly one writer created the row; the other saw it and kept created_at
    assert_ne!(a.is_new(), b.is_new());
    assert_eq!(a.created_at, b.created_at);

    let all = db.list_checkins(&user_id, None).await.unwrap();
    assert_eq!(all.len(), 1);
}
