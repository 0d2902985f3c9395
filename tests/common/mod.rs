// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use pulse_tracker::config::Config;
use pulse_tracker::db::{CheckinStore, FirestoreDb, MemoryDb, ProfileStore};
use pulse_tracker::error::AppError;
use pulse_tracker::middleware::auth::create_jwt;
use pulse_tracker::models::{CheckinInput, DailyCheckin, Profile, Session, User, UserMetadata};
use pulse_tracker::routes::create_router;
use pulse_tracker::services::{
    AuthError, AuthEvent, AuthSnapshot, IdentityProvider, SignUpOutcome,
};
use pulse_tracker::time_utils::ManualClock;
use pulse_tracker::AppState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch, Notify};

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

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// The fixed "today" used by test apps.
#[allow(dead_code)]
pub fn test_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

/// Test app over the in-memory store and a manual clock.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: Arc<MemoryDb>,
    pub clock: Arc<ManualClock>,
}

#[allow(dead_code)]
impl TestApp {
    /// Access token for `user_id`, signed with the app's key.
    pub fn token(&self, user_id: &str) -> String {
        create_jwt(
            user_id,
            Some("ana@example.com"),
            None,
            &self.state.config.jwt_signing_key,
        )
        .unwrap()
    }
}

#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let db = Arc::new(MemoryDb::new());
    let clock = Arc::new(ManualClock::at_date(test_today()));
    let state = Arc::new(AppState::new(
        Config::test_default(),
        db.clone(),
        clock.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        clock,
    }
}

#[allow(dead_code)]
pub fn checkin_input(energy: u8) -> CheckinInput {
    CheckinInput {
        energy_level: energy,
        sleep_quality: 6,
        mood_score: 7,
        fatigue_level: 3,
        notes: None,
        pain: vec![],
    }
}

#[allow(dead_code)]
pub fn session_for(user_id: &str, full_name: Option<&str>) -> Session {
    Session {
        access_token: format!("access-{}", user_id),
        refresh_token: format!("refresh-{}", user_id),
        expires_at: Utc::now() + Duration::hours(1),
        user: User {
            id: user_id.to_string(),
            email: Some(format!("{}@example.com", user_id)),
            user_metadata: UserMetadata {
                full_name: full_name.map(str::to_string),
            },
        },
    }
}

/// Wait until the snapshot satisfies `pred`, failing the test after 5 s.
#[allow(dead_code)]
pub async fn wait_for_snapshot(
    rx: &mut watch::Receiver<AuthSnapshot>,
    pred: impl FnMut(&AuthSnapshot) -> bool,
) -> AuthSnapshot {
    tokio::time::timeout(std::time::Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("timed out waiting for snapshot")
        .expect("auth context dropped")
        .clone()
}

// ─── Fake identity provider ─────────────────────────────────

/// Scriptable identity provider that emits events like the real one.
#[allow(dead_code)]
pub struct FakeIdentity {
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    pub get_session_error: Mutex<Option<AuthError>>,
    pub sign_out_error: Mutex<Option<AuthError>>,
    pub get_session_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeIdentity {
    pub fn new(session: Option<Session>) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            session: Mutex::new(session),
            events,
            get_session_error: Mutex::new(None),
            sign_out_error: Mutex::new(None),
            get_session_calls: AtomicUsize::new(0),
        })
    }

    /// Replace the session and announce it, as a sign-in elsewhere would.
    pub fn emit_signed_in(&self, session: Session) {
        *self.session.lock().unwrap() = Some(session.clone());
        let _ = self.events.send(AuthEvent::signed_in(session));
    }

    pub fn emit_signed_out(&self) {
        *self.session.lock().unwrap() = None;
        let _ = self.events.send(AuthEvent::signed_out());
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        self.get_session_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.get_session_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.session.lock().unwrap().clone())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        if password != "correct-password" {
            return Err(AuthError::Api {
                status: 400,
                message: "Invalid login credentials".to_string(),
            });
        }
        let user_id = email.split('@').next().unwrap_or(email);
        let session = session_for(user_id, None);
        self.emit_signed_in(session.clone());
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError> {
        let user_id = email.split('@').next().unwrap_or(email);
        let session = session_for(user_id, full_name);
        self.emit_signed_in(session.clone());
        Ok(SignUpOutcome::SignedIn { session })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(err) = self.sign_out_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.emit_signed_out();
        Ok(())
    }

    async fn refresh_session(&self) -> Result<Session, AuthError> {
        let session = self
            .session
            .lock()
            .unwrap()
            .clone()
            .ok_or(AuthError::NoSession)?;
        let _ = self.events.send(AuthEvent::token_refreshed(session.clone()));
        Ok(session)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

// ─── Store fakes ────────────────────────────────────────────

/// Profile store whose lookups for gated users block until released.
#[allow(dead_code)]
#[derive(Default)]
pub struct GatedProfileStore {
    profiles: Mutex<HashMap<String, Profile>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl GatedProfileStore {
    pub fn insert(&self, user_id: &str, full_name: &str) {
        self.profiles.lock().unwrap().insert(
            user_id.to_string(),
            Profile::new(user_id, Some(full_name.to_string()), Utc::now()),
        );
    }

    /// Hold lookups for `user_id` until [`GatedProfileStore::release`].
    pub fn gate(&self, user_id: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(user_id.to_string(), Arc::new(Notify::new()));
    }

    pub fn release(&self, user_id: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(user_id) {
            gate.notify_one();
        }
    }
}

#[async_trait]
impl ProfileStore for GatedProfileStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().get(user_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.profiles.lock().unwrap().get(user_id).cloned())
    }
}

/// Check-in store that counts calls before delegating to a [`MemoryDb`].
#[allow(dead_code)]
#[derive(Default)]
pub struct CountingCheckinStore {
    pub inner: MemoryDb,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl CountingCheckinStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CheckinStore for CountingCheckinStore {
    async fn upsert_checkin(
        &self,
        user_id: &str,
        checkin_date: NaiveDate,
        input: &CheckinInput,
        now: chrono::DateTime<Utc>,
    ) -> Result<DailyCheckin, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .upsert_checkin(user_id, checkin_date, input, now)
            .await
    }

    async fn get_checkin(
        &self,
        user_id: &str,
        checkin_date: NaiveDate,
    ) -> Result<Option<DailyCheckin>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_checkin(user_id, checkin_date).await
    }

    async fn list_checkins(
        &self,
        user_id: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<DailyCheckin>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_checkins(user_id, since).await
    }
}
