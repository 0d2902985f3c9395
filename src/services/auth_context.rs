// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side session state.
//!
//! [`AuthContext`] owns the signed-in session, the user and their profile,
//! and publishes them as [`AuthSnapshot`]s on a watch channel. It follows the
//! identity provider's session-change events for as long as it is alive.
//!
//! Profile loads run as separate tasks. Each load takes a generation number
//! and only the load holding the latest generation may commit, so a slow
//! load for a previous session never overwrites a newer result.

use crate::models::user::display_name;
use crate::models::{Profile, Session, User};
use crate::services::identity::{AuthError, AuthEvent, IdentityProvider, SignUpOutcome};
use crate::services::profile::ProfileLoader;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Point-in-time view of the session state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthSnapshot {
    pub session: Option<Session>,
    pub user: Option<User>,
    pub profile: Option<Profile>,
    /// True until the initial session (and its profile) is resolved.
    pub loading: bool,
    pub profile_loading: bool,
}

impl AuthSnapshot {
    pub fn display_name(&self) -> String {
        display_name(self.profile.as_ref(), self.user.as_ref())
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.profile.as_ref().and_then(|p| p.avatar_url.as_deref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading || self.profile_loading
    }
}

struct Shared {
    identity: Arc<dyn IdentityProvider>,
    loader: ProfileLoader,
    state: watch::Sender<AuthSnapshot>,
    generation: AtomicU64,
    alive: AtomicBool,
}

impl Shared {
    /// Start a new profile load generation. Called with the state lock held.
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replace session and user. With a user, a profile load is started;
    /// without one, the profile is cleared. `settle` ends the `loading`
    /// phase now rather than when the profile arrives.
    fn apply_session(self: &Arc<Self>, session: Option<Session>, settle: bool) {
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }

        let user = session.as_ref().map(|s| s.user.clone());
        let user_id = user.as_ref().map(|u| u.id.clone());

        let mut generation = 0;
        self.state.send_modify(|s| {
            s.session = session;
            s.user = user;
            generation = self.next_generation();
            if user_id.is_some() {
                s.profile_loading = true;
                if settle {
                    s.loading = false;
                }
            } else {
                s.profile = None;
                s.profile_loading = false;
                s.loading = false;
            }
        });

        if let Some(user_id) = user_id {
            let shared = Arc::clone(self);
            tokio::spawn(async move {
                let profile = shared.loader.load(&user_id).await;
                shared.commit_profile(generation, profile);
            });
        }
    }

    /// Store a loaded profile if the load is still current.
    fn commit_profile(&self, generation: u64, profile: Option<Profile>) -> bool {
        self.state.send_if_modified(|s| {
            if !self.alive.load(Ordering::SeqCst) {
                return false;
            }
            if self.generation.load(Ordering::SeqCst) != generation {
                tracing::debug!(generation, "Discarding stale profile load");
                return false;
            }
            s.profile = profile;
            s.profile_loading = false;
            s.loading = false;
            true
        })
    }

    fn clear_profile(&self) {
        self.state.send_if_modified(|s| {
            if !self.alive.load(Ordering::SeqCst) {
                return false;
            }
            self.next_generation();
            s.profile = None;
            s.profile_loading = false;
            true
        });
    }

    async fn resync(self: &Arc<Self>) {
        match self.identity.get_session().await {
            Ok(session) => self.apply_session(session, true),
            Err(e) => tracing::warn!(error = %e, "Failed to resync session"),
        }
    }

    async fn run(self: Arc<Self>, mut events: broadcast::Receiver<AuthEvent>) {
        let session = match self.identity.get_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch initial session");
                None
            }
        };
        self.apply_session(session, false);

        loop {
            match events.recv().await {
                Ok(event) => {
                    tracing::debug!(kind = ?event.kind, "Session change");
                    self.apply_session(event.session, true);
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Missed session events, resyncing");
                    self.resync().await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

/// Session state holder for one client.
pub struct AuthContext {
    shared: Arc<Shared>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl AuthContext {
    /// Subscribe to session changes, then fetch the current session.
    ///
    /// Returns at once; the snapshot reports `loading` until bootstrap
    /// completes. Must be called inside a Tokio runtime.
    pub fn start(identity: Arc<dyn IdentityProvider>, loader: ProfileLoader) -> Self {
        let events = identity.subscribe();
        let (state, _) = watch::channel(AuthSnapshot {
            loading: true,
            ..Default::default()
        });

        let shared = Arc::new(Shared {
            identity,
            loader,
            state,
            generation: AtomicU64::new(0),
            alive: AtomicBool::new(true),
        });

        let listener = tokio::spawn(Arc::clone(&shared).run(events));

        Self {
            shared,
            listener: Mutex::new(Some(listener)),
        }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.shared.state.subscribe()
    }

    /// Reload the current user's profile. No-op when signed out.
    pub async fn refresh_profile(&self) {
        let user_id = self.shared.state.borrow().user.as_ref().map(|u| u.id.clone());
        let Some(user_id) = user_id else {
            return;
        };

        let mut generation = 0;
        self.shared.state.send_modify(|s| {
            generation = self.shared.next_generation();
            s.profile_loading = true;
        });

        let profile = self.shared.loader.load(&user_id).await;
        self.shared.commit_profile(generation, profile);
    }

    /// The resulting session reaches the snapshot through the sign-in event.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.shared
            .identity
            .sign_in_with_password(email, password)
            .await
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError> {
        self.shared.identity.sign_up(email, password, full_name).await
    }

    /// Sign out. The cached profile is cleared only if the provider accepts.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.shared.identity.sign_out().await?;
        self.shared.clear_profile();
        Ok(())
    }

    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::SeqCst)
    }

    /// Stop following session changes. Later completions are ignored.
    pub fn shutdown(&self) {
        self.shared.alive.store(false, Ordering::SeqCst);
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserMetadata;
    use chrono::Utc;

    fn user(email: Option<&str>, full_name: Option<&str>) -> User {
        User {
            id: "u1".to_string(),
            email: email.map(str::to_string),
            user_metadata: UserMetadata {
                full_name: full_name.map(str::to_string),
            },
        }
    }

    #[test]
    fn test_snapshot_display_name_fallbacks() {
        let mut snap = AuthSnapshot {
            user: Some(user(Some("ana.lima@example.com"), None)),
            ..Default::default()
        };
        assert_eq!(snap.display_name(), "ana.lima");

        snap.user = Some(user(Some("ana.lima@example.com"), Some("Ana Lima")));
        assert_eq!(snap.display_name(), "Ana Lima");

        snap.profile = Some(Profile::new("u1", Some("Dr. Ana".to_string()), Utc::now()));
        assert_eq!(snap.display_name(), "Dr. Ana");

        assert_eq!(AuthSnapshot::default().display_name(), "User");
    }

    #[test]
    fn test_snapshot_flags() {
        let mut snap = AuthSnapshot::default();
        assert!(!snap.is_authenticated());
        assert!(!snap.is_loading());

        snap.profile_loading = true;
        assert!(snap.is_loading());

        snap.user = Some(user(None, None));
        assert!(snap.is_authenticated());

        let mut profile = Profile::new("u1", None, Utc::now());
        profile.avatar_url = Some("https://cdn.example.com/a.png".to_string());
        snap.profile = Some(profile);
        assert_eq!(snap.avatar_url(), Some("https://cdn.example.com/a.png"));
    }
}
