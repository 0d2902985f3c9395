// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile loading with retry.
//!
//! The profile row is created by a signup hook on the identity side, so it
//! can lag the first session by a moment. The loader polls for it a bounded
//! number of times before giving up.

use crate::db::ProfileStore;
use crate::models::Profile;
use crate::time_utils::Clock;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PROFILE_ATTEMPTS: u32 = 5;
pub const DEFAULT_PROFILE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// How many lookups to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total lookups, including the first. At least 1.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_PROFILE_ATTEMPTS,
            delay: DEFAULT_PROFILE_RETRY_DELAY,
        }
    }
}

/// Fetches a user's profile, retrying while it does not exist yet.
#[derive(Clone)]
pub struct ProfileLoader {
    store: Arc<dyn ProfileStore>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl ProfileLoader {
    pub fn new(store: Arc<dyn ProfileStore>, clock: Arc<dyn Clock>, policy: RetryPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Load the profile for `user_id`.
    ///
    /// "Not found" is retried after `policy.delay`, up to `policy.max_attempts`
    /// lookups in total. A store error ends the load at once. Both outcomes
    /// return `None`; callers never see an error.
    pub async fn load(&self, user_id: &str) -> Option<Profile> {
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            match self.store.get_profile(user_id).await {
                Ok(Some(profile)) => {
                    if attempt > 1 {
                        tracing::debug!(user_id, attempt, "Profile found after retry");
                    }
                    return Some(profile);
                }
                Ok(None) if attempt < attempts => {
                    tracing::debug!(user_id, attempt, "Profile not found yet, retrying");
                    self.clock.sleep(self.policy.delay).await;
                }
                Ok(None) => {
                    tracing::warn!(user_id, attempts, "Profile not found after retries");
                }
                Err(e) => {
                    tracing::error!(user_id, error = %e, "Failed to load profile");
                    return None;
                }
            }
        }

        None
    }
}
