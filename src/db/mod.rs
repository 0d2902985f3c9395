//! Database layer (Firestore, with an in-memory backend for local runs and tests).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AppError;
use crate::models::{CheckinInput, DailyCheckin, Profile};

/// Collection names as constants.
pub mod collections {
    /// User profiles (keyed by identity user ID)
    pub const PROFILES: &str = "profiles";
    /// Daily check-ins (keyed by `{user_id}_{date}`)
    pub const DAILY_CHECKINS: &str = "daily_checkins";
}

/// Read access to user profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError>;
}

/// Storage for daily check-ins.
#[async_trait]
pub trait CheckinStore: Send + Sync {
    /// Insert or overwrite the check-in for `(user_id, checkin_date)` and
    /// return the stored row.
    async fn upsert_checkin(
        &self,
        user_id: &str,
        checkin_date: NaiveDate,
        input: &CheckinInput,
        now: DateTime<Utc>,
    ) -> Result<DailyCheckin, AppError>;

    async fn get_checkin(
        &self,
        user_id: &str,
        checkin_date: NaiveDate,
    ) -> Result<Option<DailyCheckin>, AppError>;

    /// Check-ins for a user, newest date first. `since` is inclusive.
    async fn list_checkins(
        &self,
        user_id: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<DailyCheckin>, AppError>;
}
