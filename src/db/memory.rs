// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store for local runs and tests.

use crate::db::{CheckinStore, ProfileStore};
use crate::error::AppError;
use crate::models::{CheckinInput, DailyCheckin, Profile};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Process-local store with the same keys as Firestore.
#[derive(Default)]
pub struct MemoryDb {
    profiles: DashMap<String, Profile>,
    checkins: DashMap<String, DailyCheckin>,
    unavailable: AtomicBool,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.profiles.insert(profile.id.clone(), profile);
    }

    /// Make every operation fail as if the backend were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn checkin_count(&self) -> usize {
        self.checkins.len()
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Database("Store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryDb {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        self.check_available()?;
        Ok(self.profiles.get(user_id).map(|p| p.clone()))
    }
}

#[async_trait]
impl CheckinStore for MemoryDb {
    async fn upsert_checkin(
        &self,
        user_id: &str,
        checkin_date: NaiveDate,
        input: &CheckinInput,
        now: DateTime<Utc>,
    ) -> Result<DailyCheckin, AppError> {
        self.check_available()?;

        // The entry guard holds the shard lock across read and write
        let row = match self
            .checkins
            .entry(DailyCheckin::document_id(user_id, checkin_date))
        {
            Entry::Occupied(mut slot) => {
                let row =
                    DailyCheckin::upserted(Some(slot.get()), user_id, checkin_date, input, now);
                slot.insert(row.clone());
                row
            }
            Entry::Vacant(slot) => {
                let row = DailyCheckin::upserted(None, user_id, checkin_date, input, now);
                slot.insert(row.clone());
                row
            }
        };

        Ok(row)
    }

    async fn get_checkin(
        &self,
        user_id: &str,
        checkin_date: NaiveDate,
    ) -> Result<Option<DailyCheckin>, AppError> {
        self.check_available()?;
        Ok(self
            .checkins
            .get(&DailyCheckin::document_id(user_id, checkin_date))
            .map(|c| c.clone()))
    }

    async fn list_checkins(
        &self,
        user_id: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<DailyCheckin>, AppError> {
        self.check_available()?;
        let mut rows: Vec<DailyCheckin> = self
            .checkins
            .iter()
            .filter(|c| c.user_id == user_id)
            .filter(|c| since.map_or(true, |d| c.checkin_date >= d))
            .map(|c| c.clone())
            .collect();
        rows.sort_by(|a, b| b.checkin_date.cmp(&a.checkin_date));
        Ok(rows)
    }
}
