// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily check-in operations.
//!
//! Writes validate before touching the store and report failures to the
//! caller. Reads never fail: a store error is logged and the caller gets
//! `None` or an empty list.

use crate::db::CheckinStore;
use crate::error::AppError;
use crate::models::checkin::validation_message;
use crate::models::{CheckinInput, DailyCheckin, SavedCheckin, TrendSummary};
use crate::time_utils::Clock;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const DEFAULT_RECENT_DAYS: u32 = 7;

/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Dashboard {
    pub today: Option<DailyCheckin>,
    pub recent: Vec<DailyCheckin>,
    pub trends: TrendSummary,
}

/// Service for saving and querying daily check-ins.
#[derive(Clone)]
pub struct CheckinService {
    store: Arc<dyn CheckinStore>,
    clock: Arc<dyn Clock>,
}

impl CheckinService {
    pub fn new(store: Arc<dyn CheckinStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Save today's check-in, replacing an earlier one from the same day.
    pub async fn save_daily_checkin(
        &self,
        user_id: &str,
        input: &CheckinInput,
    ) -> Result<SavedCheckin, AppError> {
        if user_id.is_empty() {
            return Err(AppError::BadRequest("User ID not provided".to_string()));
        }
        input
            .validate()
            .map_err(|e| AppError::BadRequest(validation_message(&e)))?;

        let today = self.clock.today();
        let row = self
            .store
            .upsert_checkin(user_id, today, input, self.clock.now())
            .await
            .map_err(|e| {
                tracing::error!(user_id, date = %today, error = %e, "Failed to save check-in");
                AppError::Database(format!("Failed to save check-in: {}", e.user_message()))
            })?;

        let saved = SavedCheckin::from(&row);
        tracing::info!(
            user_id,
            checkin_id = %saved.id,
            is_new = saved.is_new,
            "Check-in saved"
        );
        Ok(saved)
    }

    pub async fn get_today_checkin(&self, user_id: &str) -> Option<DailyCheckin> {
        let today = self.clock.today();
        match self.store.get_checkin(user_id, today).await {
            Ok(row) => row,
            Err(e) => {
                tracing::error!(user_id, error = %e, "Failed to fetch today's check-in");
                None
            }
        }
    }

    /// Check-ins from the last `days` days (inclusive of `today - days`),
    /// newest first. A window reaching past the calendar's start returns
    /// the full history.
    pub async fn get_recent_checkins(&self, user_id: &str, days: u32) -> Vec<DailyCheckin> {
        let since = self
            .clock
            .today()
            .checked_sub_days(Days::new(u64::from(days)));
        self.list_or_empty(user_id, since).await
    }

    pub async fn get_all_checkins(&self, user_id: &str) -> Vec<DailyCheckin> {
        self.list_or_empty(user_id, None).await
    }

    /// Today's row, the last week, and trends over that week.
    pub async fn dashboard(&self, user_id: &str) -> Dashboard {
        let recent = self.get_recent_checkins(user_id, DEFAULT_RECENT_DAYS).await;
        let today = self.clock.today();
        let today_row = recent.iter().find(|c| c.checkin_date == today).cloned();
        let trends = TrendSummary::from_checkins(&recent);

        Dashboard {
            today: today_row,
            recent,
            trends,
        }
    }

    async fn list_or_empty(&self, user_id: &str, since: Option<NaiveDate>) -> Vec<DailyCheckin> {
        match self.store.list_checkins(user_id, since).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(user_id, error = %e, "Failed to fetch check-ins");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::time_utils::ManualClock;
    use chrono::Duration;

    fn input(energy: u8) -> CheckinInput {
        CheckinInput {
            energy_level: energy,
            sleep_quality: 6,
            mood_score: 7,
            fatigue_level: 3,
            notes: None,
            pain: vec![],
        }
    }

    fn service() -> (CheckinService, Arc<MemoryDb>, Arc<ManualClock>) {
        let db = Arc::new(MemoryDb::new());
        let clock = Arc::new(ManualClock::at_date(
            NaiveDate::from_ymd_opt(2026, 6, 15).unwrap(),
        ));
        (CheckinService::new(db.clone(), clock.clone()), db, clock)
    }

    #[tokio::test]
    async fn test_save_then_overwrite() {
        let (svc, db, clock) = service();

        let first = svc.save_daily_checkin("u1", &input(8)).await.unwrap();
        assert!(first.is_new);
        assert_eq!(first.checkin_date, NaiveDate::from_ymd_opt(2026, 6, 15).unwrap());

        clock.advance(Duration::hours(2));
        let second = svc.save_daily_checkin("u1", &input(9)).await.unwrap();
        assert!(!second.is_new);
        assert_eq!(second.id, first.id);
        assert_eq!(db.checkin_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_store() {
        let (svc, db, _) = service();
        db.set_unavailable(true);

        let err = svc.save_daily_checkin("u1", &input(11)).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("energy_level")));
    }

    #[tokio::test]
    async fn test_save_failure_has_message() {
        let (svc, db, _) = service();
        db.set_unavailable(true);

        let err = svc.save_daily_checkin("u1", &input(5)).await.unwrap_err();
        assert!(err.user_message().starts_with("Failed to save check-in: "));
    }

    #[tokio::test]
    async fn test_dashboard_summarizes_week() {
        let (svc, _, clock) = service();
        svc.save_daily_checkin("u1", &input(6)).await.unwrap();
        clock.advance(Duration::days(1));
        svc.save_daily_checkin("u1", &input(8)).await.unwrap();

        let dash = svc.dashboard("u1").await;
        assert_eq!(dash.recent.len(), 2);
        assert_eq!(dash.today.unwrap().energy_level, 8);
        assert_eq!(dash.trends.checkins, 2);
        assert_eq!(dash.trends.energy.unwrap().average, 7.0);
    }

    #[tokio::test]
    async fn test_recent_window_larger_than_calendar_returns_everything() {
        let (svc, _, clock) = service();
        svc.save_daily_checkin("u1", &input(5)).await.unwrap();
        clock.advance(Duration::days(400));
        svc.save_daily_checkin("u1", &input(7)).await.unwrap();

        let recent = svc.get_recent_checkins("u1", u32::MAX).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].energy_level, 7);
    }
}
