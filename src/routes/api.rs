// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::display_name;
use crate::models::{CheckinInput, DailyCheckin, Profile, SavedCheckin, User, UserMetadata};
use crate::services::checkins::{Dashboard, DEFAULT_RECENT_DAYS};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const MAX_RECENT_DAYS: u32 = 365;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/checkins", get(list_checkins).post(save_checkin))
        .route("/api/checkins/today", get(get_today))
        .route("/api/checkins/recent", get(get_recent))
        .route("/api/dashboard", get(get_dashboard))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub profile: Option<Profile>,
}

/// Get the current user and their profile.
///
/// A profile that does not exist yet (signup hook still running) is retried
/// briefly; if it never shows up the response carries `profile: null`.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<MeResponse> {
    let profile = state.profiles.load(&user.user_id).await;

    let identity = User {
        id: user.user_id.clone(),
        email: user.email.clone(),
        user_metadata: UserMetadata {
            full_name: user.full_name.clone(),
        },
    };

    Json(MeResponse {
        display_name: display_name(profile.as_ref(), Some(&identity)),
        avatar_url: profile.as_ref().and_then(|p| p.avatar_url.clone()),
        user_id: user.user_id,
        email: user.email,
        profile,
    })
}

// ─── Check-ins ───────────────────────────────────────────────

/// Save today's check-in. 201 when created, 200 when it replaced an
/// earlier one from the same day.
async fn save_checkin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<CheckinInput>,
) -> Result<(StatusCode, Json<SavedCheckin>)> {
    let saved = state
        .checkins
        .save_daily_checkin(&user.user_id, &input)
        .await?;

    let status = if saved.is_new {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(saved)))
}

async fn list_checkins(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<Vec<DailyCheckin>> {
    Json(state.checkins.get_all_checkins(&user.user_id).await)
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TodayResponse {
    pub date: NaiveDate,
    pub checkin: Option<DailyCheckin>,
}

async fn get_today(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<TodayResponse> {
    Json(TodayResponse {
        date: state.checkins.today(),
        checkin: state.checkins.get_today_checkin(&user.user_id).await,
    })
}

#[derive(Deserialize)]
struct RecentQuery {
    /// Window size in days (default 7)
    days: Option<u32>,
}

async fn get_recent(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<RecentQuery>,
) -> Result<Json<Vec<DailyCheckin>>> {
    let days = params.days.unwrap_or(DEFAULT_RECENT_DAYS);
    if !(1..=MAX_RECENT_DAYS).contains(&days) {
        return Err(AppError::BadRequest(format!(
            "days must be between 1 and {}",
            MAX_RECENT_DAYS
        )));
    }

    Ok(Json(
        state
            .checkins
            .get_recent_checkins(&user.user_id, days)
            .await,
    ))
}

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<Dashboard> {
    Json(state.checkins.dashboard(&user.user_id).await)
}
