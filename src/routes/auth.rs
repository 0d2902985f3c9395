// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential routes, proxied to the identity provider.
//!
//! Successful sign-in and sign-up set the access token as an HTTP-only
//! cookie in addition to returning the session in the body.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{extract_token, AUTH_COOKIE};
use crate::models::checkin::validation_message;
use crate::models::{Session, User};
use crate::services::SignUpOutcome;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signin", post(sign_in))
        .route("/auth/signup", post(sign_up))
        .route("/auth/refresh", post(refresh))
        .route("/auth/signout", post(sign_out))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 200, message = "Name is too long"))]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Session returned to the client.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: String,
    pub user: User,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_at: crate::time_utils::format_utc_rfc3339(session.expires_at),
            user: session.user,
        }
    }
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.secure_cookies())
        .build()
}

fn validate<T: Validate>(request: &T) -> Result<()> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(validation_message(&e)))
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<SignInRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    validate(&request)?;

    let session = state
        .auth_client
        .sign_in_with_password(&request.email, &request.password)
        .await?;

    tracing::info!(user_id = %session.user.id, "User signed in");

    let jar = jar.add(session_cookie(&state, session.access_token.clone()));
    Ok((jar, Json(session.into())))
}

/// Sign-up result: either a live session or a pending email confirmation.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignUpResponse {
    SignedIn { session: SessionResponse },
    ConfirmationRequired { user: User },
}

async fn sign_up(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<SignUpRequest>,
) -> Result<(StatusCode, CookieJar, Json<SignUpResponse>)> {
    validate(&request)?;

    let full_name = request
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let outcome = state
        .auth_client
        .sign_up(&request.email, &request.password, full_name)
        .await?;

    match outcome {
        SignUpOutcome::SignedIn { session } => {
            tracing::info!(user_id = %session.user.id, "User signed up");
            let jar = jar.add(session_cookie(&state, session.access_token.clone()));
            Ok((
                StatusCode::CREATED,
                jar,
                Json(SignUpResponse::SignedIn {
                    session: session.into(),
                }),
            ))
        }
        SignUpOutcome::ConfirmationRequired { user } => {
            tracing::info!(user_id = %user.id, "User signed up, confirmation pending");
            Ok((
                StatusCode::ACCEPTED,
                jar,
                Json(SignUpResponse::ConfirmationRequired { user }),
            ))
        }
    }
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<RefreshRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    if request.refresh_token.trim().is_empty() {
        return Err(AppError::BadRequest("refresh_token is required".to_string()));
    }

    let session = state.auth_client.refresh(&request.refresh_token).await?;
    let jar = jar.add(session_cookie(&state, session.access_token.clone()));
    Ok((jar, Json(session.into())))
}

/// Revoke the session on the provider, then drop the cookie.
///
/// If the provider refuses, the cookie is kept so the client stays signed in.
async fn sign_out(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(StatusCode, CookieJar)> {
    let token = extract_token(&jar, &headers).ok_or(AppError::Unauthorized)?;

    state.auth_client.sign_out(&token).await?;

    tracing::info!("User signed out");
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    Ok((StatusCode::NO_CONTENT, jar))
}
