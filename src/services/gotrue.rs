// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GoTrue (hosted auth) client.
//!
//! Handles:
//! - Password sign-in and sign-up
//! - Session refresh
//! - Sign-out (access token revocation)
//! - A per-client session holder that emits session-change events

use crate::models::{Session, User};
use crate::services::identity::{AuthError, AuthEvent, IdentityProvider, SignUpOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::{broadcast, RwLock};

/// Lifetime assumed when the provider reports neither `expires_at` nor `expires_in`.
const DEFAULT_SESSION_SECS: i64 = 60 * 60;

/// Stateless GoTrue REST client.
#[derive(Clone)]
pub struct GoTrueClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl GoTrueClient {
    /// Create a client for the project at `project_url` (e.g. `https://abc.supabase.co`).
    pub fn new(project_url: &str, anon_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("{}/auth/v1", project_url.trim_end_matches('/')),
            anon_key,
        }
    }

    /// Exchange email and password for a session.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let response = self
            .http
            .post(format!("{}/token", self.base_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let token: TokenResponse = check_response_json(response).await?;
        Ok(token.into_session(Utc::now()))
    }

    /// Register a new account. `full_name` is stored as user metadata.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError> {
        let response = self
            .http
            .post(format!("{}/signup", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
            }))
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let body: serde_json::Value = check_response_json(response).await?;
        parse_sign_up(body, Utc::now())
    }

    /// Trade a refresh token for a new session.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let response = self
            .http
            .post(format!("{}/token", self.base_url))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let token: TokenResponse = check_response_json(response).await?;
        Ok(token.into_session(Utc::now()))
    }

    /// Revoke the session behind `access_token`.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(format!("{}/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        check_response(response).await
    }
}

/// Token grant response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        // Out-of-range values from the provider fall back to the default lifetime
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .or_else(|| {
                self.expires_in
                    .and_then(Duration::try_seconds)
                    .and_then(|lifetime| now.checked_add_signed(lifetime))
            })
            .unwrap_or_else(|| now + Duration::seconds(DEFAULT_SESSION_SECS));

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Sign-up answers with a token grant when the account is active right away,
/// or with the bare user when email confirmation is pending.
fn parse_sign_up(body: serde_json::Value, now: DateTime<Utc>) -> Result<SignUpOutcome, AuthError> {
    if body.get("access_token").is_some() {
        let token: TokenResponse = serde_json::from_value(body)
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
        return Ok(SignUpOutcome::SignedIn {
            session: token.into_session(now),
        });
    }

    let user: User =
        serde_json::from_value(body).map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
    Ok(SignUpOutcome::ConfirmationRequired { user })
}

/// Error body shapes used by GoTrue versions.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Extract the provider's error text from a response body.
fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .msg
        .or(parsed.message)
        .or(parsed.error_description)
        .or(parsed.error)
}

/// Check response status and return error if not successful.
async fn check_response(response: reqwest::Response) -> Result<(), AuthError> {
    if response.status().is_success() {
        return Ok(());
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AuthError::Api {
        status: status.as_u16(),
        message: error_message(&body).unwrap_or_else(|| format!("HTTP {}", status)),
    })
}

/// Check response and parse JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AuthError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Api {
            status: status.as_u16(),
            message: error_message(&body).unwrap_or_else(|| format!("HTTP {}", status)),
        });
    }

    response
        .json()
        .await
        .map_err(|e| AuthError::InvalidResponse(format!("JSON parse error: {}", e)))
}

// ─────────────────────────────────────────────────────────────────────────────
// GoTrueIdentity - session holder for one client
// ─────────────────────────────────────────────────────────────────────────────

/// Margin before expiry when a cached session is refreshed on read.
const SESSION_REFRESH_MARGIN_SECS: i64 = 60;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// [`IdentityProvider`] backed by GoTrue, caching the signed-in session.
pub struct GoTrueIdentity {
    client: GoTrueClient,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl GoTrueIdentity {
    pub fn new(client: GoTrueClient) -> Self {
        Self::with_session(client, None)
    }

    /// Start from a session restored by the caller (e.g. from disk).
    pub fn with_session(client: GoTrueClient, session: Option<Session>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            session: RwLock::new(session),
            events,
        }
    }

    fn emit(&self, event: AuthEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    async fn clear(&self) {
        *self.session.write().await = None;
        self.emit(AuthEvent::signed_out());
    }
}

#[async_trait]
impl IdentityProvider for GoTrueIdentity {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let cached = self.session.read().await.clone();
        let Some(session) = cached else {
            return Ok(None);
        };

        if !session.expires_within(Utc::now(), Duration::seconds(SESSION_REFRESH_MARGIN_SECS)) {
            return Ok(Some(session));
        }

        tracing::debug!(user_id = %session.user.id, "Cached session expiring, refreshing");
        self.refresh_session().await.map(Some)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let session = self.client.sign_in_with_password(email, password).await?;
        *self.session.write().await = Some(session.clone());
        tracing::info!(user_id = %session.user.id, "Signed in");
        self.emit(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError> {
        let outcome = self.client.sign_up(email, password, full_name).await?;
        match &outcome {
            SignUpOutcome::SignedIn { session } => {
                *self.session.write().await = Some(session.clone());
                tracing::info!(user_id = %session.user.id, "Signed up and signed in");
                self.emit(AuthEvent::signed_in(session.clone()));
            }
            SignUpOutcome::ConfirmationRequired { user } => {
                tracing::info!(user_id = %user.id, "Signed up, awaiting email confirmation");
            }
        }
        Ok(outcome)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let access_token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone());

        if let Some(token) = access_token {
            self.client.sign_out(&token).await?;
        }

        self.clear().await;
        tracing::info!("Signed out");
        Ok(())
    }

    async fn refresh_session(&self) -> Result<Session, AuthError> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .ok_or(AuthError::NoSession)?;

        match self.client.refresh(&refresh_token).await {
            Ok(session) => {
                *self.session.write().await = Some(session.clone());
                self.emit(AuthEvent::token_refreshed(session.clone()));
                Ok(session)
            }
            Err(e @ AuthError::Api { .. }) => {
                // Refresh token rejected: the session is gone for good
                tracing::warn!(error = %e, "Session refresh rejected, clearing session");
                self.clear().await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
