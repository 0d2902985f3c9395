// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider contract.
//!
//! Credential operations are single remote calls whose errors pass through
//! unchanged. Providers also publish session-change events so that session
//! holders (see [`crate::services::AuthContext`]) can follow sign-in,
//! sign-out and token refresh.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{Session, User};

/// Message the identity provider returns for a wrong email/password pair.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid login credentials";

/// Errors from the identity provider.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    /// The provider answered with an error; `message` is its own text.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Identity provider unreachable: {0}")]
    Transport(String),

    #[error("Unexpected identity provider response: {0}")]
    InvalidResponse(String),

    #[error("No active session")]
    NoSession,
}

impl AuthError {
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, AuthError::Api { message, .. } if message == INVALID_CREDENTIALS_MESSAGE)
    }
}

/// Kind of session change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// Session-change notification. `session` is the session after the change.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

impl AuthEvent {
    pub fn signed_in(session: Session) -> Self {
        Self {
            kind: AuthEventKind::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: AuthEventKind::SignedOut,
            session: None,
        }
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self {
            kind: AuthEventKind::TokenRefreshed,
            session: Some(session),
        }
    }
}

/// Outcome of a sign-up.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignUpOutcome {
    /// The account is active and a session was issued.
    SignedIn { session: Session },
    /// The provider requires email confirmation before the first sign-in.
    ConfirmationRequired { user: User },
}

/// Hosted identity provider holding the current session of one client.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current session, if any.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Session, AuthError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    async fn refresh_session(&self) -> Result<Session, AuthError>;

    /// Session-change events emitted after this call.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
