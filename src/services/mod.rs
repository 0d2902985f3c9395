// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth_context;
pub mod checkins;
pub mod gotrue;
pub mod identity;
pub mod profile;

pub use auth_context::{AuthContext, AuthSnapshot};
pub use checkins::{CheckinService, Dashboard, DEFAULT_RECENT_DAYS};
pub use gotrue::{GoTrueClient, GoTrueIdentity};
pub use identity::{AuthError, AuthEvent, AuthEventKind, IdentityProvider, SignUpOutcome};
pub use profile::{ProfileLoader, RetryPolicy};
