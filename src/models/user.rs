//! Identity and profile models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Fallback shown when neither the profile nor the identity carries a name.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// Free-form metadata attached to the identity at sign-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
}

/// User as known by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    /// Identity provider user ID (also the profile document ID)
    pub id: String,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
    /// Metadata supplied at sign-up
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Authenticated session issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl Session {
    /// True once `now + margin` has reached the expiry.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        now + margin >= self.expires_at
    }
}

/// Profile document in Firestore, created by a backend trigger after sign-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Profile {
    /// Same as the user ID (also used as document ID)
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// IANA timezone name
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub notifications_enabled: bool,
    /// Daily reminder time ("HH:MM")
    #[serde(default)]
    pub reminder_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Empty profile as the sign-up trigger writes it.
    pub fn new(id: impl Into<String>, full_name: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            full_name,
            avatar_url: None,
            timezone: None,
            birth_date: None,
            notifications_enabled: false,
            reminder_time: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Name to greet the user with.
///
/// Prefers the profile name, then the name given at sign-up, then the local
/// part of the email address.
pub fn display_name(profile: Option<&Profile>, user: Option<&User>) -> String {
    fn non_empty(value: &Option<String>) -> Option<String> {
        value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
    }

    if let Some(name) = profile.and_then(|p| non_empty(&p.full_name)) {
        return name;
    }
    if let Some(name) = user.and_then(|u| non_empty(&u.user_metadata.full_name)) {
        return name;
    }
    user.and_then(|u| u.email.as_deref())
        .and_then(|email| email.split('@').next())
        .filter(|local| !local.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string())
}
