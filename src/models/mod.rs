// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod checkin;
pub mod draft;
pub mod trends;
pub mod user;

pub use checkin::{BodyPart, CheckinInput, DailyCheckin, PainReport, SavedCheckin};
pub use draft::CheckinDraft;
pub use trends::TrendSummary;
pub use user::{Profile, Session, User, UserMetadata};
