// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Daily check-in model for storage and API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::{Validate, ValidationError, ValidationErrors};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;
pub const MAX_NOTES_LEN: u64 = 2000;

/// Body-map regions a user can report pain in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum BodyPart {
    Head,
    Neck,
    ShoulderLeft,
    ShoulderRight,
    Chest,
    UpperBack,
    ArmLeft,
    ArmRight,
    LowerBack,
    Abdomen,
    HipLeft,
    HipRight,
    ThighLeft,
    ThighRight,
    KneeLeft,
    KneeRight,
    CalfLeft,
    CalfRight,
    FootLeft,
    FootRight,
}

impl BodyPart {
    pub const ALL: [BodyPart; 20] = [
        BodyPart::Head,
        BodyPart::Neck,
        BodyPart::ShoulderLeft,
        BodyPart::ShoulderRight,
        BodyPart::Chest,
        BodyPart::UpperBack,
        BodyPart::ArmLeft,
        BodyPart::ArmRight,
        BodyPart::LowerBack,
        BodyPart::Abdomen,
        BodyPart::HipLeft,
        BodyPart::HipRight,
        BodyPart::ThighLeft,
        BodyPart::ThighRight,
        BodyPart::KneeLeft,
        BodyPart::KneeRight,
        BodyPart::CalfLeft,
        BodyPart::CalfRight,
        BodyPart::FootLeft,
        BodyPart::FootRight,
    ];

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            BodyPart::Head => "Head",
            BodyPart::Neck => "Neck",
            BodyPart::ShoulderLeft => "Left shoulder",
            BodyPart::ShoulderRight => "Right shoulder",
            BodyPart::Chest => "Chest",
            BodyPart::UpperBack => "Upper back",
            BodyPart::ArmLeft => "Left arm",
            BodyPart::ArmRight => "Right arm",
            BodyPart::LowerBack => "Lower back",
            BodyPart::Abdomen => "Abdomen",
            BodyPart::HipLeft => "Left hip",
            BodyPart::HipRight => "Right hip",
            BodyPart::ThighLeft => "Left thigh",
            BodyPart::ThighRight => "Right thigh",
            BodyPart::KneeLeft => "Left knee",
            BodyPart::KneeRight => "Right knee",
            BodyPart::CalfLeft => "Left calf",
            BodyPart::CalfRight => "Right calf",
            BodyPart::FootLeft => "Left foot",
            BodyPart::FootRight => "Right foot",
        }
    }
}

/// Pain reported in one body region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PainReport {
    pub area: BodyPart,
    pub level: u8,
}

/// Scores submitted for today's check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CheckinInput {
    #[validate(range(min = 1, max = 10, message = "energy_level must be between 1 and 10"))]
    pub energy_level: u8,
    #[validate(range(min = 1, max = 10, message = "sleep_quality must be between 1 and 10"))]
    pub sleep_quality: u8,
    #[validate(range(min = 1, max = 10, message = "mood_score must be between 1 and 10"))]
    pub mood_score: u8,
    #[validate(range(min = 1, max = 10, message = "fatigue_level must be between 1 and 10"))]
    pub fatigue_level: u8,
    #[serde(default)]
    #[validate(length(max = 2000, message = "notes must be at most 2000 characters"))]
    pub notes: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_pain_reports"))]
    pub pain: Vec<PainReport>,
}

fn validate_pain_reports(reports: &[PainReport]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for report in reports {
        if !(MIN_SCORE..=MAX_SCORE).contains(&report.level) {
            return Err(ValidationError::new("pain_level")
                .with_message("pain levels must be between 1 and 10".into()));
        }
        if !seen.insert(report.area) {
            return Err(ValidationError::new("pain_duplicate")
                .with_message("each body part may be reported once".into()));
        }
    }
    Ok(())
}

/// Flatten validator errors into one message, ordered by field name.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Stored check-in record in Firestore.
///
/// Document ID is `{user_id}_{checkin_date}`, so the pair is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DailyCheckin {
    pub id: String,
    pub user_id: String,
    pub checkin_date: NaiveDate,
    pub energy_level: u8,
    pub sleep_quality: u8,
    pub mood_score: u8,
    pub fatigue_level: u8,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub pain: Vec<PainReport>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailyCheckin {
    /// Document ID for a (user, date) pair.
    pub fn document_id(user_id: &str, checkin_date: NaiveDate) -> String {
        format!(
            "{}_{}",
            urlencoding::encode(user_id),
            checkin_date.format("%Y-%m-%d")
        )
    }

    /// Build the record to write for an upsert.
    ///
    /// An existing row keeps its ID and `created_at`; every other field is
    /// overwritten. On overwrite `updated_at` is strictly later than
    /// `created_at` so that [`DailyCheckin::is_new`] stays accurate even when
    /// the clock has not moved.
    pub fn upserted(
        existing: Option<&DailyCheckin>,
        user_id: &str,
        checkin_date: NaiveDate,
        input: &CheckinInput,
        now: DateTime<Utc>,
    ) -> Self {
        let notes = input
            .notes
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string);

        let (id, created_at, updated_at) = match existing {
            Some(row) => {
                let min_update = row.created_at + chrono::Duration::milliseconds(1);
                (row.id.clone(), row.created_at, now.max(min_update))
            }
            None => (Self::document_id(user_id, checkin_date), now, now),
        };

        Self {
            id,
            user_id: user_id.to_string(),
            checkin_date,
            energy_level: input.energy_level,
            sleep_quality: input.sleep_quality,
            mood_score: input.mood_score,
            fatigue_level: input.fatigue_level,
            notes,
            pain: input.pain.clone(),
            created_at,
            updated_at,
        }
    }

    /// Whether this row was created (rather than overwritten) by its last write.
    pub fn is_new(&self) -> bool {
        self.created_at == self.updated_at
    }
}

/// Result of a successful check-in submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SavedCheckin {
    pub id: String,
    pub checkin_date: NaiveDate,
    pub is_new: bool,
}

impl From<&DailyCheckin> for SavedCheckin {
    fn from(row: &DailyCheckin) -> Self {
        Self {
            id: row.id.clone(),
            checkin_date: row.checkin_date,
            is_new: row.is_new(),
        }
    }
}
