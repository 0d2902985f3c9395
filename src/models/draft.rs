//! Multi-step check-in form state.
//!
//! The form walks through one step per metric and a final body-map step.
//! Scores start at the middle of the scale and are always kept in range,
//! and notes are capped at the submission limit, so a finished draft
//! converts to a valid [`CheckinInput`].

use crate::models::checkin::{
    BodyPart, CheckinInput, PainReport, MAX_NOTES_LEN, MAX_SCORE, MIN_SCORE,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_SCORE: u8 = 5;
const DEFAULT_PAIN_LEVEL: u8 = 5;

/// Scored metrics, in the order the form asks for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Energy,
    Sleep,
    Mood,
    Fatigue,
}

/// Form steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Score(Metric),
    Pain,
}

pub const STEPS: [Step; 5] = [
    Step::Score(Metric::Energy),
    Step::Score(Metric::Sleep),
    Step::Score(Metric::Mood),
    Step::Score(Metric::Fatigue),
    Step::Pain,
];

/// Quick-pick buttons shown under each score slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Low,
    Normal,
    High,
}

impl Preset {
    pub fn value(self) -> u8 {
        match self {
            Preset::Low => 2,
            Preset::Normal => 5,
            Preset::High => 8,
        }
    }
}

/// In-progress check-in.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckinDraft {
    step: usize,
    energy: u8,
    sleep: u8,
    mood: u8,
    fatigue: u8,
    pain: BTreeMap<BodyPart, u8>,
    notes: String,
}

impl Default for CheckinDraft {
    fn default() -> Self {
        Self {
            step: 0,
            energy: DEFAULT_SCORE,
            sleep: DEFAULT_SCORE,
            mood: DEFAULT_SCORE,
            fatigue: DEFAULT_SCORE,
            pain: BTreeMap::new(),
            notes: String::new(),
        }
    }
}

impl CheckinDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_step(&self) -> Step {
        STEPS[self.step]
    }

    pub fn step_index(&self) -> usize {
        self.step
    }

    pub fn is_first_step(&self) -> bool {
        self.step == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.step == STEPS.len() - 1
    }

    /// Completion of the form as a percentage of steps reached.
    pub fn progress_percent(&self) -> f64 {
        (self.step + 1) as f64 / STEPS.len() as f64 * 100.0
    }

    /// Advance one step. Returns `false` on the last step.
    pub fn next(&mut self) -> bool {
        if self.is_last_step() {
            return false;
        }
        self.step += 1;
        true
    }

    /// Go back one step. Returns `false` on the first step.
    pub fn back(&mut self) -> bool {
        if self.is_first_step() {
            return false;
        }
        self.step -= 1;
        true
    }

    pub fn score(&self, metric: Metric) -> u8 {
        match metric {
            Metric::Energy => self.energy,
            Metric::Sleep => self.sleep,
            Metric::Mood => self.mood,
            Metric::Fatigue => self.fatigue,
        }
    }

    /// Set a score, clamped to the 1..=10 scale.
    pub fn set_score(&mut self, metric: Metric, value: u8) {
        let value = value.clamp(MIN_SCORE, MAX_SCORE);
        match metric {
            Metric::Energy => self.energy = value,
            Metric::Sleep => self.sleep = value,
            Metric::Mood => self.mood = value,
            Metric::Fatigue => self.fatigue = value,
        }
    }

    /// Apply a quick-pick value to the metric of the current step.
    ///
    /// Returns `false` on the pain step, which has no presets.
    pub fn apply_preset(&mut self, preset: Preset) -> bool {
        match self.current_step() {
            Step::Score(metric) => {
                self.set_score(metric, preset.value());
                true
            }
            Step::Pain => false,
        }
    }

    /// Select or deselect a body part. Newly selected parts start at level 5.
    pub fn toggle_pain(&mut self, part: BodyPart) {
        if self.pain.remove(&part).is_none() {
            self.pain.insert(part, DEFAULT_PAIN_LEVEL);
        }
    }

    /// Change the level of an already selected part.
    pub fn set_pain_level(&mut self, part: BodyPart, level: u8) {
        if let Some(current) = self.pain.get_mut(&part) {
            *current = level.clamp(MIN_SCORE, MAX_SCORE);
        }
    }

    pub fn pain_level(&self, part: BodyPart) -> Option<u8> {
        self.pain.get(&part).copied()
    }

    pub fn selected_parts(&self) -> impl Iterator<Item = BodyPart> + '_ {
        self.pain.keys().copied()
    }

    /// Notes past the submission limit are cut off.
    pub fn set_notes(&mut self, notes: impl Into<String>) {
        let notes = notes.into();
        self.notes = if notes.chars().count() > MAX_NOTES_LEN as usize {
            notes.chars().take(MAX_NOTES_LEN as usize).collect()
        } else {
            notes
        };
    }

    /// Submission payload for the current draft.
    pub fn to_input(&self) -> CheckinInput {
        let notes = if self.notes.trim().is_empty() {
            None
        } else {
            Some(self.notes.clone())
        };

        CheckinInput {
            energy_level: self.energy,
            sleep_quality: self.sleep,
            mood_score: self.mood,
            fatigue_level: self.fatigue,
            notes,
            pain: self
                .pain
                .iter()
                .map(|(&area, &level)| PainReport { area, level })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_navigation_clamps_at_ends() {
        let mut draft = CheckinDraft::new();
        assert!(draft.is_first_step());
        assert!(!draft.back());

        for _ in 0..4 {
            assert!(draft.next());
        }
        assert!(draft.is_last_step());
        assert_eq!(draft.current_step(), Step::Pain);
        assert!(!draft.next());
        assert_eq!(draft.progress_percent(), 100.0);

        assert!(draft.back());
        assert_eq!(draft.current_step(), Step::Score(Metric::Fatigue));
    }

    #[test]
    fn test_presets_target_current_metric() {
        let mut draft = CheckinDraft::new();
        assert!(draft.apply_preset(Preset::High));
        draft.next();
        assert!(draft.apply_preset(Preset::Low));

        assert_eq!(draft.score(Metric::Energy), 8);
        assert_eq!(draft.score(Metric::Sleep), 2);
        assert_eq!(draft.score(Metric::Mood), 5);

        while draft.next() {}
        assert!(!draft.apply_preset(Preset::Normal));
    }

    #[test]
    fn test_scores_clamped() {
        let mut draft = CheckinDraft::new();
        draft.set_score(Metric::Mood, 0);
        draft.set_score(Metric::Fatigue, 42);
        assert_eq!(draft.score(Metric::Mood), 1);
        assert_eq!(draft.score(Metric::Fatigue), 10);
    }

    #[test]
    fn test_pain_toggle_and_levels() {
        let mut draft = CheckinDraft::new();
        draft.toggle_pain(BodyPart::LowerBack);
        assert_eq!(draft.pain_level(BodyPart::LowerBack), Some(5));

        draft.set_pain_level(BodyPart::LowerBack, 9);
        draft.set_pain_level(BodyPart::Head, 3);
        assert_eq!(draft.pain_level(BodyPart::LowerBack), Some(9));
        assert_eq!(draft.pain_level(BodyPart::Head), None);

        draft.toggle_pain(BodyPart::LowerBack);
        assert_eq!(draft.selected_parts().count(), 0);
    }

    #[test]
    fn test_to_input_is_valid() {
        let mut draft = CheckinDraft::new();
        draft.set_score(Metric::Energy, 8);
        draft.toggle_pain(BodyPart::KneeLeft);
        draft.toggle_pain(BodyPart::Head);
        draft.set_notes("  ");

        let input = draft.to_input();
        assert!(input.validate().is_ok());
        assert_eq!(input.energy_level, 8);
        assert_eq!(input.notes, None);
        assert_eq!(input.pain.len(), 2);
        assert_eq!(input.pain[0].area, BodyPart::Head);
    }

    #[test]
    fn test_long_notes_capped_at_limit() {
        let mut draft = CheckinDraft::new();
        draft.set_notes("é".repeat(MAX_NOTES_LEN as usize + 50));

        let input = draft.to_input();
        assert_eq!(
            input.notes.as_ref().map(|n| n.chars().count()),
            Some(MAX_NOTES_LEN as usize)
        );
        assert!(input.validate().is_ok());
    }
}
