//! Trend summaries for the dashboard and timeline.
//!
//! Computed on read from the check-ins already fetched for display; nothing
//! here is stored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::checkin::{BodyPart, DailyCheckin};

/// Coarse rating of a 1–10 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Good,
    Fair,
    Low,
}

impl ScoreBand {
    pub fn for_score(score: f64) -> Self {
        if score >= 7.0 {
            ScoreBand::Good
        } else if score >= 5.0 {
            ScoreBand::Fair
        } else {
            ScoreBand::Low
        }
    }
}

/// Average of one metric with its band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MetricAverage {
    pub average: f64,
    pub band: ScoreBand,
}

impl MetricAverage {
    fn from_values(values: impl Iterator<Item = u8>, count: usize) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let total: u32 = values.map(u32::from).sum();
        let average = round_one_decimal(total as f64 / count as f64);
        Some(Self {
            average,
            band: ScoreBand::for_score(average),
        })
    }
}

/// How often a body part was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PainFrequency {
    pub area: BodyPart,
    pub days: u32,
}

/// Aggregates over a set of check-ins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrendSummary {
    pub checkins: u32,
    pub energy: Option<MetricAverage>,
    pub sleep: Option<MetricAverage>,
    pub mood: Option<MetricAverage>,
    pub fatigue: Option<MetricAverage>,
    /// Most reported areas first
    pub pain_areas: Vec<PainFrequency>,
}

impl TrendSummary {
    pub fn from_checkins(checkins: &[DailyCheckin]) -> Self {
        let n = checkins.len();

        let mut pain_counts: HashMap<BodyPart, u32> = HashMap::new();
        for checkin in checkins {
            for report in &checkin.pain {
                *pain_counts.entry(report.area).or_insert(0) += 1;
            }
        }

        let mut pain_areas: Vec<PainFrequency> = pain_counts
            .into_iter()
            .map(|(area, days)| PainFrequency { area, days })
            .collect();
        pain_areas.sort_by(|a, b| {
            b.days
                .cmp(&a.days)
                .then_with(|| a.area.label().cmp(b.area.label()))
        });

        Self {
            checkins: n as u32,
            energy: MetricAverage::from_values(checkins.iter().map(|c| c.energy_level), n),
            sleep: MetricAverage::from_values(checkins.iter().map(|c| c.sleep_quality), n),
            mood: MetricAverage::from_values(checkins.iter().map(|c| c.mood_score), n),
            fatigue: MetricAverage::from_values(checkins.iter().map(|c| c.fatigue_level), n),
            pain_areas,
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::checkin::PainReport;
    use chrono::{NaiveDate, Utc};

    fn make_checkin(day: u32, scores: [u8; 4], pain: Vec<BodyPart>) -> DailyCheckin {
        let now = Utc::now();
        DailyCheckin {
            id: format!("u1_{}", day),
            user_id: "u1".to_string(),
            checkin_date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            energy_level: scores[0],
            sleep_quality: scores[1],
            mood_score: scores[2],
            fatigue_level: scores[3],
            notes: None,
            pain: pain
                .into_iter()
                .map(|area| PainReport { area, level: 5 })
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_score_bands() {
        assert_eq!(ScoreBand::for_score(7.0), ScoreBand::Good);
        assert_eq!(ScoreBand::for_score(6.9), ScoreBand::Fair);
        assert_eq!(ScoreBand::for_score(5.0), ScoreBand::Fair);
        assert_eq!(ScoreBand::for_score(4.9), ScoreBand::Low);
    }

    #[test]
    fn test_empty_summary() {
        let summary = TrendSummary::from_checkins(&[]);
        assert_eq!(summary.checkins, 0);
        assert!(summary.energy.is_none());
        assert!(summary.pain_areas.is_empty());
    }

    #[test]
    fn test_averages_rounded() {
        let checkins = vec![
            make_checkin(1, [8, 6, 7, 3], vec![]),
            make_checkin(2, [9, 5, 7, 4], vec![]),
            make_checkin(3, [8, 4, 6, 4], vec![]),
        ];
        let summary = TrendSummary::from_checkins(&checkins);

        assert_eq!(summary.checkins, 3);
        let energy = summary.energy.unwrap();
        assert_eq!(energy.average, 8.3);
        assert_eq!(energy.band, ScoreBand::Good);
        assert_eq!(summary.sleep.unwrap().average, 5.0);
        assert_eq!(summary.fatigue.unwrap().band, ScoreBand::Low);
    }

    #[test]
    fn test_pain_areas_sorted_by_frequency() {
        let checkins = vec![
            make_checkin(1, [5, 5, 5, 5], vec![BodyPart::Neck, BodyPart::LowerBack]),
            make_checkin(2, [5, 5, 5, 5], vec![BodyPart::LowerBack]),
            make_checkin(3, [5, 5, 5, 5], vec![BodyPart::Head]),
        ];
        let summary = TrendSummary::from_checkins(&checkins);

        assert_eq!(
            summary.pain_areas,
            vec![
                PainFrequency {
                    area: BodyPart::LowerBack,
                    days: 2
                },
                PainFrequency {
                    area: BodyPart::Head,
                    days: 1
                },
                PainFrequency {
                    area: BodyPart::Neck,
                    days: 1
                },
            ]
        );
    }

    #[test]
    fn test_pain_area_ties_ordered_by_name() {
        let checkins = vec![make_checkin(
            1,
            [5, 5, 5, 5],
            vec![BodyPart::ShoulderLeft, BodyPart::Chest, BodyPart::Abdomen],
        )];
        let summary = TrendSummary::from_checkins(&checkins);

        let order: Vec<BodyPart> = summary.pain_areas.iter().map(|p| p.area).collect();
        assert_eq!(
            order,
            vec![BodyPart::Abdomen, BodyPart::Chest, BodyPart::ShoulderLeft]
        );
    }
}
