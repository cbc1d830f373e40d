//! Period summaries for weekly reports
//!
//! Compares the means of two periods, turns dated completion events into
//! per-day completion rates, and derives threshold insights from the
//! completion average, the current streak and self-rated wellbeing.

use crate::error::VitalsError;
use crate::trend::{Outcome, Polarity};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Days at or above this completion rate are best days
pub const BEST_DAY_RATE: f64 = 80.0;

/// Days below this completion rate are hard days
pub const HARD_DAY_RATE: f64 = 50.0;

/// Streak length that counts as strong consistency
pub const STRONG_STREAK_DAYS: u32 = 7;

/// Streaks shorter than this need work
pub const WEAK_STREAK_DAYS: u32 = 3;

/// Self ratings (1 to 10) at or above this are a strength
pub const STRONG_RATING: f64 = 8.0;

/// Self ratings below this need work
pub const WEAK_RATING: f64 = 5.0;

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn check_finite(values: &[f64], what: &str) -> Result<(), VitalsError> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(bad) => Err(VitalsError::InvalidReading(format!(
            "{} value must be finite, got {}",
            what, bad
        ))),
        None => Ok(()),
    }
}

/// Change in the mean between two periods
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodChange {
    pub current_mean: Option<f64>,
    pub previous_mean: Option<f64>,
    /// Current mean minus previous mean; absent when either period is empty
    pub change: Option<f64>,
}

impl PeriodChange {
    /// Change signed so that a positive number is always an improvement
    pub fn improvement(&self, polarity: Polarity) -> Option<f64> {
        self.change.map(|change| match polarity {
            Polarity::HigherIsBetter => change,
            Polarity::LowerIsBetter => -change,
        })
    }

    pub fn outcome(&self, polarity: Polarity) -> Outcome {
        match self.improvement(polarity) {
            Some(v) if v > 0.0 => Outcome::Improving,
            Some(v) if v < 0.0 => Outcome::Worsening,
            Some(_) => Outcome::Stable,
            None => Outcome::Unknown,
        }
    }
}

/// Compare the mean of the current period with the previous one
pub fn period_change(current: &[f64], previous: &[f64]) -> Result<PeriodChange, VitalsError> {
    check_finite(current, "current period")?;
    check_finite(previous, "previous period")?;

    let current_mean = mean(current);
    let previous_mean = mean(previous);
    let change = match (current_mean, previous_mean) {
        (Some(c), Some(p)) => Some(c - p),
        _ => None,
    };

    Ok(PeriodChange {
        current_mean,
        previous_mean,
        change,
    })
}

/// How a day went, judged by its completion rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPerformance {
    Best,
    Steady,
    Hard,
}

impl DayPerformance {
    pub fn from_rate(rate: f64) -> Self {
        if rate >= BEST_DAY_RATE {
            DayPerformance::Best
        } else if rate < HARD_DAY_RATE {
            DayPerformance::Hard
        } else {
            DayPerformance::Steady
        }
    }
}

/// Completion counts for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCompletion {
    pub date: NaiveDate,
    pub total: u32,
    pub completed: u32,
    /// `completed / total * 100`
    pub rate: f64,
    pub performance: DayPerformance,
}

/// Group completion events by day, oldest day first
pub fn daily_completion_rates(events: &[(NaiveDate, bool)]) -> Vec<DailyCompletion> {
    let mut days: BTreeMap<NaiveDate, (u32, u32)> = BTreeMap::new();
    for &(date, completed) in events {
        let entry = days.entry(date).or_insert((0, 0));
        entry.0 += 1;
        if completed {
            entry.1 += 1;
        }
    }

    days.into_iter()
        .map(|(date, (total, completed))| {
            let rate = completed as f64 / total as f64 * 100.0;
            DailyCompletion {
                date,
                total,
                completed,
                rate,
                performance: DayPerformance::from_rate(rate),
            }
        })
        .collect()
}

/// Completion statistics over a reporting period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub days: Vec<DailyCompletion>,
    /// Mean of the daily rates; absent when there were no events
    pub average_rate: Option<f64>,
    pub best_days: Vec<NaiveDate>,
    pub hard_days: Vec<NaiveDate>,
}

pub fn summarize_completions(events: &[(NaiveDate, bool)]) -> CompletionSummary {
    let days = daily_completion_rates(events);
    let rates: Vec<f64> = days.iter().map(|d| d.rate).collect();

    let dates_with = |performance: DayPerformance| -> Vec<NaiveDate> {
        days.iter()
            .filter(|d| d.performance == performance)
            .map(|d| d.date)
            .collect()
    };
    let best_days = dates_with(DayPerformance::Best);
    let hard_days = dates_with(DayPerformance::Hard);

    CompletionSummary {
        average_rate: mean(&rates),
        best_days,
        hard_days,
        days,
    }
}

/// Area an insight is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightArea {
    Completion,
    Consistency,
    SleepQuality,
    Energy,
}

/// Whether an area is going well or needs work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Strength,
    NeedsImprovement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub area: InsightArea,
    pub kind: InsightKind,
}

/// What the next period should focus on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextFocus {
    /// Completion is high; raise the difficulty
    Advance,
    /// Build up consistency first
    Consolidate,
}

/// Inputs for threshold insights
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightInput {
    /// Average daily completion rate in percent
    #[serde(default)]
    pub average_completion: Option<f64>,
    #[serde(default)]
    pub current_streak: u32,
    /// Mean self-rated sleep quality (1 to 10)
    #[serde(default)]
    pub sleep_quality: Option<f64>,
    /// Mean self-rated energy (1 to 10)
    #[serde(default)]
    pub energy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub insights: Vec<Insight>,
    pub next_focus: NextFocus,
    /// Streak worth celebrating, when it is strong
    pub streak_achievement: Option<u32>,
}

impl InsightReport {
    pub fn strengths(&self) -> impl Iterator<Item = InsightArea> + '_ {
        self.areas(InsightKind::Strength)
    }

    pub fn improvement_areas(&self) -> impl Iterator<Item = InsightArea> + '_ {
        self.areas(InsightKind::NeedsImprovement)
    }

    fn areas(&self, kind: InsightKind) -> impl Iterator<Item = InsightArea> + '_ {
        self.insights
            .iter()
            .filter(move |i| i.kind == kind)
            .map(|i| i.area)
    }
}

fn rated(area: InsightArea, value: f64, strong: f64, weak: f64) -> Option<Insight> {
    let kind = if value >= strong {
        InsightKind::Strength
    } else if value < weak {
        InsightKind::NeedsImprovement
    } else {
        return None;
    };
    Some(Insight { area, kind })
}

/// Derive strengths and improvement areas from period statistics
pub fn insights(input: &InsightInput) -> Result<InsightReport, VitalsError> {
    if let Some(avg) = input.average_completion {
        if !avg.is_finite() || !(0.0..=100.0).contains(&avg) {
            return Err(VitalsError::InvalidReading(format!(
                "average completion must be a percentage, got {}",
                avg
            )));
        }
    }
    let ratings: Vec<f64> = [input.sleep_quality, input.energy].into_iter().flatten().collect();
    check_finite(&ratings, "self rating")?;

    let mut found = Vec::new();

    if let Some(avg) = input.average_completion {
        found.extend(rated(InsightArea::Completion, avg, BEST_DAY_RATE, HARD_DAY_RATE));
    }

    let streak = input.current_streak;
    if streak >= STRONG_STREAK_DAYS {
        found.push(Insight {
            area: InsightArea::Consistency,
            kind: InsightKind::Strength,
        });
    } else if streak < WEAK_STREAK_DAYS {
        found.push(Insight {
            area: InsightArea::Consistency,
            kind: InsightKind::NeedsImprovement,
        });
    }

    if let Some(sleep) = input.sleep_quality {
        found.extend(rated(InsightArea::SleepQuality, sleep, STRONG_RATING, WEAK_RATING));
    }
    if let Some(energy) = input.energy {
        found.extend(rated(InsightArea::Energy, energy, STRONG_RATING, WEAK_RATING));
    }

    let next_focus = match input.average_completion {
        Some(avg) if avg >= BEST_DAY_RATE => NextFocus::Advance,
        _ => NextFocus::Consolidate,
    };

    Ok(InsightReport {
        insights: found,
        next_focus,
        streak_achievement: (streak >= STRONG_STREAK_DAYS).then_some(streak),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_period_change_is_difference_of_means() {
        let change = period_change(&[7.0, 8.0, 9.0], &[5.0, 7.0]).unwrap();
        assert_eq!(change.current_mean, Some(8.0));
        assert_eq!(change.previous_mean, Some(6.0));
        assert_eq!(change.change, Some(2.0));
        assert_eq!(change.outcome(Polarity::HigherIsBetter), Outcome::Improving);
    }

    #[test]
    fn test_lower_is_better_flips_improvement() {
        let stress = period_change(&[4.0], &[6.0]).unwrap();
        assert_eq!(stress.change, Some(-2.0));
        assert_eq!(stress.improvement(Polarity::LowerIsBetter), Some(2.0));
        assert_eq!(stress.outcome(Polarity::LowerIsBetter), Outcome::Improving);
    }

    #[test]
    fn test_empty_period_has_no_change() {
        let change = period_change(&[7.0], &[]).unwrap();
        assert_eq!(change.current_mean, Some(7.0));
        assert_eq!(change.previous_mean, None);
        assert_eq!(change.change, None);
        assert_eq!(change.outcome(Polarity::HigherIsBetter), Outcome::Unknown);
    }

    #[test]
    fn test_period_change_rejects_non_finite() {
        let result = period_change(&[f64::NAN], &[1.0]);
        assert!(matches!(result, Err(VitalsError::InvalidReading(_))));
    }

    #[test]
    fn test_daily_rates_group_by_date() {
        let events = vec![
            (day(2), true),
            (day(1), true),
            (day(1), false),
            (day(2), true),
            (day(3), false),
        ];

        let days = daily_completion_rates(&events);
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].date, day(1));
        assert_eq!((days[0].total, days[0].completed), (2, 1));
        assert_eq!(days[0].rate, 50.0);
        assert_eq!(days[0].performance, DayPerformance::Steady);
        assert_eq!(days[1].rate, 100.0);
        assert_eq!(days[1].performance, DayPerformance::Best);
        assert_eq!(days[2].rate, 0.0);
        assert_eq!(days[2].performance, DayPerformance::Hard);
    }

    #[test]
    fn test_day_performance_thresholds() {
        assert_eq!(DayPerformance::from_rate(80.0), DayPerformance::Best);
        assert_eq!(DayPerformance::from_rate(79.9), DayPerformance::Steady);
        assert_eq!(DayPerformance::from_rate(50.0), DayPerformance::Steady);
        assert_eq!(DayPerformance::from_rate(49.9), DayPerformance::Hard);
    }

    #[test]
    fn test_summarize_completions() {
        let events = vec![(day(1), true), (day(2), false), (day(2), true), (day(3), false)];
        let summary = summarize_completions(&events);

        assert_eq!(summary.average_rate, Some(50.0));
        assert_eq!(summary.best_days, vec![day(1)]);
        assert_eq!(summary.hard_days, vec![day(3)]);

        let empty = summarize_completions(&[]);
        assert!(empty.days.is_empty());
        assert_eq!(empty.average_rate, None);
    }

    #[test]
    fn test_insights_for_a_strong_week() {
        let report = insights(&InsightInput {
            average_completion: Some(85.0),
            current_streak: 9,
            sleep_quality: Some(8.5),
            energy: Some(6.0),
        })
        .unwrap();

        let strengths: Vec<_> = report.strengths().collect();
        assert_eq!(
            strengths,
            vec![InsightArea::Completion, InsightArea::Consistency, InsightArea::SleepQuality]
        );
        assert_eq!(report.improvement_areas().count(), 0);
        assert_eq!(report.next_focus, NextFocus::Advance);
        assert_eq!(report.streak_achievement, Some(9));
    }

    #[test]
    fn test_insights_for_a_weak_week() {
        let report = insights(&InsightInput {
            average_completion: Some(40.0),
            current_streak: 1,
            sleep_quality: Some(4.0),
            energy: Some(3.5),
        })
        .unwrap();

        let areas: Vec<_> = report.improvement_areas().collect();
        assert_eq!(
            areas,
            vec![
                InsightArea::Completion,
                InsightArea::Consistency,
                InsightArea::SleepQuality,
                InsightArea::Energy,
            ]
        );
        assert_eq!(report.next_focus, NextFocus::Consolidate);
        assert_eq!(report.streak_achievement, None);
    }

    #[test]
    fn test_middle_values_produce_no_insight() {
        let report = insights(&InsightInput {
            average_completion: Some(65.0),
            current_streak: 4,
            sleep_quality: Some(6.0),
            energy: None,
        })
        .unwrap();
        assert!(report.insights.is_empty());
        assert_eq!(report.next_focus, NextFocus::Consolidate);
    }

    #[test]
    fn test_insights_reject_bad_percentages() {
        let input = InsightInput {
            average_completion: Some(120.0),
            ..InsightInput::default()
        };
        assert!(matches!(insights(&input), Err(VitalsError::InvalidReading(_))));
    }

    proptest! {
        #[test]
        fn prop_daily_rates_are_percentages(
            events in prop::collection::vec((1u32..=28, any::<bool>()), 0..60)
        ) {
            let events: Vec<(NaiveDate, bool)> =
                events.into_iter().map(|(d, done)| (day(d), done)).collect();
            let days = daily_completion_rates(&events);

            let total: u32 = days.iter().map(|d| d.total).sum();
            prop_assert_eq!(total as usize, events.len());
            for d in &days {
                prop_assert!((0.0..=100.0).contains(&d.rate));
                prop_assert!(d.completed <= d.total);
            }
            prop_assert!(days.windows(2).all(|w| w[0].date < w[1].date));
        }

        #[test]
        fn prop_change_is_zero_for_identical_periods(
            values in prop::collection::vec(0.0f64..10.0, 1..20)
        ) {
            let change = period_change(&values, &values).unwrap();
            prop_assert_eq!(change.change, Some(0.0));
        }
    }
}
