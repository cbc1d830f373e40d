//! Daily streak tracking
//!
//! One `StreakTracker` per habit. Completions on consecutive days extend the
//! streak, a gap or an explicit miss resets it, and the best streak never
//! decreases. Dates must arrive in non-decreasing order.

use crate::error::VitalsError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of a streak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Streak {
    pub current: u32,
    pub best: u32,
    pub last_date: Option<NaiveDate>,
}

/// Streak state machine for one habit
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Streak", into = "Streak")]
pub struct StreakTracker {
    current: u32,
    best: u32,
    last_date: Option<NaiveDate>,
}

impl StreakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a tracker from chronological `(date, completed)` days
    pub fn replay<I>(days: I) -> Result<Self, VitalsError>
    where
        I: IntoIterator<Item = (NaiveDate, bool)>,
    {
        let mut tracker = StreakTracker::new();
        for (date, completed) in days {
            if completed {
                tracker.record_completion(date)?;
            } else {
                tracker.record_miss(date)?;
            }
        }
        Ok(tracker)
    }

    pub fn streak(&self) -> Streak {
        Streak {
            current: self.current,
            best: self.best,
            last_date: self.last_date,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.last_date
    }

    /// Record a completed day. A repeat of the last date changes nothing.
    pub fn record_completion(&mut self, on: NaiveDate) -> Result<Streak, VitalsError> {
        match self.last_date {
            None => self.current = 1,
            Some(last) => {
                self.check_order(last, on)?;
                if on == last {
                    return Ok(self.streak());
                }
                if last.succ_opt() == Some(on) {
                    self.current = self.current.saturating_add(1);
                } else {
                    self.current = 1;
                }
            }
        }

        self.best = self.best.max(self.current);
        self.last_date = Some(on);
        Ok(self.streak())
    }

    /// Record a missed day; resets the current streak
    pub fn record_miss(&mut self, on: NaiveDate) -> Result<Streak, VitalsError> {
        if let Some(last) = self.last_date {
            self.check_order(last, on)?;
        }

        self.current = 0;
        self.last_date = Some(on);
        Ok(self.streak())
    }

    fn check_order(&self, last: NaiveDate, attempted: NaiveDate) -> Result<(), VitalsError> {
        if attempted < last {
            Err(VitalsError::OutOfOrder { last, attempted })
        } else {
            Ok(())
        }
    }
}

impl TryFrom<Streak> for StreakTracker {
    type Error = VitalsError;

    fn try_from(s: Streak) -> Result<Self, Self::Error> {
        if s.best < s.current {
            return Err(VitalsError::InvalidReading(format!(
                "best streak {} is below current streak {}",
                s.best, s.current
            )));
        }
        if s.last_date.is_none() && (s.current > 0 || s.best > 0) {
            return Err(VitalsError::InvalidReading(
                "streak has progress but no last date".to_string(),
            ));
        }
        Ok(StreakTracker {
            current: s.current,
            best: s.best,
            last_date: s.last_date,
        })
    }
}

impl From<StreakTracker> for Streak {
    fn from(t: StreakTracker) -> Self {
        t.streak()
    }
}

/// A streak length that unlocks a reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub days: u32,
    pub title: String,
    pub points: u32,
}

impl Milestone {
    pub fn new(days: u32, title: impl Into<String>, points: u32) -> Self {
        Milestone {
            days,
            title: title.into(),
            points,
        }
    }
}

/// Built-in achievement milestones
pub fn standard_milestones() -> Vec<Milestone> {
    vec![
        Milestone::new(7, "Hydration Hero", 50),
        Milestone::new(30, "Streak Legend", 200),
        Milestone::new(50, "Streak Champion", 250),
        Milestone::new(100, "Time Keeper", 150),
    ]
}

/// Milestone reached exactly at `current`, if any
pub fn is_at_milestone(current: u32, milestones: &[Milestone]) -> Option<&Milestone> {
    milestones.iter().find(|m| m.days == current)
}

/// Smallest milestone strictly above `current`
pub fn next_milestone(current: u32, milestones: &[Milestone]) -> Option<&Milestone> {
    milestones
        .iter()
        .filter(|m| m.days > current)
        .min_by_key(|m| m.days)
}

/// Streak trackers keyed by habit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreakBook {
    habits: BTreeMap<String, StreakTracker>,
}

impl StreakBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot for a habit (zero if never recorded)
    pub fn streak(&self, habit: &str) -> Streak {
        self.habits
            .get(habit)
            .map(StreakTracker::streak)
            .unwrap_or_default()
    }

    pub fn record_completion(&mut self, habit: &str, on: NaiveDate) -> Result<Streak, VitalsError> {
        self.tracker_mut(habit).record_completion(on)
    }

    pub fn record_miss(&mut self, habit: &str, on: NaiveDate) -> Result<Streak, VitalsError> {
        self.tracker_mut(habit).record_miss(on)
    }

    /// Archive a habit's streak, returning its final state
    pub fn remove(&mut self, habit: &str) -> Option<Streak> {
        self.habits.remove(habit).map(|t| t.streak())
    }

    pub fn habits(&self) -> impl Iterator<Item = (&str, Streak)> {
        self.habits.iter().map(|(k, t)| (k.as_str(), t.streak()))
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    fn tracker_mut(&mut self, habit: &str) -> &mut StreakTracker {
        self.habits.entry(habit.to_string()).or_default()
    }

    /// Load from JSON
    pub fn from_json(json: &str) -> Result<Self, VitalsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save to JSON
    pub fn to_json(&self) -> Result<String, VitalsError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_consecutive_then_gap() {
        let mut tracker = StreakTracker::new();
        assert_eq!(tracker.streak(), Streak::default());

        let s = tracker.record_completion(day(1, 1)).unwrap();
        assert_eq!((s.current, s.best, s.last_date), (1, 1, Some(day(1, 1))));

        let s = tracker.record_completion(day(1, 2)).unwrap();
        assert_eq!((s.current, s.best, s.last_date), (2, 2, Some(day(1, 2))));

        let s = tracker.record_completion(day(1, 5)).unwrap();
        assert_eq!((s.current, s.best, s.last_date), (1, 2, Some(day(1, 5))));
    }

    #[test]
    fn test_duplicate_completion_is_noop() {
        let mut tracker = StreakTracker::new();
        tracker.record_completion(day(1, 1)).unwrap();
        tracker.record_completion(day(1, 2)).unwrap();
        let before = tracker.clone();
        tracker.record_completion(day(1, 2)).unwrap();
        assert_eq!(tracker, before);
    }

    #[test]
    fn test_miss_resets_current_only() {
        let mut tracker = StreakTracker::replay(vec![
            (day(2, 1), true),
            (day(2, 2), true),
            (day(2, 3), true),
        ])
        .unwrap();
        let s = tracker.record_miss(day(2, 4)).unwrap();
        assert_eq!((s.current, s.best), (0, 3));

        let s = tracker.record_completion(day(2, 5)).unwrap();
        assert_eq!((s.current, s.best), (1, 3));
    }

    #[test]
    fn test_streak_crosses_month_end() {
        let tracker = StreakTracker::replay(vec![(day(2, 28), true), (day(2, 29), true), (day(3, 1), true)]).unwrap();
        assert_eq!(tracker.current(), 3);
    }

    #[test]
    fn test_out_of_order_is_rejected() {
        let mut tracker = StreakTracker::new();
        tracker.record_completion(day(1, 10)).unwrap();
        let before = tracker.clone();

        let err = tracker.record_completion(day(1, 9)).unwrap_err();
        assert!(matches!(
            err,
            VitalsError::OutOfOrder { last, attempted } if last == day(1, 10) && attempted == day(1, 9)
        ));
        assert!(tracker.record_miss(day(1, 1)).is_err());
        assert_eq!(tracker, before);
    }

    #[test]
    fn test_milestones() {
        let milestones = standard_milestones();
        assert_eq!(is_at_milestone(7, &milestones).unwrap().title, "Hydration Hero");
        assert!(is_at_milestone(8, &milestones).is_none());
        assert_eq!(next_milestone(7, &milestones).unwrap().days, 30);
        assert_eq!(next_milestone(0, &milestones).unwrap().days, 7);
        assert!(next_milestone(100, &milestones).is_none());
    }

    #[test]
    fn test_book_persistence() {
        let mut book = StreakBook::new();
        book.record_completion("hydration", day(1, 1)).unwrap();
        book.record_completion("hydration", day(1, 2)).unwrap();
        book.record_miss("meditation", day(1, 2)).unwrap();

        let json = book.to_json().unwrap();
        let restored = StreakBook::from_json(&json).unwrap();
        assert_eq!(restored, book);
        assert_eq!(restored.streak("hydration").current, 2);
        assert_eq!(restored.streak("unknown"), Streak::default());
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn test_book_rejects_inconsistent_state() {
        let json = r#"{"hydration": {"current": 5, "best": 2, "last_date": "2024-01-02"}}"#;
        assert!(StreakBook::from_json(json).is_err());

        let json = r#"{"hydration": {"current": 1, "best": 1, "last_date": null}}"#;
        assert!(StreakBook::from_json(json).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: best >= current after every transition
        #[test]
        fn prop_best_never_below_current(steps in proptest::collection::vec((0i64..4, any::<bool>()), 1..60)) {
            let mut tracker = StreakTracker::new();
            let mut date = day(1, 1);
            for (advance, completed) in steps {
                date += chrono::Duration::days(advance);
                if completed {
                    tracker.record_completion(date).unwrap();
                } else {
                    tracker.record_miss(date).unwrap();
                }
                prop_assert!(tracker.best() >= tracker.current());
            }
        }

        /// Property: completing two or more days after the last date restarts at 1
        #[test]
        fn prop_gap_resets_to_one(
            run in 1u32..20,
            gap in 2i64..30,
        ) {
            let mut tracker = StreakTracker::new();
            let start = day(1, 1);
            for i in 0..run {
                tracker.record_completion(start + chrono::Duration::days(i as i64)).unwrap();
            }
            let last = tracker.last_date().unwrap();
            let s = tracker.record_completion(last + chrono::Duration::days(gap)).unwrap();
            prop_assert_eq!(s.current, 1);
            prop_assert_eq!(s.best, run);
        }
    }
}
