//! Pipeline orchestration
//!
//! This module provides the public API for the vitals engine. The stateless
//! functions take JSON and return JSON report envelopes; `VitalsProcessor`
//! additionally carries streak state and custom tables across calls.

use crate::classifier::RangeClassifier;
use crate::error::VitalsError;
use crate::report::ReportEncoder;
use crate::score::{compute_score, HealthProfile, ScoreResult, StandardWeights, WeightTable};
use crate::store::{EntryStore, ProfileProvider};
use crate::streak::{is_at_milestone, next_milestone, standard_milestones, Milestone, Streak, StreakBook};
use crate::trend::{Outcome, Polarity, TrendAnalyzer, TrendResult};
use crate::types::{Category, Reading, ReadingKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A reading with its category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingAssessment {
    pub reading: Reading,
    pub category: Category,
    /// Whether the host should surface a warning
    pub needs_attention: bool,
}

/// Trend over a single-kind series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesAnalysis {
    /// `None` for an empty series
    pub kind: Option<ReadingKind>,
    pub count: usize,
    pub trend: TrendResult,
    /// Direction interpreted for kinds with a polarity
    pub outcome: Option<Outcome>,
    /// Category of the newest reading, when the kind has a table
    pub latest_category: Option<Category>,
}

/// Composite score for a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileScore {
    pub score: ScoreResult,
    pub bmi: Option<f64>,
    pub bmi_category: Option<Category>,
    /// Band of the score itself, when a band table shares the weight table's name
    pub band: Option<Category>,
}

/// Result of a streak update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakUpdate {
    pub habit: String,
    pub streak: Streak,
    /// Milestone reached by this update
    pub milestone: Option<Milestone>,
    pub next_milestone: Option<Milestone>,
}

/// Classify a single reading JSON with the built-in tables.
///
/// # Returns
/// Report JSON wrapping a `ReadingAssessment`
pub fn assess_reading_json(reading_json: String) -> Result<String, VitalsError> {
    VitalsProcessor::new().assess_json(&reading_json)
}

/// Analyze a JSON array of readings ordered newest-first.
///
/// # Returns
/// Report JSON wrapping a `SeriesAnalysis`
pub fn analyze_series_json(readings_json: String, window: usize) -> Result<String, VitalsError> {
    VitalsProcessor::new().analyze_series_json(&readings_json, window)
}

/// Score a profile JSON against one of the built-in weight tables.
///
/// # Returns
/// Report JSON wrapping a `ProfileScore`
pub fn score_profile_json(profile_json: String, scale: StandardWeights) -> Result<String, VitalsError> {
    VitalsProcessor::new().score_profile_json(&profile_json, scale)
}

/// Parse a JSON array of readings
pub fn parse_readings_json(json: &str) -> Result<Vec<Reading>, VitalsError> {
    let readings: Vec<Reading> = serde_json::from_str(json)?;
    Ok(readings)
}

/// Parse NDJSON (newline-delimited JSON) readings
pub fn parse_readings_ndjson(ndjson: &str) -> Result<Vec<Reading>, VitalsError> {
    let mut readings = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Reading>(trimmed) {
            Ok(reading) => readings.push(reading),
            Err(e) => {
                return Err(VitalsError::InvalidReading(format!(
                    "Failed to parse line {}: {}",
                    line_num + 1,
                    e
                )));
            }
        }
    }
    Ok(readings)
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate, VitalsError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| VitalsError::InvalidReading(format!("invalid date '{}': {}", s, e)))
}

/// Stateful processor holding tables, weights and streak state.
///
/// Streak updates for one habit must be serialized by the host; the processor
/// takes `&mut self` for them and does no locking of its own.
pub struct VitalsProcessor {
    classifier: RangeClassifier,
    wellness_weights: WeightTable,
    health_weights: WeightTable,
    milestones: Vec<Milestone>,
    streaks: StreakBook,
    encoder: ReportEncoder,
}

impl Default for VitalsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl VitalsProcessor {
    /// Create a processor with the built-in tables
    pub fn new() -> Self {
        Self {
            classifier: RangeClassifier::standard(),
            wellness_weights: WeightTable::wellness_index(),
            health_weights: WeightTable::health_score(),
            milestones: standard_milestones(),
            streaks: StreakBook::new(),
            encoder: ReportEncoder::new(),
        }
    }

    /// Replace the classifier
    pub fn with_classifier(mut self, classifier: RangeClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace one of the weight tables
    pub fn with_weights(mut self, which: StandardWeights, table: WeightTable) -> Self {
        match which {
            StandardWeights::WellnessIndex => self.wellness_weights = table,
            StandardWeights::HealthScore => self.health_weights = table,
        }
        self
    }

    /// Replace the milestone list
    pub fn with_milestones(mut self, milestones: Vec<Milestone>) -> Self {
        self.milestones = milestones;
        self
    }

    /// Overlay band tables from JSON onto the current ones
    pub fn load_tables(&mut self, json: &str) -> Result<(), VitalsError> {
        self.classifier.extend_from_json(json)
    }

    pub fn classifier(&self) -> &RangeClassifier {
        &self.classifier
    }

    pub fn weights(&self, which: StandardWeights) -> &WeightTable {
        match which {
            StandardWeights::WellnessIndex => &self.wellness_weights,
            StandardWeights::HealthScore => &self.health_weights,
        }
    }

    pub fn streaks(&self) -> &StreakBook {
        &self.streaks
    }

    /// Load streak state from JSON
    pub fn load_streaks(&mut self, json: &str) -> Result<(), VitalsError> {
        self.streaks = StreakBook::from_json(json)?;
        Ok(())
    }

    /// Save streak state to JSON
    pub fn save_streaks(&self) -> Result<String, VitalsError> {
        self.streaks.to_json()
    }

    /// Classify a reading
    pub fn assess(&self, reading: &Reading) -> Result<ReadingAssessment, VitalsError> {
        let category = self.classifier.classify_reading(reading)?;
        Ok(ReadingAssessment {
            reading: reading.clone(),
            needs_attention: category.alert_level.needs_attention(),
            category,
        })
    }

    pub fn assess_json(&self, reading_json: &str) -> Result<String, VitalsError> {
        let reading: Reading = serde_json::from_str(reading_json)?;
        let assessment = self.assess(&reading)?;
        self.encoder.encode_to_json(&assessment)
    }

    /// Analyze a newest-first series of one kind
    pub fn analyze_series(&self, readings: &[Reading], window: usize) -> Result<SeriesAnalysis, VitalsError> {
        let kind = match readings.first() {
            Some(first) => {
                if let Some(other) = readings.iter().find(|r| r.kind != first.kind) {
                    return Err(VitalsError::InvalidReading(format!(
                        "series mixes kinds '{}' and '{}'",
                        first.kind, other.kind
                    )));
                }
                Some(first.kind.clone())
            }
            None => None,
        };

        for reading in readings {
            reading.check_shape()?;
        }

        let trend = TrendAnalyzer::analyze(readings, window)?;

        let latest_category = match (readings.first(), &kind) {
            (Some(newest), Some(kind)) if self.classifier.can_classify(kind) => {
                Some(self.classifier.classify_reading(newest)?)
            }
            _ => None,
        };

        let outcome = kind
            .as_ref()
            .and_then(Polarity::for_kind)
            .map(|polarity| trend.outcome(polarity));

        Ok(SeriesAnalysis {
            kind,
            count: readings.len(),
            trend,
            outcome,
            latest_category,
        })
    }

    pub fn analyze_series_json(&self, readings_json: &str, window: usize) -> Result<String, VitalsError> {
        let readings = parse_readings_json(readings_json)?;
        let analysis = self.analyze_series(&readings, window)?;
        self.encoder.encode_to_json(&analysis)
    }

    /// Analyze the most recent readings of a kind held by an entry store
    pub fn analyze_store<S: EntryStore + ?Sized>(
        &self,
        store: &S,
        kind: &ReadingKind,
        window: usize,
    ) -> Result<SeriesAnalysis, VitalsError> {
        let readings = store.fetch_recent_readings(kind, window.max(2))?;
        self.analyze_series(&readings, window)
    }

    /// Score the profile supplied by a provider
    pub fn score_profile<P: ProfileProvider + ?Sized>(
        &self,
        provider: &P,
        which: StandardWeights,
    ) -> Result<ProfileScore, VitalsError> {
        let profile = provider.health_profile()?;
        self.score_with(&profile, self.weights(which))
    }

    /// Score a profile against an arbitrary weight table
    pub fn score_with(&self, profile: &HealthProfile, weights: &WeightTable) -> Result<ProfileScore, VitalsError> {
        let input = profile.to_score_input()?;
        let score = compute_score(&input, weights)?;

        let bmi = profile.bmi()?;
        let bmi_category = match bmi {
            Some(value) => Some(self.classifier.classify(value, &ReadingKind::Bmi)?),
            None => None,
        };

        let band_kind = ReadingKind::from(weights.name().to_string());
        let band = if self.classifier.can_classify(&band_kind) {
            Some(self.classifier.classify(score.value, &band_kind)?)
        } else {
            None
        };

        Ok(ProfileScore {
            score,
            bmi,
            bmi_category,
            band,
        })
    }

    pub fn score_profile_json(&self, profile_json: &str, which: StandardWeights) -> Result<String, VitalsError> {
        let profile: HealthProfile = serde_json::from_str(profile_json)?;
        let score = self.score_profile(&profile, which)?;
        self.encoder.encode_to_json(&score)
    }

    /// Record a completed day for a habit
    pub fn record_completion(&mut self, habit: &str, on: NaiveDate) -> Result<StreakUpdate, VitalsError> {
        let before = self.streaks.streak(habit);
        let streak = self.streaks.record_completion(habit, on)?;
        let milestone = if streak.current != before.current {
            is_at_milestone(streak.current, &self.milestones).cloned()
        } else {
            None
        };
        Ok(self.streak_update(habit, streak, milestone))
    }

    /// Record a missed day for a habit
    pub fn record_miss(&mut self, habit: &str, on: NaiveDate) -> Result<StreakUpdate, VitalsError> {
        let streak = self.streaks.record_miss(habit, on)?;
        Ok(self.streak_update(habit, streak, None))
    }

    pub fn record_completion_json(&mut self, habit: &str, date: &str) -> Result<String, VitalsError> {
        let update = self.record_completion(habit, parse_date(date)?)?;
        self.encoder.encode_to_json(&update)
    }

    pub fn record_miss_json(&mut self, habit: &str, date: &str) -> Result<String, VitalsError> {
        let update = self.record_miss(habit, parse_date(date)?)?;
        self.encoder.encode_to_json(&update)
    }

    fn streak_update(&self, habit: &str, streak: Streak, milestone: Option<Milestone>) -> StreakUpdate {
        StreakUpdate {
            habit: habit.to_string(),
            streak,
            milestone,
            next_milestone: next_milestone(streak.current, &self.milestones).cloned(),
        }
    }
}
