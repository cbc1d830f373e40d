//! Trend analysis over reading series
//!
//! Series are ordered newest-first. The analyzer reports the mean of the most
//! recent window, the change between the two newest entries and its direction.
//! An empty series is a valid outcome with every statistic absent.

use crate::error::VitalsError;
use crate::types::{Reading, ReadingKind};
use serde::{Deserialize, Serialize};

/// Default moving-average window
pub const DEFAULT_TREND_WINDOW: usize = 7;

/// Direction of the newest change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stable,
    Unknown,
}

impl Direction {
    fn from_delta(delta: Option<f64>) -> Self {
        match delta {
            Some(d) if d > 0.0 => Direction::Up,
            Some(d) if d < 0.0 => Direction::Down,
            Some(_) => Direction::Stable,
            None => Direction::Unknown,
        }
    }
}

/// Which way a measurement should move to be considered better
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

impl Polarity {
    /// Polarity of a reading kind, if it has one.
    ///
    /// Range-based vitals (blood pressure, glucose, BMI) are healthiest in the
    /// middle of their scale, so they have none.
    pub fn for_kind(kind: &ReadingKind) -> Option<Self> {
        match kind {
            ReadingKind::Symptom(_) => Some(Polarity::LowerIsBetter),
            ReadingKind::MedicationEffectiveness | ReadingKind::HealthScore => {
                Some(Polarity::HigherIsBetter)
            }
            _ => None,
        }
    }

    pub fn interpret(&self, direction: Direction) -> Outcome {
        match (self, direction) {
            (_, Direction::Unknown) => Outcome::Unknown,
            (_, Direction::Stable) => Outcome::Stable,
            (Polarity::HigherIsBetter, Direction::Up) | (Polarity::LowerIsBetter, Direction::Down) => {
                Outcome::Improving
            }
            (Polarity::HigherIsBetter, Direction::Down) | (Polarity::LowerIsBetter, Direction::Up) => {
                Outcome::Worsening
            }
        }
    }
}

/// Direction interpreted against a polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Improving,
    Worsening,
    Stable,
    Unknown,
}

/// Trend statistics for a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    /// Mean of the newest `min(window, len)` values
    pub average: Option<f64>,
    /// Newest value minus the previous one
    pub delta: Option<f64>,
    pub direction: Direction,
    /// Delta as a percentage of the previous value (when it is positive)
    pub change_pct: Option<f64>,
    /// Number of values the average was taken over
    pub sample_size: usize,
}

impl TrendResult {
    fn empty() -> Self {
        TrendResult {
            average: None,
            delta: None,
            direction: Direction::Unknown,
            change_pct: None,
            sample_size: 0,
        }
    }

    /// Interpret the direction for a measurement with the given polarity
    pub fn outcome(&self, polarity: Polarity) -> Outcome {
        polarity.interpret(self.direction)
    }
}

/// Moving average and delta over newest-first series
pub struct TrendAnalyzer;

impl TrendAnalyzer {
    /// Analyze readings ordered newest-first. Blood pressure readings use systolic.
    pub fn analyze(entries: &[Reading], window: usize) -> Result<TrendResult, VitalsError> {
        let values: Vec<f64> = entries.iter().map(|r| r.value.primary()).collect();
        Self::analyze_values(&values, window)
    }

    /// Analyze raw values ordered newest-first
    pub fn analyze_values(values: &[f64], window: usize) -> Result<TrendResult, VitalsError> {
        if window == 0 {
            return Err(VitalsError::Configuration(
                "trend window must be at least 1".to_string(),
            ));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(VitalsError::InvalidReading(format!(
                "trend value must be finite, got {}",
                bad
            )));
        }
        if values.is_empty() {
            return Ok(TrendResult::empty());
        }

        let sample = &values[..window.min(values.len())];
        let average = sample.iter().sum::<f64>() / sample.len() as f64;

        let (delta, change_pct) = match values {
            [newest, previous, ..] => {
                let delta = newest - previous;
                let pct = if *previous > 0.0 {
                    Some(delta / previous * 100.0)
                } else {
                    None
                };
                (Some(delta), pct)
            }
            _ => (None, None),
        };

        Ok(TrendResult {
            average: Some(average),
            delta,
            direction: Direction::from_delta(delta),
            change_pct,
            sample_size: sample.len(),
        })
    }
}

/// Sort readings newest-first by timestamp
pub fn sort_newest_first(readings: &mut [Reading]) {
    readings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
