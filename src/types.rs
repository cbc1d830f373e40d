//! Core types for the vitals engine
//!
//! This module defines the data that flows through every component: readings,
//! the kinds that select a band table, and the categories produced by
//! classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::VitalsError;
use crate::tables;

/// Alert level attached to a category, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    None,
    Info,
    Warning,
    Danger,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::None => "none",
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
            AlertLevel::Danger => "danger",
            AlertLevel::Critical => "critical",
        }
    }

    /// Whether a host should surface this level as a user-facing warning
    pub fn needs_attention(&self) -> bool {
        matches!(self, AlertLevel::Danger | AlertLevel::Critical)
    }
}

/// Output of classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Human-readable band label (e.g. "Normal", "High Stage 1")
    pub label: String,
    /// Ordinal position of the band within its table
    pub severity_rank: u32,
    /// Alert level of the band
    pub alert_level: AlertLevel,
}

/// When a glucose reading was taken relative to meals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlucoseContext {
    Fasting,
    Random,
    BeforeMeal,
    AfterMeal,
    Bedtime,
}

impl GlucoseContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlucoseContext::Fasting => "fasting",
            GlucoseContext::Random => "random",
            GlucoseContext::BeforeMeal => "before_meal",
            GlucoseContext::AfterMeal => "after_meal",
            GlucoseContext::Bedtime => "bedtime",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "fasting" => Some(GlucoseContext::Fasting),
            "random" => Some(GlucoseContext::Random),
            "before_meal" | "before-meal" => Some(GlucoseContext::BeforeMeal),
            "after_meal" | "after-meal" => Some(GlucoseContext::AfterMeal),
            "bedtime" => Some(GlucoseContext::Bedtime),
            _ => None,
        }
    }
}

/// What a reading measures; selects the band table used to classify it.
///
/// Textual forms: `bmi`, `systolic`, `diastolic`, `blood_pressure`,
/// `glucose.<context>`, `symptom:<name>`, `medication_effectiveness`,
/// `health_score`. Any other string is a custom kind whose table name is the
/// string itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReadingKind {
    Bmi,
    Systolic,
    Diastolic,
    BloodPressure,
    Glucose(GlucoseContext),
    /// Severity of a named symptom; every symptom shares one severity table
    Symptom(String),
    MedicationEffectiveness,
    HealthScore,
    Custom(String),
}

impl ReadingKind {
    /// Name of the band table that classifies this kind
    pub fn table_name(&self) -> Cow<'_, str> {
        match self {
            ReadingKind::Bmi => Cow::Borrowed(tables::BMI),
            ReadingKind::Systolic => Cow::Borrowed(tables::SYSTOLIC),
            ReadingKind::Diastolic => Cow::Borrowed(tables::DIASTOLIC),
            ReadingKind::BloodPressure => Cow::Borrowed(tables::BLOOD_PRESSURE),
            ReadingKind::Glucose(ctx) => Cow::Owned(format!("glucose.{}", ctx.as_str())),
            ReadingKind::Symptom(_) => Cow::Borrowed(tables::SYMPTOM_SEVERITY),
            ReadingKind::MedicationEffectiveness => Cow::Borrowed(tables::MEDICATION_EFFECTIVENESS),
            ReadingKind::HealthScore => Cow::Borrowed(tables::HEALTH_SCORE),
            ReadingKind::Custom(name) => Cow::Borrowed(name.as_str()),
        }
    }
}

impl fmt::Display for ReadingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingKind::Symptom(name) => write!(f, "symptom:{}", name),
            other => f.write_str(&other.table_name()),
        }
    }
}

impl FromStr for ReadingKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            tables::BMI => ReadingKind::Bmi,
            tables::SYSTOLIC => ReadingKind::Systolic,
            tables::DIASTOLIC => ReadingKind::Diastolic,
            tables::BLOOD_PRESSURE => ReadingKind::BloodPressure,
            tables::MEDICATION_EFFECTIVENESS => ReadingKind::MedicationEffectiveness,
            tables::HEALTH_SCORE => ReadingKind::HealthScore,
            other => {
                if let Some(name) = other.strip_prefix("symptom:") {
                    ReadingKind::Symptom(name.to_string())
                } else if let Some(ctx) = other
                    .strip_prefix("glucose.")
                    .and_then(GlucoseContext::parse)
                {
                    ReadingKind::Glucose(ctx)
                } else {
                    ReadingKind::Custom(other.to_string())
                }
            }
        };
        Ok(kind)
    }
}

impl From<String> for ReadingKind {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<ReadingKind> for String {
    fn from(kind: ReadingKind) -> Self {
        kind.to_string()
    }
}

/// Measured value: a single scalar, or a blood pressure triple
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Scalar(f64),
    BloodPressure {
        systolic: f64,
        diastolic: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pulse: Option<f64>,
    },
}

impl ReadingValue {
    /// Value used for trend statistics (systolic for blood pressure)
    pub fn primary(&self) -> f64 {
        match self {
            ReadingValue::Scalar(v) => *v,
            ReadingValue::BloodPressure { systolic, .. } => *systolic,
        }
    }
}

/// A single timestamped observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Unique reading identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// What was measured
    pub kind: ReadingKind,
    /// Measured value
    pub value: ReadingValue,
    /// When the reading was taken (UTC)
    pub timestamp: DateTime<Utc>,
    /// Opaque notes, passed through unchanged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Reading {
    /// Create a new scalar reading
    pub fn scalar(kind: ReadingKind, value: f64, timestamp: DateTime<Utc>) -> Self {
        Reading {
            id: Some(uuid::Uuid::new_v4().to_string()),
            kind,
            value: ReadingValue::Scalar(value),
            timestamp,
            notes: None,
        }
    }

    /// Create a new blood pressure reading
    pub fn blood_pressure(
        systolic: f64,
        diastolic: f64,
        pulse: Option<f64>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Reading {
            id: Some(uuid::Uuid::new_v4().to_string()),
            kind: ReadingKind::BloodPressure,
            value: ReadingValue::BloodPressure {
                systolic,
                diastolic,
                pulse,
            },
            timestamp,
            notes: None,
        }
    }

    /// Attach notes to the reading
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Check that the value shape matches the kind: a systolic/diastolic pair
    /// belongs to `blood_pressure` and nothing else.
    pub fn check_shape(&self) -> Result<(), VitalsError> {
        match (&self.kind, &self.value) {
            (ReadingKind::BloodPressure, ReadingValue::Scalar(_)) => {
                Err(VitalsError::InvalidReading(format!(
                    "{} readings need systolic and diastolic values",
                    tables::BLOOD_PRESSURE
                )))
            }
            (ReadingKind::BloodPressure, ReadingValue::BloodPressure { .. }) => Ok(()),
            (kind, ReadingValue::BloodPressure { .. }) => Err(VitalsError::InvalidReading(
                format!("kind '{}' cannot carry a blood pressure value", kind),
            )),
            (_, ReadingValue::Scalar(_)) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_kind_round_trips_through_text() {
        let kinds = vec![
            ReadingKind::Bmi,
            ReadingKind::BloodPressure,
            ReadingKind::Glucose(GlucoseContext::AfterMeal),
            ReadingKind::Symptom("headache".to_string()),
            ReadingKind::Custom("resting_heart_rate".to_string()),
        ];
        for kind in kinds {
            let parsed: ReadingKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_symptoms_share_a_table() {
        let a = ReadingKind::Symptom("headache".to_string());
        let b = ReadingKind::Symptom("nausea".to_string());
        assert_eq!(a.table_name(), b.table_name());
        assert_eq!(a.table_name(), tables::SYMPTOM_SEVERITY);
    }

    #[test]
    fn test_glucose_accepts_hyphenated_context() {
        let kind: ReadingKind = "glucose.before-meal".parse().unwrap();
        assert_eq!(kind, ReadingKind::Glucose(GlucoseContext::BeforeMeal));
        assert_eq!(kind.table_name(), "glucose.before_meal");
    }

    #[test]
    fn test_deserialize_blood_pressure_reading() {
        let json = r#"{
            "kind": "blood_pressure",
            "value": { "systolic": 142, "diastolic": 89, "pulse": 71 },
            "timestamp": "2024-01-20T08:00:00Z",
            "notes": "after coffee"
        }"#;

        let reading: Reading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.kind, ReadingKind::BloodPressure);
        assert_eq!(reading.value.primary(), 142.0);
        assert_eq!(reading.notes.as_deref(), Some("after coffee"));
        assert!(reading.id.is_none());
    }

    #[test]
    fn test_check_shape_pairs_kind_and_value() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 20, 8, 0, 0).unwrap();
        assert!(Reading::blood_pressure(142.0, 89.0, None, ts).check_shape().is_ok());
        assert!(Reading::scalar(ReadingKind::Bmi, 22.0, ts).check_shape().is_ok());

        let mut wrong_kind = Reading::blood_pressure(142.0, 89.0, None, ts);
        wrong_kind.kind = ReadingKind::Glucose(GlucoseContext::Fasting);
        assert!(matches!(
            wrong_kind.check_shape(),
            Err(VitalsError::InvalidReading(_))
        ));

        let scalar_pair = Reading::scalar(ReadingKind::BloodPressure, 120.0, ts);
        assert!(matches!(
            scalar_pair.check_shape(),
            Err(VitalsError::InvalidReading(_))
        ));
    }

    #[test]
    fn test_serialize_scalar_reading() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 20, 7, 30, 0).unwrap();
        let reading = Reading::scalar(ReadingKind::Glucose(GlucoseContext::Fasting), 92.0, ts);
        let json = serde_json::to_string(&reading).unwrap();

        assert!(json.contains("\"glucose.fasting\""));
        assert!(json.contains("92"));
        assert!(reading.id.is_some());
    }

    #[test]
    fn test_alert_level_ordering() {
        assert!(AlertLevel::None < AlertLevel::Info);
        assert!(AlertLevel::Danger < AlertLevel::Critical);
        assert!(AlertLevel::Critical.needs_attention());
        assert!(!AlertLevel::Warning.needs_attention());
    }
}
