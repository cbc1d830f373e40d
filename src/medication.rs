//! Medication effectiveness
//!
//! Each log pairs a 0-10 effectiveness rating with symptom severity before and
//! after the dose. Improvement is the drop in severity.

use crate::classifier::RangeClassifier;
use crate::error::VitalsError;
use crate::types::{Category, ReadingKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper end of the rating and severity scales
pub const RATING_SCALE_MAX: f64 = 10.0;

/// Improvement of at least this many points counts as significant
pub const SIGNIFICANT_IMPROVEMENT: f64 = 3.0;

/// One dose with its observed effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationLog {
    pub medication: String,
    pub taken_at: DateTime<Utc>,
    /// Self-rated effectiveness, 0-10
    pub effectiveness: f64,
    /// Symptom severity before the dose, 0-10
    pub symptoms_before: f64,
    /// Symptom severity after the dose, 0-10
    pub symptoms_after: f64,
    #[serde(default)]
    pub side_effects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// How much a dose relieved symptoms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementVerdict {
    Significant,
    Modest,
    NoImprovement,
}

impl ImprovementVerdict {
    pub fn from_improvement(improvement: f64) -> Self {
        if improvement >= SIGNIFICANT_IMPROVEMENT {
            ImprovementVerdict::Significant
        } else if improvement > 0.0 {
            ImprovementVerdict::Modest
        } else {
            ImprovementVerdict::NoImprovement
        }
    }
}

impl MedicationLog {
    pub fn validate(&self) -> Result<(), VitalsError> {
        for (name, value) in [
            ("effectiveness", self.effectiveness),
            ("symptoms_before", self.symptoms_before),
            ("symptoms_after", self.symptoms_after),
        ] {
            if !value.is_finite() || !(0.0..=RATING_SCALE_MAX).contains(&value) {
                return Err(VitalsError::InvalidReading(format!(
                    "{} for '{}' must be between 0 and {}, got {}",
                    name, self.medication, RATING_SCALE_MAX, value
                )));
            }
        }
        Ok(())
    }

    /// Severity before minus severity after
    pub fn improvement(&self) -> f64 {
        self.symptoms_before - self.symptoms_after
    }

    pub fn verdict(&self) -> ImprovementVerdict {
        ImprovementVerdict::from_improvement(self.improvement())
    }
}

/// Aggregate over all logs for one medication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationSummary {
    pub medication: String,
    pub count: usize,
    pub average_effectiveness: f64,
    pub average_improvement: f64,
    pub verdict: ImprovementVerdict,
    /// Effectiveness band of the average rating
    pub category: Category,
}

/// Summarize the logs for `medication`; `None` when it has no logs.
pub fn summarize(
    medication: &str,
    logs: &[MedicationLog],
    classifier: &RangeClassifier,
) -> Result<Option<MedicationSummary>, VitalsError> {
    let matching: Vec<&MedicationLog> = logs.iter().filter(|l| l.medication == medication).collect();
    if matching.is_empty() {
        return Ok(None);
    }
    for log in &matching {
        log.validate()?;
    }

    let count = matching.len();
    let average_effectiveness = matching.iter().map(|l| l.effectiveness).sum::<f64>() / count as f64;
    let average_improvement = matching.iter().map(|l| l.improvement()).sum::<f64>() / count as f64;
    let category = classifier.classify(average_effectiveness, &ReadingKind::MedicationEffectiveness)?;

    Ok(Some(MedicationSummary {
        medication: medication.to_string(),
        count,
        average_effectiveness,
        average_improvement,
        verdict: ImprovementVerdict::from_improvement(average_improvement),
        category,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn log(medication: &str, effectiveness: f64, before: f64, after: f64) -> MedicationLog {
        MedicationLog {
            medication: medication.to_string(),
            taken_at: Utc.with_ymd_and_hms(2024, 4, 2, 9, 0, 0).unwrap(),
            effectiveness,
            symptoms_before: before,
            symptoms_after: after,
            side_effects: vec![],
            notes: None,
        }
    }

    #[test]
    fn test_verdicts() {
        assert_eq!(log("ibuprofen", 8.0, 7.0, 3.0).verdict(), ImprovementVerdict::Significant);
        assert_eq!(log("ibuprofen", 5.0, 5.0, 4.0).verdict(), ImprovementVerdict::Modest);
        assert_eq!(log("ibuprofen", 2.0, 4.0, 4.0).verdict(), ImprovementVerdict::NoImprovement);
        assert_eq!(log("ibuprofen", 2.0, 3.0, 5.0).verdict(), ImprovementVerdict::NoImprovement);
    }

    #[test]
    fn test_summary_averages() {
        let logs = vec![
            log("ibuprofen", 8.0, 7.0, 3.0),
            log("ibuprofen", 6.0, 6.0, 4.0),
            log("sumatriptan", 2.0, 8.0, 8.0),
        ];
        let summary = summarize("ibuprofen", &logs, &RangeClassifier::standard())
            .unwrap()
            .unwrap();

        assert_eq!(summary.count, 2);
        assert!((summary.average_effectiveness - 7.0).abs() < 0.001);
        assert!((summary.average_improvement - 3.0).abs() < 0.001);
        assert_eq!(summary.verdict, ImprovementVerdict::Significant);
        assert_eq!(summary.category.label, "Effective");
    }

    #[test]
    fn test_summary_without_logs() {
        let logs = vec![log("ibuprofen", 8.0, 7.0, 3.0)];
        assert!(summarize("metformin", &logs, &RangeClassifier::standard())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_out_of_scale_rating_is_invalid() {
        let logs = vec![log("ibuprofen", 12.0, 7.0, 3.0)];
        assert!(matches!(
            summarize("ibuprofen", &logs, &RangeClassifier::standard()),
            Err(VitalsError::InvalidReading(_))
        ));
    }
}
