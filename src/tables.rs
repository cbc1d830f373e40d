//! Built-in band tables
//!
//! Thresholds used by the wellness trackers. Every built-in table has a floor of
//! zero since none of these measurements can be negative.

use crate::classifier::{Band, BandTable};
use crate::types::AlertLevel;

pub const BMI: &str = "bmi";
pub const SYSTOLIC: &str = "systolic";
pub const DIASTOLIC: &str = "diastolic";
/// Name for paired blood pressure readings; classified by the systolic and diastolic tables
pub const BLOOD_PRESSURE: &str = "blood_pressure";
pub const GLUCOSE_FASTING: &str = "glucose.fasting";
pub const GLUCOSE_RANDOM: &str = "glucose.random";
pub const GLUCOSE_BEFORE_MEAL: &str = "glucose.before_meal";
pub const GLUCOSE_AFTER_MEAL: &str = "glucose.after_meal";
pub const GLUCOSE_BEDTIME: &str = "glucose.bedtime";
pub const SYMPTOM_SEVERITY: &str = "symptom_severity";
pub const MEDICATION_EFFECTIVENESS: &str = "medication_effectiveness";
pub const HEALTH_SCORE: &str = "health_score";

// Bands are listed as (exclusive upper bound, label, alert); the last entry is
// unbounded. Built-in tables are checked by `test_standard_tables_are_valid`.
fn table(bands: &[(Option<f64>, &str, AlertLevel)]) -> BandTable {
    let bands = bands
        .iter()
        .map(|(upper, label, alert)| Band::new(*upper, *label, *alert))
        .collect();
    BandTable::from_parts(Some(0.0), bands)
}

fn bmi() -> BandTable {
    table(&[
        (Some(16.0), "Severely Underweight", AlertLevel::Danger),
        (Some(18.5), "Underweight", AlertLevel::Warning),
        (Some(25.0), "Normal", AlertLevel::None),
        (Some(30.0), "Overweight", AlertLevel::Info),
        (Some(35.0), "Obese Class I", AlertLevel::Warning),
        (Some(40.0), "Obese Class II", AlertLevel::Danger),
        (None, "Obese Class III", AlertLevel::Critical),
    ])
}

fn systolic() -> BandTable {
    table(&[
        (Some(90.0), "Low", AlertLevel::Info),
        (Some(120.0), "Normal", AlertLevel::None),
        (Some(140.0), "Elevated", AlertLevel::Info),
        (Some(180.0), "High Stage 1", AlertLevel::Warning),
        (None, "Hypertensive Crisis", AlertLevel::Critical),
    ])
}

fn diastolic() -> BandTable {
    table(&[
        (Some(60.0), "Low", AlertLevel::Info),
        (Some(80.0), "Normal", AlertLevel::None),
        (Some(90.0), "Elevated", AlertLevel::Info),
        (Some(120.0), "High Stage 1", AlertLevel::Warning),
        (None, "Hypertensive Crisis", AlertLevel::Critical),
    ])
}

fn glucose_fasting() -> BandTable {
    table(&[
        (Some(54.0), "Very Low", AlertLevel::Critical),
        (Some(70.0), "Low", AlertLevel::Warning),
        (Some(100.0), "Normal", AlertLevel::None),
        (Some(126.0), "Prediabetic Range", AlertLevel::Warning),
        (Some(250.0), "Diabetic Range", AlertLevel::Danger),
        (None, "Very High", AlertLevel::Critical),
    ])
}

fn glucose_before_meal() -> BandTable {
    table(&[
        (Some(54.0), "Very Low", AlertLevel::Critical),
        (Some(70.0), "Low", AlertLevel::Warning),
        (Some(130.0), "Normal", AlertLevel::None),
        (Some(250.0), "High", AlertLevel::Danger),
        (None, "Very High", AlertLevel::Critical),
    ])
}

// Two hours after a meal and untimed readings share thresholds
fn glucose_post_prandial() -> BandTable {
    table(&[
        (Some(54.0), "Very Low", AlertLevel::Critical),
        (Some(70.0), "Low", AlertLevel::Warning),
        (Some(140.0), "Normal", AlertLevel::None),
        (Some(200.0), "Elevated", AlertLevel::Warning),
        (Some(300.0), "High", AlertLevel::Danger),
        (None, "Very High", AlertLevel::Critical),
    ])
}

fn glucose_bedtime() -> BandTable {
    table(&[
        (Some(54.0), "Very Low", AlertLevel::Critical),
        (Some(90.0), "Low", AlertLevel::Warning),
        (Some(150.0), "Normal", AlertLevel::None),
        (Some(200.0), "Elevated", AlertLevel::Warning),
        (Some(300.0), "High", AlertLevel::Danger),
        (None, "Very High", AlertLevel::Critical),
    ])
}

fn symptom_severity() -> BandTable {
    table(&[
        (Some(3.0), "Mild", AlertLevel::None),
        (Some(5.0), "Moderate", AlertLevel::Info),
        (Some(7.0), "Severe", AlertLevel::Warning),
        (Some(9.0), "Very Severe", AlertLevel::Danger),
        (None, "Emergency", AlertLevel::Critical),
    ])
}

fn medication_effectiveness() -> BandTable {
    table(&[
        (Some(4.0), "Not Effective", AlertLevel::Warning),
        (Some(6.0), "Moderately Effective", AlertLevel::Info),
        (Some(8.0), "Effective", AlertLevel::None),
        (None, "Highly Effective", AlertLevel::None),
    ])
}

fn health_score() -> BandTable {
    table(&[
        (Some(40.0), "Poor", AlertLevel::Warning),
        (Some(60.0), "Fair", AlertLevel::Info),
        (Some(80.0), "Good", AlertLevel::None),
        (None, "Excellent", AlertLevel::None),
    ])
}

/// All built-in tables keyed by table name
pub fn standard_tables() -> Vec<(&'static str, BandTable)> {
    vec![
        (BMI, bmi()),
        (SYSTOLIC, systolic()),
        (DIASTOLIC, diastolic()),
        (GLUCOSE_FASTING, glucose_fasting()),
        (GLUCOSE_RANDOM, glucose_post_prandial()),
        (GLUCOSE_BEFORE_MEAL, glucose_before_meal()),
        (GLUCOSE_AFTER_MEAL, glucose_post_prandial()),
        (GLUCOSE_BEDTIME, glucose_bedtime()),
        (SYMPTOM_SEVERITY, symptom_severity()),
        (MEDICATION_EFFECTIVENESS, medication_effectiveness()),
        (HEALTH_SCORE, health_score()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tables_are_valid() {
        for (name, table) in standard_tables() {
            assert!(table.validate().is_ok(), "table {} failed validation", name);
            assert_eq!(table.floor(), Some(0.0));
        }
    }

    #[test]
    fn test_standard_table_names_are_unique() {
        let mut names: Vec<&str> = standard_tables().into_iter().map(|(n, _)| n).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_fasting_glucose_bands() {
        let table = glucose_fasting();
        assert_eq!(table.classify(50.0).unwrap().label, "Very Low");
        assert_eq!(table.classify(92.0).unwrap().label, "Normal");
        assert_eq!(table.classify(110.0).unwrap().label, "Prediabetic Range");
        assert_eq!(table.classify(126.0).unwrap().label, "Diabetic Range");
        assert_eq!(table.classify(260.0).unwrap().alert_level, AlertLevel::Critical);
    }

    #[test]
    fn test_medication_effectiveness_bands() {
        let table = medication_effectiveness();
        assert_eq!(table.classify(3.0).unwrap().label, "Not Effective");
        assert_eq!(table.classify(5.0).unwrap().label, "Moderately Effective");
        assert_eq!(table.classify(7.0).unwrap().label, "Effective");
        assert_eq!(table.classify(8.0).unwrap().label, "Highly Effective");
    }

    #[test]
    fn test_health_score_labels() {
        let table = health_score();
        assert_eq!(table.classify(85.0).unwrap().label, "Excellent");
        assert_eq!(table.classify(60.0).unwrap().label, "Good");
        assert_eq!(table.classify(45.0).unwrap().label, "Fair");
        assert_eq!(table.classify(10.0).unwrap().label, "Poor");
    }
}
