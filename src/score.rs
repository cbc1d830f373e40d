//! Composite health scoring
//!
//! Combines weighted contributions from profile factors into a bounded index.
//! A score starts from the table's base value, each present factor adds the delta
//! its rule produces, and the total is clamped to the table's scale and rounded
//! to one decimal place. Every delta is reported so the value can be traced back
//! to the factors that produced it.

use crate::error::VitalsError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Factor names understood by the standard weight tables
pub mod factors {
    pub const BMI: &str = "bmi";
    pub const AGE: &str = "age";
    pub const HAS_SLEEP_SCHEDULE: &str = "has_sleep_schedule";
    pub const HAS_WORKOUT_ROUTINE: &str = "has_workout_routine";
    pub const HAS_HEALTH_GOALS: &str = "has_health_goals";
    pub const CHRONIC_CONDITIONS: &str = "chronic_conditions";
    pub const MEDICATIONS: &str = "medications";
    pub const EXERCISE_DAYS_PER_WEEK: &str = "exercise_days_per_week";
    pub const SLEEP_HOURS: &str = "sleep_hours";
    pub const STRESS_LEVEL: &str = "stress_level";
    pub const DIET: &str = "diet";
}

/// Calculate BMI from weight and height
///
/// Formula: BMI = weight(kg) / height(m)²
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> Result<f64, VitalsError> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(VitalsError::InvalidReading(format!(
            "weight must be a positive number of kilograms, got {}",
            weight_kg
        )));
    }
    if !height_cm.is_finite() || height_cm <= 0.0 {
        return Err(VitalsError::InvalidReading(format!(
            "height must be a positive number of centimeters, got {}",
            height_cm
        )));
    }

    let height_m = height_cm / 100.0;
    Ok(weight_kg / (height_m * height_m))
}

/// Round half-up to the given number of decimal places
pub fn round_half_up(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    // A few ulps of the scaled value absorb binary error on exact halves (e.g. 0.15)
    let nudge = scaled.abs().max(1.0) * f64::EPSILON * 8.0;
    (scaled + 0.5 + nudge).floor() / factor
}

/// Value of a single factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactorValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl FactorValue {
    fn kind_name(&self) -> &'static str {
        match self {
            FactorValue::Flag(_) => "flag",
            FactorValue::Number(_) => "number",
            FactorValue::Text(_) => "text",
        }
    }
}

/// Named factor values supplied by the profile provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeScoreInput {
    factors: BTreeMap<String, FactorValue>,
}

impl CompositeScoreInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FactorValue) {
        self.factors.insert(name.into(), value);
    }

    pub fn with_number(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, FactorValue::Number(value));
        self
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.insert(name, FactorValue::Flag(value));
        self
    }

    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, FactorValue::Text(value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&FactorValue> {
        self.factors.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

/// Half-open `[min, max)` range paired with the delta it contributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeDelta {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    pub delta: f64,
}

impl RangeDelta {
    pub fn new(min: Option<f64>, max: Option<f64>, delta: f64) -> Self {
        RangeDelta { min, max, delta }
    }

    fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value < max)
    }
}

/// Contribution rule for one factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FactorRule {
    /// First matching range wins; `otherwise` applies when none match
    Range {
        bands: Vec<RangeDelta>,
        #[serde(default)]
        otherwise: f64,
    },
    Flag {
        when_true: f64,
        #[serde(default)]
        when_false: f64,
    },
    /// Delta multiplied by a non-negative count
    PerUnit { delta: f64 },
    /// Case-insensitive match of a text value
    Choice {
        options: BTreeMap<String, f64>,
        #[serde(default)]
        otherwise: f64,
    },
}

impl FactorRule {
    fn validate(&self, factor: &str) -> Result<(), VitalsError> {
        let finite = |v: f64, what: &str| {
            if v.is_finite() {
                Ok(())
            } else {
                Err(VitalsError::Configuration(format!(
                    "factor '{}': {} must be finite",
                    factor, what
                )))
            }
        };

        match self {
            FactorRule::Range { bands, otherwise } => {
                if bands.is_empty() {
                    return Err(VitalsError::Configuration(format!(
                        "factor '{}': range rule has no bands",
                        factor
                    )));
                }
                for band in bands {
                    finite(band.delta, "range delta")?;
                    if let (Some(min), Some(max)) = (band.min, band.max) {
                        if !(min < max) {
                            return Err(VitalsError::Configuration(format!(
                                "factor '{}': empty range [{}, {})",
                                factor, min, max
                            )));
                        }
                    }
                }
                finite(*otherwise, "otherwise delta")
            }
            FactorRule::Flag {
                when_true,
                when_false,
            } => {
                finite(*when_true, "when_true")?;
                finite(*when_false, "when_false")
            }
            FactorRule::PerUnit { delta } => finite(*delta, "per-unit delta"),
            FactorRule::Choice { options, otherwise } => {
                for delta in options.values() {
                    finite(*delta, "choice delta")?;
                }
                finite(*otherwise, "otherwise delta")
            }
        }
    }

    /// Delta this rule contributes for a value
    pub fn contribution(&self, factor: &str, value: &FactorValue) -> Result<f64, VitalsError> {
        let mismatch = || {
            VitalsError::InvalidReading(format!(
                "factor '{}' does not accept a {} value",
                factor,
                value.kind_name()
            ))
        };

        match (self, value) {
            (FactorRule::Range { bands, otherwise }, FactorValue::Number(v)) => {
                let v = finite_number(factor, *v)?;
                Ok(bands
                    .iter()
                    .find(|band| band.contains(v))
                    .map_or(*otherwise, |band| band.delta))
            }
            (
                FactorRule::Flag {
                    when_true,
                    when_false,
                },
                FactorValue::Flag(flag),
            ) => Ok(if *flag { *when_true } else { *when_false }),
            (FactorRule::PerUnit { delta }, FactorValue::Number(count)) => {
                let count = finite_number(factor, *count)?;
                if count < 0.0 {
                    return Err(VitalsError::InvalidReading(format!(
                        "factor '{}' count cannot be negative, got {}",
                        factor, count
                    )));
                }
                Ok(delta * count)
            }
            (FactorRule::Choice { options, otherwise }, FactorValue::Text(text)) => Ok(options
                .iter()
                .find(|(option, _)| option.eq_ignore_ascii_case(text.trim()))
                .map_or(*otherwise, |(_, delta)| *delta)),
            _ => Err(mismatch()),
        }
    }
}

fn finite_number(factor: &str, value: f64) -> Result<f64, VitalsError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(VitalsError::InvalidReading(format!(
            "factor '{}' must be finite, got {}",
            factor, value
        )))
    }
}

/// Inclusive bounds of a score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreScale {
    pub min: f64,
    pub max: f64,
}

/// Serialized form of a weight table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightTableSpec {
    pub name: String,
    pub base: f64,
    pub scale: ScoreScale,
    #[serde(default)]
    pub factors: BTreeMap<String, FactorRule>,
}

/// Validated weight table: base score, scale, and one rule per factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WeightTableSpec", into = "WeightTableSpec")]
pub struct WeightTable {
    name: String,
    base: f64,
    scale: ScoreScale,
    factors: BTreeMap<String, FactorRule>,
}

impl WeightTable {
    /// Create a table with no factors
    pub fn new(name: impl Into<String>, base: f64, scale: ScoreScale) -> Result<Self, VitalsError> {
        let table = WeightTable {
            name: name.into(),
            base,
            scale,
            factors: BTreeMap::new(),
        };
        table.validate()?;
        Ok(table)
    }

    /// Add a factor rule
    pub fn with_factor(mut self, factor: impl Into<String>, rule: FactorRule) -> Result<Self, VitalsError> {
        let factor = factor.into();
        rule.validate(&factor)?;
        self.factors.insert(factor, rule);
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), VitalsError> {
        let ScoreScale { min, max } = self.scale;
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(VitalsError::Configuration(format!(
                "weight table '{}': invalid scale [{}, {}]",
                self.name, min, max
            )));
        }
        if !self.base.is_finite() || self.base < min || self.base > max {
            return Err(VitalsError::Configuration(format!(
                "weight table '{}': base {} outside scale [{}, {}]",
                self.name, self.base, min, max
            )));
        }
        for (factor, rule) in &self.factors {
            rule.validate(factor)?;
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn scale(&self) -> ScoreScale {
        self.scale
    }

    pub fn factors(&self) -> &BTreeMap<String, FactorRule> {
        &self.factors
    }

    /// Load a weight table from JSON
    pub fn from_json(json: &str) -> Result<Self, VitalsError> {
        serde_json::from_str(json)
            .map_err(|e| VitalsError::Configuration(format!("invalid weight table: {}", e)))
    }

    pub fn to_json(&self) -> Result<String, VitalsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Wellness index on a 0-10 scale, starting from 5
    pub fn wellness_index() -> Self {
        WeightTable::from_parts(
            "wellness_index",
            5.0,
            ScoreScale { min: 0.0, max: 10.0 },
            vec![
                (
                    factors::BMI,
                    FactorRule::Range {
                        bands: vec![
                            RangeDelta::new(None, Some(17.0), -1.5),
                            RangeDelta::new(Some(18.5), Some(25.0), 2.0),
                            RangeDelta::new(Some(30.0), None, -1.5),
                        ],
                        otherwise: 0.0,
                    },
                ),
                (
                    factors::AGE,
                    FactorRule::Range {
                        bands: vec![RangeDelta::new(Some(18.0), Some(65.0), 1.0)],
                        otherwise: 0.0,
                    },
                ),
                (
                    factors::HAS_SLEEP_SCHEDULE,
                    FactorRule::Flag {
                        when_true: 0.5,
                        when_false: 0.0,
                    },
                ),
                (
                    factors::HAS_WORKOUT_ROUTINE,
                    FactorRule::Flag {
                        when_true: 1.0,
                        when_false: 0.0,
                    },
                ),
                (factors::CHRONIC_CONDITIONS, FactorRule::PerUnit { delta: -0.5 }),
            ],
        )
    }

    /// Health score on a 0-100 scale, starting from 50
    pub fn health_score() -> Self {
        let diet = [("balanced", 15.0), ("vegetarian", 10.0), ("vegan", 10.0), ("poor", -10.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        WeightTable::from_parts(
            "health_score",
            50.0,
            ScoreScale { min: 0.0, max: 100.0 },
            vec![
                (
                    factors::BMI,
                    FactorRule::Range {
                        bands: vec![RangeDelta::new(Some(18.5), Some(25.0), 20.0)],
                        otherwise: 0.0,
                    },
                ),
                (
                    factors::EXERCISE_DAYS_PER_WEEK,
                    FactorRule::Range {
                        bands: vec![
                            RangeDelta::new(None, Some(1.0), -10.0),
                            RangeDelta::new(Some(1.0), Some(3.0), 5.0),
                            RangeDelta::new(Some(3.0), Some(5.0), 10.0),
                            RangeDelta::new(Some(5.0), None, 15.0),
                        ],
                        otherwise: 0.0,
                    },
                ),
                (
                    factors::SLEEP_HOURS,
                    FactorRule::Range {
                        bands: vec![
                            RangeDelta::new(None, Some(6.0), -15.0),
                            RangeDelta::new(Some(6.0), Some(7.0), 5.0),
                            RangeDelta::new(Some(7.0), Some(10.0), 15.0),
                        ],
                        otherwise: 0.0,
                    },
                ),
                (
                    factors::STRESS_LEVEL,
                    FactorRule::Range {
                        bands: vec![
                            RangeDelta::new(None, Some(4.0), 10.0),
                            RangeDelta::new(Some(7.0), None, -15.0),
                        ],
                        otherwise: 0.0,
                    },
                ),
                (
                    factors::DIET,
                    FactorRule::Choice {
                        options: diet,
                        otherwise: 0.0,
                    },
                ),
                (factors::CHRONIC_CONDITIONS, FactorRule::PerUnit { delta: -10.0 }),
                (factors::MEDICATIONS, FactorRule::PerUnit { delta: -5.0 }),
                (
                    factors::HAS_HEALTH_GOALS,
                    FactorRule::Flag {
                        when_true: 10.0,
                        when_false: 0.0,
                    },
                ),
            ],
        )
    }

    fn from_parts(name: &str, base: f64, scale: ScoreScale, rules: Vec<(&str, FactorRule)>) -> Self {
        WeightTable {
            name: name.to_string(),
            base,
            scale,
            factors: rules
                .into_iter()
                .map(|(factor, rule)| (factor.to_string(), rule))
                .collect(),
        }
    }
}

impl TryFrom<WeightTableSpec> for WeightTable {
    type Error = VitalsError;

    fn try_from(spec: WeightTableSpec) -> Result<Self, Self::Error> {
        let table = WeightTable {
            name: spec.name,
            base: spec.base,
            scale: spec.scale,
            factors: spec.factors,
        };
        table.validate()?;
        Ok(table)
    }
}

impl From<WeightTable> for WeightTableSpec {
    fn from(table: WeightTable) -> Self {
        WeightTableSpec {
            name: table.name,
            base: table.base,
            scale: table.scale,
            factors: table.factors,
        }
    }
}

/// The built-in weight tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardWeights {
    WellnessIndex,
    HealthScore,
}

impl StandardWeights {
    pub fn table(&self) -> WeightTable {
        match self {
            StandardWeights::WellnessIndex => WeightTable::wellness_index(),
            StandardWeights::HealthScore => WeightTable::health_score(),
        }
    }
}

impl FromStr for StandardWeights {
    type Err = VitalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wellness" | "wellness_index" => Ok(StandardWeights::WellnessIndex),
            "health" | "health_score" => Ok(StandardWeights::HealthScore),
            other => Err(VitalsError::Configuration(format!(
                "unknown weight table '{}'",
                other
            ))),
        }
    }
}

/// Final score with the per-factor breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Clamped score rounded to one decimal
    pub value: f64,
    /// Base score the contributions were added to
    pub base: f64,
    /// Base plus contributions before clamping
    pub raw: f64,
    /// Scale the value is bounded by
    pub scale: ScoreScale,
    /// Name of the weight table used
    pub table: String,
    /// Delta contributed by each present factor
    pub contributions: BTreeMap<String, f64>,
}

/// Compute a composite score.
///
/// Factors missing from the input contribute nothing; input factors the table
/// does not know are ignored. Fails without a partial result if any present
/// factor is invalid.
pub fn compute_score(
    input: &CompositeScoreInput,
    weights: &WeightTable,
) -> Result<ScoreResult, VitalsError> {
    let mut contributions = BTreeMap::new();

    for (factor, rule) in &weights.factors {
        if let Some(value) = input.get(factor) {
            let delta = rule.contribution(factor, value)?;
            contributions.insert(factor.clone(), delta);
        }
    }

    let raw = weights.base + contributions.values().sum::<f64>();
    let ScoreScale { min, max } = weights.scale;
    let value = round_half_up(raw.clamp(min, max), 1).clamp(min, max);

    Ok(ScoreResult {
        value,
        base: weights.base,
        raw,
        scale: weights.scale,
        table: weights.name.clone(),
        contributions,
    })
}

/// Profile attributes used for scoring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthProfile {
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub age_years: Option<u32>,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
    #[serde(default)]
    pub exercise_days_per_week: Option<u32>,
    /// Self-reported stress, 1-10
    #[serde(default)]
    pub stress_level: Option<u8>,
    #[serde(default)]
    pub diet: Option<String>,
    #[serde(default)]
    pub chronic_conditions: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub has_sleep_schedule: Option<bool>,
    #[serde(default)]
    pub has_workout_routine: Option<bool>,
    #[serde(default)]
    pub has_health_goals: Option<bool>,
}

impl HealthProfile {
    /// BMI rounded to one decimal, when height and weight are both known
    pub fn bmi(&self) -> Result<Option<f64>, VitalsError> {
        match (self.weight_kg, self.height_cm) {
            (Some(weight), Some(height)) => Ok(Some(round_half_up(compute_bmi(weight, height)?, 1))),
            _ => Ok(None),
        }
    }

    /// Convert the profile into score factors
    pub fn to_score_input(&self) -> Result<CompositeScoreInput, VitalsError> {
        let mut input = CompositeScoreInput::new();

        if let Some(bmi) = self.bmi()? {
            input.insert(factors::BMI, FactorValue::Number(bmi));
        }
        if let Some(age) = self.age_years {
            input.insert(factors::AGE, FactorValue::Number(age as f64));
        }
        if let Some(hours) = self.sleep_hours {
            input.insert(factors::SLEEP_HOURS, FactorValue::Number(hours));
        }
        if let Some(days) = self.exercise_days_per_week {
            input.insert(factors::EXERCISE_DAYS_PER_WEEK, FactorValue::Number(days as f64));
        }
        if let Some(stress) = self.stress_level {
            input.insert(factors::STRESS_LEVEL, FactorValue::Number(stress as f64));
        }
        if let Some(diet) = &self.diet {
            input.insert(factors::DIET, FactorValue::Text(diet.clone()));
        }
        if !self.chronic_conditions.is_empty() {
            input.insert(
                factors::CHRONIC_CONDITIONS,
                FactorValue::Number(self.chronic_conditions.len() as f64),
            );
        }
        if !self.medications.is_empty() {
            input.insert(
                factors::MEDICATIONS,
                FactorValue::Number(self.medications.len() as f64),
            );
        }
        if let Some(flag) = self.has_sleep_schedule {
            input.insert(factors::HAS_SLEEP_SCHEDULE, FactorValue::Flag(flag));
        }
        if let Some(flag) = self.has_workout_routine {
            input.insert(factors::HAS_WORKOUT_ROUTINE, FactorValue::Flag(flag));
        }
        if let Some(flag) = self.has_health_goals {
            input.insert(factors::HAS_HEALTH_GOALS, FactorValue::Flag(flag));
        }

        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_bmi_calculation() {
        // 70kg, 175cm -> BMI 22.857
        let bmi = compute_bmi(70.0, 175.0).unwrap();
        assert!((bmi - 22.857).abs() < 0.001);
        assert_eq!(round_half_up(bmi, 1), 22.9);
    }

    #[test]
    fn test_bmi_rejects_bad_measurements() {
        assert!(compute_bmi(0.0, 175.0).is_err());
        assert!(compute_bmi(70.0, -1.0).is_err());
        assert!(compute_bmi(f64::NAN, 175.0).is_err());
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(7.25, 1), 7.3);
        assert_eq!(round_half_up(7.24, 1), 7.2);
        assert_eq!(round_half_up(0.15, 1), 0.2);
        assert_eq!(round_half_up(99.5, 0), 100.0);
        assert_eq!(round_half_up(1.005, 2), 1.01);
        assert_eq!(round_half_up(2.675, 2), 2.68);
    }

    #[test]
    fn test_round_half_up_keeps_values_just_below_half() {
        assert_eq!(round_half_up(4.94999999995, 1), 4.9);
        assert_eq!(round_half_up(72.34999999, 1), 72.3);
    }

    #[test]
    fn test_wellness_index_breakdown() {
        let input = CompositeScoreInput::new()
            .with_number(factors::BMI, 22.9)
            .with_number(factors::AGE, 30.0)
            .with_flag(factors::HAS_SLEEP_SCHEDULE, true)
            .with_flag(factors::HAS_WORKOUT_ROUTINE, false)
            .with_number(factors::CHRONIC_CONDITIONS, 1.0);

        let result = compute_score(&input, &WeightTable::wellness_index()).unwrap();

        // 5 + 2 + 1 + 0.5 + 0 - 0.5
        assert_eq!(result.value, 8.0);
        assert_eq!(result.contributions[factors::BMI], 2.0);
        assert_eq!(result.contributions[factors::AGE], 1.0);
        assert_eq!(result.contributions[factors::HAS_WORKOUT_ROUTINE], 0.0);
        assert_eq!(result.contributions[factors::CHRONIC_CONDITIONS], -0.5);
        assert_eq!(result.table, "wellness_index");
    }

    #[test]
    fn test_missing_factors_are_not_penalized() {
        let result = compute_score(&CompositeScoreInput::new(), &WeightTable::wellness_index()).unwrap();
        assert_eq!(result.value, 5.0);
        assert!(result.contributions.is_empty());
    }

    #[test]
    fn test_obese_bmi_penalty() {
        let input = CompositeScoreInput::new().with_number(factors::BMI, 31.0);
        let result = compute_score(&input, &WeightTable::wellness_index()).unwrap();
        assert_eq!(result.value, 3.5);
    }

    #[test]
    fn test_score_is_clamped() {
        let input = CompositeScoreInput::new().with_number(factors::CHRONIC_CONDITIONS, 30.0);
        let result = compute_score(&input, &WeightTable::wellness_index()).unwrap();
        assert_eq!(result.value, 0.0);
        assert_eq!(result.raw, -10.0);
    }

    #[test]
    fn test_health_score_from_profile() {
        let profile = HealthProfile {
            height_cm: Some(175.0),
            weight_kg: Some(70.0),
            age_years: Some(34),
            sleep_hours: Some(6.5),
            exercise_days_per_week: Some(3),
            stress_level: Some(5),
            diet: Some("Balanced".to_string()),
            chronic_conditions: vec!["asthma".to_string()],
            medications: vec![],
            has_health_goals: Some(true),
            ..Default::default()
        };

        let input = profile.to_score_input().unwrap();
        let result = compute_score(&input, &WeightTable::health_score()).unwrap();

        // 50 + 20 (bmi) + 10 (exercise) + 5 (sleep) + 0 (stress) + 15 (diet) - 10 (condition) + 10 (goals)
        assert_eq!(result.value, 100.0);
        assert_eq!(result.raw, 100.0);
        assert_eq!(result.contributions[factors::DIET], 15.0);
        assert!(!result.contributions.contains_key(factors::MEDICATIONS));
    }

    #[test]
    fn test_type_mismatch_fails_whole_call() {
        let input = CompositeScoreInput::new()
            .with_number(factors::BMI, 22.0)
            .with_text(factors::HAS_WORKOUT_ROUTINE, "yes");

        let result = compute_score(&input, &WeightTable::wellness_index());
        assert!(matches!(result, Err(VitalsError::InvalidReading(_))));
    }

    #[test]
    fn test_negative_count_is_invalid() {
        let input = CompositeScoreInput::new().with_number(factors::CHRONIC_CONDITIONS, -2.0);
        assert!(compute_score(&input, &WeightTable::wellness_index()).is_err());
    }

    #[test]
    fn test_weight_table_from_json() {
        let json = r#"{
            "name": "hydration_focus",
            "base": 5,
            "scale": { "min": 0, "max": 10 },
            "factors": {
                "glasses_per_day": {
                    "rule": "range",
                    "bands": [ { "min": 8, "delta": 2 } ],
                    "otherwise": -1
                },
                "tracks_intake": { "rule": "flag", "when_true": 1 }
            }
        }"#;

        let table = WeightTable::from_json(json).unwrap();
        let input = CompositeScoreInput::new()
            .with_number("glasses_per_day", 6.0)
            .with_flag("tracks_intake", true);
        let result = compute_score(&input, &table).unwrap();
        assert_eq!(result.value, 5.0);
    }

    #[test]
    fn test_weight_table_rejects_base_outside_scale() {
        let json = r#"{ "name": "bad", "base": 12, "scale": { "min": 0, "max": 10 } }"#;
        assert!(matches!(
            WeightTable::from_json(json),
            Err(VitalsError::Configuration(_))
        ));
        assert!(WeightTable::new("bad", 0.0, ScoreScale { min: 5.0, max: 5.0 }).is_err());
    }

    #[test]
    fn test_standard_tables_validate() {
        assert!(WeightTable::wellness_index().validate().is_ok());
        assert!(WeightTable::health_score().validate().is_ok());
        assert_eq!(
            "wellness".parse::<StandardWeights>().unwrap(),
            StandardWeights::WellnessIndex
        );
    }

    fn arb_input() -> impl Strategy<Value = CompositeScoreInput> {
        (
            proptest::option::of(10.0f64..50.0),
            proptest::option::of(0.0f64..100.0),
            proptest::option::of(any::<bool>()),
            proptest::option::of(any::<bool>()),
            proptest::option::of(0u32..20),
            proptest::option::of(0.0f64..14.0),
            proptest::option::of(0u32..8),
        )
            .prop_map(|(bmi, age, sleep, workout, chronic, hours, exercise)| {
                let mut input = CompositeScoreInput::new();
                if let Some(v) = bmi {
                    input.insert(factors::BMI, FactorValue::Number(v));
                }
                if let Some(v) = age {
                    input.insert(factors::AGE, FactorValue::Number(v));
                }
                if let Some(v) = sleep {
                    input.insert(factors::HAS_SLEEP_SCHEDULE, FactorValue::Flag(v));
                }
                if let Some(v) = workout {
                    input.insert(factors::HAS_WORKOUT_ROUTINE, FactorValue::Flag(v));
                }
                if let Some(v) = chronic {
                    input.insert(factors::CHRONIC_CONDITIONS, FactorValue::Number(v as f64));
                }
                if let Some(v) = hours {
                    input.insert(factors::SLEEP_HOURS, FactorValue::Number(v));
                }
                if let Some(v) = exercise {
                    input.insert(factors::EXERCISE_DAYS_PER_WEEK, FactorValue::Number(v as f64));
                }
                input
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Property: the score always lies within the table's scale
        #[test]
        fn prop_score_bounded(input in arb_input()) {
            for table in [WeightTable::wellness_index(), WeightTable::health_score()] {
                let result = compute_score(&input, &table).unwrap();
                prop_assert!(result.value >= table.scale().min);
                prop_assert!(result.value <= table.scale().max);
            }
        }

        /// Property: base plus contributions, clamped, reproduces the value
        #[test]
        fn prop_score_traceable(input in arb_input()) {
            for table in [WeightTable::wellness_index(), WeightTable::health_score()] {
                let result = compute_score(&input, &table).unwrap();
                let ScoreScale { min, max } = result.scale;
                let rebuilt = (result.base + result.contributions.values().sum::<f64>()).clamp(min, max);
                prop_assert!((rebuilt - result.value).abs() <= 0.05 + 1e-9);
            }
        }
    }
}
