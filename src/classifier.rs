//! Range classification
//!
//! Maps a scalar reading onto a named category using an ordered band table
//! selected by the reading's kind. Bands are contiguous: each band covers
//! `[previous upper, upper)` and the final band is unbounded above.
//!
//! Tables are validated when they are loaded, so classification itself can only
//! fail on bad input or on a kind that has no table.

use crate::error::VitalsError;
use crate::tables;
use crate::types::{AlertLevel, Category, Reading, ReadingKind, ReadingValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One band of a table. `upper` is exclusive; `None` marks the final band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    #[serde(default)]
    pub upper: Option<f64>,
    pub label: String,
    pub alert_level: AlertLevel,
}

impl Band {
    pub fn new(upper: Option<f64>, label: impl Into<String>, alert_level: AlertLevel) -> Self {
        Band {
            upper,
            label: label.into(),
            alert_level,
        }
    }
}

fn default_floor() -> Option<f64> {
    Some(0.0)
}

/// Serialized form of a band table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandTableSpec {
    /// Lowest plausible value; `null` means the domain is unbounded below
    #[serde(default = "default_floor")]
    pub floor: Option<f64>,
    pub bands: Vec<Band>,
}

/// A validated, ordered band table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BandTableSpec", into = "BandTableSpec")]
pub struct BandTable {
    floor: Option<f64>,
    bands: Vec<Band>,
}

impl BandTable {
    /// Build a table, failing fast if the bands are not contiguous and increasing
    pub fn new(floor: Option<f64>, bands: Vec<Band>) -> Result<Self, VitalsError> {
        let table = BandTable { floor, bands };
        table.validate()?;
        Ok(table)
    }

    /// Build a table without validation; only for the built-in tables
    pub(crate) fn from_parts(floor: Option<f64>, bands: Vec<Band>) -> Self {
        BandTable { floor, bands }
    }

    /// Check the table invariants
    pub fn validate(&self) -> Result<(), VitalsError> {
        if self.bands.is_empty() {
            return Err(VitalsError::Configuration(
                "band table has no bands".to_string(),
            ));
        }

        if let Some(floor) = self.floor {
            if !floor.is_finite() {
                return Err(VitalsError::Configuration(format!(
                    "band table floor must be finite, got {}",
                    floor
                )));
            }
        }

        let last = self.bands.len() - 1;
        let mut previous = self.floor;

        for (i, band) in self.bands.iter().enumerate() {
            if band.label.trim().is_empty() {
                return Err(VitalsError::Configuration(format!(
                    "band {} has an empty label",
                    i
                )));
            }

            match (i == last, band.upper) {
                (true, None) => {}
                (true, Some(upper)) => {
                    return Err(VitalsError::Configuration(format!(
                        "final band '{}' must be unbounded above, got upper bound {}",
                        band.label, upper
                    )));
                }
                (false, None) => {
                    return Err(VitalsError::Configuration(format!(
                        "band '{}' is unbounded but is not the final band",
                        band.label
                    )));
                }
                (false, Some(upper)) => {
                    if !upper.is_finite() {
                        return Err(VitalsError::Configuration(format!(
                            "band '{}' upper bound must be finite",
                            band.label
                        )));
                    }
                    if let Some(prev) = previous {
                        if upper <= prev {
                            return Err(VitalsError::Configuration(format!(
                                "band '{}' upper bound {} does not exceed {}",
                                band.label, upper, prev
                            )));
                        }
                    }
                    previous = Some(upper);
                }
            }
        }

        Ok(())
    }

    pub fn floor(&self) -> Option<f64> {
        self.floor
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Classify a value against this table
    pub fn classify(&self, value: f64) -> Result<Category, VitalsError> {
        if !value.is_finite() {
            return Err(VitalsError::InvalidReading(format!(
                "value must be finite, got {}",
                value
            )));
        }

        if let Some(floor) = self.floor {
            if value < floor {
                return Err(VitalsError::InvalidReading(format!(
                    "value {} is below the domain minimum {}",
                    value, floor
                )));
            }
        }

        let index = self
            .bands
            .iter()
            .position(|band| band.upper.map_or(true, |upper| value < upper))
            .unwrap_or(self.bands.len() - 1);

        Ok(self.category_at(index))
    }

    fn category_at(&self, index: usize) -> Category {
        let band = &self.bands[index];
        Category {
            label: band.label.clone(),
            severity_rank: index as u32,
            alert_level: band.alert_level,
        }
    }
}

impl TryFrom<BandTableSpec> for BandTable {
    type Error = VitalsError;

    fn try_from(spec: BandTableSpec) -> Result<Self, Self::Error> {
        BandTable::new(spec.floor, spec.bands)
    }
}

impl From<BandTable> for BandTableSpec {
    fn from(table: BandTable) -> Self {
        BandTableSpec {
            floor: table.floor,
            bands: table.bands,
        }
    }
}

/// Classifier holding one band table per reading kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeClassifier {
    tables: BTreeMap<String, BandTable>,
}

impl RangeClassifier {
    /// Create a classifier with no tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with the built-in tables
    pub fn standard() -> Self {
        Self {
            tables: tables::standard_tables()
                .into_iter()
                .map(|(name, table)| (name.to_string(), table))
                .collect(),
        }
    }

    /// Load tables from JSON, validating every table
    pub fn from_json(json: &str) -> Result<Self, VitalsError> {
        serde_json::from_str(json)
            .map_err(|e| VitalsError::Configuration(format!("invalid band tables: {}", e)))
    }

    /// Overlay tables from JSON onto this classifier, replacing same-named tables
    pub fn extend_from_json(&mut self, json: &str) -> Result<(), VitalsError> {
        let overlay = Self::from_json(json)?;
        self.tables.extend(overlay.tables);
        Ok(())
    }

    /// Serialize the tables to JSON
    pub fn to_json(&self) -> Result<String, VitalsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Register a table under a name
    pub fn insert(&mut self, name: impl Into<String>, table: BandTable) -> Result<(), VitalsError> {
        table.validate()?;
        self.tables.insert(name.into(), table);
        Ok(())
    }

    /// Builder-style variant of [`RangeClassifier::insert`]
    pub fn with_table(mut self, name: impl Into<String>, table: BandTable) -> Result<Self, VitalsError> {
        self.insert(name, table)?;
        Ok(self)
    }

    /// Names of the loaded tables, sorted
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|k| k.as_str())
    }

    /// Look up the table for a kind
    pub fn table(&self, kind: &ReadingKind) -> Result<&BandTable, VitalsError> {
        let name = kind.table_name();
        self.tables.get(name.as_ref()).ok_or_else(|| {
            VitalsError::Configuration(format!("no band table for kind '{}'", kind))
        })
    }

    /// Whether readings of this kind have the tables they need
    pub fn can_classify(&self, kind: &ReadingKind) -> bool {
        match kind {
            ReadingKind::BloodPressure => {
                self.tables.contains_key(tables::SYSTOLIC) && self.tables.contains_key(tables::DIASTOLIC)
            }
            other => self.tables.contains_key(other.table_name().as_ref()),
        }
    }

    /// Classify a scalar value of the given kind
    pub fn classify(&self, value: f64, kind: &ReadingKind) -> Result<Category, VitalsError> {
        if !value.is_finite() {
            return Err(VitalsError::InvalidReading(format!(
                "{} value must be finite, got {}",
                kind, value
            )));
        }

        self.table(kind)?
            .classify(value)
            .map_err(|e| match e {
                VitalsError::InvalidReading(msg) => {
                    VitalsError::InvalidReading(format!("{}: {}", kind, msg))
                }
                other => other,
            })
    }

    /// Classify a blood pressure pair. The component with the higher severity
    /// rank decides; ties resolve to the systolic category.
    pub fn classify_blood_pressure(
        &self,
        systolic: f64,
        diastolic: f64,
    ) -> Result<Category, VitalsError> {
        let sys = self.classify(systolic, &ReadingKind::Systolic)?;
        let dia = self.classify(diastolic, &ReadingKind::Diastolic)?;

        if dia.severity_rank > sys.severity_rank {
            Ok(dia)
        } else {
            Ok(sys)
        }
    }

    /// Classify a full reading. The kind selects the rule; a value whose shape
    /// does not fit the kind is an invalid reading.
    pub fn classify_reading(&self, reading: &Reading) -> Result<Category, VitalsError> {
        reading.check_shape()?;

        match reading.value {
            ReadingValue::Scalar(value) => self.classify(value, &reading.kind),
            ReadingValue::BloodPressure {
                systolic,
                diastolic,
                pulse,
            } => {
                if let Some(pulse) = pulse {
                    if !pulse.is_finite() || pulse < 0.0 {
                        return Err(VitalsError::InvalidReading(format!(
                            "pulse must be a non-negative finite number, got {}",
                            pulse
                        )));
                    }
                }
                self.classify_blood_pressure(systolic, diastolic)
            }
        }
    }
}
