//! Report encoding
//!
//! Wraps engine results in a JSON envelope that records which producer instance
//! computed them and when.

use crate::error::VitalsError;
use crate::{PRODUCER_NAME, VITALS_VERSION};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current report envelope version
pub const REPORT_VERSION: &str = "1.0.0";

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Envelope around a result body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report<T> {
    pub report_version: String,
    pub producer: Producer,
    pub computed_at_utc: String,
    pub body: T,
}

/// Encoder for producing report envelopes
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn encode<T>(&self, body: T) -> Report<T> {
        Report {
            report_version: REPORT_VERSION.to_string(),
            producer: Producer {
                name: PRODUCER_NAME.to_string(),
                version: VITALS_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            body,
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json<T: Serialize>(&self, body: T) -> Result<String, VitalsError> {
        let report = self.encode(body);
        serde_json::to_string(&report).map_err(VitalsError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::TrendAnalyzer;

    #[test]
    fn test_envelope_fields() {
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let trend = TrendAnalyzer::analyze_values(&[5.0, 3.0], 7).unwrap();
        let json = encoder.encode_to_json(&trend).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["report_version"], REPORT_VERSION);
        assert_eq!(value["producer"]["name"], PRODUCER_NAME);
        assert_eq!(value["producer"]["instance_id"], "test-instance");
        assert_eq!(value["body"]["direction"], "up");
        assert!(chrono::DateTime::parse_from_rfc3339(value["computed_at_utc"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_instances_differ() {
        assert_ne!(ReportEncoder::new().instance_id(), ReportEncoder::new().instance_id());
    }
}
