//! Collaborator interfaces
//!
//! The engine never owns reading history or user profiles. Hosts inject an
//! `EntryStore` for readings and a `ProfileProvider` for scoring attributes.

use crate::error::VitalsError;
use crate::score::HealthProfile;
use crate::types::{Reading, ReadingKind};
use std::collections::{HashMap, HashSet};

/// Persistence of readings, ordered newest-first per kind
pub trait EntryStore {
    /// Up to `limit` most recent readings of `kind`, newest first
    fn fetch_recent_readings(&self, kind: &ReadingKind, limit: usize) -> Result<Vec<Reading>, VitalsError>;

    /// Store a new reading
    fn append(&mut self, reading: Reading) -> Result<(), VitalsError>;
}

/// Source of the profile attributes used for scoring
pub trait ProfileProvider {
    fn health_profile(&self) -> Result<HealthProfile, VitalsError>;
}

impl ProfileProvider for HealthProfile {
    fn health_profile(&self) -> Result<HealthProfile, VitalsError> {
        Ok(self.clone())
    }
}

/// Entry store held in memory
#[derive(Debug, Default)]
pub struct InMemoryEntryStore {
    by_kind: HashMap<ReadingKind, Vec<Reading>>,
    ids: HashSet<String>,
}

impl InMemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total readings across all kinds
    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.values().all(Vec::is_empty)
    }
}

impl EntryStore for InMemoryEntryStore {
    fn fetch_recent_readings(&self, kind: &ReadingKind, limit: usize) -> Result<Vec<Reading>, VitalsError> {
        Ok(self
            .by_kind
            .get(kind)
            .map(|readings| readings.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn append(&mut self, reading: Reading) -> Result<(), VitalsError> {
        if let Some(id) = &reading.id {
            if !self.ids.insert(id.clone()) {
                return Err(VitalsError::StoreError(format!(
                    "reading {} is already stored",
                    id
                )));
            }
        }

        let readings = self.by_kind.entry(reading.kind.clone()).or_default();
        // Equal timestamps keep insertion order, newest insert first
        let pos = readings.partition_point(|r| r.timestamp > reading.timestamp);
        readings.insert(pos, reading);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use crate::types::GlucoseContext;

    #[test]
    fn test_fetch_is_newest_first() {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
        let kind = ReadingKind::Glucose(GlucoseContext::Fasting);
        let mut store = InMemoryEntryStore::new();

        store.append(Reading::scalar(kind.clone(), 95.0, base)).unwrap();
        store.append(Reading::scalar(kind.clone(), 102.0, base + Duration::days(2))).unwrap();
        store.append(Reading::scalar(kind.clone(), 99.0, base + Duration::days(1))).unwrap();
        store.append(Reading::scalar(ReadingKind::Bmi, 23.0, base)).unwrap();

        let recent = store.fetch_recent_readings(&kind, 2).unwrap();
        let values: Vec<f64> = recent.iter().map(|r| r.value.primary()).collect();
        assert_eq!(values, vec![102.0, 99.0]);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_unknown_kind_is_empty() {
        let store = InMemoryEntryStore::new();
        assert!(store.is_empty());
        assert!(store
            .fetch_recent_readings(&ReadingKind::Systolic, 10)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
        let reading = Reading::scalar(ReadingKind::Bmi, 23.0, ts);
        let mut store = InMemoryEntryStore::new();
        store.append(reading.clone()).unwrap();
        assert!(matches!(store.append(reading), Err(VitalsError::StoreError(_))));
    }

    #[test]
    fn test_profile_provides_itself() {
        let profile = HealthProfile {
            age_years: Some(40),
            ..Default::default()
        };
        assert_eq!(profile.health_profile().unwrap(), profile);
    }
}
