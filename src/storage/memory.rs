//! In-memory collaborator backends
//!
//! Thread-safe via `RwLock`. Not durable: data is lost on restart. Used by
//! the scenario replay binary and throughout the test-suite.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use super::persistence::{BatchRegistry, FeedingLedger, MeasurementStore, StorageError};
use crate::types::{BatchSnapshot, FeedEntry, FeedWindow, GrowthMeasurement};

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Backend(e.to_string())
}

// ============================================================================
// Batch registry
// ============================================================================

/// Batches keyed by `(tenant_id, batch_id)`.
#[derive(Default)]
pub struct InMemoryBatchRegistry {
    batches: RwLock<HashMap<(String, String), BatchSnapshot>>,
}

impl InMemoryBatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a batch.
    pub fn upsert(&self, batch: BatchSnapshot) -> Result<(), StorageError> {
        let mut store = self.batches.write().map_err(poisoned)?;
        store.insert((batch.tenant_id.clone(), batch.batch_id.clone()), batch);
        Ok(())
    }
}

impl BatchRegistry for InMemoryBatchRegistry {
    fn load_batch(&self, batch_id: &str, tenant_id: &str) -> Result<BatchSnapshot, StorageError> {
        let store = self.batches.read().map_err(poisoned)?;
        store
            .get(&(tenant_id.to_string(), batch_id.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::batch_not_found(batch_id))
    }

    fn apply_measured_weight(
        &self,
        batch_id: &str,
        tenant_id: &str,
        avg_weight_g: f64,
        biomass_kg: f64,
        measured_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut store = self.batches.write().map_err(poisoned)?;
        let batch = store
            .get_mut(&(tenant_id.to_string(), batch_id.to_string()))
            .ok_or_else(|| StorageError::batch_not_found(batch_id))?;
        batch.current_avg_weight_g = avg_weight_g;
        batch.current_biomass_kg = Some(biomass_kg);
        batch.last_measured_at = Some(measured_at);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

// ============================================================================
// Feeding ledger
// ============================================================================

#[derive(Default)]
pub struct InMemoryFeedingLedger {
    entries: RwLock<Vec<FeedEntry>>,
}

impl InMemoryFeedingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: FeedEntry) -> Result<(), StorageError> {
        if !entry.amount_kg.is_finite() || entry.amount_kg < 0.0 {
            return Err(StorageError::Conflict(format!(
                "feed amount must be a non-negative number, got {}",
                entry.amount_kg
            )));
        }
        self.entries.write().map_err(poisoned)?.push(entry);
        Ok(())
    }
}

impl FeedingLedger for InMemoryFeedingLedger {
    fn sum_feed(&self, batch_id: &str, tenant_id: &str, window: FeedWindow) -> Result<f64, StorageError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .iter()
            .filter(|e| e.batch_id == batch_id && e.tenant_id == tenant_id)
            .filter(|e| window.contains(e.fed_at))
            .map(|e| e.amount_kg)
            .sum())
    }
}

// ============================================================================
// Measurement store
// ============================================================================

#[derive(Default)]
pub struct InMemoryMeasurementStore {
    measurements: RwLock<Vec<GrowthMeasurement>>,
}

impl InMemoryMeasurementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.measurements.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MeasurementStore for InMemoryMeasurementStore {
    fn history(&self, batch_id: &str, tenant_id: &str) -> Result<Vec<GrowthMeasurement>, StorageError> {
        let store = self.measurements.read().map_err(poisoned)?;
        let mut history: Vec<GrowthMeasurement> = store
            .iter()
            .filter(|m| m.batch_id == batch_id && m.tenant_id == tenant_id)
            .cloned()
            .collect();
        // Stable: same-date measurements keep insertion order
        history.sort_by_key(|m| m.measurement_date);
        Ok(history)
    }

    fn get(&self, tenant_id: &str, measurement_id: &str) -> Result<GrowthMeasurement, StorageError> {
        let store = self.measurements.read().map_err(poisoned)?;
        store
            .iter()
            .find(|m| m.id == measurement_id && m.tenant_id == tenant_id)
            .cloned()
            .ok_or_else(|| StorageError::measurement_not_found(measurement_id))
    }

    fn append(&self, measurement: &GrowthMeasurement) -> Result<(), StorageError> {
        let mut store = self.measurements.write().map_err(poisoned)?;
        if store.iter().any(|m| m.id == measurement.id) {
            return Err(StorageError::Conflict(format!(
                "measurement {} already exists",
                measurement.id
            )));
        }
        store.push(measurement.clone());
        Ok(())
    }

    fn update(&self, measurement: &GrowthMeasurement) -> Result<(), StorageError> {
        let mut store = self.measurements.write().map_err(poisoned)?;
        let slot = store
            .iter_mut()
            .find(|m| m.id == measurement.id && m.tenant_id == measurement.tenant_id)
            .ok_or_else(|| StorageError::measurement_not_found(&measurement.id))?;
        *slot = measurement.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::{batch, measurement_at};
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::days(n)
    }

    #[test]
    fn test_registry_scopes_by_tenant() {
        let registry = InMemoryBatchRegistry::new();
        registry.upsert(batch("B1", "T1")).unwrap();

        assert!(registry.load_batch("B1", "T1").is_ok());
        let err = registry.load_batch("B1", "OTHER").unwrap_err();
        assert!(matches!(err, StorageError::NotFound { entity: "batch", .. }));
    }

    #[test]
    fn test_apply_measured_weight_updates_running_values() {
        let registry = InMemoryBatchRegistry::new();
        registry.upsert(batch("B1", "T1")).unwrap();
        registry
            .apply_measured_weight("B1", "T1", 120.0, 1_150.0, day(10))
            .unwrap();

        let b = registry.load_batch("B1", "T1").unwrap();
        assert_eq!(b.current_avg_weight_g, 120.0);
        assert_eq!(b.current_biomass_kg, Some(1_150.0));
        assert_eq!(b.last_measured_at, Some(day(10)));
    }

    #[test]
    fn test_ledger_sums_window_only() {
        let ledger = InMemoryFeedingLedger::new();
        for (d, kg) in [(0, 10.0), (5, 20.0), (10, 30.0)] {
            ledger
                .record(FeedEntry {
                    batch_id: "B1".to_string(),
                    tenant_id: "T1".to_string(),
                    fed_at: day(d),
                    amount_kg: kg,
                })
                .unwrap();
        }

        let sum = ledger
            .sum_feed("B1", "T1", FeedWindow::between(day(1), day(10)))
            .unwrap();
        assert!((sum - 50.0).abs() < 1e-9);
        let all = ledger.sum_feed("B1", "T1", FeedWindow::until(None)).unwrap();
        assert!((all - 60.0).abs() < 1e-9);
        assert_eq!(ledger.sum_feed("B2", "T1", FeedWindow::default()).unwrap(), 0.0);
    }

    #[test]
    fn test_ledger_rejects_negative_feed() {
        let ledger = InMemoryFeedingLedger::new();
        let result = ledger.record(FeedEntry {
            batch_id: "B1".to_string(),
            tenant_id: "T1".to_string(),
            fed_at: day(0),
            amount_kg: -1.0,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_history_is_ordered_by_measurement_date() {
        let store = InMemoryMeasurementStore::new();
        store.append(&measurement_at("m2", day(14), 30.0)).unwrap();
        store.append(&measurement_at("m1", day(0), 20.0)).unwrap();
        store.append(&measurement_at("m3", day(28), 45.0)).unwrap();

        let ids: Vec<String> = store
            .history("B1", "T1")
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn test_windowed_queries() {
        let store = InMemoryMeasurementStore::new();
        for (i, d) in [0, 14, 28, 42].iter().enumerate() {
            store
                .append(&measurement_at(&format!("m{i}"), day(*d), 20.0 + *d as f64))
                .unwrap();
        }

        assert_eq!(store.in_range("B1", "T1", day(14), day(28)).unwrap().len(), 2);
        assert_eq!(
            store.latest_before("B1", "T1", day(28)).unwrap().map(|m| m.id),
            Some("m1".to_string())
        );
        assert_eq!(
            store.latest_at_or_before("B1", "T1", Some(day(28))).unwrap().map(|m| m.id),
            Some("m2".to_string())
        );
        assert!(store.latest_before("B1", "T1", day(0)).unwrap().is_none());

        let recent = store.recent("B1", "T1", 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, "m2");
        assert_eq!(recent[1].id, "m3");
    }

    #[test]
    fn test_append_rejects_duplicate_id_and_update_requires_existing() {
        let store = InMemoryMeasurementStore::new();
        let m = measurement_at("m1", day(0), 20.0);
        store.append(&m).unwrap();
        assert!(matches!(store.append(&m), Err(StorageError::Conflict(_))));

        let ghost = measurement_at("ghost", day(1), 20.0);
        assert!(matches!(store.update(&ghost), Err(StorageError::NotFound { .. })));

        let mut verified = m.clone();
        verified.is_verified = true;
        store.update(&verified).unwrap();
        assert!(store.get("T1", "m1").unwrap().is_verified);
    }
}
