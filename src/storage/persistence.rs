//! Collaborator traits: batch registry, feeding ledger, measurement store
//!
//! The engine never touches a database directly. Every read and the single
//! batch write-back go through these traits so backends can be swapped
//! without touching the analytics code:
//! - `InMemoryBatchRegistry` / `InMemoryFeedingLedger` / `InMemoryMeasurementStore`
//!   for tests, scenario replay and minimal deployments
//! - relational backends live in the host application

use chrono::{DateTime, Utc};

use crate::types::{BatchSnapshot, FeedWindow, GrowthMeasurement};

/// Errors raised by collaborator backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn batch_not_found(batch_id: &str) -> Self {
        StorageError::NotFound {
            entity: "batch",
            id: batch_id.to_string(),
        }
    }

    pub fn measurement_not_found(measurement_id: &str) -> Self {
        StorageError::NotFound {
            entity: "measurement",
            id: measurement_id.to_string(),
        }
    }
}

/// Read access to production batches plus the narrow weight write-back.
///
/// Implementations must be thread-safe (Send + Sync) for shared access.
pub trait BatchRegistry: Send + Sync {
    /// Load a batch scoped to its tenant. Fails with `NotFound` if absent.
    fn load_batch(&self, batch_id: &str, tenant_id: &str) -> Result<BatchSnapshot, StorageError>;

    /// Write the measured average weight and biomass back to the batch.
    fn apply_measured_weight(
        &self,
        batch_id: &str,
        tenant_id: &str,
        avg_weight_g: f64,
        biomass_kg: f64,
        measured_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Read-only aggregation over the feeding log.
pub trait FeedingLedger: Send + Sync {
    /// Total feed delivered to the batch inside the (inclusive) window, in kg.
    fn sum_feed(&self, batch_id: &str, tenant_id: &str, window: FeedWindow) -> Result<f64, StorageError>;
}

/// Append-only history of growth measurements.
///
/// Only `history`, `get`, `append` and `update` are required; the windowed
/// queries default to filtering the full history, which backends with an
/// index should override.
pub trait MeasurementStore: Send + Sync {
    /// All measurements for a batch, ordered by `measurement_date` ascending.
    fn history(&self, batch_id: &str, tenant_id: &str) -> Result<Vec<GrowthMeasurement>, StorageError>;

    /// Fetch a measurement by id. Fails with `NotFound` if absent.
    fn get(&self, tenant_id: &str, measurement_id: &str) -> Result<GrowthMeasurement, StorageError>;

    /// Append a freshly recorded measurement.
    fn append(&self, measurement: &GrowthMeasurement) -> Result<(), StorageError>;

    /// Replace a stored measurement (verification and processed flag only).
    fn update(&self, measurement: &GrowthMeasurement) -> Result<(), StorageError>;

    /// Measurements with `start <= date <= end`, ascending.
    fn in_range(
        &self,
        batch_id: &str,
        tenant_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<GrowthMeasurement>, StorageError> {
        Ok(self
            .history(batch_id, tenant_id)?
            .into_iter()
            .filter(|m| m.measurement_date >= start && m.measurement_date <= end)
            .collect())
    }

    /// Latest measurement at or before `as_of` (or the latest overall).
    fn latest_at_or_before(
        &self,
        batch_id: &str,
        tenant_id: &str,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<Option<GrowthMeasurement>, StorageError> {
        Ok(self
            .history(batch_id, tenant_id)?
            .into_iter()
            .filter(|m| as_of.map_or(true, |t| m.measurement_date <= t))
            .last())
    }

    /// Latest measurement strictly before `at`.
    fn latest_before(
        &self,
        batch_id: &str,
        tenant_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<GrowthMeasurement>, StorageError> {
        Ok(self
            .history(batch_id, tenant_id)?
            .into_iter()
            .filter(|m| m.measurement_date < at)
            .last())
    }

    /// The most recent `limit` measurements, still in chronological order.
    fn recent(
        &self,
        batch_id: &str,
        tenant_id: &str,
        limit: usize,
    ) -> Result<Vec<GrowthMeasurement>, StorageError> {
        let history = self.history(batch_id, tenant_id)?;
        let skip = history.len().saturating_sub(limit);
        Ok(history.into_iter().skip(skip).collect())
    }
}
