//! Measurement Recorder - the per-sample pipeline and measurement lifecycle
//!
//! `record_sample` runs:
//! 1. Statistics over the individual observations (validation first)
//! 2. Batch lookup and the previous measurement strictly before this one
//! 3. Growth comparison against the previous measurement
//! 4. Period / cumulative FCR since the previous measurement
//! 5. Performance rating and suggested actions
//! 6. Append to the history, optional write-back, cache invalidation
//!
//! Callers serialize recordings per batch (see `BatchLocks`).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::cache_key;
use crate::config::{ActionConfig, EngineConfig};
use crate::error::{EngineError, EngineResult};
use crate::fcr::FcrCalculator;
use crate::growth::{rate_performance, suggest_actions, GrowthComparisonEngine};
use crate::statistics::StatisticsEngine;
use crate::storage::{AnalysisCache, DataSources, StorageError};
use crate::types::{GrowthMeasurement, IndividualObservation, MeasurementMethod, MeasurementType};

/// A new biological sample as submitted by an operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSampleRequest {
    pub batch_id: String,
    pub tenant_id: String,
    #[serde(default)]
    pub tank_id: Option<String>,
    pub measurement_date: DateTime<Utc>,
    #[serde(default = "default_measurement_type")]
    pub measurement_type: MeasurementType,
    #[serde(default = "default_measurement_method")]
    pub measurement_method: MeasurementMethod,
    /// Head count the sample represents; defaults to the batch's current count
    #[serde(default)]
    pub population_size: Option<u64>,
    pub individual_measurements: Vec<IndividualObservation>,
    pub measured_by: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Write the new average weight back to the batch
    #[serde(default)]
    pub apply_to_batch: bool,
}

fn default_measurement_type() -> MeasurementType {
    MeasurementType::Routine
}

fn default_measurement_method() -> MeasurementMethod {
    MeasurementMethod::ManualScale
}

pub struct MeasurementRecorder {
    sources: DataSources,
    cache: Option<Arc<dyn AnalysisCache>>,
    statistics: StatisticsEngine,
    fcr: FcrCalculator,
    actions: ActionConfig,
    now: fn() -> DateTime<Utc>,
}

impl MeasurementRecorder {
    pub fn new(
        sources: DataSources,
        cache: Option<Arc<dyn AnalysisCache>>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            statistics: StatisticsEngine::new(&config.statistics),
            fcr: FcrCalculator::new(sources.clone(), config.fcr.clone()),
            sources,
            cache,
            actions: config.actions.clone(),
            now: Utc::now,
        }
    }

    /// Replace the wall clock used for `created_at` / `verified_at`.
    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Record a new sample and return the stored measurement.
    pub fn record_sample(&self, request: RecordSampleRequest) -> EngineResult<GrowthMeasurement> {
        if request.batch_id.trim().is_empty() || request.tenant_id.trim().is_empty() {
            return Err(EngineError::validation("batch_id and tenant_id are required"));
        }
        if request.measured_by.trim().is_empty() {
            return Err(EngineError::validation("measured_by is required"));
        }

        // Step 1: statistics (rejects bad samples before any lookup)
        let stats = self.statistics.calculate(&request.individual_measurements)?;

        // Step 2: context
        let batch = self
            .sources
            .batches
            .load_batch(&request.batch_id, &request.tenant_id)?;
        let population_size = request.population_size.unwrap_or(batch.current_count);
        if population_size == 0 {
            return Err(EngineError::validation("population size must be positive"));
        }
        let previous = self.sources.measurements.latest_before(
            &request.batch_id,
            &request.tenant_id,
            request.measurement_date,
        )?;

        let biomass_kg = stats.average_weight * population_size as f64 / 1000.0;

        // Step 3: growth
        let comparison = GrowthComparisonEngine::compare_for_batch(
            &batch,
            previous.as_ref(),
            request.measurement_date,
            stats.average_weight,
        );

        // Step 4: FCR
        let fcr_analysis = self.fcr.analyze_measurement_fcr(
            &batch,
            previous.as_ref(),
            request.measurement_date,
            biomass_kg,
        )?;

        // Step 5: rating and actions
        let performance = comparison.as_ref().map(|c| rate_performance(c.variance_percent));
        let sample_size = request.individual_measurements.len();
        let suggested = suggest_actions(
            comparison.as_ref(),
            fcr_analysis.as_ref(),
            stats.weight_cv,
            sample_size,
            &self.actions,
        );

        debug!(
            batch_id = %request.batch_id,
            avg_weight = stats.average_weight,
            variance_percent = comparison.as_ref().map(|c| c.variance_percent),
            period_fcr = fcr_analysis.as_ref().map(|f| f.period_fcr),
            "Sample pipeline complete"
        );

        let previous_biomass_kg = previous.as_ref().map(|p| p.estimated_biomass_kg);
        let mut measurement = GrowthMeasurement {
            id: Uuid::new_v4().to_string(),
            tenant_id: request.tenant_id,
            batch_id: request.batch_id,
            tank_id: request.tank_id,
            measurement_date: request.measurement_date,
            measurement_type: request.measurement_type,
            measurement_method: request.measurement_method,
            sample_size,
            population_size,
            sample_percent: sample_size as f64 / population_size as f64 * 100.0,
            individual_measurements: request.individual_measurements,
            average_weight: stats.average_weight,
            average_length: stats.average_length,
            weight_cv: stats.weight_cv,
            condition_factor: stats.condition_factor,
            statistics: stats.summary,
            estimated_biomass_kg: biomass_kg,
            previous_biomass_kg,
            biomass_gain_kg: previous_biomass_kg.map(|p| biomass_kg - p),
            growth_comparison: comparison,
            performance,
            fcr_analysis,
            suggested_actions: Some(suggested),
            is_verified: false,
            verified_by: None,
            verified_at: None,
            quality_rating: None,
            notes: request.notes.into_iter().collect(),
            measured_by: request.measured_by,
            is_processed: false,
            created_at: (self.now)(),
        };

        // Step 6: persist
        self.sources.measurements.append(&measurement)?;

        if request.apply_to_batch && self.write_back(&measurement) {
            measurement.is_processed = true;
            if let Err(e) = self.sources.measurements.update(&measurement) {
                warn!(measurement_id = %measurement.id, error = %e, "Failed to mark measurement processed");
                measurement.is_processed = false;
            }
        }

        self.invalidate_analysis(&measurement.batch_id, &measurement.tenant_id);

        info!(
            measurement_id = %measurement.id,
            batch_id = %measurement.batch_id,
            tenant_id = %measurement.tenant_id,
            sample_size,
            avg_weight = measurement.average_weight,
            weight_cv = measurement.weight_cv,
            biomass_kg = measurement.estimated_biomass_kg,
            processed = measurement.is_processed,
            "Growth measurement recorded"
        );

        Ok(measurement)
    }

    /// Mark a measurement as verified.
    ///
    /// Fails with `Validation` for a rating outside 1-5 or an already
    /// verified measurement, and `NotFound` if it does not exist in the batch.
    pub fn verify_measurement(
        &self,
        tenant_id: &str,
        batch_id: &str,
        measurement_id: &str,
        verified_by: &str,
        quality_rating: Option<u8>,
        note: Option<String>,
    ) -> EngineResult<GrowthMeasurement> {
        if let Some(rating) = quality_rating {
            if !(1..=5).contains(&rating) {
                return Err(EngineError::validation(format!(
                    "quality rating must be between 1 and 5, got {rating}"
                )));
            }
        }

        let mut measurement = self.load(tenant_id, batch_id, measurement_id)?;
        if measurement.is_verified {
            return Err(EngineError::validation(format!(
                "measurement {measurement_id} is already verified"
            )));
        }

        measurement.is_verified = true;
        measurement.verified_by = Some(verified_by.to_string());
        measurement.verified_at = Some((self.now)());
        if quality_rating.is_some() {
            measurement.quality_rating = quality_rating;
        }
        if let Some(note) = note {
            measurement.notes.push(note);
        }
        self.sources.measurements.update(&measurement)?;

        info!(measurement_id, batch_id, verified_by, "Growth measurement verified");
        Ok(measurement)
    }

    /// Write the measured weight back to the batch. Idempotent; write-back
    /// failures leave `is_processed = false` and are only logged, as does a
    /// measurement older than the batch's latest weighing.
    pub fn apply_to_batch(
        &self,
        tenant_id: &str,
        batch_id: &str,
        measurement_id: &str,
    ) -> EngineResult<GrowthMeasurement> {
        let mut measurement = self.load(tenant_id, batch_id, measurement_id)?;
        if measurement.is_processed {
            debug!(measurement_id, "Measurement already applied to batch");
            return Ok(measurement);
        }

        if self.write_back(&measurement) {
            measurement.is_processed = true;
            self.sources.measurements.update(&measurement)?;
            self.invalidate_analysis(batch_id, tenant_id);
        }
        Ok(measurement)
    }

    fn load(&self, tenant_id: &str, batch_id: &str, measurement_id: &str) -> EngineResult<GrowthMeasurement> {
        let measurement = self.sources.measurements.get(tenant_id, measurement_id)?;
        if measurement.batch_id != batch_id {
            return Err(EngineError::NotFound {
                entity: "measurement",
                id: measurement_id.to_string(),
            });
        }
        Ok(measurement)
    }

    /// Date of a newer weighing the batch already reflects or holds, if any.
    fn superseded_at(&self, m: &GrowthMeasurement) -> Result<Option<DateTime<Utc>>, StorageError> {
        let latest_stored = self
            .sources
            .measurements
            .latest_at_or_before(&m.batch_id, &m.tenant_id, None)?
            .map(|latest| latest.measurement_date);
        let last_applied = self
            .sources
            .batches
            .load_batch(&m.batch_id, &m.tenant_id)?
            .last_measured_at;
        Ok(latest_stored
            .into_iter()
            .chain(last_applied)
            .filter(|at| *at > m.measurement_date)
            .max())
    }

    fn write_back(&self, m: &GrowthMeasurement) -> bool {
        match self.superseded_at(m) {
            Ok(None) => {}
            Ok(Some(newer)) => {
                warn!(
                    measurement_id = %m.id,
                    batch_id = %m.batch_id,
                    measured_at = %m.measurement_date,
                    newer = %newer,
                    "Batch write-back skipped: a newer measurement exists"
                );
                return false;
            }
            Err(e) => {
                warn!(
                    measurement_id = %m.id,
                    batch_id = %m.batch_id,
                    error = %e,
                    "Batch write-back skipped: could not check for newer measurements"
                );
                return false;
            }
        }

        match self.sources.batches.apply_measured_weight(
            &m.batch_id,
            &m.tenant_id,
            m.average_weight,
            m.estimated_biomass_kg,
            m.measurement_date,
        ) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    measurement_id = %m.id,
                    batch_id = %m.batch_id,
                    backend = self.sources.batches.backend_name(),
                    error = %e,
                    "Batch write-back failed"
                );
                false
            }
        }
    }

    fn invalidate_analysis(&self, batch_id: &str, tenant_id: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.invalidate(&cache_key(tenant_id, batch_id)) {
                warn!(batch_id, tenant_id, error = %e, "Analysis cache invalidation failed");
            }
        }
    }
}
