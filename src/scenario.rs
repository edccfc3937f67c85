//! Scenario replay
//!
//! Loads a batch, its feeding log and a sequence of weighing samples from a
//! JSON file and replays them through the recorder and the batch analysis,
//! using the in-memory collaborators and the configured analysis cache.
//!
//! # Usage
//!
//! ```ignore
//! use aquametrics::scenario::Scenario;
//!
//! let scenario = Scenario::load("trout_cycle.json")?;
//! let outcome = scenario.replay(&EngineConfig::default())?;
//! outcome.print_summary();
//! ```
//!
//! Samples are replayed in date order regardless of their order in the file.

use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::GrowthAnalysisOrchestrator;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fcr::{compare_fcr, detect_fcr_anomalies};
use crate::recording::{BatchLocks, MeasurementRecorder, RecordSampleRequest};
use crate::storage::{open_cache, InMemoryBackends, StorageError};
use crate::types::{
    BatchSnapshot, FcrAnomaly, FcrComparison, FeedEntry, GrowthAnalysisResult, GrowthMeasurement,
    IndividualObservation, MeasurementMethod, MeasurementType,
};

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("invalid scenario JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("scenario has no samples")]
    Empty,
    #[error("replay failed at sample {index} ({date}): {source}")]
    Sample {
        index: usize,
        date: DateTime<Utc>,
        source: EngineError,
    },
    #[error("analysis failed: {0}")]
    Analysis(EngineError),
}

// ============================================================================
// File format
// ============================================================================

/// One feeding event. Batch and tenant come from the scenario's batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFeeding {
    pub fed_at: DateTime<Utc>,
    pub amount_kg: f64,
}

/// One weighing event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSample {
    pub measurement_date: DateTime<Utc>,
    pub weights_g: Vec<f64>,
    /// Lengths in the same order as `weights_g`; may be shorter
    #[serde(default)]
    pub lengths_cm: Vec<f64>,
    #[serde(default)]
    pub population_size: Option<u64>,
    #[serde(default = "default_measured_by")]
    pub measured_by: String,
    #[serde(default = "default_apply")]
    pub apply_to_batch: bool,
}

fn default_measured_by() -> String {
    "scenario".to_string()
}

fn default_apply() -> bool {
    true
}

impl ScenarioSample {
    fn observations(&self) -> Vec<IndividualObservation> {
        self.weights_g
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let obs = IndividualObservation::new(i as u32 + 1, *w);
                match self.lengths_cm.get(i) {
                    Some(l) => obs.with_length(*l),
                    None => obs,
                }
            })
            .collect()
    }

    fn to_request(&self, batch: &BatchSnapshot) -> RecordSampleRequest {
        RecordSampleRequest {
            batch_id: batch.batch_id.clone(),
            tenant_id: batch.tenant_id.clone(),
            tank_id: None,
            measurement_date: self.measurement_date,
            measurement_type: MeasurementType::Routine,
            measurement_method: MeasurementMethod::ManualScale,
            population_size: self.population_size,
            individual_measurements: self.observations(),
            measured_by: self.measured_by.clone(),
            notes: None,
            apply_to_batch: self.apply_to_batch,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub batch: BatchSnapshot,
    #[serde(default)]
    pub feedings: Vec<ScenarioFeeding>,
    pub samples: Vec<ScenarioSample>,
}

/// Everything a replay produced.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayOutcome {
    pub scenario: String,
    pub measurements: Vec<GrowthMeasurement>,
    pub analysis: GrowthAnalysisResult,
    /// Cumulative FCR against target and industry, once it is defined
    pub fcr_comparison: Option<FcrComparison>,
    /// Anomalous period FCR values, with the measurement they came from
    pub anomalies: Vec<(String, FcrAnomaly)>,
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ScenarioError::Io(path.to_path_buf(), e))?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(content)?;
        if scenario.samples.is_empty() {
            return Err(ScenarioError::Empty);
        }
        Ok(scenario)
    }

    pub fn to_json(&self) -> Result<String, ScenarioError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn total_feed_kg(&self) -> f64 {
        self.feedings.iter().map(|f| f.amount_kg).sum()
    }

    /// Replay every sample through a fresh in-memory engine.
    pub fn replay(&self, config: &EngineConfig) -> Result<ReplayOutcome, ScenarioError> {
        let backends = InMemoryBackends::new();
        let seed = |e: StorageError| ScenarioError::Analysis(EngineError::from(e));
        backends.batches.upsert(self.batch.clone()).map_err(seed)?;
        for f in &self.feedings {
            backends
                .feed
                .record(FeedEntry {
                    batch_id: self.batch.batch_id.clone(),
                    tenant_id: self.batch.tenant_id.clone(),
                    fed_at: f.fed_at,
                    amount_kg: f.amount_kg,
                })
                .map_err(seed)?;
        }

        let cache = open_cache(&config.cache).map_err(seed)?;
        let recorder = MeasurementRecorder::new(backends.sources(), cache.clone(), config);
        let orchestrator = GrowthAnalysisOrchestrator::new(backends.sources(), cache, config);
        let locks = BatchLocks::new();

        let mut samples: Vec<&ScenarioSample> = self.samples.iter().collect();
        samples.sort_by_key(|s| s.measurement_date);

        let mut measurements = Vec::with_capacity(samples.len());
        for (index, sample) in samples.into_iter().enumerate() {
            let request = sample.to_request(&self.batch);
            let recorded = locks
                .with_batch(&self.batch.tenant_id, &self.batch.batch_id, || {
                    recorder.record_sample(request)
                })
                .map_err(|source| ScenarioError::Sample {
                    index,
                    date: sample.measurement_date,
                    source,
                })?;
            measurements.push(recorded);
        }

        let analysis = orchestrator
            .get_analysis(&self.batch.batch_id, &self.batch.tenant_id)
            .map_err(ScenarioError::Analysis)?;

        let cumulative = analysis.current.cumulative_fcr.fcr;
        let fcr_comparison = (cumulative > 0.0).then(|| {
            compare_fcr(
                cumulative,
                analysis.current.target_fcr,
                &analysis.species_code,
                &config.fcr,
            )
        });
        let anomalies: Vec<(String, FcrAnomaly)> = measurements
            .iter()
            .filter_map(|m| m.period_fcr().map(|fcr| (m.id.clone(), fcr)))
            .flat_map(|(id, fcr)| {
                detect_fcr_anomalies(fcr, &config.fcr)
                    .into_iter()
                    .map(move |a| (id.clone(), a))
            })
            .collect();

        info!(
            scenario = %self.name,
            samples = measurements.len(),
            performance_index = analysis.performance_index,
            anomalies = anomalies.len(),
            "Scenario replay complete"
        );

        Ok(ReplayOutcome {
            scenario: self.name.clone(),
            measurements,
            analysis,
            fcr_comparison,
            anomalies,
        })
    }
}

impl ReplayOutcome {
    pub fn print_summary(&self) {
        let a = &self.analysis;
        println!("=== Scenario: {} ===", self.scenario);
        println!("  Batch:        {} ({})", a.batch_id, a.species_code);
        println!("  Samples:      {}", self.measurements.len());
        println!(
            "  Weight:       {:.1} g -> {:.1} g (expected {:.1} g, {:+.1}%)",
            a.current.initial_avg_weight_g,
            a.current.current_avg_weight_g,
            a.current.expected_weight_g,
            a.current.growth_variance_percent,
        );
        println!(
            "  Biomass:      {:.1} kg (+{:.1} kg)",
            a.current.current_biomass_kg, a.current.biomass_gain_kg
        );
        println!(
            "  FCR:          {:.2} (target {:.2}, {:+.1}%), trend {}",
            a.current.cumulative_fcr.fcr,
            a.current.target_fcr,
            a.current.fcr_variance_percent,
            a.trend.fcr.trend,
        );
        println!(
            "  Performance:  {:.0}/100 ({})",
            a.performance_index, a.performance
        );
        if let Some(p) = &a.projection {
            println!(
                "  Harvest:      {} ({} days, {:.0} kg, {:.0} kg feed)",
                p.projected_harvest_date.format("%Y-%m-%d"),
                p.days_to_harvest,
                p.projected_biomass_kg,
                p.feed_required_kg,
            );
        }
        if let Some(c) = &self.fcr_comparison {
            println!(
                "  Benchmark:    industry {:.2} ({:+.1}%), rated {}",
                c.industry_benchmark, c.variance_from_industry, c.performance
            );
        }
        for (id, anomaly) in &self.anomalies {
            println!("  Anomaly:      {} ({})", anomaly.message, id);
        }
        for r in &a.recommendations {
            println!("  [{}] {}", r.priority, r.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"{
        "name": "trout-small",
        "batch": {
            "batch_id": "B1",
            "tenant_id": "T1",
            "initial_count": 10000,
            "initial_avg_weight_g": 20.0,
            "current_avg_weight_g": 20.0,
            "current_count": 10000,
            "species": {
                "species_code": "rainbow_trout",
                "daily_growth_g": 1.0,
                "target_fcr": 1.2,
                "avg_harvest_weight_g": 500.0
            },
            "stocked_at": "2024-03-01T08:00:00Z"
        },
        "feedings": [
            { "fed_at": "2024-03-08T08:00:00Z", "amount_kg": 180.0 }
        ],
        "samples": [
            { "measurement_date": "2024-03-15T08:00:00Z", "weights_g": [34.0, 35.0, 36.0] },
            { "measurement_date": "2024-03-01T08:00:00Z", "weights_g": [20.0, 20.0, 20.0] }
        ]
    }"#;

    #[test]
    fn test_parse_defaults() {
        let s = Scenario::from_json_str(SCENARIO).unwrap();
        assert_eq!(s.samples.len(), 2);
        assert!(s.samples[0].apply_to_batch);
        assert_eq!(s.samples[0].measured_by, "scenario");
        assert_eq!(s.total_feed_kg(), 180.0);
    }

    #[test]
    fn test_replay_orders_samples_by_date() {
        let s = Scenario::from_json_str(SCENARIO).unwrap();
        let outcome = s.replay(&EngineConfig::default()).unwrap();
        assert_eq!(outcome.measurements.len(), 2);
        assert!(outcome.measurements[0].growth_comparison.is_none());
        let fcr = outcome.measurements[1].fcr_analysis.as_ref().unwrap();
        assert!((fcr.period_fcr - 1.2).abs() < 1e-9);
        assert_eq!(outcome.analysis.current.measurement_count, 2);
        let c = outcome.fcr_comparison.as_ref().unwrap();
        assert_eq!(c.industry_benchmark, 1.1);
        assert!(outcome.anomalies.is_empty());
        assert!((outcome.analysis.current.current_avg_weight_g - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_scenario_rejected() {
        let json = SCENARIO.replace(
            r#""samples": ["#,
            r#""samples": [], "ignored": ["#,
        );
        assert!(matches!(Scenario::from_json_str(&json), Err(ScenarioError::Empty)));
    }

    #[test]
    fn test_invalid_sample_reports_index() {
        let mut s = Scenario::from_json_str(SCENARIO).unwrap();
        s.samples[1].weights_g = vec![20.0, 20.0];
        match s.replay(&EngineConfig::default()) {
            Err(ScenarioError::Sample { index, source, .. }) => {
                assert_eq!(index, 0);
                assert!(matches!(source, EngineError::Validation(_)));
            }
            other => panic!("expected sample error, got {other:?}"),
        }
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let s = Scenario::from_json_str(SCENARIO).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        std::fs::write(&path, s.to_json().unwrap()).unwrap();
        let loaded = Scenario::load(&path).unwrap();
        assert_eq!(loaded.name, "trout-small");
        assert_eq!(loaded.batch, s.batch);
    }
}
