//! aquametrics: Aquaculture Growth & Feed-Conversion Analytics
//!
//! Turns periodic biological samples of a fish population into statistics,
//! growth and FCR assessments, ranked actions and a batch-level report.
//!
//! ## Architecture
//!
//! - **Statistics Engine**: sample observations to population estimates
//! - **Growth**: theoretical-vs-actual comparison, rating, suggested actions
//! - **FCR Calculator**: period / cumulative FCR, trend, anomalies, benchmarks
//! - **Analysis Orchestrator**: cached batch report, index, projection
//! - **Recorder**: per-sample pipeline and measurement lifecycle
//! - **Storage**: collaborator traits with in-memory and sled backends

pub mod analysis;
pub mod config;
pub mod error;
pub mod fcr;
pub mod growth;
pub mod recording;
pub mod scenario;
pub mod statistics;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::EngineConfig;

// Re-export errors
pub use error::{EngineError, EngineResult};

// Re-export the engine entry points
pub use analysis::GrowthAnalysisOrchestrator;
pub use fcr::FcrCalculator;
pub use growth::GrowthComparisonEngine;
pub use recording::{BatchLocks, MeasurementRecorder, RecordSampleRequest};
pub use statistics::StatisticsEngine;

// Re-export storage
pub use storage::{
    AnalysisCache, BatchRegistry, DataSources, FeedingLedger, InMemoryBackends, MeasurementStore,
    StorageError,
};

// Re-export commonly used types
pub use types::{
    BatchSnapshot, FcrAnalysis, GrowthAnalysisResult, GrowthMeasurement, IndividualObservation,
    PerformanceRating, SampleStatistics,
};
