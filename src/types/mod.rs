//! Shared data structures for the growth & feed-conversion analytics engine
//!
//! This module defines the core types flowing through the pipeline:
//! - Batch snapshot and species targets (read from the batch registry)
//! - Individual observations and the `GrowthMeasurement` aggregate
//! - Statistical summaries produced by the statistics engine
//! - Embedded derived structures: growth comparison, FCR analysis, actions
//! - Batch-level analysis report produced by the orchestrator

mod batch;
mod measurement;
mod statistics;
mod fcr;
mod analysis;

pub use batch::*;
pub use measurement::*;
pub use statistics::*;
pub use fcr::*;
pub use analysis::*;
