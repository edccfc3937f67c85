//! Batch Growth Analysis
//!
//! ## Architecture
//! - `orchestrator`: `GrowthAnalysisOrchestrator`, cached batch report
//! - `index`: performance index (0-100) and CV trend
//! - `projection`: harvest date / biomass / feed projection
//! - `recommendations`: ranked batch recommendations

pub mod index;
pub mod orchestrator;
pub mod projection;
pub mod recommendations;

pub use index::{cv_trend, performance_index, rate_index, IndexInputs};
pub use orchestrator::{cache_key, GrowthAnalysisOrchestrator};
pub use projection::{growth_rate, project_harvest, ProjectionBasis};
pub use recommendations::{build_recommendations, RecommendationInputs};
