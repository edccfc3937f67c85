//! Batch-level analysis types produced by the growth analysis orchestrator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActionPriority, CumulativeFcr, FcrTrendAnalysis, PerformanceRating};

/// Direction of size dispersion over the measurement history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvTrend {
    /// CV falling: the population is getting more uniform
    Improving,
    Stable,
    /// CV rising: sizes are spreading out
    Worsening,
}

/// Where the growth rate used for the harvest projection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthRateSource {
    /// Linear fit of average weight against days since stocking
    Regression,
    /// ADG of the latest measurement
    LatestMeasurement,
    /// Species daily growth target
    SpeciesTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    Growth,
    FeedConversion,
    FcrTrend,
    Uniformity,
    Survival,
    General,
}

/// One ranked recommendation in the batch report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: ActionPriority,
    pub category: RecommendationCategory,
    pub message: String,
}

/// Point-in-time production metrics for the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentMetrics {
    pub days_in_production: i64,
    pub initial_avg_weight_g: f64,
    pub current_avg_weight_g: f64,
    pub weight_gain_g: f64,
    pub stocking_biomass_kg: f64,
    pub current_biomass_kg: f64,
    pub biomass_gain_kg: f64,
    /// Average daily growth since stocking (g/day)
    pub adg_g_per_day: f64,
    /// Specific growth rate since stocking (%/day)
    pub sgr_percent: f64,
    /// Weight expected on the species growth curve (g)
    pub expected_weight_g: f64,
    pub growth_variance_percent: f64,
    #[serde(default)]
    pub weight_cv: Option<f64>,
    pub survival_rate_percent: f64,
    pub cumulative_fcr: CumulativeFcr,
    pub target_fcr: f64,
    pub fcr_variance_percent: f64,
    pub measurement_count: usize,
    #[serde(default)]
    pub last_measured_at: Option<DateTime<Utc>>,
}

/// One measurement in the historical series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub measurement_id: String,
    pub date: DateTime<Utc>,
    pub average_weight_g: f64,
    pub weight_cv: f64,
    pub biomass_kg: f64,
    #[serde(default)]
    pub period_fcr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub fcr: FcrTrendAnalysis,
    pub cv_trend: CvTrend,
    /// Mean CV of the latest measurements minus the earliest (percentage points)
    pub cv_change: f64,
    pub series: Vec<TrendPoint>,
}

/// When the batch is expected to reach harvest weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestProjection {
    pub target_weight_g: f64,
    pub growth_rate_g_per_day: f64,
    pub growth_rate_source: GrowthRateSource,
    pub days_to_harvest: i64,
    pub projected_harvest_date: DateTime<Utc>,
    pub projected_biomass_kg: f64,
    pub feed_required_kg: f64,
    /// Positive when the projection is later than the planned harvest date
    #[serde(default)]
    pub days_behind_plan: Option<i64>,
    pub ready_for_harvest: bool,
}

/// Complete batch analysis, cached by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthAnalysisResult {
    pub batch_id: String,
    pub tenant_id: String,
    pub species_code: String,
    pub generated_at: DateTime<Utc>,
    pub current: CurrentMetrics,
    pub trend: TrendSummary,
    #[serde(default)]
    pub projection: Option<HarvestProjection>,
    /// 0-100
    pub performance_index: f64,
    pub performance: PerformanceRating,
    pub recommendations: Vec<Recommendation>,
}
