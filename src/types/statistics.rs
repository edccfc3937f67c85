//! Statistical summary types produced by the statistics engine

use serde::{Deserialize, Serialize};

/// Two-sided confidence interval around a sample mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

/// Descriptive statistics for one measured dimension (weight or length).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    /// Number of values the summary was computed from
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Sample (Bessel-corrected) standard deviation
    pub std_dev: f64,
    /// Coefficient of variation in percent: `std_dev / mean * 100`
    pub cv: f64,
    /// 95% confidence interval for the mean
    pub confidence_interval: ConfidenceInterval,
}

/// Fulton's condition factor summary across the sampled animals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConditionFactorSummary {
    pub mean: f64,
    pub std_dev: f64,
    /// Number of observations carrying a usable length
    pub count: usize,
}

/// Full statistical summary attached to a growth measurement. Never hand-edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalSummary {
    pub weight: DistributionSummary,
    #[serde(default)]
    pub length: Option<DistributionSummary>,
    #[serde(default)]
    pub condition_factor: Option<ConditionFactorSummary>,
}

/// Output of the statistics stage: the summary plus quick-access values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleStatistics {
    pub summary: StatisticalSummary,
    pub average_weight: f64,
    pub weight_cv: f64,
    pub average_length: Option<f64>,
    pub condition_factor: Option<f64>,
}
