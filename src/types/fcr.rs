//! Feed conversion types: FcrAnalysis, period/cumulative results, trend,
//! benchmark comparison and anomalies

use serde::{Deserialize, Serialize};

use super::PerformanceRating;

/// Direction of the FCR time series. Falling FCR is an improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FcrTrend {
    Improving,
    Stable,
    Declining,
}

impl std::fmt::Display for FcrTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FcrTrend::Improving => write!(f, "improving"),
            FcrTrend::Stable => write!(f, "stable"),
            FcrTrend::Declining => write!(f, "declining"),
        }
    }
}

/// FCR figures embedded in a growth measurement or a period calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FcrAnalysis {
    /// Feed delivered during the period (kg)
    pub period_feed_given: f64,
    /// Biomass gained during the period (kg)
    pub period_growth: f64,
    pub period_fcr: f64,
    /// Feed delivered since stocking (kg)
    pub cumulative_feed_given: f64,
    /// Biomass gained since stocking (kg)
    pub cumulative_growth: f64,
    /// Cumulative FCR, 0 while not yet meaningful
    pub cumulative_fcr: f64,
    pub target_fcr: f64,
    /// `(cumulative_fcr - target_fcr) / target_fcr * 100`
    pub fcr_variance: f64,
    pub fcr_trend: FcrTrend,
}

impl FcrAnalysis {
    /// All-zero analysis returned alongside invalid period results.
    pub fn empty(target_fcr: f64) -> Self {
        Self {
            period_feed_given: 0.0,
            period_growth: 0.0,
            period_fcr: 0.0,
            cumulative_feed_given: 0.0,
            cumulative_growth: 0.0,
            cumulative_fcr: 0.0,
            target_fcr,
            fcr_variance: 0.0,
            fcr_trend: FcrTrend::Stable,
        }
    }
}

/// Non-fatal conditions attached to a period FCR result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FcrWarning {
    /// Fewer than two measurements inside the window
    InsufficientMeasurements { found: usize, required: usize },
    /// Biomass did not increase over the window
    NonPositiveGrowth { growth_kg: f64 },
    /// Period FCR outside the plausible range
    AbnormalFcr { fcr: f64, low: f64, high: f64 },
    /// Cumulative FCR far from the target
    LargeTargetVariance { variance_percent: f64 },
}

impl std::fmt::Display for FcrWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FcrWarning::InsufficientMeasurements { found, required } => write!(
                f,
                "insufficient measurements: {found} in period, need at least {required}"
            ),
            FcrWarning::NonPositiveGrowth { growth_kg } => write!(
                f,
                "non-positive growth ({growth_kg:.2} kg): FCR cannot be calculated"
            ),
            FcrWarning::AbnormalFcr { fcr, low, high } => write!(
                f,
                "abnormal FCR {fcr:.2} (expected between {low:.1} and {high:.1}): check feeding records and biomass estimates"
            ),
            FcrWarning::LargeTargetVariance { variance_percent } => write!(
                f,
                "large variance from target FCR ({variance_percent:+.1}%)"
            ),
        }
    }
}

/// Result of an explicit period FCR calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodFcrResult {
    pub period_fcr: f64,
    pub cumulative_fcr: f64,
    pub analysis: FcrAnalysis,
    pub is_valid: bool,
    pub warnings: Vec<FcrWarning>,
}

impl PeriodFcrResult {
    pub fn has_warning(&self, predicate: impl Fn(&FcrWarning) -> bool) -> bool {
        self.warnings.iter().any(predicate)
    }
}

/// Cumulative FCR since stocking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CumulativeFcr {
    /// 0 when `total_growth <= 0`
    pub fcr: f64,
    pub total_feed: f64,
    pub total_growth: f64,
}

/// Least-squares trend over recent period FCR values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FcrTrendAnalysis {
    pub trend: FcrTrend,
    pub slope: f64,
    /// Coefficient of determination of the linear fit
    pub r_squared: f64,
    pub forecast_7_days: f64,
    /// Number of FCR values the fit used
    pub data_points: usize,
    pub recommendations: Vec<String>,
}

/// Current FCR compared against the batch target and the industry benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FcrComparison {
    pub current_fcr: f64,
    pub target_fcr: f64,
    pub industry_benchmark: f64,
    pub variance_from_target: f64,
    pub variance_from_industry: f64,
    pub performance: PerformanceRating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FcrAnomalySeverity {
    Suspicious,
    Critical,
}

/// Numeric anomaly in an FCR value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FcrAnomaly {
    pub severity: FcrAnomalySeverity,
    pub fcr: f64,
    pub message: String,
}
