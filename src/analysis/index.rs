//! Batch performance index and size-dispersion trend

use crate::config::defaults::{
    CV_PENALTY_MAX, FCR_PENALTY_MAX, GROWTH_PENALTY_MAX, SURVIVAL_ADJUSTMENT,
};
use crate::config::AnalysisConfig;
use crate::types::{CvTrend, GrowthMeasurement, PerformanceRating};

/// Inputs to the performance index.
#[derive(Debug, Clone, Copy)]
pub struct IndexInputs {
    pub growth_variance_percent: f64,
    pub fcr_variance_percent: f64,
    pub weight_cv: Option<f64>,
    pub survival_rate_percent: f64,
}

/// Score a batch on 0..=100, starting from 100.
///
/// Penalties: growth shortfall `min(|v| * 1.5, 30)`, FCR above target
/// `min(v * 1.25, 25)`, CV above the threshold `min((cv - t) * 2, 20)`.
/// Survival adds or removes a fixed adjustment.
pub fn performance_index(inputs: &IndexInputs, config: &AnalysisConfig) -> f64 {
    let mut score = 100.0;

    if inputs.growth_variance_percent < 0.0 {
        score -= (inputs.growth_variance_percent.abs() * 1.5).min(GROWTH_PENALTY_MAX);
    }
    if inputs.fcr_variance_percent > 0.0 {
        score -= (inputs.fcr_variance_percent * 1.25).min(FCR_PENALTY_MAX);
    }
    if let Some(cv) = inputs.weight_cv {
        if cv > config.cv_penalty_threshold {
            score -= ((cv - config.cv_penalty_threshold) * 2.0).min(CV_PENALTY_MAX);
        }
    }
    if inputs.survival_rate_percent > config.survival_bonus_percent {
        score += SURVIVAL_ADJUSTMENT;
    } else if inputs.survival_rate_percent < config.survival_penalty_percent {
        score -= SURVIVAL_ADJUSTMENT;
    }

    score.clamp(0.0, 100.0)
}

/// Bands: 90 / 75 / 60 / 45.
pub fn rate_index(index: f64) -> PerformanceRating {
    if index >= 90.0 {
        PerformanceRating::Excellent
    } else if index >= 75.0 {
        PerformanceRating::Good
    } else if index >= 60.0 {
        PerformanceRating::Average
    } else if index >= 45.0 {
        PerformanceRating::BelowAverage
    } else {
        PerformanceRating::Poor
    }
}

/// Mean CV of the latest `window` measurements minus that of the earliest.
///
/// With fewer than `2 * window` measurements the two windows overlap.
/// Fewer than two measurements is always stable.
pub fn cv_trend(history: &[GrowthMeasurement], config: &AnalysisConfig) -> (CvTrend, f64) {
    if history.len() < 2 {
        return (CvTrend::Stable, 0.0);
    }
    let window = config.cv_trend_window.clamp(1, history.len());
    let avg = |ms: &[GrowthMeasurement]| ms.iter().map(|m| m.weight_cv).sum::<f64>() / ms.len() as f64;

    let early = avg(&history[..window]);
    let late = avg(&history[history.len() - window..]);
    let change = late - early;

    let trend = if change < -config.cv_trend_delta {
        CvTrend::Improving
    } else if change > config.cv_trend_delta {
        CvTrend::Worsening
    } else {
        CvTrend::Stable
    };
    (trend, change)
}
