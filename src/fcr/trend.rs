//! FCR trend: least-squares slope over recent period FCR values
//!
//! Rising FCR means more feed per kg of gain, so a positive slope is a
//! *declining* trend.

use crate::config::defaults::{FCR_FORECAST_HORIZON, MIN_TREND_POINTS};
use crate::config::FcrConfig;
use crate::statistics::LinearFit;
use crate::types::{FcrTrend, FcrTrendAnalysis};

/// Classify a slope against the stability threshold.
pub fn classify_slope(slope: f64, threshold: f64) -> FcrTrend {
    if slope < -threshold {
        FcrTrend::Improving
    } else if slope > threshold {
        FcrTrend::Declining
    } else {
        FcrTrend::Stable
    }
}

/// Trend over a chronological series of period FCR values.
///
/// Only the last `config.trend_window` values are used; x is the index of
/// each value in that window.
pub fn trend_from_series(values: &[f64], config: &FcrConfig) -> FcrTrendAnalysis {
    let skip = values.len().saturating_sub(config.trend_window);
    let window = &values[skip..];
    let latest = window.last().copied();

    if window.len() < MIN_TREND_POINTS {
        return FcrTrendAnalysis {
            trend: FcrTrend::Stable,
            slope: 0.0,
            r_squared: 0.0,
            forecast_7_days: latest.unwrap_or(0.0),
            data_points: window.len(),
            recommendations: vec![format!(
                "Not enough FCR data for trend analysis (need at least {MIN_TREND_POINTS} measurements)"
            )],
        };
    }

    let points: Vec<(f64, f64)> = window
        .iter()
        .enumerate()
        .map(|(i, fcr)| (i as f64, *fcr))
        .collect();
    let (slope, r_squared) = LinearFit::fit(&points)
        .map(|f| (f.slope, f.r_squared))
        .unwrap_or((0.0, 0.0));

    let trend = classify_slope(slope, config.trend_slope_threshold);
    let last = latest.unwrap_or(0.0);
    let forecast_7_days = (last + slope * FCR_FORECAST_HORIZON).max(config.forecast_floor);

    FcrTrendAnalysis {
        trend,
        slope,
        r_squared,
        forecast_7_days,
        data_points: window.len(),
        recommendations: recommendations(trend, slope, last, config),
    }
}

fn recommendations(trend: FcrTrend, slope: f64, latest: f64, config: &FcrConfig) -> Vec<String> {
    let mut out = Vec::new();

    match trend {
        FcrTrend::Declining => {
            if slope > config.urgent_slope {
                out.push(format!(
                    "URGENT: FCR deteriorating rapidly (+{slope:.3} per measurement); review feeding immediately"
                ));
            }
            out.push(
                "FCR declining: review feed quality, ration size and water conditions".to_string(),
            );
        }
        FcrTrend::Improving => {
            out.push("FCR improving: current feeding strategy is working".to_string());
        }
        FcrTrend::Stable => {
            out.push("FCR stable: maintain current feeding regime".to_string());
        }
    }

    if latest > config.high_fcr_level {
        out.push(format!(
            "FCR {latest:.2} is high: check for overfeeding, feed waste or unrecorded mortality"
        ));
    } else if latest < config.low_fcr_level {
        out.push(format!(
            "FCR {latest:.2} is unusually low: verify biomass estimates and feeding records"
        ));
    }

    out
}
