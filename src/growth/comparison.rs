//! Growth comparison: actual vs theoretical weight between two samples

use chrono::{DateTime, Utc};

use crate::types::{BatchSnapshot, GrowthComparison, GrowthMeasurement};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Whole days from `from` to `to`, rounded up. Negative if `to` is earlier.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let secs = (to - from).num_seconds() as f64;
    (secs / SECONDS_PER_DAY).ceil() as i64
}

/// Average daily gain in g/day. 0 when `days <= 0`.
pub fn average_daily_gain(from_weight: f64, to_weight: f64, days: i64) -> f64 {
    if days <= 0 {
        return 0.0;
    }
    (to_weight - from_weight) / days as f64
}

/// Specific growth rate in %/day: `(ln w2 - ln w1) / days * 100`.
///
/// 0 when either weight is not positive or `days <= 0`.
pub fn specific_growth_rate(from_weight: f64, to_weight: f64, days: i64) -> f64 {
    if days <= 0 || from_weight <= 0.0 || to_weight <= 0.0 {
        return 0.0;
    }
    (to_weight.ln() - from_weight.ln()) / days as f64 * 100.0
}

/// Expected weight on the stocking curve: `initial + days_since_stocking * daily_target`.
pub fn expected_weight(batch: &BatchSnapshot, at: DateTime<Utc>) -> f64 {
    let days = days_between(batch.stocked_at, at).max(0);
    batch.initial_avg_weight_g + days as f64 * batch.species.daily_growth_g
}

pub struct GrowthComparisonEngine;

impl GrowthComparisonEngine {
    /// Compare a new average weight against the previous measurement.
    ///
    /// Returns `None` when there is no previous measurement.
    pub fn compare(
        previous: Option<&GrowthMeasurement>,
        measured_at: DateTime<Utc>,
        current_weight: f64,
        daily_growth_target: f64,
    ) -> Option<GrowthComparison> {
        let previous = previous?;
        let days = days_between(previous.measurement_date, measured_at);

        let theoretical_weight = previous.average_weight + days as f64 * daily_growth_target;
        let variance = current_weight - theoretical_weight;
        let variance_percent = if theoretical_weight > 0.0 {
            variance / theoretical_weight * 100.0
        } else {
            0.0
        };

        Some(GrowthComparison {
            theoretical_weight,
            actual_weight: current_weight,
            variance,
            variance_percent,
            previous_measurement_id: Some(previous.id.clone()),
            days_since_previous: days,
            daily_growth_rate: average_daily_gain(previous.average_weight, current_weight, days),
            specific_growth_rate: specific_growth_rate(previous.average_weight, current_weight, days),
            target_weight: None,
            target_variance: None,
        })
    }

    /// `compare`, then attach the stocking-curve target for the batch.
    pub fn compare_for_batch(
        batch: &BatchSnapshot,
        previous: Option<&GrowthMeasurement>,
        measured_at: DateTime<Utc>,
        current_weight: f64,
    ) -> Option<GrowthComparison> {
        let mut comparison = Self::compare(
            previous,
            measured_at,
            current_weight,
            batch.species.daily_growth_g,
        )?;
        let target = expected_weight(batch, measured_at);
        comparison.target_weight = Some(target);
        comparison.target_variance = Some(current_weight - target);
        Some(comparison)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::{batch, measurement_at, stocking_date};
    use chrono::Duration;

    #[test]
    fn test_fourteen_day_comparison() {
        let start = stocking_date();
        let previous = measurement_at("m0", start, 20.0);
        let c = GrowthComparisonEngine::compare(
            Some(&previous),
            start + Duration::days(14),
            35.0,
            1.0,
        )
        .unwrap();

        assert_eq!(c.days_since_previous, 14);
        assert_eq!(c.theoretical_weight, 34.0);
        assert_eq!(c.variance, 1.0);
        assert!((c.variance_percent - 2.941).abs() < 1e-3);
        assert!((c.daily_growth_rate - 15.0 / 14.0).abs() < 1e-12);
        let sgr = (35f64.ln() - 20f64.ln()) / 14.0 * 100.0;
        assert!((c.specific_growth_rate - sgr).abs() < 1e-12);
        assert_eq!(c.previous_measurement_id.as_deref(), Some("m0"));
    }

    #[test]
    fn test_no_previous_measurement() {
        assert!(GrowthComparisonEngine::compare(None, stocking_date(), 35.0, 1.0).is_none());
    }

    #[test]
    fn test_partial_days_round_up() {
        let start = stocking_date();
        assert_eq!(days_between(start, start + Duration::hours(36)), 2);
        assert_eq!(days_between(start, start), 0);
    }

    #[test]
    fn test_same_day_rates_are_zero() {
        let start = stocking_date();
        let previous = measurement_at("m0", start, 20.0);
        let c = GrowthComparisonEngine::compare(Some(&previous), start, 22.0, 1.0).unwrap();
        assert_eq!(c.daily_growth_rate, 0.0);
        assert_eq!(c.specific_growth_rate, 0.0);
        assert_eq!(c.theoretical_weight, 20.0);
    }

    #[test]
    fn test_non_positive_theoretical_weight() {
        let start = stocking_date();
        let previous = measurement_at("m0", start, 5.0);
        let c = GrowthComparisonEngine::compare(
            Some(&previous),
            start + Duration::days(10),
            4.0,
            -1.0,
        )
        .unwrap();
        assert_eq!(c.theoretical_weight, -5.0);
        assert_eq!(c.variance_percent, 0.0);
    }

    #[test]
    fn test_stocking_curve_target() {
        let b = batch("B1", "T1");
        let previous = measurement_at("m0", stocking_date() + Duration::days(10), 30.0);
        let at = stocking_date() + Duration::days(20);
        let c = GrowthComparisonEngine::compare_for_batch(&b, Some(&previous), at, 41.0).unwrap();
        // 20 g + 20 days * 1 g/day
        assert_eq!(c.target_weight, Some(40.0));
        assert_eq!(c.target_variance, Some(1.0));
    }
}
