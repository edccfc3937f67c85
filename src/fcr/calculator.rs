//! FCR Calculator - period, cumulative and per-sample feed conversion
//!
//! ## Failure semantics
//! - Period FCR fails loud: fewer than two measurements or non-positive
//!   growth yields `is_valid = false` with a warning, never NaN/Infinity.
//! - Cumulative FCR degrades to the `0` sentinel when growth since stocking
//!   is not positive.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::trend::trend_from_series;
use crate::config::defaults::MIN_PERIOD_MEASUREMENTS;
use crate::config::FcrConfig;
use crate::error::{EngineError, EngineResult};
use crate::storage::DataSources;
use crate::types::{
    BatchSnapshot, CumulativeFcr, FcrAnalysis, FcrTrendAnalysis, FcrWarning, FeedWindow,
    GrowthMeasurement, PeriodFcrResult,
};

/// `(cumulative - target) / target * 100`; 0 for the sentinel or a non-positive target.
pub fn fcr_variance(cumulative_fcr: f64, target_fcr: f64) -> f64 {
    if cumulative_fcr == 0.0 || target_fcr <= 0.0 {
        return 0.0;
    }
    (cumulative_fcr - target_fcr) / target_fcr * 100.0
}

/// Cumulative FCR from total feed and the current biomass estimate.
pub fn cumulative_from(batch: &BatchSnapshot, total_feed: f64, current_biomass_kg: f64) -> CumulativeFcr {
    let total_growth = current_biomass_kg - batch.stocking_biomass_kg();
    let fcr = if total_growth > 0.0 {
        total_feed / total_growth
    } else {
        0.0
    };
    CumulativeFcr {
        fcr,
        total_feed,
        total_growth,
    }
}

pub struct FcrCalculator {
    sources: DataSources,
    config: FcrConfig,
}

impl FcrCalculator {
    pub fn new(sources: DataSources, config: FcrConfig) -> Self {
        Self { sources, config }
    }

    pub fn config(&self) -> &FcrConfig {
        &self.config
    }

    /// FCR over `[start, end]` from the feeding ledger and the biomass of the
    /// first and last measurements inside the window.
    ///
    /// `target_fcr` defaults to the species target.
    pub fn calculate_period_fcr(
        &self,
        batch_id: &str,
        tenant_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        target_fcr: Option<f64>,
    ) -> EngineResult<PeriodFcrResult> {
        if start > end {
            return Err(EngineError::validation(format!(
                "period start {start} is after end {end}"
            )));
        }

        let batch = self.sources.batches.load_batch(batch_id, tenant_id)?;
        let target = target_fcr.unwrap_or(batch.species.target_fcr);

        let total_feed = self
            .sources
            .feed
            .sum_feed(batch_id, tenant_id, FeedWindow::between(start, end))?;
        let measurements = self
            .sources
            .measurements
            .in_range(batch_id, tenant_id, start, end)?;

        let (first, last) = match (measurements.first(), measurements.last()) {
            (Some(first), Some(last)) if measurements.len() >= MIN_PERIOD_MEASUREMENTS => {
                (first, last)
            }
            _ => {
                debug!(batch_id, found = measurements.len(), "Period FCR: insufficient measurements");
                return Ok(PeriodFcrResult {
                    period_fcr: 0.0,
                    cumulative_fcr: 0.0,
                    analysis: FcrAnalysis::empty(target),
                    is_valid: false,
                    warnings: vec![FcrWarning::InsufficientMeasurements {
                        found: measurements.len(),
                        required: MIN_PERIOD_MEASUREMENTS,
                    }],
                });
            }
        };

        let growth_kg = last.estimated_biomass_kg - first.estimated_biomass_kg;
        if growth_kg <= 0.0 {
            warn!(batch_id, tenant_id, growth_kg, "Period FCR rejected: non-positive growth");
            return Ok(PeriodFcrResult {
                period_fcr: 0.0,
                cumulative_fcr: 0.0,
                analysis: FcrAnalysis {
                    period_feed_given: total_feed,
                    period_growth: growth_kg,
                    ..FcrAnalysis::empty(target)
                },
                is_valid: false,
                warnings: vec![FcrWarning::NonPositiveGrowth { growth_kg }],
            });
        }

        let period_fcr = total_feed / growth_kg;
        let cumulative = self.cumulative_for(&batch, Some(end))?;
        let trend = self.analyze_fcr_trend(batch_id, tenant_id)?;
        let variance = fcr_variance(cumulative.fcr, target);

        let mut warnings = Vec::new();
        if period_fcr < self.config.abnormal_low || period_fcr >= self.config.abnormal_high {
            warnings.push(FcrWarning::AbnormalFcr {
                fcr: period_fcr,
                low: self.config.abnormal_low,
                high: self.config.abnormal_high,
            });
        }
        if variance.abs() > self.config.large_variance_percent {
            warnings.push(FcrWarning::LargeTargetVariance {
                variance_percent: variance,
            });
        }

        debug!(
            batch_id,
            period_fcr,
            cumulative_fcr = cumulative.fcr,
            warnings = warnings.len(),
            "Period FCR computed"
        );

        Ok(PeriodFcrResult {
            period_fcr,
            cumulative_fcr: cumulative.fcr,
            analysis: FcrAnalysis {
                period_feed_given: total_feed,
                period_growth: growth_kg,
                period_fcr,
                cumulative_feed_given: cumulative.total_feed,
                cumulative_growth: cumulative.total_growth,
                cumulative_fcr: cumulative.fcr,
                target_fcr: target,
                fcr_variance: variance,
                fcr_trend: trend.trend,
            },
            is_valid: true,
            warnings,
        })
    }

    /// FCR since stocking, up to `end` (or everything recorded so far).
    pub fn calculate_cumulative_fcr(
        &self,
        batch_id: &str,
        tenant_id: &str,
        end: Option<DateTime<Utc>>,
    ) -> EngineResult<CumulativeFcr> {
        let batch = self.sources.batches.load_batch(batch_id, tenant_id)?;
        self.cumulative_for(&batch, end)
    }

    /// Cumulative FCR for an already loaded batch.
    pub fn cumulative_for(
        &self,
        batch: &BatchSnapshot,
        end: Option<DateTime<Utc>>,
    ) -> EngineResult<CumulativeFcr> {
        let total_feed = self.sources.feed.sum_feed(
            &batch.batch_id,
            &batch.tenant_id,
            FeedWindow::until(end),
        )?;
        let current_biomass = self
            .sources
            .measurements
            .latest_at_or_before(&batch.batch_id, &batch.tenant_id, end)?
            .map(|m| m.estimated_biomass_kg)
            .unwrap_or_else(|| batch.stocking_biomass_kg());
        Ok(cumulative_from(batch, total_feed, current_biomass))
    }

    /// Trend over the period FCR of the most recent measurements.
    pub fn analyze_fcr_trend(&self, batch_id: &str, tenant_id: &str) -> EngineResult<FcrTrendAnalysis> {
        let recent = self
            .sources
            .measurements
            .recent(batch_id, tenant_id, self.config.trend_window)?;
        let series: Vec<f64> = recent.iter().filter_map(GrowthMeasurement::period_fcr).collect();
        Ok(trend_from_series(&series, &self.config))
    }

    /// FCR for a sample about to be recorded: the period runs from just
    /// after the previous measurement up to and including `measured_at`.
    ///
    /// `None` without a previous measurement or when biomass did not grow.
    pub fn analyze_measurement_fcr(
        &self,
        batch: &BatchSnapshot,
        previous: Option<&GrowthMeasurement>,
        measured_at: DateTime<Utc>,
        biomass_kg: f64,
    ) -> EngineResult<Option<FcrAnalysis>> {
        let Some(previous) = previous else {
            return Ok(None);
        };

        let growth_kg = biomass_kg - previous.estimated_biomass_kg;
        if growth_kg <= 0.0 {
            warn!(
                batch_id = %batch.batch_id,
                tenant_id = %batch.tenant_id,
                growth_kg,
                "Sample FCR skipped: non-positive growth since previous measurement"
            );
            return Ok(None);
        }

        let feed = &self.sources.feed;
        let period_feed = feed.sum_feed(
            &batch.batch_id,
            &batch.tenant_id,
            FeedWindow::after(previous.measurement_date, measured_at),
        )?;
        let total_feed = feed.sum_feed(
            &batch.batch_id,
            &batch.tenant_id,
            FeedWindow::until(Some(measured_at)),
        )?;

        let period_fcr = period_feed / growth_kg;
        let cumulative = cumulative_from(batch, total_feed, biomass_kg);
        let target = batch.species.target_fcr;

        // stored history plus this period's value
        let recent = self.sources.measurements.recent(
            &batch.batch_id,
            &batch.tenant_id,
            self.config.trend_window.saturating_sub(1),
        )?;
        let mut series: Vec<f64> = recent
            .iter()
            .filter(|m| m.measurement_date < measured_at)
            .filter_map(GrowthMeasurement::period_fcr)
            .collect();
        series.push(period_fcr);
        let trend = trend_from_series(&series, &self.config);

        Ok(Some(FcrAnalysis {
            period_feed_given: period_feed,
            period_growth: growth_kg,
            period_fcr,
            cumulative_feed_given: cumulative.total_feed,
            cumulative_growth: cumulative.total_growth,
            cumulative_fcr: cumulative.fcr,
            target_fcr: target,
            fcr_variance: fcr_variance(cumulative.fcr, target),
            fcr_trend: trend.trend,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::{batch, measurement_at, stocking_date, with_period_fcr};
    use crate::storage::InMemoryBackends;
    use crate::types::{FcrTrend, FeedEntry};
    use chrono::Duration;

    fn feed(backends: &InMemoryBackends, day: i64, kg: f64) {
        backends
            .feed
            .record(FeedEntry {
                batch_id: "B1".to_string(),
                tenant_id: "T1".to_string(),
                fed_at: stocking_date() + Duration::days(day),
                amount_kg: kg,
            })
            .unwrap();
    }

    fn store(backends: &InMemoryBackends, m: GrowthMeasurement) {
        use crate::storage::MeasurementStore;
        backends.measurements.append(&m).unwrap();
    }

    fn setup() -> (InMemoryBackends, FcrCalculator) {
        let backends = InMemoryBackends::new();
        backends.batches.upsert(batch("B1", "T1")).unwrap();
        let calc = FcrCalculator::new(backends.sources(), FcrConfig::default());
        (backends, calc)
    }

    fn day(d: i64) -> DateTime<Utc> {
        stocking_date() + Duration::days(d)
    }

    #[test]
    fn test_period_fcr_basic() {
        let (b, calc) = setup();
        // biomass 300 kg -> 400 kg
        store(&b, measurement_at("m1", day(10), 30.0));
        store(&b, measurement_at("m2", day(20), 40.0));
        feed(&b, 12, 60.0);
        feed(&b, 18, 60.0);

        let r = calc
            .calculate_period_fcr("B1", "T1", day(10), day(20), None)
            .unwrap();
        assert!(r.is_valid);
        assert!((r.period_fcr - 1.2).abs() < 1e-12);
        assert_eq!(r.analysis.period_feed_given, 120.0);
        assert_eq!(r.analysis.period_growth, 100.0);
        // cumulative: 120 kg feed over 200 kg gain since stocking
        assert!((r.cumulative_fcr - 0.6).abs() < 1e-12);
        assert_eq!(r.analysis.target_fcr, 1.2);
        assert!((r.analysis.fcr_variance + 50.0).abs() < 1e-9);
        assert!(r.has_warning(|w| matches!(w, FcrWarning::LargeTargetVariance { .. })));
        assert!(!r.has_warning(|w| matches!(w, FcrWarning::AbnormalFcr { .. })));
    }

    #[test]
    fn test_period_with_one_measurement_is_invalid() {
        let (b, calc) = setup();
        store(&b, measurement_at("m1", day(10), 30.0));
        let r = calc
            .calculate_period_fcr("B1", "T1", day(0), day(20), None)
            .unwrap();
        assert!(!r.is_valid);
        assert_eq!(r.period_fcr, 0.0);
        assert_eq!(r.analysis, FcrAnalysis::empty(1.2));
        assert!(r.has_warning(|w| matches!(
            w,
            FcrWarning::InsufficientMeasurements { found: 1, required: 2 }
        )));
    }

    #[test]
    fn test_zero_growth_never_divides() {
        let (b, calc) = setup();
        store(&b, measurement_at("m1", day(10), 30.0));
        store(&b, measurement_at("m2", day(20), 30.0));
        feed(&b, 15, 50.0);

        let r = calc
            .calculate_period_fcr("B1", "T1", day(10), day(20), Some(1.2))
            .unwrap();
        assert!(!r.is_valid);
        assert!(r.period_fcr.is_finite());
        assert!(r.has_warning(|w| matches!(w, FcrWarning::NonPositiveGrowth { .. })));
        assert!(r.warnings[0].to_string().contains("non-positive growth"));
    }

    #[test]
    fn test_inverted_window_rejected() {
        let (_b, calc) = setup();
        let err = calc
            .calculate_period_fcr("B1", "T1", day(20), day(10), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_unknown_batch_is_not_found() {
        let (_b, calc) = setup();
        let err = calc
            .calculate_period_fcr("NOPE", "T1", day(0), day(10), None)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_cumulative_sentinel_without_growth() {
        let (b, calc) = setup();
        feed(&b, 3, 25.0);
        let c = calc.calculate_cumulative_fcr("B1", "T1", None).unwrap();
        assert_eq!(c.fcr, 0.0);
        assert_eq!(c.total_feed, 25.0);
        assert_eq!(c.total_growth, 0.0);
    }

    #[test]
    fn test_cumulative_respects_end_date() {
        let (b, calc) = setup();
        store(&b, measurement_at("m1", day(10), 30.0));
        store(&b, measurement_at("m2", day(20), 40.0));
        feed(&b, 5, 100.0);
        feed(&b, 15, 100.0);

        let at_10 = calc.calculate_cumulative_fcr("B1", "T1", Some(day(10))).unwrap();
        assert_eq!(at_10.total_feed, 100.0);
        assert!((at_10.fcr - 1.0).abs() < 1e-12);

        let all = calc.calculate_cumulative_fcr("B1", "T1", None).unwrap();
        assert_eq!(all.total_feed, 200.0);
        assert!((all.fcr - 1.0).abs() < 1e-12);
        assert_eq!(all, calc.calculate_cumulative_fcr("B1", "T1", None).unwrap());
    }

    #[test]
    fn test_trend_reads_stored_period_fcr() {
        let (b, calc) = setup();
        for (i, fcr) in [1.8, 1.6, 1.4, 1.2].iter().enumerate() {
            let m = measurement_at(&format!("m{i}"), day(7 * (i as i64 + 1)), 30.0 + i as f64);
            store(&b, with_period_fcr(m, *fcr));
        }
        let t = calc.analyze_fcr_trend("B1", "T1").unwrap();
        assert_eq!(t.trend, FcrTrend::Improving);
        assert!(t.slope < 0.0);
    }

    #[test]
    fn test_measurement_fcr() {
        let (b, calc) = setup();
        let previous = measurement_at("m1", day(10), 30.0);
        store(&b, previous.clone());
        feed(&b, 5, 50.0);
        feed(&b, 15, 110.0);

        let snapshot = batch("B1", "T1");
        let a = calc
            .analyze_measurement_fcr(&snapshot, Some(&previous), day(20), 400.0)
            .unwrap()
            .unwrap();
        assert_eq!(a.period_feed_given, 110.0);
        assert_eq!(a.period_growth, 100.0);
        assert!((a.period_fcr - 1.1).abs() < 1e-12);
        // 160 kg over 200 kg gain
        assert!((a.cumulative_fcr - 0.8).abs() < 1e-12);
        assert_eq!(a.fcr_trend, FcrTrend::Stable);

        assert!(calc
            .analyze_measurement_fcr(&snapshot, None, day(20), 400.0)
            .unwrap()
            .is_none());
        assert!(calc
            .analyze_measurement_fcr(&snapshot, Some(&previous), day(20), 250.0)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_feeding_at_a_measurement_counts_in_one_period_only() {
        let (b, calc) = setup();
        // 12 kg daily on days 0..=28, weighed on days 0, 14 and 28
        for d in 0..=28 {
            feed(&b, d, 12.0);
        }
        let m0 = measurement_at("m0", day(0), 20.0);
        let m14 = measurement_at("m14", day(14), 34.0);
        store(&b, m0.clone());
        store(&b, m14.clone());

        let snapshot = batch("B1", "T1");
        let first = calc
            .analyze_measurement_fcr(&snapshot, Some(&m0), day(14), m14.estimated_biomass_kg)
            .unwrap()
            .unwrap();
        let second = calc
            .analyze_measurement_fcr(&snapshot, Some(&m14), day(28), 480.0)
            .unwrap()
            .unwrap();

        assert_eq!(first.period_feed_given, 168.0);
        assert_eq!(second.period_feed_given, 168.0);
        // periods plus the stocking-day feeding make up the cumulative total
        assert_eq!(second.cumulative_feed_given, 348.0);
        assert_eq!(
            first.period_feed_given + second.period_feed_given + 12.0,
            second.cumulative_feed_given
        );
    }

    #[test]
    fn test_fcr_variance_guards() {
        assert_eq!(fcr_variance(0.0, 1.2), 0.0);
        assert_eq!(fcr_variance(1.5, 0.0), 0.0);
        assert!((fcr_variance(1.32, 1.2) - 10.0).abs() < 1e-9);
    }
}
