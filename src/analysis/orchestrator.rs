//! Growth Analysis Orchestrator - batch-level report with read-through cache
//!
//! Pipeline for a cache miss:
//! 1. Load batch, species targets and full measurement history
//! 2. Current metrics (gain, ADG/SGR since stocking, variance to the curve)
//! 3. Cumulative FCR and its variance from target
//! 4. FCR trend and CV trend
//! 5. Performance index and rating
//! 6. Harvest projection
//! 7. Ranked recommendations
//!
//! The cache only affects latency: read errors and undecodable entries are
//! misses, write errors are logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::index::{cv_trend, performance_index, rate_index, IndexInputs};
use super::projection::{project_harvest, ProjectionBasis};
use super::recommendations::{build_recommendations, RecommendationInputs};
use crate::config::{ActionConfig, AnalysisConfig, EngineConfig};
use crate::error::EngineResult;
use crate::fcr::{fcr_variance, FcrCalculator};
use crate::growth::{average_daily_gain, days_between, expected_weight, specific_growth_rate};
use crate::storage::{AnalysisCache, DataSources};
use crate::types::{CurrentMetrics, GrowthAnalysisResult, TrendPoint, TrendSummary};

/// Cache key for a batch analysis.
pub fn cache_key(tenant_id: &str, batch_id: &str) -> String {
    format!("growth-analysis:{tenant_id}:{batch_id}")
}

pub struct GrowthAnalysisOrchestrator {
    sources: DataSources,
    cache: Option<Arc<dyn AnalysisCache>>,
    fcr: FcrCalculator,
    actions: ActionConfig,
    analysis: AnalysisConfig,
    now: fn() -> DateTime<Utc>,
}

impl GrowthAnalysisOrchestrator {
    pub fn new(
        sources: DataSources,
        cache: Option<Arc<dyn AnalysisCache>>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            fcr: FcrCalculator::new(sources.clone(), config.fcr.clone()),
            sources,
            cache,
            actions: config.actions.clone(),
            analysis: config.analysis.clone(),
            now: Utc::now,
        }
    }

    /// Replace the wall clock (scenario replay, tests).
    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn fcr_calculator(&self) -> &FcrCalculator {
        &self.fcr
    }

    /// Batch analysis, served from the cache when a live entry exists.
    pub fn get_analysis(&self, batch_id: &str, tenant_id: &str) -> EngineResult<GrowthAnalysisResult> {
        let key = cache_key(tenant_id, batch_id);

        if let Some(cached) = self.read_cache(&key) {
            debug!(batch_id, tenant_id, "Growth analysis served from cache");
            return Ok(cached);
        }

        let result = self.compute_analysis(batch_id, tenant_id)?;
        self.write_cache(&key, &result);
        Ok(result)
    }

    /// Drop the cached analysis for a batch. Failures are logged only.
    pub fn invalidate(&self, batch_id: &str, tenant_id: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.invalidate(&cache_key(tenant_id, batch_id)) {
                warn!(batch_id, tenant_id, error = %e, backend = cache.backend_name(), "Analysis cache invalidation failed");
            }
        }
    }

    fn read_cache(&self, key: &str) -> Option<GrowthAnalysisResult> {
        let cache = self.cache.as_ref()?;
        match cache.get(key) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(result) => Some(result),
                Err(e) => {
                    warn!(key, error = %e, "Discarding undecodable cached analysis");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, backend = cache.backend_name(), "Analysis cache read failed, recomputing");
                None
            }
        }
    }

    fn write_cache(&self, key: &str, result: &GrowthAnalysisResult) {
        let Some(cache) = &self.cache else {
            return;
        };
        let bytes = match serde_json::to_vec(result) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "Failed to encode analysis for cache");
                return;
            }
        };
        let ttl = Duration::from_secs(self.analysis.cache_ttl_secs);
        if let Err(e) = cache.set(key, &bytes, ttl) {
            warn!(key, error = %e, backend = cache.backend_name(), "Analysis cache write failed");
        }
    }

    /// Compute the analysis without touching the cache.
    pub fn compute_analysis(&self, batch_id: &str, tenant_id: &str) -> EngineResult<GrowthAnalysisResult> {
        let now = (self.now)();
        let batch = self.sources.batches.load_batch(batch_id, tenant_id)?;
        let history = self.sources.measurements.history(batch_id, tenant_id)?;
        let latest = history.last();

        // Step 2: current metrics
        let current_weight = latest.map_or(batch.current_avg_weight_g, |m| m.average_weight);
        let current_biomass = latest
            .map(|m| m.estimated_biomass_kg)
            .or(batch.current_biomass_kg)
            .unwrap_or(batch.current_count as f64 * batch.current_avg_weight_g / 1000.0);
        let weighed_at = latest
            .map(|m| m.measurement_date)
            .or(batch.last_measured_at)
            .unwrap_or(now);

        let days_weighed = days_between(batch.stocked_at, weighed_at).max(0);
        let expected = expected_weight(&batch, weighed_at);
        let growth_variance_percent = if expected > 0.0 {
            (current_weight - expected) / expected * 100.0
        } else {
            0.0
        };
        let weight_cv = latest.map(|m| m.weight_cv);
        let survival = batch.survival_rate_percent();

        // Step 3: feed conversion
        let cumulative = self.fcr.cumulative_for(&batch, None)?;
        let target_fcr = batch.species.target_fcr;
        let fcr_variance_percent = fcr_variance(cumulative.fcr, target_fcr);

        // Step 4: trends
        let fcr_trend = self.fcr.analyze_fcr_trend(batch_id, tenant_id)?;
        let (cv_direction, cv_change) = cv_trend(&history, &self.analysis);

        // Step 5: index
        let index = performance_index(
            &IndexInputs {
                growth_variance_percent,
                fcr_variance_percent,
                weight_cv,
                survival_rate_percent: survival,
            },
            &self.analysis,
        );

        // Step 6: projection
        let projection = project_harvest(
            &batch,
            &history,
            &ProjectionBasis {
                current_weight_g: current_weight,
                current_biomass_kg: current_biomass,
                weighed_at,
                cumulative_fcr: cumulative.fcr,
            },
            &self.analysis,
        );

        // Step 7: recommendations
        let recommendations = build_recommendations(
            &RecommendationInputs {
                growth_variance_percent,
                fcr_variance_percent,
                fcr_trend: &fcr_trend,
                weight_cv,
                cv_trend: cv_direction,
                survival_rate_percent: survival,
            },
            &self.actions,
            &self.analysis,
        );

        let series = history
            .iter()
            .map(|m| TrendPoint {
                measurement_id: m.id.clone(),
                date: m.measurement_date,
                average_weight_g: m.average_weight,
                weight_cv: m.weight_cv,
                biomass_kg: m.estimated_biomass_kg,
                period_fcr: m.period_fcr(),
            })
            .collect();

        let stocking_biomass = batch.stocking_biomass_kg();
        let performance = rate_index(index);

        info!(
            batch_id,
            tenant_id,
            measurements = history.len(),
            performance_index = index,
            performance = %performance,
            cumulative_fcr = cumulative.fcr,
            "Growth analysis computed"
        );

        Ok(GrowthAnalysisResult {
            batch_id: batch.batch_id.clone(),
            tenant_id: batch.tenant_id.clone(),
            species_code: batch.species.species_code.clone(),
            generated_at: now,
            current: CurrentMetrics {
                days_in_production: days_between(batch.stocked_at, now).max(0),
                initial_avg_weight_g: batch.initial_avg_weight_g,
                current_avg_weight_g: current_weight,
                weight_gain_g: current_weight - batch.initial_avg_weight_g,
                stocking_biomass_kg: stocking_biomass,
                current_biomass_kg: current_biomass,
                biomass_gain_kg: current_biomass - stocking_biomass,
                adg_g_per_day: average_daily_gain(batch.initial_avg_weight_g, current_weight, days_weighed),
                sgr_percent: specific_growth_rate(batch.initial_avg_weight_g, current_weight, days_weighed),
                expected_weight_g: expected,
                growth_variance_percent,
                weight_cv,
                survival_rate_percent: survival,
                cumulative_fcr: cumulative,
                target_fcr,
                fcr_variance_percent,
                measurement_count: history.len(),
                last_measured_at: latest.map(|m| m.measurement_date),
            },
            trend: TrendSummary {
                fcr: fcr_trend,
                cv_trend: cv_direction,
                cv_change,
                series,
            },
            projection,
            performance_index: index,
            performance,
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::{batch, measurement_at, stocking_date};
    use crate::storage::{InMemoryBackends, InMemoryCache, MeasurementStore, StorageError};
    use crate::types::{CvTrend, FeedEntry, GrowthRateSource, PerformanceRating};
    use chrono::{Duration as ChronoDuration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap()
    }

    fn seeded() -> InMemoryBackends {
        let b = InMemoryBackends::new();
        b.batches.upsert(batch("B1", "T1")).unwrap();
        // on the 1 g/day curve: day 10 -> 30 g, day 20 -> 40 g, day 30 -> 50 g
        for (i, d) in [10i64, 20, 30].iter().enumerate() {
            let m = measurement_at(&format!("m{i}"), stocking_date() + ChronoDuration::days(*d), 20.0 + *d as f64);
            b.measurements.append(&m).unwrap();
        }
        b.feed
            .record(FeedEntry {
                batch_id: "B1".to_string(),
                tenant_id: "T1".to_string(),
                fed_at: stocking_date() + ChronoDuration::days(15),
                amount_kg: 360.0,
            })
            .unwrap();
        b
    }

    #[test]
    fn test_compute_analysis() {
        let b = seeded();
        let orch = GrowthAnalysisOrchestrator::new(b.sources(), None, &EngineConfig::default())
            .with_clock(fixed_now);
        let r = orch.compute_analysis("B1", "T1").unwrap();

        assert_eq!(r.species_code, "rainbow_trout");
        assert_eq!(r.generated_at, fixed_now());
        assert_eq!(r.current.days_in_production, 31);
        assert_eq!(r.current.current_avg_weight_g, 50.0);
        assert_eq!(r.current.weight_gain_g, 30.0);
        assert_eq!(r.current.expected_weight_g, 50.0);
        assert_eq!(r.current.growth_variance_percent, 0.0);
        assert!((r.current.adg_g_per_day - 1.0).abs() < 1e-12);
        // 360 kg feed over 500 - 200 = 300 kg gain
        assert!((r.current.cumulative_fcr.fcr - 1.2).abs() < 1e-12);
        assert!(r.current.fcr_variance_percent.abs() < 1e-9);
        assert_eq!(r.current.measurement_count, 3);
        assert_eq!(r.trend.series.len(), 3);
        assert_eq!(r.trend.cv_trend, CvTrend::Stable);

        // cv 10, survival 100 -> clamped at 100
        assert_eq!(r.performance_index, 100.0);
        assert_eq!(r.performance, PerformanceRating::Excellent);

        let p = r.projection.unwrap();
        assert_eq!(p.growth_rate_source, GrowthRateSource::Regression);
        assert_eq!(p.days_to_harvest, 450);
    }

    #[test]
    fn test_unknown_batch_propagates_not_found() {
        let b = InMemoryBackends::new();
        let orch = GrowthAnalysisOrchestrator::new(b.sources(), None, &EngineConfig::default());
        assert!(orch.get_analysis("B404", "T1").unwrap_err().is_not_found());
    }

    #[test]
    fn test_cache_hit_skips_recompute() {
        let b = seeded();
        let cache = Arc::new(InMemoryCache::new());
        let orch = GrowthAnalysisOrchestrator::new(b.sources(), Some(cache.clone()), &EngineConfig::default())
            .with_clock(fixed_now);

        let first = orch.get_analysis("B1", "T1").unwrap();
        assert_eq!(first.current.measurement_count, 3);
        assert!(cache.get(&cache_key("T1", "B1")).unwrap().is_some());

        // a new measurement is invisible until the entry is invalidated
        let m = measurement_at("m9", stocking_date() + ChronoDuration::days(31), 60.0);
        b.measurements.append(&m).unwrap();
        let cached = orch.get_analysis("B1", "T1").unwrap();
        assert_eq!(cached.current.measurement_count, 3);
        assert_eq!(cached.generated_at, first.generated_at);

        orch.invalidate("B1", "T1");
        let fresh = orch.get_analysis("B1", "T1").unwrap();
        assert_eq!(fresh.current.measurement_count, 4);
    }

    #[test]
    fn test_garbage_cache_entry_is_a_miss() {
        let b = seeded();
        let cache = Arc::new(InMemoryCache::new());
        cache
            .set(&cache_key("T1", "B1"), b"not json", Duration::from_secs(60))
            .unwrap();
        let orch = GrowthAnalysisOrchestrator::new(b.sources(), Some(cache), &EngineConfig::default());
        assert_eq!(orch.get_analysis("B1", "T1").unwrap().current.measurement_count, 3);
    }

    #[test]
    fn test_negligible_growth_target_has_no_projection() {
        let b = InMemoryBackends::new();
        let mut slow = batch("R", "T1");
        slow.species.daily_growth_g = 1e-6;
        b.batches.upsert(slow).unwrap();

        let orch = GrowthAnalysisOrchestrator::new(b.sources(), None, &EngineConfig::default())
            .with_clock(fixed_now);
        let r = orch.compute_analysis("R", "T1").unwrap();
        assert!(r.projection.is_none());
        assert_eq!(r.current.measurement_count, 0);
    }

    struct BrokenCache {
        writes: AtomicUsize,
    }

    impl AnalysisCache for BrokenCache {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
            Err(StorageError::Backend("down".to_string()))
        }
        fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::Backend("down".to_string()))
        }
        fn invalidate(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("down".to_string()))
        }
        fn backend_name(&self) -> &'static str {
            "Broken"
        }
    }

    #[test]
    fn test_failing_cache_does_not_change_result() {
        let b = seeded();
        let broken = Arc::new(BrokenCache {
            writes: AtomicUsize::new(0),
        });
        let with_cache = GrowthAnalysisOrchestrator::new(b.sources(), Some(broken.clone()), &EngineConfig::default())
            .with_clock(fixed_now);
        let without = GrowthAnalysisOrchestrator::new(b.sources(), None, &EngineConfig::default())
            .with_clock(fixed_now);

        assert_eq!(
            with_cache.get_analysis("B1", "T1").unwrap(),
            without.get_analysis("B1", "T1").unwrap()
        );
        assert_eq!(broken.writes.load(Ordering::SeqCst), 1);
        with_cache.invalidate("B1", "T1");
    }
}
