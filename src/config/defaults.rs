//! System-wide default constants.
//!
//! Centralises the domain thresholds used by the engine. Every value here is
//! the default of a field in `EngineConfig` and can be overridden in
//! `aquametrics.toml`.

// ============================================================================
// Statistics
// ============================================================================

/// Minimum number of sampled animals in a measurement.
pub const MIN_SAMPLE_SIZE: usize = 3;

/// Normal-approximation critical value used when df is out of table range.
pub const NORMAL_APPROX_Z_975: f64 = 1.96;

// ============================================================================
// Feed conversion
// ============================================================================

/// Minimum measurements inside a window to compute a period FCR.
pub const MIN_PERIOD_MEASUREMENTS: usize = 2;

/// Period FCR below this is flagged as abnormal.
pub const ABNORMAL_FCR_LOW: f64 = 0.5;

/// Period FCR at or above this is flagged as abnormal.
pub const ABNORMAL_FCR_HIGH: f64 = 5.0;

/// FCR above this is a critical anomaly (severe waste or mortality).
pub const CRITICAL_FCR: f64 = 3.0;

/// FCR below this is suspicious (likely recording error).
pub const SUSPICIOUS_FCR: f64 = 0.7;

/// |slope| per measurement below which the FCR trend is stable.
pub const FCR_TREND_SLOPE_THRESHOLD: f64 = 0.01;

/// Declining slope above this produces an urgent recommendation.
pub const FCR_URGENT_SLOPE: f64 = 0.03;

/// Most recent measurements considered by the trend analysis.
pub const FCR_TREND_WINDOW: usize = 10;

/// Minimum FCR values needed for a regression.
pub const MIN_TREND_POINTS: usize = 3;

/// Floor for the 7-day FCR forecast.
pub const FCR_FORECAST_FLOOR: f64 = 0.5;

/// Horizon of the FCR forecast (steps).
pub const FCR_FORECAST_HORIZON: f64 = 7.0;

/// |FCR variance from target| (%) above which a warning is attached.
pub const LARGE_FCR_VARIANCE_PERCENT: f64 = 20.0;

/// Latest FCR above this triggers a feed-efficiency recommendation.
pub const HIGH_FCR_LEVEL: f64 = 2.0;

/// Latest FCR below this triggers a data-quality recommendation.
pub const LOW_FCR_LEVEL: f64 = 0.8;

/// Industry FCR benchmark for species missing from the table.
pub const DEFAULT_INDUSTRY_FCR: f64 = 1.5;

// ============================================================================
// Suggested actions / recommendations
// ============================================================================

/// Growth shortfall (%) that warrants a health check.
pub const GROWTH_SHORTFALL_HIGH_PERCENT: f64 = 20.0;

/// Growth shortfall (%) that warrants a feeding review.
pub const GROWTH_SHORTFALL_MEDIUM_PERCENT: f64 = 10.0;

/// Growth surplus (%) that suggests revisiting targets.
pub const GROWTH_SURPLUS_PERCENT: f64 = 10.0;

pub const FCR_VARIANCE_HIGH_PERCENT: f64 = 20.0;
pub const FCR_VARIANCE_MEDIUM_PERCENT: f64 = 10.0;

/// Weight CV (%) above which grading is urgent.
pub const CV_HIGH_PERCENT: f64 = 25.0;

/// Weight CV (%) above which grading should be scheduled.
pub const CV_MEDIUM_PERCENT: f64 = 15.0;

/// Samples smaller than this get an "increase sampling" suggestion.
pub const RECOMMENDED_SAMPLE_SIZE: usize = 30;

// ============================================================================
// Batch analysis
// ============================================================================

/// TTL of cached batch analyses (seconds).
pub const ANALYSIS_CACHE_TTL_SECS: u64 = 3_600;

/// Measurements averaged at each end of the history for the CV trend.
pub const CV_TREND_WINDOW: usize = 3;

/// CV change (percentage points) that counts as a trend.
pub const CV_TREND_DELTA: f64 = 2.0;

/// CV (%) above which the performance index is penalised.
pub const CV_PENALTY_THRESHOLD: f64 = 15.0;

/// Survival (%) above which the performance index gets a bonus.
pub const SURVIVAL_BONUS_PERCENT: f64 = 95.0;

/// Survival (%) below which the performance index is penalised.
pub const SURVIVAL_PENALTY_PERCENT: f64 = 80.0;

/// Maximum penalty for negative growth variance.
pub const GROWTH_PENALTY_MAX: f64 = 30.0;

/// Maximum penalty for positive FCR variance.
pub const FCR_PENALTY_MAX: f64 = 25.0;

/// Maximum penalty for excess CV.
pub const CV_PENALTY_MAX: f64 = 20.0;

/// Survival bonus/penalty magnitude.
pub const SURVIVAL_ADJUSTMENT: f64 = 5.0;

/// Most recent measurements used to fit the harvest growth curve.
pub const PROJECTION_WINDOW: usize = 10;

/// Furthest a harvest date is projected (days from the latest weighing).
pub const PROJECTION_HORIZON_DAYS: i64 = 3_650;

// ============================================================================
// Cache
// ============================================================================

/// Default on-disk location of the sled analysis cache.
pub const DEFAULT_CACHE_PATH: &str = "./data/analysis_cache";
