//! Engine Configuration - every analytics threshold as an operator-tunable TOML value
//!
//! Each struct implements `Default` with values matching `config::defaults`,
//! so behaviour is unchanged when no config file is present.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults::*;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "AQUAMETRICS_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "aquametrics.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for an analytics deployment.
///
/// Load with `EngineConfig::load()` which searches:
/// 1. `$AQUAMETRICS_CONFIG` env var
/// 2. `./aquametrics.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Deployment identification
    #[serde(default)]
    pub site: SiteInfo,

    /// Sample statistics
    #[serde(default)]
    pub statistics: StatisticsConfig,

    /// Feed conversion thresholds
    #[serde(default)]
    pub fcr: FcrConfig,

    /// Suggested action / recommendation thresholds
    #[serde(default)]
    pub actions: ActionConfig,

    /// Batch analysis tuning
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Analysis cache backend
    #[serde(default)]
    pub cache: CacheConfig,
}

impl EngineConfig {
    /// Load configuration using the standard search order:
    /// 1. `$AQUAMETRICS_CONFIG` environment variable
    /// 2. `./aquametrics.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), site = %config.site.name, "Loaded engine config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./aquametrics.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(site = %config.site.name, "Loaded engine config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Two passes: unknown keys are reported as warnings first, then the
    /// document is deserialized and validated.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all thresholds for internal consistency.
    ///
    /// Rules:
    /// - Escalating thresholds (medium/high, warning/critical) must be ordered
    /// - Windows and sample sizes must be large enough for the statistics
    /// - Every threshold must be finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let s = &self.statistics;
        if s.min_sample_size < MIN_SAMPLE_SIZE {
            errors.push(format!(
                "statistics.min_sample_size ({}) must be >= {}",
                s.min_sample_size, MIN_SAMPLE_SIZE
            ));
        }

        let f = &self.fcr;
        if f.abnormal_low >= f.abnormal_high {
            errors.push(format!(
                "fcr.abnormal_low ({:.2}) must be less than abnormal_high ({:.2})",
                f.abnormal_low, f.abnormal_high
            ));
        }
        if f.suspicious_fcr >= f.critical_fcr {
            errors.push(format!(
                "fcr.suspicious_fcr ({:.2}) must be less than critical_fcr ({:.2})",
                f.suspicious_fcr, f.critical_fcr
            ));
        }
        if f.trend_slope_threshold <= 0.0 {
            errors.push("fcr.trend_slope_threshold must be > 0".to_string());
        }
        Self::check_escalation(
            f.trend_slope_threshold,
            f.urgent_slope,
            "fcr.trend_slope_threshold/urgent_slope",
            &mut errors,
        );
        if f.trend_window < MIN_TREND_POINTS {
            errors.push(format!(
                "fcr.trend_window ({}) must be >= {}",
                f.trend_window, MIN_TREND_POINTS
            ));
        }
        if f.default_industry_benchmark <= 0.0 {
            errors.push("fcr.default_industry_benchmark must be > 0".to_string());
        }
        for (species, value) in &f.industry_benchmarks {
            if !value.is_finite() || *value <= 0.0 {
                errors.push(format!(
                    "fcr.industry_benchmarks.{species} must be a positive number, got {value}"
                ));
            }
        }

        let a = &self.actions;
        Self::check_escalation(
            a.growth_shortfall_medium_percent,
            a.growth_shortfall_high_percent,
            "actions.growth_shortfall",
            &mut errors,
        );
        Self::check_escalation(
            a.fcr_variance_medium_percent,
            a.fcr_variance_high_percent,
            "actions.fcr_variance",
            &mut errors,
        );
        Self::check_escalation(
            a.cv_medium_percent,
            a.cv_high_percent,
            "actions.cv",
            &mut errors,
        );

        let an = &self.analysis;
        if an.cache_ttl_secs == 0 {
            errors.push("analysis.cache_ttl_secs must be > 0".to_string());
        }
        if an.cv_trend_window == 0 {
            errors.push("analysis.cv_trend_window must be > 0".to_string());
        }
        if an.survival_penalty_percent >= an.survival_bonus_percent {
            errors.push(format!(
                "analysis.survival_penalty_percent ({:.1}) must be less than survival_bonus_percent ({:.1})",
                an.survival_penalty_percent, an.survival_bonus_percent
            ));
        }
        if an.projection_horizon_days <= 0 {
            errors.push("analysis.projection_horizon_days must be > 0".to_string());
        }
        if an.projection_window < MIN_TREND_POINTS {
            errors.push(format!(
                "analysis.projection_window ({}) must be >= {}",
                an.projection_window, MIN_TREND_POINTS
            ));
        }

        // Physical range validation
        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        // Reject NaN/Inf in any config value (sweep all f64 fields via serialization)
        if let Ok(value) = toml::Value::try_from(self) {
            let mut non_finite = Vec::new();
            collect_non_finite(&value, "", &mut non_finite);
            if !non_finite.is_empty() {
                errors.push(format!(
                    "Config contains NaN or Inf values ({}); all thresholds must be finite numbers",
                    non_finite.join(", ")
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_escalation(lower: f64, higher: f64, name: &str, errors: &mut Vec<String>) {
        // NaN/Inf comparisons silently pass
        if !lower.is_finite() || !higher.is_finite() {
            errors.push(format!(
                "{name}: values must be finite (got {lower}, {higher})"
            ));
            return;
        }
        if higher < lower {
            errors.push(format!(
                "{name}: higher threshold ({higher:.3}) must be >= lower threshold ({lower:.3})"
            ));
        }
    }
}

fn collect_non_finite(value: &toml::Value, prefix: &str, out: &mut Vec<String>) {
    match value {
        toml::Value::Float(f) if !f.is_finite() => out.push(prefix.to_string()),
        toml::Value::Table(table) => {
            for (k, v) in table {
                let path = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                collect_non_finite(v, &path, out);
            }
        }
        _ => {}
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(#[source] toml::ser::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Site Info
// ============================================================================

/// Identification metadata. Not used for logic; appears in logs and reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInfo {
    #[serde(default = "default_site_name")]
    pub name: String,

    #[serde(default)]
    pub region: String,
}

fn default_site_name() -> String {
    "DEFAULT".to_string()
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            region: String::new(),
        }
    }
}

// ============================================================================
// Statistics Config
// ============================================================================

/// Student-t critical value source for confidence intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TDistribution {
    /// Hand-tabulated critical values with linear interpolation
    #[default]
    Tabulated,
    /// Exact inverse CDF via statrs
    Exact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsConfig {
    #[serde(default)]
    pub t_distribution: TDistribution,

    /// Minimum animals per sample (never below 3).
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: usize,
}

fn default_min_sample_size() -> usize { MIN_SAMPLE_SIZE }

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            t_distribution: TDistribution::default(),
            min_sample_size: default_min_sample_size(),
        }
    }
}

// ============================================================================
// FCR Config
// ============================================================================

/// Feed conversion thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcrConfig {
    /// Period FCR below this is abnormal.
    #[serde(default = "default_abnormal_low")]
    pub abnormal_low: f64,

    /// Period FCR at or above this is abnormal.
    #[serde(default = "default_abnormal_high")]
    pub abnormal_high: f64,

    /// FCR above this is a critical anomaly.
    #[serde(default = "default_critical_fcr")]
    pub critical_fcr: f64,

    /// FCR below this is a suspicious anomaly.
    #[serde(default = "default_suspicious_fcr")]
    pub suspicious_fcr: f64,

    /// Slope magnitude separating stable from improving/declining.
    #[serde(default = "default_trend_slope_threshold")]
    pub trend_slope_threshold: f64,

    /// Declining slope that makes the trend recommendation urgent.
    #[serde(default = "default_urgent_slope")]
    pub urgent_slope: f64,

    #[serde(default = "default_trend_window")]
    pub trend_window: usize,

    #[serde(default = "default_forecast_floor")]
    pub forecast_floor: f64,

    /// |variance from target| (%) that attaches a warning to period results.
    #[serde(default = "default_large_variance_percent")]
    pub large_variance_percent: f64,

    #[serde(default = "default_high_fcr_level")]
    pub high_fcr_level: f64,

    #[serde(default = "default_low_fcr_level")]
    pub low_fcr_level: f64,

    #[serde(default = "default_industry_benchmark")]
    pub default_industry_benchmark: f64,

    /// Per-species overrides of the built-in industry benchmark table.
    #[serde(default)]
    pub industry_benchmarks: HashMap<String, f64>,
}

fn default_abnormal_low() -> f64 { ABNORMAL_FCR_LOW }
fn default_abnormal_high() -> f64 { ABNORMAL_FCR_HIGH }
fn default_critical_fcr() -> f64 { CRITICAL_FCR }
fn default_suspicious_fcr() -> f64 { SUSPICIOUS_FCR }
fn default_trend_slope_threshold() -> f64 { FCR_TREND_SLOPE_THRESHOLD }
fn default_urgent_slope() -> f64 { FCR_URGENT_SLOPE }
fn default_trend_window() -> usize { FCR_TREND_WINDOW }
fn default_forecast_floor() -> f64 { FCR_FORECAST_FLOOR }
fn default_large_variance_percent() -> f64 { LARGE_FCR_VARIANCE_PERCENT }
fn default_high_fcr_level() -> f64 { HIGH_FCR_LEVEL }
fn default_low_fcr_level() -> f64 { LOW_FCR_LEVEL }
fn default_industry_benchmark() -> f64 { DEFAULT_INDUSTRY_FCR }

impl Default for FcrConfig {
    fn default() -> Self {
        Self {
            abnormal_low: default_abnormal_low(),
            abnormal_high: default_abnormal_high(),
            critical_fcr: default_critical_fcr(),
            suspicious_fcr: default_suspicious_fcr(),
            trend_slope_threshold: default_trend_slope_threshold(),
            urgent_slope: default_urgent_slope(),
            trend_window: default_trend_window(),
            forecast_floor: default_forecast_floor(),
            large_variance_percent: default_large_variance_percent(),
            high_fcr_level: default_high_fcr_level(),
            low_fcr_level: default_low_fcr_level(),
            default_industry_benchmark: default_industry_benchmark(),
            industry_benchmarks: HashMap::new(),
        }
    }
}

// ============================================================================
// Action Config
// ============================================================================

/// Thresholds shared by per-sample suggested actions and batch recommendations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    #[serde(default = "default_growth_shortfall_high")]
    pub growth_shortfall_high_percent: f64,

    #[serde(default = "default_growth_shortfall_medium")]
    pub growth_shortfall_medium_percent: f64,

    #[serde(default = "default_growth_surplus")]
    pub growth_surplus_percent: f64,

    #[serde(default = "default_fcr_variance_high")]
    pub fcr_variance_high_percent: f64,

    #[serde(default = "default_fcr_variance_medium")]
    pub fcr_variance_medium_percent: f64,

    #[serde(default = "default_cv_high")]
    pub cv_high_percent: f64,

    #[serde(default = "default_cv_medium")]
    pub cv_medium_percent: f64,

    #[serde(default = "default_recommended_sample_size")]
    pub recommended_sample_size: usize,
}

fn default_growth_shortfall_high() -> f64 { GROWTH_SHORTFALL_HIGH_PERCENT }
fn default_growth_shortfall_medium() -> f64 { GROWTH_SHORTFALL_MEDIUM_PERCENT }
fn default_growth_surplus() -> f64 { GROWTH_SURPLUS_PERCENT }
fn default_fcr_variance_high() -> f64 { FCR_VARIANCE_HIGH_PERCENT }
fn default_fcr_variance_medium() -> f64 { FCR_VARIANCE_MEDIUM_PERCENT }
fn default_cv_high() -> f64 { CV_HIGH_PERCENT }
fn default_cv_medium() -> f64 { CV_MEDIUM_PERCENT }
fn default_recommended_sample_size() -> usize { RECOMMENDED_SAMPLE_SIZE }

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            growth_shortfall_high_percent: default_growth_shortfall_high(),
            growth_shortfall_medium_percent: default_growth_shortfall_medium(),
            growth_surplus_percent: default_growth_surplus(),
            fcr_variance_high_percent: default_fcr_variance_high(),
            fcr_variance_medium_percent: default_fcr_variance_medium(),
            cv_high_percent: default_cv_high(),
            cv_medium_percent: default_cv_medium(),
            recommended_sample_size: default_recommended_sample_size(),
        }
    }
}

// ============================================================================
// Analysis Config
// ============================================================================

/// Batch analysis (orchestrator) tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_cv_trend_window")]
    pub cv_trend_window: usize,

    #[serde(default = "default_cv_trend_delta")]
    pub cv_trend_delta: f64,

    #[serde(default = "default_cv_penalty_threshold")]
    pub cv_penalty_threshold: f64,

    #[serde(default = "default_survival_bonus")]
    pub survival_bonus_percent: f64,

    #[serde(default = "default_survival_penalty")]
    pub survival_penalty_percent: f64,

    #[serde(default = "default_projection_window")]
    pub projection_window: usize,

    #[serde(default = "default_projection_horizon_days")]
    pub projection_horizon_days: i64,
}

fn default_cache_ttl_secs() -> u64 { ANALYSIS_CACHE_TTL_SECS }
fn default_cv_trend_window() -> usize { CV_TREND_WINDOW }
fn default_cv_trend_delta() -> f64 { CV_TREND_DELTA }
fn default_cv_penalty_threshold() -> f64 { CV_PENALTY_THRESHOLD }
fn default_survival_bonus() -> f64 { SURVIVAL_BONUS_PERCENT }
fn default_survival_penalty() -> f64 { SURVIVAL_PENALTY_PERCENT }
fn default_projection_window() -> usize { PROJECTION_WINDOW }
fn default_projection_horizon_days() -> i64 { PROJECTION_HORIZON_DAYS }

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            cv_trend_window: default_cv_trend_window(),
            cv_trend_delta: default_cv_trend_delta(),
            cv_penalty_threshold: default_cv_penalty_threshold(),
            survival_bonus_percent: default_survival_bonus(),
            survival_penalty_percent: default_survival_penalty(),
            projection_window: default_projection_window(),
            projection_horizon_days: default_projection_horizon_days(),
        }
    }
}

// ============================================================================
// Cache Config
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    Memory,
    Sled,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Database directory for the sled backend.
    #[serde(default = "default_cache_path")]
    pub path: String,
}

fn default_cache_path() -> String {
    DEFAULT_CACHE_PATH.to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            path: default_cache_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.fcr.abnormal_high, ABNORMAL_FCR_HIGH);
        assert_eq!(config.statistics.t_distribution, TDistribution::Tabulated);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
[fcr]
abnormal_high = 4.0

[statistics]
t_distribution = "exact"
"#,
        )
        .unwrap();
        assert_eq!(config.fcr.abnormal_high, 4.0);
        assert_eq!(config.fcr.abnormal_low, ABNORMAL_FCR_LOW);
        assert_eq!(config.statistics.t_distribution, TDistribution::Exact);
    }

    #[test]
    fn test_inverted_abnormal_bounds_rejected() {
        let mut config = EngineConfig::default();
        config.fcr.abnormal_low = 6.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("abnormal_low"));
    }

    #[test]
    fn test_min_sample_size_cannot_drop_below_three() {
        let mut config = EngineConfig::default();
        config.statistics.min_sample_size = 2;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_nan_threshold_rejected() {
        let mut config = EngineConfig::default();
        config.actions.cv_high_percent = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_site_name_is_not_mistaken_for_infinity() {
        let mut config = EngineConfig::default();
        config.site.name = "Rainford Hatchery".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = EngineConfig::default();
        config
            .fcr
            .industry_benchmarks
            .insert("arctic_char".to_string(), 1.3);
        let text = config.to_toml().unwrap();
        let parsed = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.fcr.industry_benchmarks.get("arctic_char"), Some(&1.3));
    }
}
