//! Industry FCR benchmarks and anomaly detection

use crate::config::FcrConfig;
use crate::types::{FcrAnomaly, FcrAnomalySeverity, FcrComparison, PerformanceRating};

/// Typical commercial FCR per species code.
const INDUSTRY_FCR: &[(&str, f64)] = &[
    ("atlantic_salmon", 1.2),
    ("rainbow_trout", 1.1),
    ("arctic_char", 1.3),
    ("atlantic_cod", 1.2),
    ("sea_bass", 1.8),
    ("sea_bream", 1.9),
    ("tilapia", 1.6),
    ("catfish", 1.7),
    ("common_carp", 1.8),
    ("barramundi", 1.4),
    ("whiteleg_shrimp", 1.5),
];

/// Benchmark for a species: config override, then the built-in table, then
/// `default_industry_benchmark`.
pub fn industry_benchmark(species_code: &str, config: &FcrConfig) -> f64 {
    if let Some(v) = config.industry_benchmarks.get(species_code) {
        return *v;
    }
    INDUSTRY_FCR
        .iter()
        .find(|(code, _)| *code == species_code)
        .map(|(_, v)| *v)
        .unwrap_or(config.default_industry_benchmark)
}

fn percent_diff(value: f64, reference: f64) -> f64 {
    if reference > 0.0 {
        (value - reference) / reference * 100.0
    } else {
        0.0
    }
}

/// Lower FCR is better: bands on the variance from target.
pub fn rate_fcr(variance_from_target: f64) -> PerformanceRating {
    if variance_from_target <= -10.0 {
        PerformanceRating::Excellent
    } else if variance_from_target <= 0.0 {
        PerformanceRating::Good
    } else if variance_from_target <= 10.0 {
        PerformanceRating::Average
    } else if variance_from_target <= 20.0 {
        PerformanceRating::BelowAverage
    } else {
        PerformanceRating::Poor
    }
}

pub fn compare_fcr(
    current_fcr: f64,
    target_fcr: f64,
    species_code: &str,
    config: &FcrConfig,
) -> FcrComparison {
    let industry_benchmark = industry_benchmark(species_code, config);
    let variance_from_target = percent_diff(current_fcr, target_fcr);
    FcrComparison {
        current_fcr,
        target_fcr,
        industry_benchmark,
        variance_from_target,
        variance_from_industry: percent_diff(current_fcr, industry_benchmark),
        performance: rate_fcr(variance_from_target),
    }
}

/// Flag FCR values that point at a data problem or a production problem.
pub fn detect_fcr_anomalies(fcr: f64, config: &FcrConfig) -> Vec<FcrAnomaly> {
    let mut anomalies = Vec::new();
    if !fcr.is_finite() || fcr < 0.0 {
        anomalies.push(FcrAnomaly {
            severity: FcrAnomalySeverity::Critical,
            fcr,
            message: format!("FCR {fcr} is not a valid ratio: check feeding and biomass records"),
        });
    } else if fcr > config.critical_fcr {
        anomalies.push(FcrAnomaly {
            severity: FcrAnomalySeverity::Critical,
            fcr,
            message: format!(
                "FCR {fcr:.2} above {:.1}: possible feed waste, disease or unrecorded mortality",
                config.critical_fcr
            ),
        });
    } else if fcr < config.suspicious_fcr {
        anomalies.push(FcrAnomaly {
            severity: FcrAnomalySeverity::Suspicious,
            fcr,
            message: format!(
                "FCR {fcr:.2} below {:.1}: likely a biomass or feed recording error",
                config.suspicious_fcr
            ),
        });
    }
    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmark_lookup_order() {
        let mut config = FcrConfig::default();
        assert_eq!(industry_benchmark("rainbow_trout", &config), 1.1);
        assert_eq!(industry_benchmark("unknown_fish", &config), 1.5);

        config
            .industry_benchmarks
            .insert("rainbow_trout".to_string(), 0.95);
        assert_eq!(industry_benchmark("rainbow_trout", &config), 0.95);
    }

    #[test]
    fn test_compare_fcr() {
        let c = compare_fcr(1.26, 1.2, "atlantic_salmon", &FcrConfig::default());
        assert!((c.variance_from_target - 5.0).abs() < 1e-9);
        assert!((c.variance_from_industry - 5.0).abs() < 1e-9);
        assert_eq!(c.industry_benchmark, 1.2);
        assert_eq!(c.performance, PerformanceRating::Average);
    }

    #[test]
    fn test_fcr_rating_bands() {
        assert_eq!(rate_fcr(-15.0), PerformanceRating::Excellent);
        assert_eq!(rate_fcr(-10.0), PerformanceRating::Excellent);
        assert_eq!(rate_fcr(-3.0), PerformanceRating::Good);
        assert_eq!(rate_fcr(0.0), PerformanceRating::Good);
        assert_eq!(rate_fcr(15.0), PerformanceRating::BelowAverage);
        assert_eq!(rate_fcr(25.0), PerformanceRating::Poor);
    }

    #[test]
    fn test_anomalies() {
        let config = FcrConfig::default();
        assert!(detect_fcr_anomalies(1.3, &config).is_empty());
        assert!(detect_fcr_anomalies(3.0, &config).is_empty());

        let high = detect_fcr_anomalies(3.5, &config);
        assert_eq!(high[0].severity, FcrAnomalySeverity::Critical);

        let low = detect_fcr_anomalies(0.6, &config);
        assert_eq!(low[0].severity, FcrAnomalySeverity::Suspicious);

        let nan = detect_fcr_anomalies(f64::NAN, &config);
        assert_eq!(nan[0].severity, FcrAnomalySeverity::Critical);
        let negative = detect_fcr_anomalies(-1.0, &config);
        assert_eq!(negative[0].severity, FcrAnomalySeverity::Critical);
    }
}
