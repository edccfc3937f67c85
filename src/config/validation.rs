//! Config validation: unknown-key detection with Levenshtein suggestions
//! and biological range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `EngineConfig`.
///
/// Maintained by hand against engine_config.rs. Entries under
/// `fcr.industry_benchmarks` are species codes and are accepted freely.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [site]
        "site",
        "site.name",
        "site.region",
        // [statistics]
        "statistics",
        "statistics.t_distribution",
        "statistics.min_sample_size",
        // [fcr]
        "fcr",
        "fcr.abnormal_low",
        "fcr.abnormal_high",
        "fcr.critical_fcr",
        "fcr.suspicious_fcr",
        "fcr.trend_slope_threshold",
        "fcr.urgent_slope",
        "fcr.trend_window",
        "fcr.forecast_floor",
        "fcr.large_variance_percent",
        "fcr.high_fcr_level",
        "fcr.low_fcr_level",
        "fcr.default_industry_benchmark",
        "fcr.industry_benchmarks",
        // [actions]
        "actions",
        "actions.growth_shortfall_high_percent",
        "actions.growth_shortfall_medium_percent",
        "actions.growth_surplus_percent",
        "actions.fcr_variance_high_percent",
        "actions.fcr_variance_medium_percent",
        "actions.cv_high_percent",
        "actions.cv_medium_percent",
        "actions.recommended_sample_size",
        // [analysis]
        "analysis",
        "analysis.cache_ttl_secs",
        "analysis.cv_trend_window",
        "analysis.cv_trend_delta",
        "analysis.cv_penalty_threshold",
        "analysis.survival_bonus_percent",
        "analysis.survival_penalty_percent",
        "analysis.projection_window",
        "analysis.projection_horizon_days",
        // [cache]
        "cache",
        "cache.backend",
        "cache.path",
    ];
    keys.iter().copied().collect()
}

/// Tables whose children are free-form (user-named) keys.
const OPEN_TABLES: &[&str] = &["fcr.industry_benchmarks"];

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() && !OPEN_TABLES.contains(&path.as_str()) {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (*k, levenshtein(unknown, k)))
        .filter(|(_, dist)| *dist <= 3)
        // tie-break on the key so the suggestion is deterministic
        .min_by(|(ka, da), (kb, db)| da.cmp(db).then_with(|| ka.cmp(kb)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Never fails: parse errors are reported later by serde.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Biological Range Validation
// ============================================================================

/// Validate value ranges on a parsed `EngineConfig`.
///
/// Returns (errors, warnings). Errors are impossible values that must
/// prevent startup; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::EngineConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let f = &config.fcr;

    // FCR is kg feed per kg gain: zero or negative bounds are meaningless
    for (name, value) in [
        ("fcr.abnormal_low", f.abnormal_low),
        ("fcr.suspicious_fcr", f.suspicious_fcr),
        ("fcr.forecast_floor", f.forecast_floor),
        ("fcr.low_fcr_level", f.low_fcr_level),
    ] {
        if value <= 0.0 {
            errors.push(format!("{name} = {value:.2} must be > 0"));
        }
    }

    if f.high_fcr_level <= f.low_fcr_level {
        errors.push(format!(
            "fcr.high_fcr_level ({:.2}) must be greater than low_fcr_level ({:.2})",
            f.high_fcr_level, f.low_fcr_level
        ));
    }

    // Commercial feeds rarely convert outside 0.6-3.0
    if f.default_industry_benchmark < 0.6 || f.default_industry_benchmark > 3.0 {
        warnings.push(ValidationWarning {
            field: "fcr.default_industry_benchmark".to_string(),
            message: format!(
                "default_industry_benchmark = {:.2} is outside typical range (0.6-3.0)",
                f.default_industry_benchmark
            ),
            suggestion: None,
        });
    }

    // Percentages
    let a = &config.actions;
    for (name, value) in [
        ("actions.cv_high_percent", a.cv_high_percent),
        ("actions.cv_medium_percent", a.cv_medium_percent),
        ("actions.growth_shortfall_high_percent", a.growth_shortfall_high_percent),
        ("actions.growth_shortfall_medium_percent", a.growth_shortfall_medium_percent),
    ] {
        if !(0.0..=100.0).contains(&value) {
            errors.push(format!("{name} = {value:.1} must be within 0-100"));
        }
    }

    let an = &config.analysis;
    for (name, value) in [
        ("analysis.survival_bonus_percent", an.survival_bonus_percent),
        ("analysis.survival_penalty_percent", an.survival_penalty_percent),
    ] {
        if !(0.0..=100.0).contains(&value) {
            errors.push(format!("{name} = {value:.1} must be within 0-100"));
        }
    }

    // Hour-scale TTLs are expected; anything past a week is probably a typo
    if an.cache_ttl_secs > 7 * 24 * 3600 {
        warnings.push(ValidationWarning {
            field: "analysis.cache_ttl_secs".to_string(),
            message: format!(
                "cache_ttl_secs = {} exceeds one week; analyses may go stale",
                an.cache_ttl_secs
            ),
            suggestion: None,
        });
    }

    if a.recommended_sample_size < config.statistics.min_sample_size {
        warnings.push(ValidationWarning {
            field: "actions.recommended_sample_size".to_string(),
            message: format!(
                "recommended_sample_size = {} is below statistics.min_sample_size ({})",
                a.recommended_sample_size, config.statistics.min_sample_size
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("abnormal_hgh", "abnormal_high"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [fcr]
            abnormal_high = 5.0
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"fcr".to_string()));
        assert!(keys.contains(&"fcr.abnormal_high".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let warnings = validate_unknown_keys(
            r#"
[fcr]
abnormal_hgih = 4.0
"#,
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "fcr.abnormal_hgih");
        assert_eq!(warnings[0].suggestion.as_deref(), Some("fcr.abnormal_high"));
    }

    #[test]
    fn test_benchmark_species_are_free_form() {
        let warnings = validate_unknown_keys(
            r#"
[fcr.industry_benchmarks]
arctic_char = 1.3
barramundi = 1.6
"#,
        );
        assert!(warnings.is_empty(), "got: {:?}", warnings);
    }

    #[test]
    fn test_unknown_section_produces_warning() {
        let warnings = validate_unknown_keys("[feeding]\nrate = 2\n");
        assert!(warnings.iter().any(|w| w.field == "feeding"));
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_defaults_clean() {
        let (errors, warnings) = validate_physical_ranges(&EngineConfig::default());
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(warnings.is_empty(), "{:?}", warnings);
    }

    #[test]
    fn test_negative_fcr_bound_is_error() {
        let mut config = EngineConfig::default();
        config.fcr.suspicious_fcr = -0.1;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("suspicious_fcr")));
    }

    #[test]
    fn test_cv_percent_above_hundred_is_error() {
        let mut config = EngineConfig::default();
        config.actions.cv_high_percent = 150.0;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("cv_high_percent")));
    }

    #[test]
    fn test_odd_benchmark_is_warning() {
        let mut config = EngineConfig::default();
        config.fcr.default_industry_benchmark = 4.5;
        let (errors, warnings) = validate_physical_ranges(&config);
        assert!(errors.is_empty());
        assert!(warnings
            .iter()
            .any(|w| w.field == "fcr.default_industry_benchmark"));
    }
}
