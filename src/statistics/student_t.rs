//! Two-sided 95% Student-t critical values
//!
//! Two interchangeable sources behind `CriticalValueSource`:
//! - `TabulatedStudentT`: fixed table with linear interpolation (default,
//!   reproduces historical confidence intervals exactly)
//! - `ExactStudentT`: inverse CDF from statrs

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::config::defaults::NORMAL_APPROX_Z_975;
use crate::config::TDistribution;

/// Supplies `t(df, 0.975)` for confidence intervals.
pub trait CriticalValueSource: Send + Sync {
    fn critical_value(&self, df: usize) -> f64;

    /// Strategy name for logging
    fn name(&self) -> &'static str;
}

/// Build the source selected by `statistics.t_distribution`.
pub fn from_config(kind: TDistribution) -> Box<dyn CriticalValueSource> {
    match kind {
        TDistribution::Tabulated => Box::new(TabulatedStudentT),
        TDistribution::Exact => Box::new(ExactStudentT),
    }
}

// ============================================================================
// Tabulated
// ============================================================================

/// t(0.975) for df 1..=30.
const T_975_SMALL_DF: [f64; 30] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, // 1-10
    2.201, 2.179, 2.160, 2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, // 11-20
    2.080, 2.074, 2.069, 2.064, 2.060, 2.056, 2.052, 2.048, 2.045, 2.042, // 21-30
];

/// Sparse entries above df 30, interpolated linearly in between.
const T_975_LARGE_DF: [(usize, f64); 6] = [
    (30, 2.042),
    (40, 2.021),
    (50, 2.009),
    (60, 2.000),
    (80, 1.990),
    (100, 1.984),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct TabulatedStudentT;

impl CriticalValueSource for TabulatedStudentT {
    fn critical_value(&self, df: usize) -> f64 {
        if df == 0 || df > 100 {
            return NORMAL_APPROX_Z_975;
        }
        if df <= 30 {
            return T_975_SMALL_DF[df - 1];
        }
        for pair in T_975_LARGE_DF.windows(2) {
            let (lo_df, lo_t) = pair[0];
            let (hi_df, hi_t) = pair[1];
            if df <= hi_df {
                let frac = (df - lo_df) as f64 / (hi_df - lo_df) as f64;
                return lo_t + frac * (hi_t - lo_t);
            }
        }
        NORMAL_APPROX_Z_975
    }

    fn name(&self) -> &'static str {
        "tabulated"
    }
}

// ============================================================================
// Exact (statrs)
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct ExactStudentT;

impl CriticalValueSource for ExactStudentT {
    fn critical_value(&self, df: usize) -> f64 {
        if df == 0 {
            return NORMAL_APPROX_Z_975;
        }
        match StudentsT::new(0.0, 1.0, df as f64) {
            Ok(dist) => dist.inverse_cdf(0.975),
            Err(_) => NORMAL_APPROX_Z_975,
        }
    }

    fn name(&self) -> &'static str {
        "exact"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tabulated_exact_entries() {
        let t = TabulatedStudentT;
        assert_eq!(t.critical_value(1), 12.706);
        assert_eq!(t.critical_value(4), 2.776);
        assert_eq!(t.critical_value(30), 2.042);
        assert_eq!(t.critical_value(60), 2.000);
        assert_eq!(t.critical_value(100), 1.984);
    }

    #[test]
    fn test_tabulated_interpolates_between_entries() {
        let t = TabulatedStudentT;
        // halfway between 40 (2.021) and 50 (2.009)
        assert!((t.critical_value(45) - 2.015).abs() < 1e-9);
        // quarter of the way from 60 (2.000) to 80 (1.990)
        assert!((t.critical_value(65) - 1.9975).abs() < 1e-9);
    }

    #[test]
    fn test_tabulated_falls_back_to_normal() {
        let t = TabulatedStudentT;
        assert_eq!(t.critical_value(0), 1.96);
        assert_eq!(t.critical_value(101), 1.96);
        assert_eq!(t.critical_value(10_000), 1.96);
    }

    #[test]
    fn test_exact_agrees_with_table() {
        let exact = ExactStudentT;
        let table = TabulatedStudentT;
        for df in [1, 2, 4, 10, 20, 30, 60, 100] {
            let diff = (exact.critical_value(df) - table.critical_value(df)).abs();
            assert!(diff < 2e-3, "df={df} diff={diff}");
        }
    }

    #[test]
    fn test_from_config_selects_strategy() {
        assert_eq!(from_config(TDistribution::Tabulated).name(), "tabulated");
        assert_eq!(from_config(TDistribution::Exact).name(), "exact");
    }
}
