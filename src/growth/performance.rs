//! Growth performance rating

use crate::types::PerformanceRating;

/// Rate growth from the variance (%) against the theoretical weight.
///
/// Only positive variance above +10% is excellent; a shortfall of the same
/// size falls through to `average`/`below_average`.
pub fn rate_performance(variance_percent: f64) -> PerformanceRating {
    let magnitude = variance_percent.abs();
    if variance_percent > 10.0 {
        PerformanceRating::Excellent
    } else if magnitude <= 5.0 {
        PerformanceRating::Good
    } else if magnitude <= 10.0 {
        PerformanceRating::Average
    } else if magnitude <= 20.0 {
        PerformanceRating::BelowAverage
    } else {
        PerformanceRating::Poor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands() {
        assert_eq!(rate_performance(2.94), PerformanceRating::Good);
        assert_eq!(rate_performance(-5.0), PerformanceRating::Good);
        assert_eq!(rate_performance(7.5), PerformanceRating::Average);
        assert_eq!(rate_performance(10.0), PerformanceRating::Average);
        assert_eq!(rate_performance(10.01), PerformanceRating::Excellent);
        assert_eq!(rate_performance(-15.0), PerformanceRating::BelowAverage);
        assert_eq!(rate_performance(-20.5), PerformanceRating::Poor);
    }

    #[test]
    fn test_shortfall_is_never_excellent() {
        assert_eq!(rate_performance(-12.0), PerformanceRating::BelowAverage);
        assert_eq!(rate_performance(12.0), PerformanceRating::Excellent);
        assert_eq!(rate_performance(50.0), PerformanceRating::Excellent);
    }
}
