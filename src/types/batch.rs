//! Batch types: BatchSnapshot, SpeciesTargets, FeedEntry, FeedWindow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Species-level production targets attached to a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesTargets {
    /// Species key used for the industry FCR benchmark table (e.g. "atlantic_salmon")
    pub species_code: String,
    /// Expected average daily growth (g/day)
    pub daily_growth_g: f64,
    /// Target feed conversion ratio
    pub target_fcr: f64,
    /// Average individual weight at harvest (g)
    pub avg_harvest_weight_g: f64,
}

/// Read-only view of a production batch as served by the batch registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSnapshot {
    pub batch_id: String,
    pub tenant_id: String,
    /// Number of animals stocked
    pub initial_count: u64,
    /// Average individual weight at stocking (g)
    pub initial_avg_weight_g: f64,
    /// Running average weight, updated by the "apply measurement" write-back (g)
    pub current_avg_weight_g: f64,
    /// Current head count
    pub current_count: u64,
    /// Survival rate in percent. When absent it is derived from head counts.
    #[serde(default)]
    pub survival_rate: Option<f64>,
    pub species: SpeciesTargets,
    pub stocked_at: DateTime<Utc>,
    #[serde(default)]
    pub expected_harvest_date: Option<DateTime<Utc>>,
    /// Current biomass as last written back (kg)
    #[serde(default)]
    pub current_biomass_kg: Option<f64>,
    #[serde(default)]
    pub last_measured_at: Option<DateTime<Utc>>,
}

impl BatchSnapshot {
    /// Biomass at stocking (kg).
    pub fn stocking_biomass_kg(&self) -> f64 {
        self.initial_count as f64 * self.initial_avg_weight_g / 1000.0
    }

    /// Survival rate in percent, falling back to `current_count / initial_count`.
    pub fn survival_rate_percent(&self) -> f64 {
        match self.survival_rate {
            Some(rate) => rate,
            None if self.initial_count > 0 => {
                self.current_count as f64 / self.initial_count as f64 * 100.0
            }
            None => 0.0,
        }
    }
}

/// A single feeding event in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub batch_id: String,
    pub tenant_id: String,
    pub fed_at: DateTime<Utc>,
    pub amount_kg: f64,
}

/// Date range for ledger aggregation. Open bounds are unbounded.
///
/// The end is always inclusive; the start is inclusive unless
/// `exclusive_start` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub exclusive_start: bool,
}

impl FeedWindow {
    /// `[start, end]`
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            exclusive_start: false,
        }
    }

    /// `(start, end]`: consecutive sampling periods share no feeding.
    pub fn after(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            exclusive_start: true,
            ..Self::between(start, end)
        }
    }

    pub fn until(end: Option<DateTime<Utc>>) -> Self {
        Self {
            start: None,
            end,
            exclusive_start: false,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let after_start = self
            .start
            .map_or(true, |s| if self.exclusive_start { at > s } else { at >= s });
        after_start && self.end.map_or(true, |e| at <= e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot() -> BatchSnapshot {
        BatchSnapshot {
            batch_id: "B1".to_string(),
            tenant_id: "T1".to_string(),
            initial_count: 10_000,
            initial_avg_weight_g: 50.0,
            current_avg_weight_g: 50.0,
            current_count: 9_000,
            survival_rate: None,
            species: SpeciesTargets {
                species_code: "tilapia".to_string(),
                daily_growth_g: 2.0,
                target_fcr: 1.5,
                avg_harvest_weight_g: 600.0,
            },
            stocked_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            expected_harvest_date: None,
            current_biomass_kg: None,
            last_measured_at: None,
        }
    }

    #[test]
    fn stocking_biomass_in_kg() {
        assert!((snapshot().stocking_biomass_kg() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn survival_falls_back_to_head_count() {
        let mut batch = snapshot();
        assert!((batch.survival_rate_percent() - 90.0).abs() < 1e-9);
        batch.survival_rate = Some(97.5);
        assert!((batch.survival_rate_percent() - 97.5).abs() < 1e-9);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let window = FeedWindow::between(start, end);
        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(end + chrono::Duration::seconds(1)));
        assert!(FeedWindow::until(None).contains(start));
    }

    #[test]
    fn sampling_period_excludes_its_start() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let window = FeedWindow::after(start, end);
        assert!(!window.contains(start));
        assert!(window.contains(start + chrono::Duration::seconds(1)));
        assert!(window.contains(end));
    }
}
