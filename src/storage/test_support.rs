//! Fixtures shared by unit tests across modules.

use chrono::{DateTime, TimeZone, Utc};

use crate::types::{
    BatchSnapshot, ConfidenceInterval, DistributionSummary, FcrAnalysis, FcrTrend,
    GrowthMeasurement, MeasurementMethod, MeasurementType, SpeciesTargets, StatisticalSummary,
};

/// Population used by `measurement_at`: biomass (kg) is `avg_weight * 10`.
pub const POPULATION: u64 = 10_000;

pub fn stocking_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
}

pub fn batch(batch_id: &str, tenant_id: &str) -> BatchSnapshot {
    BatchSnapshot {
        batch_id: batch_id.to_string(),
        tenant_id: tenant_id.to_string(),
        initial_count: POPULATION,
        initial_avg_weight_g: 20.0,
        current_avg_weight_g: 20.0,
        current_count: POPULATION,
        survival_rate: None,
        species: SpeciesTargets {
            species_code: "rainbow_trout".to_string(),
            daily_growth_g: 1.0,
            target_fcr: 1.2,
            avg_harvest_weight_g: 500.0,
        },
        stocked_at: stocking_date(),
        expected_harvest_date: None,
        current_biomass_kg: None,
        last_measured_at: None,
    }
}

fn flat_summary(avg_weight: f64, cv: f64) -> StatisticalSummary {
    StatisticalSummary {
        weight: DistributionSummary {
            count: 5,
            min: avg_weight,
            max: avg_weight,
            mean: avg_weight,
            median: avg_weight,
            std_dev: avg_weight * cv / 100.0,
            cv,
            confidence_interval: ConfidenceInterval {
                lower: avg_weight,
                upper: avg_weight,
            },
        },
        length: None,
        condition_factor: None,
    }
}

/// A stored measurement for batch `B1` / tenant `T1`.
pub fn measurement_at(id: &str, date: DateTime<Utc>, avg_weight: f64) -> GrowthMeasurement {
    measurement_with_cv(id, date, avg_weight, 10.0)
}

pub fn measurement_with_cv(id: &str, date: DateTime<Utc>, avg_weight: f64, cv: f64) -> GrowthMeasurement {
    GrowthMeasurement {
        id: id.to_string(),
        tenant_id: "T1".to_string(),
        batch_id: "B1".to_string(),
        tank_id: None,
        measurement_date: date,
        measurement_type: MeasurementType::Routine,
        measurement_method: MeasurementMethod::ManualScale,
        sample_size: 5,
        population_size: POPULATION,
        sample_percent: 5.0 / POPULATION as f64 * 100.0,
        individual_measurements: Vec::new(),
        statistics: flat_summary(avg_weight, cv),
        average_weight: avg_weight,
        average_length: None,
        weight_cv: cv,
        condition_factor: None,
        estimated_biomass_kg: avg_weight * POPULATION as f64 / 1000.0,
        previous_biomass_kg: None,
        biomass_gain_kg: None,
        growth_comparison: None,
        performance: None,
        fcr_analysis: None,
        suggested_actions: None,
        is_verified: false,
        verified_by: None,
        verified_at: None,
        quality_rating: None,
        notes: Vec::new(),
        measured_by: "tester".to_string(),
        is_processed: false,
        created_at: date,
    }
}

/// Attach a period FCR to a fixture measurement.
pub fn with_period_fcr(mut m: GrowthMeasurement, period_fcr: f64) -> GrowthMeasurement {
    m.fcr_analysis = Some(FcrAnalysis {
        period_fcr,
        fcr_trend: FcrTrend::Stable,
        ..FcrAnalysis::empty(1.2)
    });
    m
}
