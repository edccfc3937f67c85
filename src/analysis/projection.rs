//! Harvest projection from the recent growth curve

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::defaults::MIN_TREND_POINTS;
use crate::config::AnalysisConfig;
use crate::growth::days_between;
use crate::statistics::LinearFit;
use crate::types::{BatchSnapshot, GrowthMeasurement, GrowthRateSource, HarvestProjection};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Where the batch stands when the projection is made.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionBasis {
    pub current_weight_g: f64,
    pub current_biomass_kg: f64,
    /// When `current_weight_g` was measured
    pub weighed_at: DateTime<Utc>,
    /// Cumulative FCR, 0 while undefined
    pub cumulative_fcr: f64,
}

/// Pick the growth rate (g/day) for the projection.
///
/// Preference: OLS slope of weight against days since stocking over the
/// latest `window` measurements (at least three, positive slope), then the
/// latest measured ADG, then the species target.
pub fn growth_rate(
    batch: &BatchSnapshot,
    history: &[GrowthMeasurement],
    window: usize,
) -> Option<(f64, GrowthRateSource)> {
    let skip = history.len().saturating_sub(window);
    let recent = &history[skip..];

    if recent.len() >= MIN_TREND_POINTS {
        let points: Vec<(f64, f64)> = recent
            .iter()
            .map(|m| {
                let days = (m.measurement_date - batch.stocked_at).num_seconds() as f64 / SECONDS_PER_DAY;
                (days, m.average_weight)
            })
            .collect();
        if let Some(fit) = LinearFit::fit(&points) {
            if fit.slope > 0.0 {
                return Some((fit.slope, GrowthRateSource::Regression));
            }
        }
    }

    if let Some(adg) = recent
        .last()
        .and_then(|m| m.growth_comparison.as_ref())
        .map(|c| c.daily_growth_rate)
        .filter(|adg| *adg > 0.0)
    {
        return Some((adg, GrowthRateSource::LatestMeasurement));
    }

    (batch.species.daily_growth_g > 0.0)
        .then_some((batch.species.daily_growth_g, GrowthRateSource::SpeciesTarget))
}

/// Project the harvest date, biomass and remaining feed.
///
/// `None` when no positive growth rate is available, or when the harvest
/// date lies beyond `projection_horizon_days` of the latest weighing.
pub fn project_harvest(
    batch: &BatchSnapshot,
    history: &[GrowthMeasurement],
    basis: &ProjectionBasis,
    config: &AnalysisConfig,
) -> Option<HarvestProjection> {
    let target_weight_g = batch.species.avg_harvest_weight_g;
    let (rate, source) = growth_rate(batch, history, config.projection_window)?;

    let ready_for_harvest = basis.current_weight_g >= target_weight_g;
    let days_to_harvest = if ready_for_harvest {
        0
    } else {
        let days = ((target_weight_g - basis.current_weight_g) / rate).ceil();
        if !days.is_finite() || days > config.projection_horizon_days as f64 {
            debug!(
                batch_id = %batch.batch_id,
                rate,
                horizon_days = config.projection_horizon_days,
                "Harvest beyond projection horizon"
            );
            return None;
        }
        days as i64
    };
    let projected_harvest_date = Duration::try_days(days_to_harvest)
        .and_then(|d| basis.weighed_at.checked_add_signed(d))?;

    let projected_biomass_kg = if batch.current_count > 0 {
        target_weight_g.max(basis.current_weight_g) * batch.current_count as f64 / 1000.0
    } else if basis.current_weight_g > 0.0 {
        basis.current_biomass_kg * target_weight_g.max(basis.current_weight_g) / basis.current_weight_g
    } else {
        basis.current_biomass_kg
    };

    let fcr = if basis.cumulative_fcr > 0.0 {
        basis.cumulative_fcr
    } else {
        batch.species.target_fcr
    };
    let feed_required_kg = (projected_biomass_kg - basis.current_biomass_kg).max(0.0) * fcr;

    Some(HarvestProjection {
        target_weight_g,
        growth_rate_g_per_day: rate,
        growth_rate_source: source,
        days_to_harvest,
        projected_harvest_date,
        projected_biomass_kg,
        feed_required_kg,
        days_behind_plan: batch
            .expected_harvest_date
            .map(|planned| days_between(planned, projected_harvest_date)),
        ready_for_harvest,
    })
}
