//! Ranked batch-level recommendations

use crate::config::{ActionConfig, AnalysisConfig};
use crate::types::{
    ActionPriority, CvTrend, FcrTrend, FcrTrendAnalysis, Recommendation, RecommendationCategory,
};

/// Signals the recommendation rules look at.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationInputs<'a> {
    pub growth_variance_percent: f64,
    pub fcr_variance_percent: f64,
    pub fcr_trend: &'a FcrTrendAnalysis,
    pub weight_cv: Option<f64>,
    pub cv_trend: CvTrend,
    pub survival_rate_percent: f64,
}

fn rec(priority: ActionPriority, category: RecommendationCategory, message: String) -> Recommendation {
    Recommendation {
        priority,
        category,
        message,
    }
}

/// Build recommendations, most urgent first (stable within a priority).
pub fn build_recommendations(
    inputs: &RecommendationInputs<'_>,
    actions: &ActionConfig,
    analysis: &AnalysisConfig,
) -> Vec<Recommendation> {
    use ActionPriority::*;
    use RecommendationCategory as Cat;

    let mut out = Vec::new();

    let g = inputs.growth_variance_percent;
    if g < -actions.growth_shortfall_high_percent {
        out.push(rec(
            High,
            Cat::Growth,
            format!("Growth {:.1}% behind the stocking curve: check fish health, water quality and feeding", g.abs()),
        ));
    } else if g < -actions.growth_shortfall_medium_percent {
        out.push(rec(
            Medium,
            Cat::Growth,
            format!("Growth {:.1}% behind the stocking curve: review ration size and feeding frequency", g.abs()),
        ));
    } else if g > actions.growth_surplus_percent {
        out.push(rec(
            Low,
            Cat::Growth,
            format!("Growth {g:.1}% ahead of the stocking curve: consider revising species targets"),
        ));
    }

    let f = inputs.fcr_variance_percent;
    if f > actions.fcr_variance_high_percent {
        out.push(rec(
            High,
            Cat::FeedConversion,
            format!("Cumulative FCR {f:.1}% above target: audit feed delivery, wastage and feed quality"),
        ));
    } else if f > actions.fcr_variance_medium_percent {
        out.push(rec(
            Medium,
            Cat::FeedConversion,
            format!("Cumulative FCR {f:.1}% above target: check feeding times and appetite"),
        ));
    }

    match inputs.fcr_trend.trend {
        FcrTrend::Declining => out.push(rec(
            Medium,
            Cat::FcrTrend,
            format!(
                "FCR worsening by {:.3} per measurement (7-step forecast {:.2})",
                inputs.fcr_trend.slope, inputs.fcr_trend.forecast_7_days
            ),
        )),
        FcrTrend::Improving => out.push(rec(
            Low,
            Cat::FcrTrend,
            "FCR improving: keep the current feeding strategy".to_string(),
        )),
        FcrTrend::Stable => {}
    }

    if let Some(cv) = inputs.weight_cv {
        if cv > actions.cv_high_percent {
            out.push(rec(
                High,
                Cat::Uniformity,
                format!("Weight CV {cv:.1}%: grade the population to reduce size variation"),
            ));
        } else if cv > actions.cv_medium_percent {
            out.push(rec(
                Medium,
                Cat::Uniformity,
                format!("Weight CV {cv:.1}%: plan a grading at the next opportunity"),
            ));
        }
    }
    if inputs.cv_trend == CvTrend::Worsening {
        out.push(rec(
            Medium,
            Cat::Uniformity,
            "Size variation increasing over recent samples: check feed distribution".to_string(),
        ));
    }

    if inputs.survival_rate_percent < analysis.survival_penalty_percent {
        out.push(rec(
            High,
            Cat::Survival,
            format!(
                "Survival {:.1}% below {:.0}%: investigate mortality causes",
                inputs.survival_rate_percent, analysis.survival_penalty_percent
            ),
        ));
    }

    if out.is_empty() {
        out.push(rec(
            Low,
            Cat::General,
            "Batch performing within expected ranges: continue routine monitoring".to_string(),
        ));
    }

    out.sort_by_key(|r| r.priority.rank());
    out
}
