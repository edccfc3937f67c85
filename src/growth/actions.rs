//! Suggested actions for a freshly recorded sample

use crate::config::ActionConfig;
use crate::types::{
    ActionPriority, ActionType, FcrAnalysis, FcrTrend, GrowthComparison, SuggestedAction,
    SuggestedActions,
};

fn action(
    action_type: ActionType,
    priority: ActionPriority,
    description: impl Into<String>,
    reason: impl Into<String>,
) -> SuggestedAction {
    SuggestedAction {
        action_type,
        priority,
        description: description.into(),
        reason: reason.into(),
    }
}

/// Build the ranked action list from growth variance, FCR and size dispersion.
///
/// Actions come out high → medium → low (stable within a level) and the
/// overall priority is the most urgent one present. With nothing to flag the
/// list holds a single `continue_monitoring` entry.
pub fn suggest_actions(
    comparison: Option<&GrowthComparison>,
    fcr: Option<&FcrAnalysis>,
    weight_cv: f64,
    sample_size: usize,
    config: &ActionConfig,
) -> SuggestedActions {
    let mut actions = Vec::new();

    if let Some(c) = comparison {
        let v = c.variance_percent;
        if v < -config.growth_shortfall_high_percent {
            actions.push(action(
                ActionType::HealthCheck,
                ActionPriority::High,
                "Perform a health check: growth is far below target",
                format!("Growth {:.1}% below theoretical weight", v.abs()),
            ));
        } else if v < -config.growth_shortfall_medium_percent {
            actions.push(action(
                ActionType::AdjustFeeding,
                ActionPriority::Medium,
                "Review feeding rate and ration size",
                format!("Growth {:.1}% below theoretical weight", v.abs()),
            ));
        } else if v > config.growth_surplus_percent {
            actions.push(action(
                ActionType::ReviewTargets,
                ActionPriority::Low,
                "Growth ahead of target: consider revising species targets",
                format!("Growth {v:.1}% above theoretical weight"),
            ));
        }
    }

    if let Some(f) = fcr {
        if f.fcr_variance > config.fcr_variance_high_percent {
            actions.push(action(
                ActionType::ReviewFeeding,
                ActionPriority::High,
                "Review feeding strategy: FCR well above target",
                format!("Cumulative FCR {:.1}% above target", f.fcr_variance),
            ));
        } else if f.fcr_variance > config.fcr_variance_medium_percent {
            actions.push(action(
                ActionType::ReviewFeeding,
                ActionPriority::Medium,
                "Check feed wastage and feeding times",
                format!("Cumulative FCR {:.1}% above target", f.fcr_variance),
            ));
        }
        if f.fcr_trend == FcrTrend::Declining {
            actions.push(action(
                ActionType::ReviewFeeding,
                ActionPriority::Medium,
                "Investigate declining feed efficiency",
                "FCR trending upwards over recent measurements",
            ));
        }
    }

    if weight_cv > config.cv_high_percent {
        actions.push(action(
            ActionType::Grading,
            ActionPriority::High,
            "Grade the population to reduce size variation",
            format!("Weight CV {weight_cv:.1}% exceeds {:.0}%", config.cv_high_percent),
        ));
    } else if weight_cv > config.cv_medium_percent {
        actions.push(action(
            ActionType::Grading,
            ActionPriority::Medium,
            "Consider grading at the next opportunity",
            format!("Weight CV {weight_cv:.1}% exceeds {:.0}%", config.cv_medium_percent),
        ));
    }

    if sample_size < config.recommended_sample_size {
        actions.push(action(
            ActionType::IncreaseSampling,
            ActionPriority::Low,
            format!(
                "Increase sample size to at least {} fish",
                config.recommended_sample_size
            ),
            format!("Only {sample_size} fish sampled"),
        ));
    }

    if actions.is_empty() {
        actions.push(action(
            ActionType::ContinueMonitoring,
            ActionPriority::Low,
            "Continue routine monitoring",
            "All indicators within expected ranges",
        ));
    }

    // stable sort keeps rule order within a priority level
    actions.sort_by_key(|a| a.priority.rank());
    let priority = actions
        .first()
        .map(|a| a.priority)
        .unwrap_or(ActionPriority::Low);

    SuggestedActions { priority, actions }
}
