//! Growth comparison, performance rating and suggested actions

pub mod actions;
pub mod comparison;
pub mod performance;

pub use actions::suggest_actions;
pub use comparison::{
    average_daily_gain, days_between, expected_weight, specific_growth_rate,
    GrowthComparisonEngine,
};
pub use performance::rate_performance;
