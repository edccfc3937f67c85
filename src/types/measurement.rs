//! Measurement types: IndividualObservation, GrowthMeasurement and its embedded
//! derived structures (GrowthComparison, PerformanceRating, SuggestedActions)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FcrAnalysis, StatisticalSummary};

// ============================================================================
// Enumerations
// ============================================================================

/// Why a sampling event took place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementType {
    Routine,
    Transfer,
    Grading,
    Harvest,
    HealthCheck,
    SpotCheck,
}

/// How the animals were weighed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementMethod {
    ManualScale,
    AutomatedScale,
    ImageAnalysis,
    Sonar,
    Estimated,
}

/// Five-level performance scale shared by growth, FCR and batch-level ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceRating {
    Excellent,
    Good,
    Average,
    BelowAverage,
    Poor,
}

impl std::fmt::Display for PerformanceRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PerformanceRating::Excellent => write!(f, "excellent"),
            PerformanceRating::Good => write!(f, "good"),
            PerformanceRating::Average => write!(f, "average"),
            PerformanceRating::BelowAverage => write!(f, "below_average"),
            PerformanceRating::Poor => write!(f, "poor"),
        }
    }
}

/// Urgency of a suggested action or recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPriority {
    High,
    Medium,
    Low,
}

impl ActionPriority {
    /// Sort rank, most urgent first.
    pub fn rank(self) -> u8 {
        match self {
            ActionPriority::High => 0,
            ActionPriority::Medium => 1,
            ActionPriority::Low => 2,
        }
    }
}

impl std::fmt::Display for ActionPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionPriority::High => write!(f, "HIGH"),
            ActionPriority::Medium => write!(f, "MEDIUM"),
            ActionPriority::Low => write!(f, "LOW"),
        }
    }
}

/// Kind of corrective action suggested after a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    HealthCheck,
    AdjustFeeding,
    ReviewTargets,
    ReviewFeeding,
    Grading,
    IncreaseSampling,
    ContinueMonitoring,
}

// ============================================================================
// Observations
// ============================================================================

/// One sampled animal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualObservation {
    /// Positive, unique within a measurement
    pub sample_number: u32,
    pub weight_grams: f64,
    #[serde(default)]
    pub length_cm: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
}

impl IndividualObservation {
    pub fn new(sample_number: u32, weight_grams: f64) -> Self {
        Self {
            sample_number,
            weight_grams,
            length_cm: None,
            note: None,
        }
    }

    pub fn with_length(mut self, length_cm: f64) -> Self {
        self.length_cm = Some(length_cm);
        self
    }
}

// ============================================================================
// Embedded derived structures
// ============================================================================

/// Theoretical-vs-actual growth between two consecutive measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthComparison {
    pub theoretical_weight: f64,
    pub actual_weight: f64,
    pub variance: f64,
    pub variance_percent: f64,
    #[serde(default)]
    pub previous_measurement_id: Option<String>,
    pub days_since_previous: i64,
    /// ADG (g/day)
    pub daily_growth_rate: f64,
    /// SGR (%/day)
    pub specific_growth_rate: f64,
    /// Expected weight on the stocking growth curve at this date (g)
    #[serde(default)]
    pub target_weight: Option<f64>,
    /// `actual_weight - target_weight` (g)
    #[serde(default)]
    pub target_variance: Option<f64>,
}

/// A single suggested action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub priority: ActionPriority,
    pub description: String,
    pub reason: String,
}

/// Ordered action list with the overall (highest) priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedActions {
    pub priority: ActionPriority,
    pub actions: Vec<SuggestedAction>,
}

// ============================================================================
// Aggregate root
// ============================================================================

/// A sampling event and everything derived from it.
///
/// Derived fields are computed once at creation. Afterwards only the
/// verification fields and `is_processed` change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthMeasurement {
    pub id: String,
    pub tenant_id: String,
    pub batch_id: String,
    #[serde(default)]
    pub tank_id: Option<String>,
    pub measurement_date: DateTime<Utc>,
    pub measurement_type: MeasurementType,
    pub measurement_method: MeasurementMethod,
    pub sample_size: usize,
    pub population_size: u64,
    pub sample_percent: f64,
    pub individual_measurements: Vec<IndividualObservation>,
    pub statistics: StatisticalSummary,

    // === Quick-access values ===
    pub average_weight: f64,
    #[serde(default)]
    pub average_length: Option<f64>,
    pub weight_cv: f64,
    #[serde(default)]
    pub condition_factor: Option<f64>,

    // === Biomass ===
    pub estimated_biomass_kg: f64,
    #[serde(default)]
    pub previous_biomass_kg: Option<f64>,
    #[serde(default)]
    pub biomass_gain_kg: Option<f64>,

    // === Derived analyses ===
    #[serde(default)]
    pub growth_comparison: Option<GrowthComparison>,
    #[serde(default)]
    pub performance: Option<PerformanceRating>,
    #[serde(default)]
    pub fcr_analysis: Option<FcrAnalysis>,
    #[serde(default)]
    pub suggested_actions: Option<SuggestedActions>,

    // === Verification ===
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub verified_by: Option<String>,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
    /// Reviewer confidence in the sample, 1-5
    #[serde(default)]
    pub quality_rating: Option<u8>,
    #[serde(default)]
    pub notes: Vec<String>,

    pub measured_by: String,
    #[serde(default)]
    pub is_processed: bool,
    pub created_at: DateTime<Utc>,
}

impl GrowthMeasurement {
    /// Period FCR recorded at creation, if growth was positive.
    pub fn period_fcr(&self) -> Option<f64> {
        self.fcr_analysis.as_ref().map(|a| a.period_fcr)
    }
}
