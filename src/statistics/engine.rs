//! Statistics Engine - sample observations to a population estimate
//!
//! Pure: no I/O, no logging beyond debug traces. All inputs are validated
//! before anything is computed, so a rejected sample never yields a partial
//! summary.

use std::collections::HashSet;

use tracing::debug;

use super::descriptive::{coefficient_of_variation, mean, median, min_max, sample_std_dev};
use super::student_t::{self, CriticalValueSource, TabulatedStudentT};
use crate::config::defaults::MIN_SAMPLE_SIZE;
use crate::config::StatisticsConfig;
use crate::error::{EngineError, EngineResult};
use crate::types::{
    ConditionFactorSummary, ConfidenceInterval, DistributionSummary, IndividualObservation,
    SampleStatistics, StatisticalSummary,
};

pub struct StatisticsEngine {
    critical_values: Box<dyn CriticalValueSource>,
    min_sample_size: usize,
}

impl Default for StatisticsEngine {
    fn default() -> Self {
        Self {
            critical_values: Box::new(TabulatedStudentT),
            min_sample_size: MIN_SAMPLE_SIZE,
        }
    }
}

impl StatisticsEngine {
    pub fn new(config: &StatisticsConfig) -> Self {
        Self {
            critical_values: student_t::from_config(config.t_distribution),
            min_sample_size: config.min_sample_size.max(MIN_SAMPLE_SIZE),
        }
    }

    /// Use a specific critical-value source.
    pub fn with_critical_values(mut self, source: Box<dyn CriticalValueSource>) -> Self {
        self.critical_values = source;
        self
    }

    pub fn min_sample_size(&self) -> usize {
        self.min_sample_size
    }

    /// Summarise a sample of individual observations.
    ///
    /// Rejects (with `EngineError::Validation`) fewer than `min_sample_size`
    /// observations, non-positive or non-finite weights, non-positive lengths,
    /// and non-positive or duplicate sample numbers.
    pub fn calculate(&self, observations: &[IndividualObservation]) -> EngineResult<SampleStatistics> {
        self.validate(observations)?;

        let weights: Vec<f64> = observations.iter().map(|o| o.weight_grams).collect();
        let weight = self.summarize(&weights);

        let lengths: Vec<f64> = observations.iter().filter_map(|o| o.length_cm).collect();
        let length = (!lengths.is_empty()).then(|| self.summarize(&lengths));

        // Fulton's K = 100 * W / L^3
        let k_values: Vec<f64> = observations
            .iter()
            .filter_map(|o| match o.length_cm {
                Some(l) if l > 0.0 => Some(100.0 * o.weight_grams / l.powi(3)),
                _ => None,
            })
            .collect();
        let condition_factor = (!k_values.is_empty()).then(|| {
            let k_mean = mean(&k_values);
            ConditionFactorSummary {
                mean: k_mean,
                std_dev: sample_std_dev(&k_values, k_mean),
                count: k_values.len(),
            }
        });

        debug!(
            n = weights.len(),
            mean = weight.mean,
            cv = weight.cv,
            t = self.critical_values.name(),
            "Sample statistics computed"
        );

        Ok(SampleStatistics {
            average_weight: weight.mean,
            weight_cv: weight.cv,
            average_length: length.as_ref().map(|l| l.mean),
            condition_factor: condition_factor.map(|k| k.mean),
            summary: StatisticalSummary {
                weight,
                length,
                condition_factor,
            },
        })
    }

    fn validate(&self, observations: &[IndividualObservation]) -> EngineResult<()> {
        if observations.len() < self.min_sample_size {
            return Err(EngineError::validation(format!(
                "at least {} individual measurements required, got {}",
                self.min_sample_size,
                observations.len()
            )));
        }

        let mut seen = HashSet::with_capacity(observations.len());
        for obs in observations {
            if obs.sample_number == 0 {
                return Err(EngineError::validation(
                    "sample numbers must be positive integers",
                ));
            }
            if !seen.insert(obs.sample_number) {
                return Err(EngineError::validation(format!(
                    "duplicate sample number {}",
                    obs.sample_number
                )));
            }
            if !obs.weight_grams.is_finite() || obs.weight_grams <= 0.0 {
                return Err(EngineError::validation(format!(
                    "sample {}: weight must be a positive number, got {}",
                    obs.sample_number, obs.weight_grams
                )));
            }
            if let Some(length) = obs.length_cm {
                if !length.is_finite() || length <= 0.0 {
                    return Err(EngineError::validation(format!(
                        "sample {}: length must be a positive number, got {}",
                        obs.sample_number, length
                    )));
                }
            }
        }
        Ok(())
    }

    fn summarize(&self, values: &[f64]) -> DistributionSummary {
        let n = values.len();
        let m = mean(values);
        let sd = sample_std_dev(values, m);
        let (min, max) = min_max(values);

        let confidence_interval = if n < 2 {
            ConfidenceInterval { lower: m, upper: m }
        } else {
            let t = self.critical_values.critical_value(n - 1);
            let margin = t * sd / (n as f64).sqrt();
            ConfidenceInterval {
                lower: m - margin,
                upper: m + margin,
            }
        };

        DistributionSummary {
            count: n,
            min,
            max,
            mean: m,
            median: median(values),
            std_dev: sd,
            cv: coefficient_of_variation(sd, m),
            confidence_interval,
        }
    }
}
