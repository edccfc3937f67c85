//! Sample Statistics
//!
//! Turns individual fish observations into a population estimate.
//!
//! ## Architecture
//! - `descriptive`: mean, median, sample standard deviation, CV
//! - `student_t`: 95% critical values (tabulated or exact via statrs)
//! - `regression`: OLS line fit shared by the FCR trend and harvest projection
//! - `engine`: `StatisticsEngine`, the validated entry point

pub mod descriptive;
pub mod engine;
pub mod regression;
pub mod student_t;

pub use engine::StatisticsEngine;
pub use regression::LinearFit;
pub use student_t::{CriticalValueSource, ExactStudentT, TabulatedStudentT};
