//! Feed Conversion Ratio
//!
//! ## Architecture
//! - `calculator`: `FcrCalculator`, period/cumulative/per-sample FCR over the
//!   feeding ledger and measurement history
//! - `trend`: OLS trend over recent period FCR values with a 7-step forecast
//! - `benchmarks`: industry benchmark table, target comparison, anomalies

pub mod benchmarks;
pub mod calculator;
pub mod trend;

pub use benchmarks::{compare_fcr, detect_fcr_anomalies, industry_benchmark, rate_fcr};
pub use calculator::{cumulative_from, fcr_variance, FcrCalculator};
pub use trend::{classify_slope, trend_from_series};
