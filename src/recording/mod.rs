//! Sample recording pipeline and measurement lifecycle

pub mod locks;
pub mod recorder;

pub use locks::BatchLocks;
pub use recorder::{MeasurementRecorder, RecordSampleRequest};
