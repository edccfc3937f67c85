//! Collaborator storage
//!
//! Traits for the batch registry, feeding ledger, measurement history and
//! analysis cache, with in-memory and sled-backed implementations.

mod cache;
mod memory;
mod persistence;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::{AnalysisCache, InMemoryCache, SledCache};
pub use memory::{InMemoryBatchRegistry, InMemoryFeedingLedger, InMemoryMeasurementStore};
pub use persistence::{BatchRegistry, FeedingLedger, MeasurementStore, StorageError};

use std::sync::Arc;

use tracing::info;

use crate::config::{CacheBackend, CacheConfig};

/// The three read collaborators every engine component needs.
#[derive(Clone)]
pub struct DataSources {
    pub batches: Arc<dyn BatchRegistry>,
    pub feed: Arc<dyn FeedingLedger>,
    pub measurements: Arc<dyn MeasurementStore>,
}

impl DataSources {
    pub fn new(
        batches: Arc<dyn BatchRegistry>,
        feed: Arc<dyn FeedingLedger>,
        measurements: Arc<dyn MeasurementStore>,
    ) -> Self {
        Self {
            batches,
            feed,
            measurements,
        }
    }
}

/// Concrete in-memory backends, kept typed so callers can seed them.
#[derive(Clone, Default)]
pub struct InMemoryBackends {
    pub batches: Arc<InMemoryBatchRegistry>,
    pub feed: Arc<InMemoryFeedingLedger>,
    pub measurements: Arc<InMemoryMeasurementStore>,
}

impl InMemoryBackends {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sources(&self) -> DataSources {
        DataSources::new(
            self.batches.clone(),
            self.feed.clone(),
            self.measurements.clone(),
        )
    }
}

/// Build the analysis cache selected by `[cache]`.
pub fn open_cache(config: &CacheConfig) -> Result<Option<Arc<dyn AnalysisCache>>, StorageError> {
    let cache: Option<Arc<dyn AnalysisCache>> = match config.backend {
        CacheBackend::Memory => Some(Arc::new(InMemoryCache::new())),
        CacheBackend::Sled => Some(Arc::new(SledCache::open(&config.path)?)),
        CacheBackend::None => None,
    };
    info!(
        backend = cache.as_ref().map_or("none", |c| c.backend_name()),
        "Analysis cache ready"
    );
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_cache_per_backend() {
        let memory = open_cache(&CacheConfig::default()).unwrap().unwrap();
        assert_eq!(memory.backend_name(), "InMemory");

        let none = CacheConfig {
            backend: CacheBackend::None,
            ..CacheConfig::default()
        };
        assert!(open_cache(&none).unwrap().is_none());

        let dir = tempfile::tempdir().unwrap();
        let sled = CacheConfig {
            backend: CacheBackend::Sled,
            path: dir.path().join("cache").display().to_string(),
        };
        assert_eq!(open_cache(&sled).unwrap().unwrap().backend_name(), "Sled");
    }
}
