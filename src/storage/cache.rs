//! Analysis cache backends
//!
//! The orchestrator consults the cache before recomputing a batch analysis
//! and writes the fresh result afterwards. Callers treat every cache error as
//! a miss (reads) or ignore it (writes), so a broken cache only costs latency.
//!
//! - `InMemoryCache`: process-local map with per-entry expiry
//! - `SledCache`: persistent cache in a sled tree, survives restarts

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use super::persistence::StorageError;

/// Key/value store with TTL.
pub trait AnalysisCache: Send + Sync {
    /// Fetch a live entry. Expired entries read as `None`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store an entry that expires after `ttl`.
    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StorageError>;

    /// Drop an entry if present.
    fn invalidate(&self, key: &str) -> Result<(), StorageError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, (Instant, Vec<u8>)>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnalysisCache for InMemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(entries
            .get(key)
            .filter(|(expires_at, _)| Instant::now() < *expires_at)
            .map(|(_, value)| value.clone()))
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let now = Instant::now();
        entries.retain(|_, (expires_at, _)| now < *expires_at);
        entries.insert(key.to_string(), (now + ttl, value.to_vec()));
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

// ============================================================================
// Sled
// ============================================================================

/// Length of the big-endian expiry prefix on every stored value.
const EXPIRY_PREFIX_LEN: usize = 8;

/// Persistent cache. Values are stored as `expires_at (u64 BE unix secs) ++ payload`.
#[derive(Clone)]
pub struct SledCache {
    tree: Arc<sled::Tree>,
}

impl SledCache {
    /// Open or create the cache database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;
        let tree = db.open_tree("analysis_cache")?;
        tracing::info!(path = %path_ref.display(), "Analysis cache opened");
        Ok(Self { tree: Arc::new(tree) })
    }

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

impl AnalysisCache for SledCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let Some(raw) = self.tree.get(key.as_bytes())? else {
            return Ok(None);
        };
        if raw.len() < EXPIRY_PREFIX_LEN {
            self.tree.remove(key.as_bytes())?;
            return Err(StorageError::Serialization(format!(
                "cache entry '{key}' is truncated"
            )));
        }
        let mut prefix = [0u8; EXPIRY_PREFIX_LEN];
        prefix.copy_from_slice(&raw[..EXPIRY_PREFIX_LEN]);
        if Self::now_secs() >= u64::from_be_bytes(prefix) {
            self.tree.remove(key.as_bytes())?;
            return Ok(None);
        }
        Ok(Some(raw[EXPIRY_PREFIX_LEN..].to_vec()))
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StorageError> {
        let expires_at = Self::now_secs().saturating_add(ttl.as_secs());
        let mut stored = Vec::with_capacity(EXPIRY_PREFIX_LEN + value.len());
        stored.extend_from_slice(&expires_at.to_be_bytes());
        stored.extend_from_slice(value);
        self.tree.insert(key.as_bytes(), stored)?;
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<(), StorageError> {
        self.tree.remove(key.as_bytes())?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_round_trip_and_invalidate() {
        let cache = InMemoryCache::new();
        cache.set("k", b"payload", Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get("k").unwrap(), Some(b"payload".to_vec()));

        cache.invalidate("k").unwrap();
        assert_eq!(cache.get("k").unwrap(), None);
    }

    #[test]
    fn test_in_memory_expired_entry_reads_as_miss() {
        let cache = InMemoryCache::new();
        cache.set("k", b"payload", Duration::ZERO).unwrap();
        assert_eq!(cache.get("k").unwrap(), None);
    }

    #[test]
    fn test_sled_cache_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        {
            let cache = SledCache::open(dir.path()).unwrap();
            cache.set("growth", b"{}", Duration::from_secs(3600)).unwrap();
        }
        let reopened = SledCache::open(dir.path()).unwrap();
        assert_eq!(reopened.get("growth").unwrap(), Some(b"{}".to_vec()));
        assert_eq!(reopened.backend_name(), "Sled");
    }

    #[test]
    fn test_sled_cache_expiry_and_invalidate() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SledCache::open(dir.path()).unwrap();

        cache.set("stale", b"x", Duration::ZERO).unwrap();
        assert_eq!(cache.get("stale").unwrap(), None);

        cache.set("live", b"y", Duration::from_secs(600)).unwrap();
        cache.invalidate("live").unwrap();
        assert_eq!(cache.get("live").unwrap(), None);
        assert_eq!(cache.get("missing").unwrap(), None);
    }

    #[test]
    fn test_trait_object() {
        let cache: Box<dyn AnalysisCache> = Box::new(InMemoryCache::new());
        assert_eq!(cache.backend_name(), "InMemory");
    }
}
