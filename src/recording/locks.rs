//! Per-batch write serialization
//!
//! Recording a sample reads the previous measurement and the feeding ledger,
//! then appends. Two concurrent recordings on one batch could both see the
//! same "previous" measurement, so callers hold the batch lock around
//! `MeasurementRecorder::record_sample`. Different batches never contend.
//!
//! Entries are dropped once no writer holds them, so the registry only
//! tracks batches with a recording in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

type BatchKey = (String, String);

#[derive(Default)]
pub struct BatchLocks {
    locks: Mutex<HashMap<BatchKey, Arc<Mutex<()>>>>,
}

impl BatchLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock shared by every writer of `(tenant_id, batch_id)`.
    pub fn lock_for(&self, tenant_id: &str, batch_id: &str) -> Arc<Mutex<()>> {
        self.registry()
            .entry((tenant_id.to_string(), batch_id.to_string()))
            .or_default()
            .clone()
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<BatchKey, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(|e| {
            warn!("Mutex poisoned on batch lock registry, recovering");
            e.into_inner()
        })
    }

    /// Drop `lock` under the registry lock and remove the entry if the
    /// registry now holds the only handle.
    fn release(&self, tenant_id: &str, batch_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.registry();
        drop(lock);
        let key = (tenant_id.to_string(), batch_id.to_string());
        if locks.get(&key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&key);
        }
    }

    /// Run `f` while holding the batch lock.
    pub fn with_batch<R>(&self, tenant_id: &str, batch_id: &str, f: impl FnOnce() -> R) -> R {
        let lock = self.lock_for(tenant_id, batch_id);
        let result = {
            let _guard: MutexGuard<'_, ()> = lock.lock().unwrap_or_else(|e| {
                warn!(tenant_id, batch_id, "Batch lock poisoned, recovering");
                e.into_inner()
            });
            f()
        };
        self.release(tenant_id, batch_id, lock);
        result
    }

    /// Drop every entry no caller holds a handle to.
    pub fn prune_idle(&self) {
        self.registry().retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Number of batches with a live lock handle.
    pub fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
