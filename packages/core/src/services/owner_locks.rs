//! Per-owner write serialization
//!
//! Folder mutations read the owner's hierarchy, validate against it, then
//! write. Two interleaved moves could each pass the subtree check and still
//! close a cycle together. `OwnerWriteLocks` hands out one async mutex per
//! owner so those read-validate-write sequences run one at a time, while
//! different owners proceed in parallel.

use crate::models::OwnerId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Registry of per-owner write locks
///
/// Entries nobody holds or waits on are pruned whenever a new owner is
/// registered, so the map stays bounded by the owners with writes in flight.
#[derive(Debug, Default, Clone)]
pub struct OwnerWriteLocks {
    locks: Arc<RwLock<HashMap<OwnerId, Arc<Mutex<()>>>>>,
}

impl OwnerWriteLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive write access to `owner_id`'s folders.
    ///
    /// Access is released when the returned guard is dropped.
    pub async fn acquire(&self, owner_id: OwnerId) -> OwnedMutexGuard<()> {
        let existing = self.locks.read().await.get(&owner_id).cloned();

        let lock = match existing {
            Some(lock) => lock,
            None => {
                let mut locks = self.locks.write().await;
                // The map's own reference is the only one left on idle entries
                locks.retain(|id, lock| *id == owner_id || Arc::strong_count(lock) > 1);
                locks.entry(owner_id).or_default().clone()
            }
        };

        lock.lock_owned().await
    }

    /// Number of owners currently registered (held, awaited, or not yet pruned)
    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.read().await.is_empty()
    }
}
