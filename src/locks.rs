//! Keyed serialization points for check-then-mutate sequences.
//!
//! RocksDB has no conditional update, so the "check non-terminal, then
//! mutate" and "check balance, then insert" sequences are serialized
//! through per-key async mutexes: one key per game session, one per
//! publisher ledger. Operations on different keys never contend.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct LockRegistry {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self { locks: DashMap::new() }
    }

    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
