//! Per-trip and per-user mutual exclusion.
//!
//! Operations lock the trip first and then the users they touch, users in
//! ascending id order. Unrelated trips never wait on each other. An entry
//! lives only while someone holds or waits on it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::{TripId, UserId};

/// What a lock protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKey {
    Trip(TripId),
    User(UserId),
}

/// Lazily created async mutexes, one per key.
#[derive(Default)]
pub struct LockTable {
    locks: Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn acquire(&self, key: LockKey) -> LockGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key).or_default())
        };
        LockGuard {
            table: self,
            key,
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Acquire several user locks in ascending id order.
    pub async fn acquire_users(&self, users: &[UserId]) -> Vec<LockGuard<'_>> {
        let mut sorted = users.to_vec();
        sorted.sort();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for user in sorted {
            guards.push(self.acquire(LockKey::User(user)).await);
        }
        guards
    }

    /// Drop the entry for `key` if nobody holds or waits on it.
    fn forget(&self, key: LockKey) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(&key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&key);
        }
    }

    /// Number of keys with a live entry.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive access to one key. Releasing it prunes the key's entry when
/// nobody else is waiting.
pub struct LockGuard<'a> {
    table: &'a LockTable,
    key: LockKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        // Release first so the table holds the only reference.
        drop(self.guard.take());
        self.table.forget(self.key);
    }
}
