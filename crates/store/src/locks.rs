//! Per-key async mutual exclusion.
//!
//! Generation requests for the same patch id must not interleave their
//! writes. [`KeyedLocks`] hands out one `tokio` mutex per key and drops the
//! entry once nobody holds or awaits it, so the table only grows with the
//! number of ids in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = Arc<Mutex<HashMap<String, Slot>>>;

#[derive(Debug)]
struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    /// Holders plus waiters.
    users: usize,
}

#[derive(Debug, Clone, Default)]
pub struct KeyedLocks {
    table: LockTable,
}

/// Held while the key is locked. Dropping it releases the key.
#[derive(Debug)]
pub struct KeyGuard {
    // Field order matters: the mutex is released before the claim.
    _guard: OwnedMutexGuard<()>,
    _claim: Claim,
}

/// One holder's or waiter's share of a slot.
///
/// Dropped with the `lock` future when a waiter is cancelled, so abandoned
/// waits still prune the slot.
#[derive(Debug)]
struct Claim {
    key: String,
    table: LockTable,
}

impl Drop for Claim {
    fn drop(&mut self) {
        let mut table = lock_table(&self.table);
        if let Some(slot) = table.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                table.remove(&self.key);
            }
        }
    }
}

fn lock_table(table: &LockTable) -> MutexGuard<'_, HashMap<String, Slot>> {
    table.lock().unwrap_or_else(|e| e.into_inner())
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `key` is free and lock it.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let (claim, mutex) = {
            let mut table = lock_table(&self.table);
            let slot = table.entry(key.to_string()).or_insert_with(|| Slot {
                mutex: Arc::new(AsyncMutex::new(())),
                users: 0,
            });
            slot.users += 1;
            let claim = Claim {
                key: key.to_string(),
                table: Arc::clone(&self.table),
            };
            (claim, Arc::clone(&slot.mutex))
        };
        KeyGuard {
            _guard: mutex.lock_owned().await,
            _claim: claim,
        }
    }

    /// Number of keys currently held or awaited.
    pub fn active_keys(&self) -> usize {
        lock_table(&self.table).len()
    }
}
