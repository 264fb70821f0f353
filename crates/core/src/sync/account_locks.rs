//! Per-account mutual exclusion for the fetch-then-merge cycle.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type AccountKey = (String, String);

/// Hands out one async mutex per `(user_id, account_id)`.
///
/// Holding the guard across read-cursor, fetch and merge keeps two cycles
/// on the same account from interleaving. Different accounts never contend.
/// An entry is dropped from the map once its last guard is released and no
/// task is waiting on it.
#[derive(Debug, Default)]
pub struct AccountLockRegistry {
    locks: DashMap<AccountKey, Arc<Mutex<()>>>,
}

/// Exclusive hold on one account. Releases (and prunes) on drop.
#[derive(Debug)]
pub struct AccountLockGuard<'a> {
    registry: &'a AccountLockRegistry,
    key: AccountKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for AccountLockGuard<'_> {
    fn drop(&mut self) {
        // Release first so the guard's own Arc no longer counts.
        self.guard.take();
        // `remove_if` holds the shard lock, so no acquirer can clone the
        // mutex between the count check and the removal.
        self.registry
            .locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl AccountLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &AccountKey) -> Arc<Mutex<()>> {
        self.locks.entry(key.clone()).or_default().clone()
    }

    /// Waits until the account is free and returns a guard that releases it
    /// on drop.
    pub async fn acquire(&self, user_id: &str, account_id: &str) -> AccountLockGuard<'_> {
        let key = (user_id.to_string(), account_id.to_string());
        let lock = self.lock_for(&key);
        let guard = lock.lock_owned().await;
        AccountLockGuard {
            registry: self,
            key,
            guard: Some(guard),
        }
    }

    /// Returns the guard only if no other cycle holds the account.
    pub fn try_acquire(&self, user_id: &str, account_id: &str) -> Option<AccountLockGuard<'_>> {
        let key = (user_id.to_string(), account_id.to_string());
        // On failure the current holder keeps the entry alive, so nothing to prune.
        let guard = self.lock_for(&key).try_lock_owned().ok()?;
        Some(AccountLockGuard {
            registry: self,
            key,
            guard: Some(guard),
        })
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
