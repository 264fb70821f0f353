//! Ledger repository and merger traits.
//!
//! These traits define the contract for ledger persistence without any
//! database-specific types, allowing for different storage implementations.

use async_trait::async_trait;

use super::transactions_model::{AccountLedger, MergeOutcome, SyncBatch};
use crate::errors::Result;

/// Trait defining the contract for Account Ledger persistence.
///
/// Atomicity is at the single-ledger granularity: `upsert` either replaces the
/// whole ledger or leaves the stored one untouched.
#[async_trait]
pub trait LedgerRepositoryTrait: Send + Sync {
    /// Loads the ledger for `(user_id, account_id)`, if one was ever stored.
    fn get(&self, user_id: &str, account_id: &str) -> Result<Option<AccountLedger>>;

    /// Lists every ledger owned by a user. Read-only path for consumers.
    fn list_by_user(&self, user_id: &str) -> Result<Vec<AccountLedger>>;

    /// Stores `ledger` as one atomic write.
    ///
    /// `expected_version` is the version the caller read: `None` means the
    /// ledger must not exist yet. Any mismatch fails with
    /// `DatabaseError::WriteConflict` and writes nothing. On success the
    /// stored ledger is returned with its new version.
    async fn upsert(
        &self,
        ledger: AccountLedger,
        expected_version: Option<i64>,
    ) -> Result<AccountLedger>;
}

/// Trait for the merge step of a sync cycle.
#[async_trait]
pub trait LedgerMergerTrait: Send + Sync {
    /// Reconciles `batch` into the stored ledger of `(user_id, account_id)`
    /// and advances its cursor.
    async fn merge(&self, user_id: &str, account_id: &str, batch: SyncBatch)
        -> Result<MergeOutcome>;

    /// Like `merge`, but against `snapshot`, the ledger read when the cycle
    /// started. The write fails with `DatabaseError::WriteConflict` if the
    /// stored ledger moved past that snapshot in the meantime.
    async fn merge_from(
        &self,
        user_id: &str,
        account_id: &str,
        snapshot: Option<AccountLedger>,
        batch: SyncBatch,
    ) -> Result<MergeOutcome>;
}
