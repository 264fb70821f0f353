use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;

use super::transactions_model::{
    AccountLedger, MergeKind, MergeOutcome, SyncBatch, TransactionRecord,
};
use super::transactions_traits::{LedgerMergerTrait, LedgerRepositoryTrait};
use crate::errors::{Error, Result};
use crate::users::UserDirectoryTrait;

/// Reconciles `batch` against `existing` without touching storage.
///
/// Records whose identifier is already stored, or already seen earlier in
/// the same batch, are dropped; identifier-less records are always kept.
/// The cursor is replaced unconditionally. Returns the ledger to persist and
/// an outcome whose `version` is still the pre-write version.
pub fn merge_batch(
    existing: Option<AccountLedger>,
    user_id: &str,
    account_id: &str,
    batch: SyncBatch,
) -> (AccountLedger, MergeOutcome) {
    let incoming = batch.transactions.len();

    let created = existing.is_none();
    let mut ledger = existing
        .unwrap_or_else(|| AccountLedger::new(user_id, account_id, String::new(), Vec::new()));

    let mut seen: HashSet<String> = ledger
        .transactions
        .iter()
        .filter_map(|t| t.dedup_key().map(str::to_string))
        .collect();

    let fresh: Vec<TransactionRecord> = batch
        .transactions
        .into_iter()
        .filter(|t| match t.dedup_key() {
            Some(id) => seen.insert(id.to_string()),
            None => true,
        })
        .collect();

    let appended = fresh.len();
    ledger.transactions.extend(fresh);
    ledger.cursor = batch.cursor;
    ledger.updated_at = Utc::now();

    let kind = if created {
        MergeKind::Created
    } else if appended > 0 {
        MergeKind::Appended
    } else {
        MergeKind::NoOp
    };

    let outcome = MergeOutcome {
        kind,
        appended,
        duplicates_skipped: incoming - appended,
        cursor: ledger.cursor.clone(),
        version: ledger.version,
    };

    (ledger, outcome)
}

/// Merge step backed by a ledger store and the user directory.
///
/// The merger is the sole writer of account ledgers. It does not lock: two
/// concurrent merges on the same account are caught by the store's version
/// check and the loser reports a persistence failure.
pub struct LedgerMerger {
    repository: Arc<dyn LedgerRepositoryTrait>,
    directory: Arc<dyn UserDirectoryTrait>,
}

impl LedgerMerger {
    pub fn new(
        repository: Arc<dyn LedgerRepositoryTrait>,
        directory: Arc<dyn UserDirectoryTrait>,
    ) -> Self {
        Self {
            repository,
            directory,
        }
    }
}

#[async_trait]
impl LedgerMergerTrait for LedgerMerger {
    async fn merge(
        &self,
        user_id: &str,
        account_id: &str,
        batch: SyncBatch,
    ) -> Result<MergeOutcome> {
        let existing = self.repository.get(user_id, account_id)?;
        self.merge_from(user_id, account_id, existing, batch).await
    }

    async fn merge_from(
        &self,
        user_id: &str,
        account_id: &str,
        snapshot: Option<AccountLedger>,
        batch: SyncBatch,
    ) -> Result<MergeOutcome> {
        if !self.directory.user_exists(user_id)? {
            warn!("Merge rejected for account {}: user {} not found", account_id, user_id);
            return Err(Error::UserNotFound(user_id.to_string()));
        }

        let expected_version = snapshot.as_ref().map(|l| l.version);
        debug!(
            "Merging {} records into ledger {}/{} (expected version {:?})",
            batch.transactions.len(),
            user_id,
            account_id,
            expected_version
        );

        let (ledger, mut outcome) = merge_batch(snapshot, user_id, account_id, batch);
        let stored = self.repository.upsert(ledger, expected_version).await?;
        outcome.version = stored.version;

        info!(
            "Ledger {}/{} merged: {:?}, {} appended, {} duplicates skipped, version {}",
            user_id,
            account_id,
            outcome.kind,
            outcome.appended,
            outcome.duplicates_skipped,
            outcome.version
        );
        Ok(outcome)
    }
}
