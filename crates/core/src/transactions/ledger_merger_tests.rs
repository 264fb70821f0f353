use crate::errors::{DatabaseError, Error, Result};
use crate::transactions::{
    merge_batch, AccountLedger, LedgerMerger, LedgerMergerTrait, LedgerRepositoryTrait, MergeKind,
    SyncBatch, TransactionRecord,
};
use crate::users::{LinkedAccount, UserDirectoryTrait};
use async_trait::async_trait;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

// --- Mock LedgerRepository ---
#[derive(Clone, Default)]
struct MockLedgerRepository {
    ledgers: Arc<Mutex<HashMap<(String, String), AccountLedger>>>,
    fail_writes: Arc<Mutex<bool>>,
    writes: Arc<Mutex<usize>>,
}

impl MockLedgerRepository {
    fn new() -> Self {
        Self::default()
    }

    fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    fn stored(&self, user_id: &str, account_id: &str) -> Option<AccountLedger> {
        self.ledgers
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), account_id.to_string()))
            .cloned()
    }

    fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl LedgerRepositoryTrait for MockLedgerRepository {
    fn get(&self, user_id: &str, account_id: &str) -> Result<Option<AccountLedger>> {
        Ok(self.stored(user_id, account_id))
    }

    fn list_by_user(&self, user_id: &str) -> Result<Vec<AccountLedger>> {
        Ok(self
            .ledgers
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert(
        &self,
        mut ledger: AccountLedger,
        expected_version: Option<i64>,
    ) -> Result<AccountLedger> {
        if *self.fail_writes.lock().unwrap() {
            return Err(Error::Database(DatabaseError::QueryFailed(
                "disk I/O error".to_string(),
            )));
        }

        let key = (ledger.user_id.clone(), ledger.account_id.clone());
        let mut ledgers = self.ledgers.lock().unwrap();
        let current = ledgers.get(&key).map(|l| l.version);
        if current != expected_version {
            return Err(Error::Database(DatabaseError::WriteConflict {
                user_id: key.0,
                account_id: key.1,
            }));
        }

        ledger.version = current.unwrap_or(0) + 1;
        ledgers.insert(key, ledger.clone());
        *self.writes.lock().unwrap() += 1;
        Ok(ledger)
    }
}

// --- Mock UserDirectory ---
#[derive(Clone, Default)]
struct MockUserDirectory {
    users: Arc<Mutex<HashMap<String, Vec<LinkedAccount>>>>,
}

impl MockUserDirectory {
    fn with_user(user_id: &str) -> Self {
        let directory = Self::default();
        directory
            .users
            .lock()
            .unwrap()
            .insert(user_id.to_string(), Vec::new());
        directory
    }
}

impl UserDirectoryTrait for MockUserDirectory {
    fn user_exists(&self, user_id: &str) -> Result<bool> {
        Ok(self.users.lock().unwrap().contains_key(user_id))
    }

    fn accounts_of(&self, user_id: &str) -> Result<Vec<LinkedAccount>> {
        self.users
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .ok_or_else(|| Error::UserNotFound(user_id.to_string()))
    }

    fn list_user_ids(&self) -> Result<Vec<String>> {
        Ok(self.users.lock().unwrap().keys().cloned().collect())
    }
}

fn tx(id: &str, amount: Decimal) -> TransactionRecord {
    TransactionRecord::new(Some(id.to_string()), amount, "2024-03-01")
}

fn ids(ledger: &AccountLedger) -> Vec<Option<String>> {
    ledger
        .transactions
        .iter()
        .map(|t| t.transaction_id.clone())
        .collect()
}

fn setup() -> (MockLedgerRepository, LedgerMerger) {
    let repository = MockLedgerRepository::new();
    let directory = MockUserDirectory::with_user("alice@example.com");
    let merger = LedgerMerger::new(Arc::new(repository.clone()), Arc::new(directory));
    (repository, merger)
}

// ============================================================================
// merge_batch (pure)
// ============================================================================

#[test]
fn test_merge_batch_creates_ledger_from_first_batch() {
    let batch = SyncBatch::new(vec![tx("1", dec!(10)), tx("2", dec!(20))], "c1");

    let (ledger, outcome) = merge_batch(None, "u", "acc", batch);

    assert_eq!(ledger.user_id, "u");
    assert_eq!(ledger.account_id, "acc");
    assert_eq!(ledger.cursor, "c1");
    assert_eq!(ids(&ledger), vec![Some("1".into()), Some("2".into())]);
    assert_eq!(outcome.kind, MergeKind::Created);
    assert_eq!(outcome.appended, 2);
    assert_eq!(outcome.duplicates_skipped, 0);
}

#[test]
fn test_merge_batch_keeps_records_without_identifier() {
    let mut existing = AccountLedger::new("u", "acc", "c1", vec![tx("1", dec!(10))]);
    existing.version = 1;
    let anonymous = TransactionRecord::new(None, dec!(3.5), "2024-03-02");
    let empty_id = TransactionRecord::new(Some(String::new()), dec!(4), "2024-03-02");
    let batch = SyncBatch::new(
        vec![anonymous.clone(), anonymous.clone(), empty_id.clone()],
        "c2",
    );

    let (ledger, outcome) = merge_batch(Some(existing), "u", "acc", batch);

    assert_eq!(ledger.len(), 4);
    assert_eq!(outcome.appended, 3);
    assert_eq!(outcome.kind, MergeKind::Appended);
}

#[test]
fn test_merge_batch_drops_ids_repeated_within_batch() {
    let batch = SyncBatch::new(
        vec![tx("1", dec!(10)), tx("1", dec!(10)), tx("2", dec!(1))],
        "c1",
    );

    let (ledger, outcome) = merge_batch(None, "u", "acc", batch);

    assert_eq!(ids(&ledger), vec![Some("1".into()), Some("2".into())]);
    assert_eq!(outcome.duplicates_skipped, 1);
}

#[test]
fn test_merge_batch_fully_duplicate_batch_only_moves_cursor() {
    let mut existing =
        AccountLedger::new("u", "acc", "c1", vec![tx("1", dec!(10)), tx("2", dec!(20))]);
    existing.version = 3;
    let before = existing.transactions.clone();

    let batch = SyncBatch::new(vec![tx("2", dec!(20)), tx("1", dec!(10))], "c9");
    let (ledger, outcome) = merge_batch(Some(existing), "u", "acc", batch);

    assert_eq!(ledger.transactions, before);
    assert_eq!(ledger.cursor, "c9");
    assert_eq!(outcome.kind, MergeKind::NoOp);
    assert_eq!(outcome.appended, 0);
    assert_eq!(outcome.duplicates_skipped, 2);
    assert_eq!(outcome.version, 3);
}

#[test]
fn test_merge_batch_empty_batch_on_new_account_creates_empty_ledger() {
    let (ledger, outcome) = merge_batch(None, "u", "acc", SyncBatch::new(vec![], "c0"));

    assert!(ledger.is_empty());
    assert_eq!(ledger.cursor, "c0");
    assert_eq!(outcome.kind, MergeKind::Created);
}

// ============================================================================
// LedgerMerger (with store)
// ============================================================================

#[tokio::test]
async fn test_scenario_first_merge_creates_ledger() {
    let (repository, merger) = setup();
    let batch = SyncBatch::new(vec![tx("1", dec!(10)), tx("2", dec!(20))], "c1");

    let outcome = merger
        .merge("alice@example.com", "item-1", batch)
        .await
        .unwrap();

    let stored = repository.stored("alice@example.com", "item-1").unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored.cursor, "c1");
    assert_eq!(stored.version, 1);
    assert_eq!(outcome.version, 1);
    assert_eq!(outcome.kind, MergeKind::Created);
}

#[tokio::test]
async fn test_scenario_second_merge_dedups_by_identifier() {
    let (repository, merger) = setup();
    merger
        .merge(
            "alice@example.com",
            "item-1",
            SyncBatch::new(vec![tx("1", dec!(10)), tx("2", dec!(20))], "c1"),
        )
        .await
        .unwrap();

    let outcome = merger
        .merge(
            "alice@example.com",
            "item-1",
            SyncBatch::new(vec![tx("2", dec!(20)), tx("3", dec!(5))], "c2"),
        )
        .await
        .unwrap();

    let stored = repository.stored("alice@example.com", "item-1").unwrap();
    assert_eq!(
        ids(&stored),
        vec![Some("1".into()), Some("2".into()), Some("3".into())]
    );
    assert_eq!(stored.cursor, "c2");
    assert_eq!(outcome.appended, 1);
    assert_eq!(outcome.duplicates_skipped, 1);
    assert_eq!(outcome.version, 2);
}

#[tokio::test]
async fn test_scenario_unknown_user_is_rejected_without_write() {
    let (repository, merger) = setup();

    let result = merger
        .merge(
            "mallory@example.com",
            "item-1",
            SyncBatch::new(vec![tx("1", dec!(10))], "c1"),
        )
        .await;

    assert!(matches!(result, Err(Error::UserNotFound(ref u)) if u == "mallory@example.com"));
    assert_eq!(repository.write_count(), 0);
    assert!(repository.stored("mallory@example.com", "item-1").is_none());
}

#[tokio::test]
async fn test_failed_write_leaves_stored_ledger_untouched() {
    let (repository, merger) = setup();
    merger
        .merge(
            "alice@example.com",
            "item-1",
            SyncBatch::new(vec![tx("1", dec!(10))], "c1"),
        )
        .await
        .unwrap();
    let before = repository.stored("alice@example.com", "item-1").unwrap();

    repository.set_fail_writes(true);
    let batch = SyncBatch::new(vec![tx("2", dec!(20))], "c2");
    let result = merger
        .merge("alice@example.com", "item-1", batch.clone())
        .await;

    assert!(matches!(result, Err(ref e) if e.is_persistence_failure()));
    assert_eq!(repository.stored("alice@example.com", "item-1").unwrap(), before);

    // The same batch can be retried once the store recovers.
    repository.set_fail_writes(false);
    let outcome = merger
        .merge("alice@example.com", "item-1", batch)
        .await
        .unwrap();
    assert_eq!(outcome.appended, 1);
    assert_eq!(
        repository.stored("alice@example.com", "item-1").unwrap().cursor,
        "c2"
    );
}

#[tokio::test]
async fn test_stale_version_reports_write_conflict() {
    let (repository, _merger) = setup();
    let ledger = AccountLedger::new("alice@example.com", "item-1", "c1", vec![]);
    repository.upsert(ledger.clone(), None).await.unwrap();

    let result = repository.upsert(ledger, None).await;

    assert!(matches!(
        result,
        Err(Error::Database(DatabaseError::WriteConflict { .. }))
    ));
}

#[tokio::test]
async fn test_merge_from_stale_snapshot_conflicts_and_keeps_newer_ledger() {
    let (repository, merger) = setup();
    merger
        .merge(
            "alice@example.com",
            "item-1",
            SyncBatch::new(vec![tx("1", dec!(10))], "c1"),
        )
        .await
        .unwrap();
    let snapshot = repository.stored("alice@example.com", "item-1");

    // Another writer advances the ledger after the snapshot was taken.
    merger
        .merge(
            "alice@example.com",
            "item-1",
            SyncBatch::new(vec![tx("5", dec!(50))], "c5"),
        )
        .await
        .unwrap();

    let result = merger
        .merge_from(
            "alice@example.com",
            "item-1",
            snapshot,
            SyncBatch::new(vec![tx("2", dec!(20))], "c2"),
        )
        .await;

    assert!(matches!(
        result,
        Err(Error::Database(DatabaseError::WriteConflict { .. }))
    ));
    let stored = repository.stored("alice@example.com", "item-1").unwrap();
    assert_eq!(stored.cursor, "c5");
    assert_eq!(stored.version, 2);
    assert_eq!(ids(&stored), vec![Some("1".into()), Some("5".into())]);
}

#[tokio::test]
async fn test_merge_from_fresh_snapshot_succeeds() {
    let (repository, merger) = setup();
    merger
        .merge(
            "alice@example.com",
            "item-1",
            SyncBatch::new(vec![tx("1", dec!(10))], "c1"),
        )
        .await
        .unwrap();
    let snapshot = repository.stored("alice@example.com", "item-1");

    let outcome = merger
        .merge_from(
            "alice@example.com",
            "item-1",
            snapshot,
            SyncBatch::new(vec![tx("2", dec!(20))], "c2"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.version, 2);
    assert_eq!(outcome.appended, 1);
}

#[tokio::test]
async fn test_redelivered_batch_is_idempotent() {
    let (repository, merger) = setup();
    let batch = SyncBatch::new(vec![tx("1", dec!(10)), tx("2", dec!(20))], "c1");

    merger
        .merge("alice@example.com", "item-1", batch.clone())
        .await
        .unwrap();
    let once = repository.stored("alice@example.com", "item-1").unwrap();

    let outcome = merger
        .merge("alice@example.com", "item-1", batch)
        .await
        .unwrap();
    let twice = repository.stored("alice@example.com", "item-1").unwrap();

    assert_eq!(outcome.kind, MergeKind::NoOp);
    assert_eq!(once.transactions, twice.transactions);
    assert_eq!(once.cursor, twice.cursor);
}

// ============================================================================
// Invariants
// ============================================================================

fn arb_record() -> impl Strategy<Value = TransactionRecord> {
    (proptest::option::of(0u8..12), -500i64..500).prop_map(|(id, cents)| {
        TransactionRecord::new(
            id.map(|n| n.to_string()),
            Decimal::new(cents, 2),
            "2024-01-15",
        )
    })
}

fn arb_batch() -> impl Strategy<Value = SyncBatch> {
    (proptest::collection::vec(arb_record(), 0..20), "[a-z0-9]{1,8}")
        .prop_map(|(records, cursor)| SyncBatch::new(records, cursor))
}

proptest! {
    #[test]
    fn prop_merge_invariants_hold_over_batch_sequences(
        batches in proptest::collection::vec(arb_batch(), 1..6)
    ) {
        let mut ledger: Option<AccountLedger> = None;

        for batch in batches {
            let cursor = batch.cursor.clone();
            let before = ledger.as_ref().map(|l| l.transactions.clone()).unwrap_or_default();

            let (mut merged, _) = merge_batch(ledger.take(), "u", "acc", batch.clone());
            merged.version += 1;

            // Cursor always overwritten.
            prop_assert_eq!(&merged.cursor, &cursor);
            // Monotonic growth with the old records kept as a prefix.
            prop_assert!(merged.transactions.len() >= before.len());
            prop_assert_eq!(&merged.transactions[..before.len()], &before[..]);
            // No two records share a non-empty id.
            let mut seen = HashSet::new();
            for record in &merged.transactions {
                if let Some(id) = record.dedup_key() {
                    prop_assert!(seen.insert(id.to_string()));
                }
            }

            // Re-delivering the same batch does not change the content,
            // apart from identifier-less records which are always new.
            let anonymous = batch.transactions.iter().filter(|t| t.dedup_key().is_none()).count();
            let (again, outcome) = merge_batch(Some(merged.clone()), "u", "acc", batch);
            prop_assert_eq!(outcome.appended, anonymous);
            prop_assert_eq!(&again.cursor, &merged.cursor);

            ledger = Some(merged);
        }
    }
}
