//! Transactions module - ledger models, merge logic, and repository traits.

mod ledger_merger;
mod transactions_model;
mod transactions_traits;

#[cfg(test)]
mod ledger_merger_tests;

pub use ledger_merger::{merge_batch, LedgerMerger};
pub use transactions_model::{
    AccountLedger, MergeKind, MergeOutcome, SyncBatch, TransactionRecord,
};
pub use transactions_traits::{LedgerMergerTrait, LedgerRepositoryTrait};
