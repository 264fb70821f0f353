//! txsync Connect - provider access and sync orchestration.
//!
//! This crate talks to the Plaid transactions feed, drains it page by page
//! into a [`SyncBatch`](txsync_core::transactions::SyncBatch), and drives the
//! fetch-then-merge cycle for every linked account of a user.

pub mod client;
pub mod sync;

// Re-export commonly used types
pub use client::{parse_sync_response, PlaidApiClient, PlaidConfig, PlaidEnvironment};
pub use sync::{
    FetchConfig, LogProgressReporter, NoOpProgressReporter, PageFetcher, RawChangeRecord,
    SyncConfig, SyncOrchestrator, SyncPage, SyncProgressPayload, SyncProgressReporter, SyncStatus,
    TransactionsSyncApi,
};
