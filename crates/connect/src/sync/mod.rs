//! Paginated fetch and per-user sync orchestration.

mod fetcher;
mod mapping;
mod models;
mod orchestrator;
mod progress;
mod traits;

pub use fetcher::{FetchConfig, PageFetcher};
pub use mapping::{normalize_page, normalize_record};
pub use models::{
    PlaidErrorBody, RawChangeRecord, SyncPage, TransactionsSyncRequest, TransactionsSyncResponse,
};
pub use orchestrator::{SyncConfig, SyncOrchestrator};
pub use progress::{
    LogProgressReporter, NoOpProgressReporter, SyncProgressPayload, SyncProgressReporter,
    SyncStatus,
};
pub use traits::TransactionsSyncApi;
