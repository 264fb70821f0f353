//! Drains the provider's change feed into a single batch.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use txsync_core::constants::{DEFAULT_MAX_PAGES, DEFAULT_PAGE_TIMEOUT_MS};
use txsync_core::errors::FetchError;
use txsync_core::transactions::SyncBatch;

use super::mapping::normalize_page;
use super::models::SyncPage;
use super::progress::{
    NoOpProgressReporter, SyncProgressPayload, SyncProgressReporter, SyncStatus,
};
use super::traits::TransactionsSyncApi;

/// Bounds on a single sweep.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum number of pages to drain per sweep (safety limit).
    pub max_pages: usize,
    /// Per-call timeout; `None` leaves timing to the transport.
    pub page_timeout: Option<Duration>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            page_timeout: Some(Duration::from_millis(DEFAULT_PAGE_TIMEOUT_MS)),
        }
    }
}

/// Repeatedly calls the paginated sync primitive until the provider reports
/// no more pages. Keeps no state between sweeps.
#[derive(Clone)]
pub struct PageFetcher {
    api: Arc<dyn TransactionsSyncApi>,
    config: FetchConfig,
}

impl PageFetcher {
    pub fn new(api: Arc<dyn TransactionsSyncApi>, config: FetchConfig) -> Self {
        Self { api, config }
    }

    /// Fetches every page after `cursor`. On any failure nothing is returned:
    /// no partial records and no advanced cursor.
    pub async fn fetch_all(&self, access_token: &str, cursor: &str) -> Result<SyncBatch, FetchError> {
        self.fetch_with_progress("", access_token, cursor, &NoOpProgressReporter)
            .await
    }

    /// Same as [`fetch_all`](Self::fetch_all), reporting each page for
    /// `account_id`.
    pub async fn fetch_with_progress(
        &self,
        account_id: &str,
        access_token: &str,
        cursor: &str,
        reporter: &dyn SyncProgressReporter,
    ) -> Result<SyncBatch, FetchError> {
        let mut current = cursor.to_string();
        let mut transactions = Vec::new();
        let mut pages_fetched: usize = 0;
        let mut ignored_changes: usize = 0;

        loop {
            if pages_fetched >= self.config.max_pages {
                warn!(
                    "[{}] Pagination exceeded max pages ({}). Aborting.",
                    account_id, self.config.max_pages
                );
                return Err(FetchError::PageLimitExceeded(self.config.max_pages));
            }

            let page = self.fetch_page(access_token, &current).await?;
            pages_fetched += 1;

            let SyncPage {
                added,
                next_cursor,
                has_more,
                modified_count,
                removed_count,
            } = page;

            let page_len = added.len();
            transactions.extend(normalize_page(added)?);
            ignored_changes += modified_count + removed_count;

            reporter.report_progress(
                SyncProgressPayload::new(account_id, SyncStatus::Syncing)
                    .with_page(pages_fetched)
                    .with_transactions_fetched(transactions.len()),
            );
            debug!(
                "[{}] Page {}: {} added, {} modified, {} removed, has_more={}",
                account_id, pages_fetched, page_len, modified_count, removed_count, has_more
            );

            if !has_more {
                current = next_cursor;
                break;
            }

            if next_cursor == current {
                warn!(
                    "[{}] Pagination appears stuck (provider returned cursor it was given)",
                    account_id
                );
                return Err(FetchError::StuckCursor(next_cursor));
            }
            current = next_cursor;
        }

        if ignored_changes > 0 {
            warn!(
                "[{}] Ignored {} modified/removed entries; corrections are not applied",
                account_id, ignored_changes
            );
        }

        info!(
            "[{}] Fetched {} transactions across {} pages",
            account_id,
            transactions.len(),
            pages_fetched
        );

        Ok(SyncBatch {
            transactions,
            cursor: current,
            pages_fetched,
        })
    }

    async fn fetch_page(&self, access_token: &str, cursor: &str) -> Result<SyncPage, FetchError> {
        let call = self.api.sync_page(access_token, cursor);
        match self.config.page_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| FetchError::Timeout(limit.as_millis() as u64))?,
            None => call.await,
        }
    }
}
