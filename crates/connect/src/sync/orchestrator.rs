//! Per-user sync orchestrator.
//!
//! For every linked account of a user this reads the stored cursor, drains
//! the feed from there, and hands the batch to the ledger merger. Accounts
//! are isolated: one account failing never stops or rolls back another.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};

use txsync_core::constants::{
    DEFAULT_MAX_CONCURRENT_ACCOUNTS, DEFAULT_MAX_PAGES, DEFAULT_PAGE_TIMEOUT_MS,
};
use txsync_core::errors::{Error, Result};
use txsync_core::sync::{
    AccountLockRegistry, AccountSyncOutcome, SyncRunReport, UserStartFailure, UserSyncReport,
};
use txsync_core::transactions::{LedgerMergerTrait, LedgerRepositoryTrait, MergeOutcome};
use txsync_core::users::{LinkedAccount, UserDirectoryTrait};

use super::fetcher::{FetchConfig, PageFetcher};
use super::progress::{SyncProgressPayload, SyncProgressReporter, SyncStatus};
use super::traits::TransactionsSyncApi;

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum number of pages to fetch per account (safety limit).
    pub max_pages: usize,
    /// Per-page request timeout.
    pub page_timeout: Option<Duration>,
    /// Accounts of one user synced at the same time.
    pub max_concurrent_accounts: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            page_timeout: Some(Duration::from_millis(DEFAULT_PAGE_TIMEOUT_MS)),
            max_concurrent_accounts: DEFAULT_MAX_CONCURRENT_ACCOUNTS,
        }
    }
}

impl SyncConfig {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            max_pages: self.max_pages,
            page_timeout: self.page_timeout,
        }
    }
}

/// Orchestrates fetch-then-merge for every linked account of a user.
///
/// # Example
///
/// ```ignore
/// let orchestrator = SyncOrchestrator::new(
///     api, directory, ledgers, merger,
///     Arc::new(LogProgressReporter),
///     SyncConfig::default(),
/// );
/// let report = orchestrator.sync_user("user-1").await?;
/// ```
pub struct SyncOrchestrator<P: SyncProgressReporter> {
    fetcher: PageFetcher,
    directory: Arc<dyn UserDirectoryTrait>,
    ledgers: Arc<dyn LedgerRepositoryTrait>,
    merger: Arc<dyn LedgerMergerTrait>,
    locks: Arc<AccountLockRegistry>,
    progress_reporter: Arc<P>,
    config: SyncConfig,
}

impl<P: SyncProgressReporter> SyncOrchestrator<P> {
    pub fn new(
        api: Arc<dyn TransactionsSyncApi>,
        directory: Arc<dyn UserDirectoryTrait>,
        ledgers: Arc<dyn LedgerRepositoryTrait>,
        merger: Arc<dyn LedgerMergerTrait>,
        progress_reporter: Arc<P>,
        config: SyncConfig,
    ) -> Self {
        Self {
            fetcher: PageFetcher::new(api, config.fetch_config()),
            directory,
            ledgers,
            merger,
            locks: Arc::new(AccountLockRegistry::new()),
            progress_reporter,
            config,
        }
    }

    /// Syncs every linked account of `user_id`.
    ///
    /// Fails with `Error::UserNotFound` only when the user is absent at the
    /// start; per-account failures are reported in the returned map.
    pub async fn sync_user(&self, user_id: &str) -> Result<UserSyncReport> {
        let accounts = self.directory.accounts_of(user_id)?;
        info!(
            "Syncing {} linked accounts for user {}",
            accounts.len(),
            user_id
        );
        self.progress_reporter.report_sync_start(user_id);

        let mut report = UserSyncReport::new(user_id);
        let cycles: Vec<_> = accounts
            .into_iter()
            .map(|account| self.sync_account(user_id, account))
            .collect();
        let outcomes: Vec<AccountSyncOutcome> = stream::iter(cycles)
            .buffer_unordered(self.config.max_concurrent_accounts.max(1))
            .collect()
            .await;

        for outcome in outcomes {
            report.record(outcome);
        }
        report.finish();

        self.progress_reporter.report_sync_complete(&report);
        Ok(report)
    }

    /// Syncs every user in the directory, one after another.
    ///
    /// Fails only if the directory cannot be listed. A user removed between
    /// listing and syncing is skipped; any other start failure is recorded
    /// in `start_failures`.
    pub async fn sync_all_users(&self) -> Result<SyncRunReport> {
        let user_ids = self.directory.list_user_ids()?;
        let mut run = SyncRunReport {
            users: Vec::with_capacity(user_ids.len()),
            start_failures: Vec::new(),
        };

        for user_id in user_ids {
            match self.sync_user(&user_id).await {
                Ok(report) => run.users.push(report),
                Err(Error::UserNotFound(_)) => {
                    warn!("User {} disappeared before sync; skipping", user_id);
                }
                Err(e) => {
                    error!("Sync for user {} could not start: {}", user_id, e);
                    run.start_failures.push(UserStartFailure {
                        user_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(run)
    }

    /// One account's cycle under its lock. Never fails; the error is folded
    /// into the outcome.
    async fn sync_account(&self, user_id: &str, account: LinkedAccount) -> AccountSyncOutcome {
        let account_id = account.account_id.clone();
        let _guard = self.locks.acquire(user_id, &account_id).await;

        match self.fetch_and_merge(user_id, &account).await {
            Ok((pages_fetched, merge)) => {
                self.progress_reporter.report_progress(
                    SyncProgressPayload::new(&account_id, SyncStatus::Complete)
                        .with_page(pages_fetched)
                        .with_message(format!("{} new transactions", merge.appended)),
                );
                AccountSyncOutcome::merged(account_id, pages_fetched, &merge)
            }
            Err(e) => {
                error!("Sync failed for {}/{}: {}", user_id, account_id, e);
                self.progress_reporter.report_progress(
                    SyncProgressPayload::new(&account_id, SyncStatus::Failed)
                        .with_message(e.to_string()),
                );
                AccountSyncOutcome::failed(account_id, &e)
            }
        }
    }

    async fn fetch_and_merge(
        &self,
        user_id: &str,
        account: &LinkedAccount,
    ) -> Result<(usize, MergeOutcome)> {
        // The version read here guards the whole cycle, not just the write.
        let snapshot = self.ledgers.get(user_id, &account.account_id)?;
        let cursor = snapshot
            .as_ref()
            .map(|ledger| ledger.cursor.clone())
            .unwrap_or_default();
        debug!(
            "Fetching {}/{} from cursor '{}'",
            user_id, account.account_id, cursor
        );

        self.progress_reporter
            .report_progress(SyncProgressPayload::new(&account.account_id, SyncStatus::Starting));

        let batch = self
            .fetcher
            .fetch_with_progress(
                &account.account_id,
                &account.access_token,
                &cursor,
                self.progress_reporter.as_ref(),
            )
            .await?;
        let pages_fetched = batch.pages_fetched;

        let merge = self
            .merger
            .merge_from(user_id, &account.account_id, snapshot, batch)
            .await?;
        Ok((pages_fetched, merge))
    }
}
