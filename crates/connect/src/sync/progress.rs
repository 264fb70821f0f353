//! Progress reporting for sync runs.
//!
//! This module defines the reporter trait the orchestrator and fetcher call
//! into, so a host can surface progress however it likes.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use txsync_core::sync::UserSyncReport;

/// Status of a sync operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Starting,
    Syncing,
    Complete,
    Failed,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Starting => write!(f, "starting"),
            SyncStatus::Syncing => write!(f, "syncing"),
            SyncStatus::Complete => write!(f, "complete"),
            SyncStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Payload for sync progress events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgressPayload {
    pub account_id: String,
    pub status: SyncStatus,
    /// Pages drained so far (1-based once the first page arrives).
    pub current_page: usize,
    pub transactions_fetched: usize,
    pub message: Option<String>,
}

impl SyncProgressPayload {
    pub fn new(account_id: impl Into<String>, status: SyncStatus) -> Self {
        Self {
            account_id: account_id.into(),
            status,
            current_page: 0,
            transactions_fetched: 0,
            message: None,
        }
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.current_page = page;
        self
    }

    pub fn with_transactions_fetched(mut self, count: usize) -> Self {
        self.transactions_fetched = count;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Trait for reporting sync progress.
pub trait SyncProgressReporter: Send + Sync {
    /// Report progress for one account.
    fn report_progress(&self, payload: SyncProgressPayload);

    /// Report that a user's sync is starting.
    fn report_sync_start(&self, user_id: &str);

    /// Report that a user's sync finished, whatever the per-account results.
    fn report_sync_complete(&self, report: &UserSyncReport);
}

/// A no-op progress reporter for contexts where progress reporting is not needed.
#[derive(Debug, Clone, Default)]
pub struct NoOpProgressReporter;

impl SyncProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _payload: SyncProgressPayload) {}

    fn report_sync_start(&self, _user_id: &str) {}

    fn report_sync_complete(&self, _report: &UserSyncReport) {}
}

/// Writes progress to the log.
#[derive(Debug, Clone, Default)]
pub struct LogProgressReporter;

impl SyncProgressReporter for LogProgressReporter {
    fn report_progress(&self, payload: SyncProgressPayload) {
        debug!(
            "[{}] {} page {} ({} transactions){}",
            payload.account_id,
            payload.status,
            payload.current_page,
            payload.transactions_fetched,
            payload
                .message
                .map(|m| format!(": {}", m))
                .unwrap_or_default()
        );
    }

    fn report_sync_start(&self, user_id: &str) {
        info!("Sync starting for user {}", user_id);
    }

    fn report_sync_complete(&self, report: &UserSyncReport) {
        if report.failed_count() > 0 {
            warn!(
                "Sync finished for user {}: {} accounts ok, {} failed, {} new transactions",
                report.user_id,
                report.succeeded_count(),
                report.failed_count(),
                report.appended_total()
            );
        } else {
            info!(
                "Sync finished for user {}: {} accounts ok, {} new transactions",
                report.user_id,
                report.succeeded_count(),
                report.appended_total()
            );
        }
    }
}
