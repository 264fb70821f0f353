//! Per-account and per-user sync outcome models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::Error;
use crate::transactions::MergeOutcome;

/// Outcome of one account's fetch-then-merge cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountSyncStatus {
    /// New records were appended (or the ledger was created with records).
    Success,
    /// The merge succeeded but nothing new arrived.
    NoOp,
    UserNotFound,
    FetchFailed,
    PersistenceFailed,
}

impl AccountSyncStatus {
    /// Classifies a failed cycle by the error that stopped it.
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::UserNotFound(_) => AccountSyncStatus::UserNotFound,
            Error::Fetch(_) => AccountSyncStatus::FetchFailed,
            _ => AccountSyncStatus::PersistenceFailed,
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, AccountSyncStatus::Success | AccountSyncStatus::NoOp)
    }
}

impl fmt::Display for AccountSyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountSyncStatus::Success => write!(f, "success"),
            AccountSyncStatus::NoOp => write!(f, "no-op"),
            AccountSyncStatus::UserNotFound => write!(f, "user not found"),
            AccountSyncStatus::FetchFailed => write!(f, "fetch failed"),
            AccountSyncStatus::PersistenceFailed => write!(f, "persistence failed"),
        }
    }
}

/// What happened to a single linked account during a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSyncOutcome {
    pub account_id: String,
    pub status: AccountSyncStatus,
    #[serde(default)]
    pub appended: usize,
    #[serde(default)]
    pub pages_fetched: usize,
    /// Cursor stored after the merge; absent when the cycle failed.
    pub cursor: Option<String>,
    pub error: Option<String>,
}

impl AccountSyncOutcome {
    pub fn merged(account_id: impl Into<String>, pages_fetched: usize, merge: &MergeOutcome) -> Self {
        let status = if merge.appended > 0 {
            AccountSyncStatus::Success
        } else {
            AccountSyncStatus::NoOp
        };
        Self {
            account_id: account_id.into(),
            status,
            appended: merge.appended,
            pages_fetched,
            cursor: Some(merge.cursor.clone()),
            error: None,
        }
    }

    pub fn failed(account_id: impl Into<String>, error: &Error) -> Self {
        Self {
            account_id: account_id.into(),
            status: AccountSyncStatus::from_error(error),
            appended: 0,
            pages_fetched: 0,
            cursor: None,
            error: Some(error.to_string()),
        }
    }
}

/// Per-account statuses for one user's sync run, keyed by account id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSyncReport {
    pub user_id: String,
    pub accounts: BTreeMap<String, AccountSyncOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl UserSyncReport {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            accounts: BTreeMap::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record(&mut self, outcome: AccountSyncOutcome) {
        self.accounts.insert(outcome.account_id.clone(), outcome);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn status_of(&self, account_id: &str) -> Option<AccountSyncStatus> {
        self.accounts.get(account_id).map(|o| o.status)
    }

    pub fn succeeded_count(&self) -> usize {
        self.accounts
            .values()
            .filter(|o| !o.status.is_failure())
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.accounts
            .values()
            .filter(|o| o.status.is_failure())
            .count()
    }

    pub fn appended_total(&self) -> usize {
        self.accounts.values().map(|o| o.appended).sum()
    }
}

/// A user whose sync never started because the directory lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStartFailure {
    pub user_id: String,
    pub error: String,
}

/// One pass over every user in the directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRunReport {
    pub users: Vec<UserSyncReport>,
    /// Users skipped for reasons other than having been removed.
    pub start_failures: Vec<UserStartFailure>,
}

impl SyncRunReport {
    pub fn failed_accounts(&self) -> usize {
        self.users.iter().map(|r| r.failed_count()).sum()
    }

    pub fn appended_total(&self) -> usize {
        self.users.iter().map(|r| r.appended_total()).sum()
    }

    /// True if any account failed or any user could not be started.
    pub fn has_failures(&self) -> bool {
        !self.start_failures.is_empty() || self.failed_accounts() > 0
    }
}
