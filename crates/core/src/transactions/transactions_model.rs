//! Ledger domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One financial event as stored in an account ledger.
///
/// `date` and `authorized_date` are ISO 8601 calendar dates (`YYYY-MM-DD`);
/// the store has no native date type so they are kept as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Provider-assigned identifier. Older records may not carry one.
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// Signed amount; positive means money left the account.
    pub amount: Decimal,
    #[serde(default)]
    pub merchant_name: Option<String>,
    pub date: String,
    #[serde(default)]
    pub authorized_date: Option<String>,
    /// Coarse to fine category path.
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub iso_currency_code: Option<String>,
    /// Provider's own account identifier, when the feed reports one.
    #[serde(default)]
    pub provider_account_id: Option<String>,
}

impl TransactionRecord {
    pub fn new(transaction_id: Option<String>, amount: Decimal, date: impl Into<String>) -> Self {
        Self {
            transaction_id,
            amount,
            merchant_name: None,
            date: date.into(),
            authorized_date: None,
            category: Vec::new(),
            name: None,
            pending: false,
            iso_currency_code: None,
            provider_account_id: None,
        }
    }

    /// The identifier used for dedup. Empty strings count as no identifier.
    pub fn dedup_key(&self) -> Option<&str> {
        self.transaction_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// The persisted, deduplicated, ordered history plus cursor for one linked
/// account of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountLedger {
    pub user_id: String,
    pub account_id: String,
    /// Opaque provider cursor; presenting it again resumes the feed here.
    pub cursor: String,
    /// Arrival order, not chronological order.
    pub transactions: Vec<TransactionRecord>,
    /// Bumped on every successful write; 0 means never stored.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountLedger {
    /// A ledger that has not been stored yet.
    pub fn new(
        user_id: impl Into<String>,
        account_id: impl Into<String>,
        cursor: impl Into<String>,
        transactions: Vec<TransactionRecord>,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            account_id: account_id.into(),
            cursor: cursor.into(),
            transactions,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Result of draining every page of one feed sweep. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncBatch {
    pub transactions: Vec<TransactionRecord>,
    /// Cursor marking the end of the sweep.
    pub cursor: String,
    #[serde(default)]
    pub pages_fetched: usize,
}

impl SyncBatch {
    pub fn new(transactions: Vec<TransactionRecord>, cursor: impl Into<String>) -> Self {
        Self {
            transactions,
            cursor: cursor.into(),
            pages_fetched: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeKind {
    /// First merge for the account; the ledger was created.
    Created,
    /// At least one new record was appended.
    Appended,
    /// Nothing new; only the cursor was rewritten.
    NoOp,
}

/// What a successful merge did to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    pub kind: MergeKind,
    pub appended: usize,
    pub duplicates_skipped: usize,
    pub cursor: String,
    /// Ledger version after the write.
    pub version: i64,
}
