//! Wire models for the provider's `/transactions/sync` endpoint.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An added transaction as the provider reports it. Every field is optional
/// on the wire; required fields are enforced during normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChangeRecord {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub authorized_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<Vec<String>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pending: Option<bool>,
    #[serde(default)]
    pub iso_currency_code: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
}

/// One page of the change feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPage {
    pub added: Vec<RawChangeRecord>,
    pub next_cursor: String,
    pub has_more: bool,
    /// Provider corrections to already-delivered records. Not applied.
    pub modified_count: usize,
    /// Provider removals of already-delivered records. Not applied.
    pub removed_count: usize,
}

#[derive(Debug, Serialize)]
pub struct TransactionsSyncRequest<'a> {
    pub client_id: &'a str,
    pub secret: &'a str,
    pub access_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<&'a str>,
    pub count: u32,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsSyncResponse {
    #[serde(default)]
    pub added: Vec<RawChangeRecord>,
    #[serde(default)]
    pub modified: Vec<serde_json::Value>,
    #[serde(default)]
    pub removed: Vec<serde_json::Value>,
    pub next_cursor: String,
    pub has_more: bool,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl From<TransactionsSyncResponse> for SyncPage {
    fn from(response: TransactionsSyncResponse) -> Self {
        Self {
            added: response.added,
            next_cursor: response.next_cursor,
            has_more: response.has_more,
            modified_count: response.modified.len(),
            removed_count: response.removed.len(),
        }
    }
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct PlaidErrorBody {
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub display_message: Option<String>,
}
