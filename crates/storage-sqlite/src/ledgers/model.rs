//! Database models for account ledgers.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use txsync_core::errors::{Result, ValidationError};
use txsync_core::transactions::{AccountLedger, TransactionRecord};

use crate::errors::IntoCore;

/// One row per `(user_id, account_id)`. Transactions are stored as a JSON
/// array in arrival order.
#[derive(Queryable, Insertable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::account_ledgers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(primary_key(user_id, account_id))]
pub struct AccountLedgerDB {
    pub user_id: String,
    pub account_id: String,
    pub cursor: String,
    pub transactions_json: String,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl AccountLedgerDB {
    pub fn from_domain(ledger: &AccountLedger) -> Result<Self> {
        Ok(Self {
            user_id: ledger.user_id.clone(),
            account_id: ledger.account_id.clone(),
            cursor: ledger.cursor.clone(),
            transactions_json: serde_json::to_string(&ledger.transactions).into_core()?,
            version: ledger.version,
            created_at: ledger.created_at.to_rfc3339(),
            updated_at: ledger.updated_at.to_rfc3339(),
        })
    }

    pub fn into_domain(self) -> Result<AccountLedger> {
        let transactions: Vec<TransactionRecord> =
            serde_json::from_str(&self.transactions_json).into_core()?;
        Ok(AccountLedger {
            user_id: self.user_id,
            account_id: self.account_id,
            cursor: self.cursor,
            transactions,
            version: self.version,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ValidationError::DateTimeParse(e).into())
}
