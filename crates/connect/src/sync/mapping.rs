//! Normalization of provider records into ledger records.
//!
//! A record without an amount or a date cannot be stored; rather than
//! dropping it, the whole page is rejected so the cursor does not move past
//! it.

use txsync_core::constants::TRANSACTION_DATE_FORMAT;
use txsync_core::errors::FetchError;
use txsync_core::transactions::TransactionRecord;

use super::models::RawChangeRecord;

pub fn normalize_record(raw: RawChangeRecord) -> Result<TransactionRecord, FetchError> {
    let amount = raw
        .amount
        .ok_or_else(|| FetchError::malformed_record(raw.transaction_id.clone(), "amount"))?;
    let date = raw
        .date
        .ok_or_else(|| FetchError::malformed_record(raw.transaction_id.clone(), "date"))?;

    Ok(TransactionRecord {
        transaction_id: raw.transaction_id,
        amount,
        merchant_name: raw.merchant_name,
        date: date.format(TRANSACTION_DATE_FORMAT).to_string(),
        authorized_date: raw
            .authorized_date
            .map(|d| d.format(TRANSACTION_DATE_FORMAT).to_string()),
        category: raw.category.unwrap_or_default(),
        name: raw.name,
        pending: raw.pending.unwrap_or(false),
        iso_currency_code: raw.iso_currency_code,
        provider_account_id: raw.account_id,
    })
}

/// Normalizes a page in provider order, failing on the first bad record.
pub fn normalize_page(added: Vec<RawChangeRecord>) -> Result<Vec<TransactionRecord>, FetchError> {
    added.into_iter().map(normalize_record).collect()
}
