//! Repository for account ledger persistence.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use log::{debug, warn};
use std::sync::Arc;

use txsync_core::errors::{DatabaseError, Error, Result};
use txsync_core::transactions::{AccountLedger, LedgerRepositoryTrait};

use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::account_ledgers;

use super::model::AccountLedgerDB;

pub struct LedgerRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl LedgerRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl LedgerRepositoryTrait for LedgerRepository {
    fn get(&self, user_id: &str, account_id: &str) -> Result<Option<AccountLedger>> {
        let mut conn = get_connection(&self.pool)?;

        let row = account_ledgers::table
            .find((user_id, account_id))
            .select(AccountLedgerDB::as_select())
            .first::<AccountLedgerDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        row.map(AccountLedgerDB::into_domain).transpose()
    }

    fn list_by_user(&self, user_id: &str) -> Result<Vec<AccountLedger>> {
        let mut conn = get_connection(&self.pool)?;

        account_ledgers::table
            .filter(account_ledgers::user_id.eq(user_id))
            .order(account_ledgers::account_id.asc())
            .select(AccountLedgerDB::as_select())
            .load::<AccountLedgerDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(AccountLedgerDB::into_domain)
            .collect()
    }

    /// Writes the whole ledger as one row replacement.
    ///
    /// The stored version is read and compared inside the writer's immediate
    /// transaction, so the check and the write cannot be split by another
    /// writer.
    async fn upsert(
        &self,
        ledger: AccountLedger,
        expected_version: Option<i64>,
    ) -> Result<AccountLedger> {
        self.writer
            .exec(move |conn| {
                let current: Option<i64> = account_ledgers::table
                    .find((&ledger.user_id, &ledger.account_id))
                    .select(account_ledgers::version)
                    .first::<i64>(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                if current != expected_version {
                    warn!(
                        "Ledger {}/{} changed under writer: expected version {:?}, found {:?}",
                        ledger.user_id, ledger.account_id, expected_version, current
                    );
                    return Err(Error::Database(DatabaseError::WriteConflict {
                        user_id: ledger.user_id,
                        account_id: ledger.account_id,
                    }));
                }

                let mut stored = ledger;
                stored.version = current.unwrap_or(0) + 1;
                let row = AccountLedgerDB::from_domain(&stored)?;

                match current {
                    None => {
                        diesel::insert_into(account_ledgers::table)
                            .values(&row)
                            .execute(conn)
                            .map_err(StorageError::from)?;
                    }
                    Some(_) => {
                        diesel::update(
                            account_ledgers::table.find((&row.user_id, &row.account_id)),
                        )
                        .set((
                            account_ledgers::cursor.eq(&row.cursor),
                            account_ledgers::transactions_json.eq(&row.transactions_json),
                            account_ledgers::version.eq(row.version),
                            account_ledgers::updated_at.eq(&row.updated_at),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    }
                }

                debug!(
                    "Stored ledger {}/{} at version {} ({} records)",
                    stored.user_id,
                    stored.account_id,
                    stored.version,
                    stored.len()
                );
                Ok(stored)
            })
            .await
    }
}
