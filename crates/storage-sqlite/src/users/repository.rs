//! Read-only user directory over the `users` and `linked_accounts` tables.

use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use txsync_core::errors::{Error, Result};
use txsync_core::users::{LinkedAccount, UserDirectoryTrait};

use crate::db::get_connection;
use crate::errors::StorageError;
use crate::schema::{linked_accounts, users};

use super::model::LinkedAccountDB;

pub struct UserDirectoryRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl UserDirectoryRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    fn user_exists_on(conn: &mut SqliteConnection, user_id: &str) -> Result<bool> {
        diesel::select(exists(users::table.find(user_id)))
            .get_result::<bool>(conn)
            .map_err(|e| StorageError::from(e).into())
    }
}

impl UserDirectoryTrait for UserDirectoryRepository {
    fn user_exists(&self, user_id: &str) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;
        Self::user_exists_on(&mut conn, user_id)
    }

    fn accounts_of(&self, user_id: &str) -> Result<Vec<LinkedAccount>> {
        let mut conn = get_connection(&self.pool)?;

        if !Self::user_exists_on(&mut conn, user_id)? {
            return Err(Error::UserNotFound(user_id.to_string()));
        }

        let rows = linked_accounts::table
            .filter(linked_accounts::user_id.eq(user_id))
            .order((linked_accounts::created_at.asc(), linked_accounts::item_id.asc()))
            .select(LinkedAccountDB::as_select())
            .load::<LinkedAccountDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(LinkedAccount::from).collect())
    }

    fn list_user_ids(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;

        users::table
            .select(users::id)
            .order(users::created_at.asc())
            .load::<String>(&mut conn)
            .map_err(|e| StorageError::from(e).into())
    }
}
