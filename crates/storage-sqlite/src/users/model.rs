//! Database models for users and their linked accounts.

use diesel::prelude::*;
use txsync_core::users::LinkedAccount;

#[derive(Queryable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserDB {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub created_at: String,
}

/// A provider item linked by a user. `item_id` doubles as the ledger's
/// account id.
#[derive(Queryable, Insertable, Selectable, Clone)]
#[diesel(table_name = crate::schema::linked_accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(primary_key(item_id))]
pub struct LinkedAccountDB {
    pub item_id: String,
    pub user_id: String,
    pub access_token: String,
    pub created_at: String,
}

impl From<LinkedAccountDB> for LinkedAccount {
    fn from(db: LinkedAccountDB) -> Self {
        LinkedAccount::new(db.item_id, db.access_token)
    }
}
