//! User directory trait.

use super::users_model::LinkedAccount;
use crate::errors::Result;

/// Read-only view of registered users and their linked accounts.
///
/// The sync core never creates or deletes users or accounts.
pub trait UserDirectoryTrait: Send + Sync {
    fn user_exists(&self, user_id: &str) -> Result<bool>;

    /// Linked accounts of a user, in registration order.
    ///
    /// Fails with `Error::UserNotFound` when the user does not exist.
    fn accounts_of(&self, user_id: &str) -> Result<Vec<LinkedAccount>>;

    /// Every registered user id.
    fn list_user_ids(&self) -> Result<Vec<String>>;
}
