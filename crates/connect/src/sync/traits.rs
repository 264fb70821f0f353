//! Traits defining the contract for the remote change feed.

use async_trait::async_trait;
use txsync_core::errors::FetchError;

use super::models::SyncPage;

/// One call of the provider's paginated sync primitive.
///
/// An empty `cursor` asks for the feed from the beginning of history.
#[async_trait]
pub trait TransactionsSyncApi: Send + Sync {
    async fn sync_page(&self, access_token: &str, cursor: &str) -> Result<SyncPage, FetchError>;
}
