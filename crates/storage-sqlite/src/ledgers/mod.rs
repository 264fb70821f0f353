//! SQLite storage implementation for account ledgers.

mod model;
mod repository;

pub use model::AccountLedgerDB;
pub use repository::LedgerRepository;
