//! txsync Core - Domain entities, merge logic, and traits.
//!
//! This crate owns the account ledger model and the merge step. It is
//! storage-agnostic and defines traits that are implemented by the
//! `storage-sqlite` crate and driven by the `connect` crate.

pub mod constants;
pub mod errors;
pub mod sync;
pub mod transactions;
pub mod users;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
