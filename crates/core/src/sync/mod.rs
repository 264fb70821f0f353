//! Sync domain models and per-account locking.

mod account_locks;
mod sync_model;

pub use account_locks::*;
pub use sync_model::*;
