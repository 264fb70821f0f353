//! SQLite storage implementation for the user directory.

mod model;
mod repository;

pub use model::{LinkedAccountDB, UserDB};
pub use repository::UserDirectoryRepository;
