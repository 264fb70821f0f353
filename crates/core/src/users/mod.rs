//! Users module - linked account model and directory trait.

mod users_model;
mod users_traits;

pub use users_model::LinkedAccount;
pub use users_traits::UserDirectoryTrait;
