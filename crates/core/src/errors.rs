//! Core error types for transaction sync.
//!
//! This module defines database-agnostic and transport-agnostic error types.
//! Storage-specific errors (from Diesel, SQLite, etc.) are converted to these
//! types by the storage layer; HTTP errors are converted by the connect layer.

use chrono::ParseError as ChronoParseError;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the sync core.
///
/// The variants map one-to-one onto the per-account outcomes reported to
/// callers: a missing user, a failed fetch, or a failed persistence step.
/// Nothing here is retried internally.
#[derive(Error, Debug)]
pub enum Error {
    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("Transactions fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// True when the error came from the store (unavailable, conflict, ...).
    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, Error::Database(_))
    }
}

/// Failures of the paginated remote sync primitive.
///
/// Every variant aborts the whole sweep: no partial batch and no cursor is
/// handed back, so the persisted cursor stays at the last known-good point.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The provider answered with an error body.
    #[error("Provider error ({status}) {code}: {message}")]
    Remote {
        status: u16,
        code: String,
        message: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// A single page call exceeded the configured timeout.
    #[error("Page request timed out after {0} ms")]
    Timeout(u64),

    /// The page body could not be decoded.
    #[error("Malformed page: {0}")]
    MalformedPage(String),

    /// A record on the page is missing a required field. The whole batch is
    /// rejected rather than dropping the record.
    #[error("Malformed record {}: missing required field '{field}'", .transaction_id.as_deref().unwrap_or("<no id>"))]
    MalformedRecord {
        transaction_id: Option<String>,
        field: String,
    },

    #[error("Pagination exceeded max pages ({0})")]
    PageLimitExceeded(usize),

    /// Provider claimed more pages but handed back the cursor it was given.
    #[error("Pagination appears stuck at cursor '{0}'")]
    StuckCursor(String),
}

impl FetchError {
    pub fn remote(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn malformed_record(transaction_id: Option<String>, field: impl Into<String>) -> Self {
        Self::MalformedRecord {
            transaction_id,
            field: field.into(),
        }
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The stored ledger changed under the writer (optimistic check failed).
    #[error("Write conflict on ledger {user_id}/{account_id}")]
    WriteConflict { user_id: String, account_id: String },

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Unexpected(err.to_string())
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
