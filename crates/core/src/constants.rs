/// Upper bound on pages drained in one sweep.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Records requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest page size the provider accepts.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Per-call timeout for a single page request, in milliseconds.
pub const DEFAULT_PAGE_TIMEOUT_MS: u64 = 30_000;

/// Accounts of one user synced at the same time.
pub const DEFAULT_MAX_CONCURRENT_ACCOUNTS: usize = 4;

/// Date format used for stored transaction dates.
pub const TRANSACTION_DATE_FORMAT: &str = "%Y-%m-%d";
