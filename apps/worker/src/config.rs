use std::time::Duration;

use anyhow::{anyhow, Context};
use txsync_connect::PlaidEnvironment;
use txsync_core::constants::{
    DEFAULT_MAX_CONCURRENT_ACCOUNTS, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE,
    DEFAULT_PAGE_TIMEOUT_MS, MAX_PAGE_SIZE,
};

/// Default interval between scheduled runs: 4 hours.
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 4 * 60 * 60;

pub struct Config {
    pub db_path: String,
    pub plaid_client_id: String,
    pub plaid_secret: String,
    pub plaid_env: PlaidEnvironment,
    pub page_size: u32,
    pub max_pages: usize,
    pub request_timeout: Duration,
    pub max_concurrent_accounts: usize,
    pub sync_interval: Duration,
    pub run_once: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{} must be set", key))
        };

        let db_path = lookup("TXSYNC_DB_PATH").unwrap_or_else(|| "./db/txsync.db".into());
        let plaid_client_id = required("PLAID_CLIENT_ID")?;
        let plaid_secret = required("PLAID_SECRET")?;
        let plaid_env: PlaidEnvironment = lookup("PLAID_ENV")
            .unwrap_or_else(|| "sandbox".into())
            .parse()
            .context("Invalid PLAID_ENV")?;

        let page_size: u32 = parse_or(&lookup, "TXSYNC_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(anyhow!(
                "TXSYNC_PAGE_SIZE must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                page_size
            ));
        }
        let max_pages: usize = parse_or(&lookup, "TXSYNC_MAX_PAGES", DEFAULT_MAX_PAGES)?;
        let timeout_ms: u64 =
            parse_or(&lookup, "TXSYNC_REQUEST_TIMEOUT_MS", DEFAULT_PAGE_TIMEOUT_MS)?;
        let max_concurrent_accounts: usize = parse_or(
            &lookup,
            "TXSYNC_MAX_CONCURRENT_ACCOUNTS",
            DEFAULT_MAX_CONCURRENT_ACCOUNTS,
        )?;
        let interval_secs: u64 =
            parse_or(&lookup, "TXSYNC_SYNC_INTERVAL_SECS", DEFAULT_SYNC_INTERVAL_SECS)?;
        let run_once = lookup("TXSYNC_RUN_ONCE")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            db_path,
            plaid_client_id,
            plaid_secret,
            plaid_env,
            page_size,
            max_pages,
            request_timeout: Duration::from_millis(timeout_ms),
            max_concurrent_accounts: max_concurrent_accounts.max(1),
            sync_interval: Duration::from_secs(interval_secs.max(1)),
            run_once,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {} '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("PLAID_CLIENT_ID", "client"),
            ("PLAID_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, "./db/txsync.db");
        assert_eq!(config.plaid_env, PlaidEnvironment::Sandbox);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.max_pages, 10_000);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_concurrent_accounts, 4);
        assert_eq!(config.sync_interval, Duration::from_secs(4 * 60 * 60));
        assert!(!config.run_once);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PLAID_CLIENT_ID", "client"),
            ("PLAID_SECRET", "secret"),
            ("PLAID_ENV", "production"),
            ("TXSYNC_DB_PATH", "/data/ledgers.db"),
            ("TXSYNC_PAGE_SIZE", "500"),
            ("TXSYNC_RUN_ONCE", "true"),
        ]))
        .unwrap();

        assert_eq!(config.plaid_env, PlaidEnvironment::Production);
        assert_eq!(config.db_path, "/data/ledgers.db");
        assert_eq!(config.page_size, 500);
        assert!(config.run_once);
    }

    #[test]
    fn test_missing_credentials_is_an_error() {
        let err = Config::from_lookup(lookup(&[("PLAID_CLIENT_ID", "client")]))
            .err()
            .unwrap();
        assert!(err.to_string().contains("PLAID_SECRET"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let base = [("PLAID_CLIENT_ID", "client"), ("PLAID_SECRET", "secret")];

        let mut pairs = base.to_vec();
        pairs.push(("TXSYNC_PAGE_SIZE", "0"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());

        let mut pairs = base.to_vec();
        pairs.push(("TXSYNC_MAX_PAGES", "lots"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());

        let mut pairs = base.to_vec();
        pairs.push(("PLAID_ENV", "staging"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }
}
