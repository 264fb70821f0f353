//! HTTP client for the Plaid transactions feed.
//!
//! Implements [`TransactionsSyncApi`] over `POST /transactions/sync`. Client
//! credentials live on the client; the per-account access token is passed
//! with every call and never stored.

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use txsync_core::constants::{DEFAULT_PAGE_SIZE, DEFAULT_PAGE_TIMEOUT_MS, MAX_PAGE_SIZE};
use txsync_core::errors::{Error, FetchError, Result};

use crate::sync::{
    PlaidErrorBody, SyncPage, TransactionsSyncApi, TransactionsSyncRequest,
    TransactionsSyncResponse,
};

/// API version pinned in every request.
pub const PLAID_API_VERSION: &str = "2020-09-14";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaidEnvironment {
    Sandbox,
    Development,
    Production,
}

impl PlaidEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            PlaidEnvironment::Sandbox => "https://sandbox.plaid.com",
            PlaidEnvironment::Development => "https://development.plaid.com",
            PlaidEnvironment::Production => "https://production.plaid.com",
        }
    }
}

impl FromStr for PlaidEnvironment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(PlaidEnvironment::Sandbox),
            "development" => Ok(PlaidEnvironment::Development),
            "production" => Ok(PlaidEnvironment::Production),
            other => Err(Error::InvalidConfigValue(format!(
                "unknown Plaid environment '{}'",
                other
            ))),
        }
    }
}

/// Client credentials and request settings.
#[derive(Clone)]
pub struct PlaidConfig {
    pub base_url: String,
    pub client_id: String,
    pub secret: String,
    /// Records requested per page (`count`), 1..=500.
    pub page_size: u32,
    pub request_timeout: Duration,
}

impl PlaidConfig {
    pub fn new(
        environment: PlaidEnvironment,
        client_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: environment.base_url().to_string(),
            client_id: client_id.into(),
            secret: secret.into(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_millis(DEFAULT_PAGE_TIMEOUT_MS),
        }
    }
}

impl fmt::Debug for PlaidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaidConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("secret", &"<redacted>")
            .field("page_size", &self.page_size)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// HTTP client for the Plaid API.
///
/// # Example
///
/// ```ignore
/// let client = PlaidApiClient::new(PlaidConfig::new(PlaidEnvironment::Sandbox, id, secret))?;
/// let page = client.sync_page(&access_token, "").await?;
/// ```
#[derive(Debug, Clone)]
pub struct PlaidApiClient {
    client: reqwest::Client,
    config: PlaidConfig,
}

impl PlaidApiClient {
    /// Create a new Plaid API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the page size is out of range or the HTTP client
    /// cannot be initialized.
    pub fn new(mut config: PlaidConfig) -> Result<Self> {
        if config.page_size == 0 || config.page_size > MAX_PAGE_SIZE {
            return Err(Error::InvalidConfigValue(format!(
                "page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, config.page_size
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to initialize HTTP client: {}", e)))?;

        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Create default headers for API requests.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("Plaid-Version", HeaderValue::from_static(PLAID_API_VERSION));
        headers
    }

    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.config.request_timeout.as_millis() as u64)
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl TransactionsSyncApi for PlaidApiClient {
    async fn sync_page(&self, access_token: &str, cursor: &str) -> std::result::Result<SyncPage, FetchError> {
        let url = format!("{}/transactions/sync", self.config.base_url);
        let body = TransactionsSyncRequest {
            client_id: &self.config.client_id,
            secret: &self.config.secret,
            access_token,
            cursor: (!cursor.is_empty()).then_some(cursor),
            count: self.config.page_size,
        };
        debug!(
            "[Plaid] POST {} (cursor {})",
            url,
            if cursor.is_empty() { "<start>" } else { cursor }
        );

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        parse_sync_response(status, &text)
    }
}

/// Turns a raw HTTP status and body into a page or a fetch error.
pub fn parse_sync_response(status: u16, body: &str) -> std::result::Result<SyncPage, FetchError> {
    if !(200..300).contains(&status) {
        if let Ok(err) = serde_json::from_str::<PlaidErrorBody>(body) {
            let code = err
                .error_code
                .or(err.error_type)
                .unwrap_or_else(|| format!("HTTP_{}", status));
            let message = err
                .error_message
                .or(err.display_message)
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(FetchError::remote(status, code, message));
        }
        return Err(FetchError::remote(
            status,
            format!("HTTP_{}", status),
            body.chars().take(200).collect::<String>(),
        ));
    }

    serde_json::from_str::<TransactionsSyncResponse>(body)
        .map(SyncPage::from)
        .map_err(|e| {
            FetchError::MalformedPage(format!(
                "{} - {}",
                e,
                body.chars().take(200).collect::<String>()
            ))
        })
}
