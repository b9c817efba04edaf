use std::time::Duration;

use bon::Builder;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::ledger::{EventQuery, Ledger, LedgerEvent};

/// Default fullnode of the Movement testnet.
pub const DEFAULT_FULLNODE_URL: &str = "https://full.testnet.movementinfra.xyz/v1";

/// How failed fullnode requests are retried.
///
/// Only transport failures and `5xx` responses are retried. The delay doubles after every
/// attempt, starting at `base_delay`.
#[derive(Builder, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. `0` behaves like `1`.
    #[builder(default = 3)]
    pub max_attempts: u32,
    #[builder(default = Duration::from_millis(200))]
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::builder().build()
    }
}

impl RetryPolicy {
    /// No retries.
    pub fn none() -> Self {
        RetryPolicy::builder().max_attempts(1).build()
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }
}

/// A client for the REST API of an Aptos-compatible fullnode.
///
/// ```
/// use url_macro::url;
/// use x402_move_kit::fullnode_client::{FullnodeClient, RetryPolicy};
///
/// let client = FullnodeClient::new(url!("https://full.testnet.movementinfra.xyz/v1/"))
///     .with_retry_policy(RetryPolicy::none());
/// ```
#[derive(Debug, Clone)]
pub struct FullnodeClient {
    pub base_url: Url,
    pub client: reqwest::Client,
    pub retry: RetryPolicy,
    /// Per-request timeout.
    pub timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum FullnodeError {
    #[error("Fullnode URL cannot be a base: {0}")]
    InvalidBaseUrl(Url),
    #[error("HTTP request error: {0}")]
    HttpRequestError(#[from] reqwest::Error),
    #[error("Fullnode error {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl FullnodeError {
    fn is_retryable(&self) -> bool {
        match self {
            FullnodeError::InvalidBaseUrl(_) => false,
            FullnodeError::HttpRequestError(err) => !err.is_decode() && !err.is_builder(),
            FullnodeError::Status { status, .. } => status.is_server_error(),
        }
    }
}

impl FullnodeClient {
    pub fn new(base_url: Url) -> Self {
        FullnodeClient {
            base_url,
            client: reqwest::Client::new(),
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Build an endpoint URL. Segments are percent-encoded; a trailing slash on the base URL is
    /// ignored.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, FullnodeError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FullnodeError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET` a JSON document, retrying per the retry policy. A `404` is `Ok(None)`.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, FullnodeError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.get_once(url.clone()).await {
                Err(err) if attempt < attempts && err.is_retryable() => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(%url, attempt, "Fullnode request failed, retrying: {err}");

                    tokio::time::sleep(self.retry.delay(attempt)).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, FullnodeError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FullnodeError::Status { status, body });
        }

        Ok(Some(response.json().await?))
    }

    async fn get_required<T: DeserializeOwned>(&self, url: Url) -> Result<T, FullnodeError> {
        self.get_json(url).await?.ok_or(FullnodeError::Status {
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        })
    }
}

impl Ledger for FullnodeClient {
    type Error = FullnodeError;

    async fn transaction_by_hash(&self, hash: &str) -> Result<Option<Value>, Self::Error> {
        self.get_json(self.endpoint(&["transactions", "by_hash", hash])?)
            .await
    }

    async fn transaction_by_version(&self, version: u64) -> Result<Option<Value>, Self::Error> {
        let version = version.to_string();
        self.get_json(self.endpoint(&["transactions", "by_version", &version])?)
            .await
    }

    async fn account_resource(
        &self,
        account: &str,
        resource_type: &str,
    ) -> Result<Option<Value>, Self::Error> {
        self.get_json(self.endpoint(&["accounts", account, "resource", resource_type])?)
            .await
    }

    async fn account_resources(&self, account: &str) -> Result<Vec<Value>, Self::Error> {
        self.get_required(self.endpoint(&["accounts", account, "resources"])?)
            .await
    }

    async fn account_events(&self, query: &EventQuery) -> Result<Vec<LedgerEvent>, Self::Error> {
        let mut url = self.endpoint(&[
            "accounts",
            &query.account,
            "events",
            &query.event_handle,
            &query.field,
        ])?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(start) = query.start {
                pairs.append_pair("start", &start.to_string());
            }
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        self.get_required(url).await
    }
}
