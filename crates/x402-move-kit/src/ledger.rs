//! Read access to a Move ledger.

use std::collections::HashMap;

use bon::Builder;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use x402_move_core::types::render_scalar;

/// Read-only queries against a Move ledger, modelled on the fullnode REST API.
///
/// Implementations decide transport, timeouts and retries. Records are returned as raw JSON and
/// decoded by the verification engine.
pub trait Ledger {
    type Error: std::error::Error + Send + Sync + 'static;

    /// `GET /transactions/by_hash/{hash}`. `None` when the ledger does not know the hash.
    fn transaction_by_hash(
        &self,
        hash: &str,
    ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send;

    /// `GET /transactions/by_version/{version}`.
    fn transaction_by_version(
        &self,
        version: u64,
    ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send;

    /// `GET /accounts/{account}/resource/{resource_type}`. `None` when the account has no such
    /// resource.
    fn account_resource(
        &self,
        account: &str,
        resource_type: &str,
    ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send;

    /// `GET /accounts/{account}/resources`.
    fn account_resources(
        &self,
        account: &str,
    ) -> impl Future<Output = Result<Vec<Value>, Self::Error>> + Send;

    /// `GET /accounts/{account}/events/{event_handle}/{field}`.
    fn account_events(
        &self,
        query: &EventQuery,
    ) -> impl Future<Output = Result<Vec<LedgerEvent>, Self::Error>> + Send;
}

/// An event stream query: the events of `field` in the `event_handle` resource of `account`.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    #[builder(into)]
    pub account: String,
    /// Resource holding the event handle, e.g. `0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>`.
    #[builder(into)]
    pub event_handle: String,
    /// Event handle field, e.g. `deposit_events`.
    #[builder(into)]
    pub field: String,
    /// First sequence number to return.
    pub start: Option<u64>,
    pub limit: Option<u32>,
}

/// An event as returned by the fullnode. Numeric fields are kept in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Version of the transaction that emitted the event.
    #[serde(default, deserialize_with = "scalar")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub sequence_number: Option<String>,
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

impl LedgerEvent {
    /// The transaction version as a number, if it parses.
    pub fn version_number(&self) -> Option<u64> {
        self.version.as_deref()?.parse().ok()
    }

    /// A field of `data` rendered as text. Missing and `null` fields are `None`.
    pub fn data_field(&self, name: &str) -> Option<String> {
        self.data
            .get(name)
            .filter(|v| !v.is_null())
            .map(render_scalar)
    }
}

fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_null()).map(|v| render_scalar(&v)))
}

/// An in-memory ledger, for tests and local tooling.
///
/// ```
/// use serde_json::json;
/// use x402_move_kit::ledger::MemoryLedger;
///
/// let mut ledger = MemoryLedger::default();
/// ledger
///     .insert_transaction(json!({"type": "pending_transaction", "hash": "0xabc"}))
///     .insert_resource("0xA11CE", json!({"type": "0x1::account::Account", "data": {}}));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    transactions: HashMap<String, Value>,
    versions: HashMap<u64, String>,
    resources: HashMap<String, Vec<Value>>,
    events: HashMap<(String, String, String), Vec<LedgerEvent>>,
}

impl MemoryLedger {
    /// Store a transaction under its `hash`, and under its `version` when it has one.
    pub fn insert_transaction(&mut self, transaction: Value) -> &mut Self {
        let hash = transaction
            .get("hash")
            .map(render_scalar)
            .unwrap_or_default();
        let version = transaction
            .get("version")
            .map(render_scalar)
            .and_then(|v| v.parse::<u64>().ok());

        if let Some(version) = version {
            self.versions.insert(version, hash.clone());
        }
        self.transactions.insert(hash, transaction);
        self
    }

    /// Store a resource (`{"type": ..., "data": ...}`) on an account, replacing any resource of
    /// the same type.
    pub fn insert_resource(&mut self, account: &str, resource: Value) -> &mut Self {
        let resources = self.resources.entry(account.to_ascii_lowercase()).or_default();
        let resource_type = resource.get("type").cloned();
        resources.retain(|r| r.get("type") != resource_type.as_ref());
        resources.push(resource);
        self
    }

    /// Append events to a stream.
    pub fn insert_events(
        &mut self,
        account: &str,
        event_handle: &str,
        field: &str,
        events: impl IntoIterator<Item = LedgerEvent>,
    ) -> &mut Self {
        self.events
            .entry(stream_key(account, event_handle, field))
            .or_default()
            .extend(events);
        self
    }
}

fn stream_key(account: &str, event_handle: &str, field: &str) -> (String, String, String) {
    (
        account.to_ascii_lowercase(),
        event_handle.to_string(),
        field.to_string(),
    )
}

impl Ledger for MemoryLedger {
    type Error = std::convert::Infallible;

    async fn transaction_by_hash(&self, hash: &str) -> Result<Option<Value>, Self::Error> {
        Ok(self.transactions.get(hash).cloned())
    }

    async fn transaction_by_version(&self, version: u64) -> Result<Option<Value>, Self::Error> {
        Ok(self
            .versions
            .get(&version)
            .and_then(|hash| self.transactions.get(hash))
            .cloned())
    }

    async fn account_resource(
        &self,
        account: &str,
        resource_type: &str,
    ) -> Result<Option<Value>, Self::Error> {
        Ok(self
            .resources
            .get(&account.to_ascii_lowercase())
            .and_then(|resources| {
                resources
                    .iter()
                    .find(|r| r.get("type").and_then(Value::as_str) == Some(resource_type))
            })
            .cloned())
    }

    async fn account_resources(&self, account: &str) -> Result<Vec<Value>, Self::Error> {
        Ok(self
            .resources
            .get(&account.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn account_events(&self, query: &EventQuery) -> Result<Vec<LedgerEvent>, Self::Error> {
        let events = self
            .events
            .get(&stream_key(&query.account, &query.event_handle, &query.field))
            .map(Vec::as_slice)
            .unwrap_or_default();

        let start = query.start.unwrap_or(0);
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);

        Ok(events
            .iter()
            .filter(|e| {
                e.sequence_number
                    .as_deref()
                    .and_then(|s| s.parse::<u64>().ok())
                    .is_none_or(|seq| seq >= start)
            })
            .take(limit)
            .cloned()
            .collect())
    }
}
