//! Payment history and account activity, read from ledger event streams.

use std::cmp::Reverse;

use bon::Builder;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use x402_move_core::{
    payment::{AcceptedFunction, COIN_TRANSFER, NATIVE_TRANSFER},
    receipt::ReceiptSettlement,
    types::render_scalar,
};

use crate::ledger::{EventQuery, Ledger, LedgerEvent};

/// Treasury event handle field holding settled payments.
pub const PAYMENT_EVENTS_FIELD: &str = "payment_events";
pub const DEFAULT_PAYMENT_LIMIT: u32 = 25;

pub const DEPOSIT_EVENTS_FIELD: &str = "deposit_events";
pub const WITHDRAW_EVENTS_FIELD: &str = "withdraw_events";
pub const ACTIVITY_LIMIT: u32 = 12;

/// Native coin of the Aptos framework, used when no native coin is configured.
pub const DEFAULT_NATIVE_COIN: &str = "0x1::aptos_coin::AptosCoin";

/// `0x1::coin::CoinStore<coin_type>`.
pub fn coin_store_type(coin_type: &str) -> String {
    format!("0x1::coin::CoinStore<{coin_type}>")
}

/// A payment settled through the merchant treasury.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// The on-chain payment id, or `<payer>:<sequence number>`.
    pub id: String,
    pub tx_version: Option<String>,
    pub sequence_number: Option<String>,
    pub settlement: ReceiptSettlement,
    pub token: Option<String>,
    pub amount: String,
    pub merchant: String,
    pub payer: String,
    pub function: String,
    pub settled_at: Option<String>,
}

/// A query for the treasury payments made by one payer.
///
/// ```
/// use x402_move_kit::history::PaymentHistory;
///
/// let query = PaymentHistory::builder()
///     .package_address("0xDEO")
///     .payer("0xAGENT")
///     .token("deo::usdc::USDC")
///     .build();
/// assert_eq!(query.event_handle(), "0xDEO::treasury::Treasury");
/// ```
#[derive(Builder, Debug, Clone)]
pub struct PaymentHistory {
    #[builder(into)]
    pub package_address: String,
    #[builder(into)]
    pub payer: String,
    /// Token reported on every record.
    #[builder(into)]
    pub token: Option<String>,
    pub start: Option<u64>,
    #[builder(default = DEFAULT_PAYMENT_LIMIT)]
    pub limit: u32,
}

impl PaymentHistory {
    pub fn event_handle(&self) -> String {
        format!("{}::treasury::Treasury", self.package_address)
    }

    pub async fn fetch<L: Ledger>(&self, ledger: &L) -> Result<Vec<PaymentRecord>, L::Error> {
        let query = EventQuery::builder()
            .account(self.payer.as_str())
            .event_handle(self.event_handle())
            .field(PAYMENT_EVENTS_FIELD)
            .maybe_start(self.start)
            .limit(self.limit)
            .build();

        let events = ledger.account_events(&query).await?;
        Ok(events.iter().map(|e| self.record(e)).collect())
    }

    fn record(&self, event: &LedgerEvent) -> PaymentRecord {
        let sequence_number = event.sequence_number.clone();
        let id = event.data_field("payment_id").unwrap_or_else(|| {
            format!(
                "{}:{}",
                self.payer,
                sequence_number.as_deref().unwrap_or("?")
            )
        });

        PaymentRecord {
            id,
            tx_version: event.version.clone(),
            sequence_number,
            settlement: ReceiptSettlement::Final,
            token: self.token.clone(),
            amount: event.data_field("amount").unwrap_or_default(),
            merchant: event.data_field("merchant").unwrap_or_default(),
            payer: event
                .data_field("payer")
                .unwrap_or_else(|| self.payer.clone()),
            function: AcceptedFunction::pay_merchant(&self.package_address)
                .function_id()
                .to_string(),
            settled_at: event.data_field("settled_at"),
        }
    }
}

/// Direction of a coin movement, seen from the queried account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Received,
    Sent,
}

/// A deposit or withdrawal of the native coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: String,
    pub direction: Direction,
    pub amount: String,
    pub tx_version: Option<String>,
    pub status: ReceiptSettlement,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub timestamp: Option<String>,
    pub counterparty: Option<String>,
}

/// First sequence number of the last `limit` events of a stream holding `counter` events.
pub fn compute_start(counter: u64, limit: u64) -> u64 {
    counter.saturating_sub(limit)
}

/// The latest deposits and withdrawals of `coin_type` on `address`, newest first.
///
/// Failing to read the coin store is an error. A failing event stream contributes nothing and a
/// failing transaction lookup leaves the hash, timestamp and counterparty empty.
pub async fn recent_activity<L: Ledger>(
    ledger: &L,
    address: &str,
    coin_type: &str,
) -> Result<Vec<ActivityItem>, L::Error> {
    let store_type = coin_store_type(coin_type);
    let store = ledger.account_resource(address, &store_type).await?;

    let counter = |field: &str| -> Option<u64> {
        let counter = store
            .as_ref()
            .and_then(|s| s.pointer(&format!("/data/{field}/counter")))
            .map(render_scalar)
            .unwrap_or_else(|| "0".to_string());
        counter.parse().ok()
    };

    let query = |field: &str| {
        EventQuery::builder()
            .account(address)
            .event_handle(store_type.as_str())
            .field(field)
            .maybe_start(counter(field).map(|c| compute_start(c, ACTIVITY_LIMIT.into())))
            .limit(ACTIVITY_LIMIT)
            .build()
    };
    let deposit_query = query(DEPOSIT_EVENTS_FIELD);
    let withdraw_query = query(WITHDRAW_EVENTS_FIELD);

    let (deposits, withdraws) = futures_util::future::join(
        ledger.account_events(&deposit_query),
        ledger.account_events(&withdraw_query),
    )
    .await;

    let mut items: Vec<ActivityItem> = deposits
        .unwrap_or_else(|err| stream_failed(DEPOSIT_EVENTS_FIELD, err))
        .iter()
        .map(|e| activity_item(e, Direction::Received))
        .chain(
            withdraws
                .unwrap_or_else(|err| stream_failed(WITHDRAW_EVENTS_FIELD, err))
                .iter()
                .map(|e| activity_item(e, Direction::Sent)),
        )
        .collect();

    items.sort_by_key(|item| {
        Reverse(
            item.tx_version
                .as_deref()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0),
        )
    });
    items.truncate(ACTIVITY_LIMIT as usize);

    let transactions = join_all(items.iter().map(|item| async {
        let version = item.tx_version.as_deref()?.parse::<u64>().ok()?;
        ledger.transaction_by_version(version).await.ok().flatten()
    }))
    .await;

    for (item, transaction) in items.iter_mut().zip(transactions) {
        if let Some(transaction) = transaction {
            enrich(item, &transaction);
        }
    }

    Ok(items)
}

fn stream_failed<E: std::error::Error>(field: &str, err: E) -> Vec<LedgerEvent> {
    #[cfg(feature = "tracing")]
    tracing::warn!(field, "Failed to read event stream: {err}");
    #[cfg(not(feature = "tracing"))]
    let _ = (field, err);

    Vec::new()
}

fn activity_item(event: &LedgerEvent, direction: Direction) -> ActivityItem {
    let prefix = match direction {
        Direction::Received => "dep",
        Direction::Sent => "wd",
    };

    ActivityItem {
        id: format!(
            "{prefix}:{}:{}",
            event.version.as_deref().unwrap_or("?"),
            event.sequence_number.as_deref().unwrap_or("?")
        ),
        direction,
        amount: event.data_field("amount").unwrap_or_default(),
        tx_version: event.version.clone(),
        status: ReceiptSettlement::Final,
        tx_hash: None,
        timestamp: None,
        counterparty: None,
    }
}

fn enrich(item: &mut ActivityItem, transaction: &Value) {
    let text = |pointer: &str| {
        transaction
            .pointer(pointer)
            .filter(|v| !v.is_null())
            .map(render_scalar)
            .filter(|s| !s.is_empty())
    };

    item.tx_hash = text("/hash");
    item.timestamp = text("/timestamp");
    item.counterparty = match item.direction {
        Direction::Received => text("/sender"),
        Direction::Sent => {
            let function = text("/payload/function").unwrap_or_default();
            if function.ends_with(NATIVE_TRANSFER) || function.ends_with(COIN_TRANSFER) {
                text("/payload/arguments/0")
            } else {
                None
            }
        }
    };
}
