//! Synthetic data served in preview mode.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use x402_move_kit::{
    balance::NATIVE_DECIMALS,
    core::receipt::{Receipt, ReceiptSettlement},
    history::{ActivityItem, Direction},
};

use crate::config::Config;

/// Balance reported in preview mode: 12.345 coins.
pub const PREVIEW_BALANCE: &str = "1234500000";

/// Coin type reported in preview mode when none is configured.
pub const PREVIEW_COIN: &str = "MOVE";

/// A payment made by the preview agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewPayment {
    pub id: String,
    #[serde(flatten)]
    pub receipt: Receipt,
}

/// Three payments of the configured price, one minute apart, newest first.
pub fn sample_payments(config: &Config, now: DateTime<Utc>) -> Vec<PreviewPayment> {
    let expected = config.expected_payment();
    let millis = now.timestamp_millis();

    (0..3)
        .map(|i| {
            let at = now - Duration::minutes(i);
            let mut receipt = Receipt::preview(
                format!("proof_{}", at.timestamp_millis()),
                config.chain_id.as_str(),
                &expected,
                at,
            );
            receipt.payer = Some("0xAGENT".to_string());

            PreviewPayment {
                id: format!("preview_{millis}_{i}"),
                receipt,
            }
        })
        .collect()
}

/// Five coin movements of `address` over the last hours, newest first.
pub fn sample_activity(address: Option<&str>, now: DateTime<Utc>) -> Vec<ActivityItem> {
    let millis = now.timestamp_millis();
    let me = address.unwrap_or("0xYOU");

    [
        (Direction::Received, 250_000_000, "0xA11CE", Duration::minutes(2), "rx"),
        (Direction::Sent, 75_000_000, "0xB0B", Duration::minutes(9), "tx"),
        (Direction::Received, 120_000_000, "0xC4R0L", Duration::minutes(25), "rx2"),
        (Direction::Sent, 10_000_000, "0xD4VE", Duration::hours(2), "tx2"),
        (Direction::Received, 5_000_000, me, Duration::hours(7), "misc"),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (direction, amount, counterparty, age, tag))| ActivityItem {
        id: format!("preview_{millis}_{i}"),
        direction,
        amount: amount.to_string(),
        tx_version: None,
        status: ReceiptSettlement::Preview,
        tx_hash: Some(format!("preview_{tag}_{millis}")),
        timestamp: Some((now - age).timestamp_millis().to_string()),
        counterparty: Some(counterparty.to_string()),
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewBalance {
    pub address: Option<String>,
    pub coin_type: String,
    pub decimals: u8,
    pub value: &'static str,
}

pub fn sample_balance(config: &Config, address: Option<String>) -> PreviewBalance {
    PreviewBalance {
        address,
        coin_type: config
            .native_coin_type
            .clone()
            .unwrap_or_else(|| PREVIEW_COIN.to_string()),
        decimals: NATIVE_DECIMALS,
        value: PREVIEW_BALANCE,
    }
}
