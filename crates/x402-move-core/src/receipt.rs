//! Normalized payment receipts returned to HTTP clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    payment::ExpectedPayment,
    types::{Amount, Base64EncodedHeader},
    verifier::{Acceptance, Settlement},
};

/// Settlement stage reported in a receipt.
///
/// `Preview` receipts are synthesized without consulting the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptSettlement {
    Preview,
    Fast,
    Final,
}

impl From<Settlement> for ReceiptSettlement {
    fn from(settlement: Settlement) -> Self {
        match settlement {
            Settlement::Fast => ReceiptSettlement::Fast,
            Settlement::Final => ReceiptSettlement::Final,
        }
    }
}

/// A verified payment, as returned by the receipt endpoint and the `X-Payment-Response` header.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use serde_json::json;
/// use x402_move_core::{payment::ExpectedPayment, receipt::Receipt};
///
/// let expected = ExpectedPayment::builder()
///     .merchant("0xMERCHANT")
///     .amount("1000")
///     .package_address("0xDEO")
///     .token("deo::usdc::USDC")
///     .build();
/// let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
///
/// let receipt = Receipt::preview("0xabc", "movement_testnet", &expected, at);
/// let value = serde_json::to_value(&receipt).unwrap();
/// assert_eq!(value["txHash"], json!("0xabc"));
/// assert_eq!(value["settlement"], json!("preview"));
/// assert_eq!(value["verified_at"], json!("2025-01-01T00:00:00Z"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// The proof as presented by the client.
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    pub chain_id: String,
    pub settlement: ReceiptSettlement,
    pub token: Option<String>,
    pub amount: Amount,
    pub merchant: String,
    pub payer: Option<String>,
    pub function: Option<String>,
    #[serde(with = "rfc3339")]
    pub verified_at: DateTime<Utc>,
}

impl Receipt {
    pub fn from_acceptance(
        acceptance: &Acceptance,
        proof: impl Into<String>,
        chain_id: impl Into<String>,
        verified_at: DateTime<Utc>,
    ) -> Self {
        Receipt {
            tx_hash: proof.into(),
            chain_id: chain_id.into(),
            settlement: acceptance.settlement.into(),
            token: acceptance.token.clone(),
            amount: acceptance.amount.clone(),
            merchant: acceptance.merchant.clone(),
            payer: acceptance.payer.clone(),
            function: Some(acceptance.function_id.clone()),
            verified_at,
        }
    }

    /// A receipt for the expected payment that has not been checked against the ledger.
    pub fn preview(
        proof: impl Into<String>,
        chain_id: impl Into<String>,
        expected: &ExpectedPayment,
        verified_at: DateTime<Utc>,
    ) -> Self {
        Receipt {
            tx_hash: proof.into(),
            chain_id: chain_id.into(),
            settlement: ReceiptSettlement::Preview,
            token: expected.token.clone(),
            amount: expected.amount.clone(),
            merchant: expected.merchant.clone(),
            payer: None,
            function: None,
            verified_at,
        }
    }

    pub fn is_preview(&self) -> bool {
        self.settlement == ReceiptSettlement::Preview
    }
}

impl TryFrom<&Receipt> for Base64EncodedHeader {
    type Error = crate::errors::Error;

    fn try_from(receipt: &Receipt) -> Result<Self, Self::Error> {
        Base64EncodedHeader::encode(receipt)
    }
}

impl TryFrom<&Base64EncodedHeader> for Receipt {
    type Error = crate::errors::Error;

    fn try_from(header: &Base64EncodedHeader) -> Result<Self, Self::Error> {
        header.decode()
    }
}

/// Timestamps are always written with a `Z` suffix and second precision or better.
mod rfc3339 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
