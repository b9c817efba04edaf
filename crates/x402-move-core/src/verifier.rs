//! Payment proof verification.
//!
//! [`verify`] decides whether a raw ledger record is a valid payment for an
//! [`ExpectedPayment`]. It is a pure function: no I/O, no shared state, safe to call
//! concurrently and to repeat for the same transaction.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    payment::{AcceptedFunction, ExpectedPayment},
    transaction::{TransactionRecord, classify},
    types::{Amount, addresses_match, type_tag_matches},
};

/// Why a transaction was not accepted as payment.
///
/// Variants are listed in the order they are checked; exactly one is reported. The display form
/// is the wire reason code, e.g. `wrong_amount` or `unexpected_type:genesis_transaction`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum RejectReason {
    /// The record is missing or malformed.
    #[error("bad_tx")]
    BadTransaction,
    /// The record is neither pending nor a user transaction.
    #[error("unexpected_type:{0}")]
    UnexpectedType(String),
    /// The transaction executed and aborted.
    #[error("tx_failed")]
    ExecutionFailed,
    /// The payload is not an entry function call.
    #[error("not_entry_function")]
    NotEntryFunction,
    /// The entry function is not an accepted payment function.
    #[error("unsupported_function")]
    UnsupportedFunction,
    /// A token-bearing function was called without a coin type argument.
    #[error("missing_token")]
    MissingToken,
    #[error("wrong_token")]
    WrongToken,
    #[error("wrong_merchant")]
    WrongMerchant,
    #[error("wrong_amount")]
    WrongAmount,
}

impl RejectReason {
    const UNEXPECTED_TYPE_PREFIX: &'static str = "unexpected_type:";
}

impl FromStr for RejectReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(kind) = s.strip_prefix(Self::UNEXPECTED_TYPE_PREFIX) {
            return Ok(RejectReason::UnexpectedType(kind.to_string()));
        }
        match s {
            "bad_tx" => Ok(RejectReason::BadTransaction),
            "tx_failed" => Ok(RejectReason::ExecutionFailed),
            "not_entry_function" => Ok(RejectReason::NotEntryFunction),
            "unsupported_function" => Ok(RejectReason::UnsupportedFunction),
            "missing_token" => Ok(RejectReason::MissingToken),
            "wrong_token" => Ok(RejectReason::WrongToken),
            "wrong_merchant" => Ok(RejectReason::WrongMerchant),
            "wrong_amount" => Ok(RejectReason::WrongAmount),
            other => Err(format!("Unknown reject reason: {other}")),
        }
    }
}

impl Serialize for RejectReason {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RejectReason {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RejectReason::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// How settled an accepted payment is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Settlement {
    /// The transaction is still pending. The payment may yet fail.
    Fast,
    /// The transaction executed successfully.
    Final,
}

impl Display for Settlement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Settlement::Fast => write!(f, "fast"),
            Settlement::Final => write!(f, "final"),
        }
    }
}

/// The details of an accepted payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acceptance {
    pub settlement: Settlement,
    /// Transaction sender.
    pub payer: Option<String>,
    /// Transaction hash as reported by the ledger.
    pub tx_ref: Option<String>,
    pub function_id: String,
    /// Recipient as it appears in the transaction.
    pub merchant: String,
    pub amount: Amount,
    /// The verified coin type argument for `coin::transfer`, the configured token for the
    /// treasury pay function, and `None` for native transfers.
    pub token: Option<String>,
}

/// The outcome of verifying a transaction against an expected payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted(Acceptance),
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }

    pub fn acceptance(&self) -> Option<&Acceptance> {
        match self {
            Verdict::Accepted(acceptance) => Some(acceptance),
            Verdict::Rejected(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            Verdict::Accepted(_) => None,
            Verdict::Rejected(reason) => Some(reason),
        }
    }

    pub fn into_result(self) -> Result<Acceptance, RejectReason> {
        self.into()
    }
}

impl From<Result<Acceptance, RejectReason>> for Verdict {
    fn from(result: Result<Acceptance, RejectReason>) -> Self {
        match result {
            Ok(acceptance) => Verdict::Accepted(acceptance),
            Err(reason) => Verdict::Rejected(reason),
        }
    }
}

impl From<Verdict> for Result<Acceptance, RejectReason> {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Accepted(acceptance) => Ok(acceptance),
            Verdict::Rejected(reason) => Err(reason),
        }
    }
}

/// Verify a raw ledger record against an expected payment.
///
/// `None` stands for a transaction the ledger does not know.
///
/// ```
/// use serde_json::json;
/// use x402_move_core::{payment::ExpectedPayment, verifier::{RejectReason, verify}};
///
/// let expected = ExpectedPayment::builder()
///     .merchant("0xMERCHANT")
///     .amount("1000")
///     .package_address("0xDEO")
///     .token("deo::usdc::USDC")
///     .build();
///
/// let tx = json!({
///     "type": "user_transaction",
///     "success": true,
///     "payload": {
///         "type": "entry_function_payload",
///         "function": "0x1::coin::transfer",
///         "type_arguments": ["0xdeadbeef::usdc::USDC"],
///         "arguments": ["0xMERCHANT", "999"]
///     }
/// });
///
/// assert_eq!(verify(Some(&tx), &expected).reason(), Some(&RejectReason::WrongAmount));
/// assert_eq!(verify(None, &expected).reason(), Some(&RejectReason::BadTransaction));
/// ```
pub fn verify(raw: Option<&Value>, expected: &ExpectedPayment) -> Verdict {
    match classify(raw) {
        Ok(record) => verify_record(&record, expected),
        Err(reason) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(%reason, "Transaction rejected during classification");
            Verdict::Rejected(reason)
        }
    }
}

/// Verify an already decoded record against an expected payment.
pub fn verify_record(record: &TransactionRecord, expected: &ExpectedPayment) -> Verdict {
    let verdict: Verdict = check(record, expected).into();

    #[cfg(feature = "tracing")]
    trace_verdict(record, &verdict);

    verdict
}

#[cfg(feature = "tracing")]
fn trace_verdict(record: &TransactionRecord, verdict: &Verdict) {
    match verdict {
        Verdict::Accepted(acceptance) => tracing::debug!(
            tx = ?acceptance.tx_ref,
            function = %acceptance.function_id,
            settlement = %acceptance.settlement,
            "Payment accepted"
        ),
        Verdict::Rejected(reason) => tracing::debug!(
            tx = ?record.hash,
            %reason,
            "Payment rejected"
        ),
    }
}

fn check(record: &TransactionRecord, expected: &ExpectedPayment) -> Result<Acceptance, RejectReason> {
    let settlement = record.settlement()?;

    let call = record
        .entry_call
        .as_ref()
        .ok_or(RejectReason::NotEntryFunction)?;

    let function = expected
        .match_function(&call.function_id)
        .ok_or(RejectReason::UnsupportedFunction)?;

    let explicit_token = call.type_argument(0);
    if function.requires_token() {
        let actual = explicit_token.ok_or(RejectReason::MissingToken)?;
        let expected_token = expected.token.as_deref().unwrap_or_default();
        if !type_tag_matches(expected_token, actual) {
            return Err(RejectReason::WrongToken);
        }
    }

    let merchant = call.argument(function.recipient_index());
    if !addresses_match(merchant, &expected.merchant) {
        return Err(RejectReason::WrongMerchant);
    }

    let amount = Amount::verbatim(call.argument(function.amount_index()));
    if amount != expected.amount {
        return Err(RejectReason::WrongAmount);
    }

    Ok(Acceptance {
        settlement,
        payer: record.sender.clone(),
        tx_ref: record.hash.clone(),
        function_id: call.function_id.clone(),
        merchant: merchant.to_string(),
        amount,
        token: match function {
            AcceptedFunction::CoinTransfer => explicit_token.map(str::to_string),
            AcceptedFunction::PayMerchant { .. } => expected.token.clone(),
            AcceptedFunction::NativeTransfer => None,
        },
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn expected() -> ExpectedPayment {
        ExpectedPayment::builder()
            .merchant("0xMERCHANT")
            .amount("1000")
            .package_address("0xDEO")
            .token("deo::usdc::USDC")
            .build()
    }

    fn tx(kind: &str, function: &str, type_args: Value, args: Value) -> Value {
        json!({
            "type": kind,
            "hash": "0xabc",
            "sender": "0xAGENT",
            "success": true,
            "payload": {
                "type": "entry_function_payload",
                "function": function,
                "type_arguments": type_args,
                "arguments": args
            }
        })
    }

    #[test]
    fn test_reason_codes() {
        let cases = [
            (RejectReason::BadTransaction, "bad_tx"),
            (
                RejectReason::UnexpectedType("genesis_transaction".into()),
                "unexpected_type:genesis_transaction",
            ),
            (RejectReason::ExecutionFailed, "tx_failed"),
            (RejectReason::NotEntryFunction, "not_entry_function"),
            (RejectReason::UnsupportedFunction, "unsupported_function"),
            (RejectReason::MissingToken, "missing_token"),
            (RejectReason::WrongToken, "wrong_token"),
            (RejectReason::WrongMerchant, "wrong_merchant"),
            (RejectReason::WrongAmount, "wrong_amount"),
        ];
        for (reason, code) in cases {
            assert_eq!(reason.to_string(), code);
            assert_eq!(code.parse::<RejectReason>().unwrap(), reason);
            assert_eq!(serde_json::to_value(&reason).unwrap(), json!(code));
        }
        assert!("nope".parse::<RejectReason>().is_err());
    }

    #[test]
    fn test_pay_merchant_final() {
        let raw = tx(
            "user_transaction",
            "0xDEO::treasury::pay_merchant",
            json!([]),
            json!(["0xmerchant", "1000"]),
        );
        let acceptance = verify(Some(&raw), &expected()).into_result().unwrap();
        assert_eq!(acceptance.settlement, Settlement::Final);
        assert_eq!(acceptance.payer.as_deref(), Some("0xAGENT"));
        assert_eq!(acceptance.tx_ref.as_deref(), Some("0xabc"));
        assert_eq!(acceptance.merchant, "0xmerchant");
        assert_eq!(acceptance.token.as_deref(), Some("deo::usdc::USDC"));
    }

    #[test]
    fn test_pending_is_fast() {
        let mut raw = tx(
            "pending_transaction",
            "0x1::coin::transfer",
            json!(["0xdeadbeef::usdc::USDC"]),
            json!(["0xMERCHANT", "1000"]),
        );
        raw.as_object_mut().unwrap().remove("success");
        let acceptance = verify(Some(&raw), &expected()).into_result().unwrap();
        assert_eq!(acceptance.settlement, Settlement::Fast);
        assert_eq!(acceptance.token.as_deref(), Some("0xdeadbeef::usdc::USDC"));
    }

    #[test]
    fn test_not_entry_function() {
        let raw = json!({"type": "user_transaction", "success": true});
        assert_eq!(
            verify(Some(&raw), &expected()).reason(),
            Some(&RejectReason::NotEntryFunction)
        );
    }

    #[test]
    fn test_unsupported_function() {
        let raw = tx(
            "user_transaction",
            "0x1::aptos_account::transfer",
            json!([]),
            json!(["0xMERCHANT", "1000"]),
        );
        assert_eq!(
            verify(Some(&raw), &expected()).reason(),
            Some(&RejectReason::UnsupportedFunction)
        );
    }

    #[test]
    fn test_native_transfer_when_allowed() {
        let expected = ExpectedPayment::builder()
            .merchant("0xMERCHANT")
            .amount("1000")
            .package_address("0xDEO")
            .token("deo::usdc::USDC")
            .allow_native_transfer(true)
            .build();
        let raw = tx(
            "user_transaction",
            "0x1::aptos_account::transfer",
            json!([]),
            json!(["0xMERCHANT", "1000"]),
        );
        let acceptance = verify(Some(&raw), &expected).into_result().unwrap();
        assert_eq!(acceptance.function_id, "0x1::aptos_account::transfer");
        assert_eq!(acceptance.token, None);
    }

    #[test]
    fn test_missing_token() {
        for type_args in [json!([]), json!([""])] {
            let raw = tx(
                "user_transaction",
                "0x1::coin::transfer",
                type_args,
                json!(["0xMERCHANT", "1000"]),
            );
            assert_eq!(
                verify(Some(&raw), &expected()).reason(),
                Some(&RejectReason::MissingToken)
            );
        }
    }

    #[test]
    fn test_pay_merchant_ignores_type_arguments() {
        let raw = tx(
            "user_transaction",
            "0xDEO::treasury::pay_merchant",
            json!(["0xEVIL::fake::Coin"]),
            json!(["0xMERCHANT", "1000"]),
        );
        let acceptance = verify(Some(&raw), &expected()).into_result().unwrap();
        assert_eq!(acceptance.token.as_deref(), Some("deo::usdc::USDC"));
    }

    #[test]
    fn test_rejection_priority() {
        // Failed execution is reported before any payload check.
        let mut raw = tx(
            "user_transaction",
            "0x1::unknown::call",
            json!([]),
            json!(["0xOTHER", "1"]),
        );
        raw["success"] = json!(false);
        assert_eq!(
            verify(Some(&raw), &expected()).reason(),
            Some(&RejectReason::ExecutionFailed)
        );

        // Wrong token wins over wrong merchant and wrong amount.
        let raw = tx(
            "user_transaction",
            "0x1::coin::transfer",
            json!(["0x1::usdt::USDT"]),
            json!(["0xOTHER", "1"]),
        );
        assert_eq!(
            verify(Some(&raw), &expected()).reason(),
            Some(&RejectReason::WrongToken)
        );

        // Wrong merchant wins over wrong amount.
        let raw = tx(
            "user_transaction",
            "0x1::coin::transfer",
            json!(["0x1::usdc::USDC"]),
            json!(["0xOTHER", "1"]),
        );
        assert_eq!(
            verify(Some(&raw), &expected()).reason(),
            Some(&RejectReason::WrongMerchant)
        );
    }

    #[test]
    fn test_missing_arguments_are_empty() {
        let raw = tx(
            "user_transaction",
            "0xDEO::treasury::pay_merchant",
            json!([]),
            json!([]),
        );
        assert_eq!(
            verify(Some(&raw), &expected()).reason(),
            Some(&RejectReason::WrongMerchant)
        );
    }

    #[test]
    fn test_numeric_amount_argument() {
        let raw = tx(
            "user_transaction",
            "0xDEO::treasury::pay_merchant",
            json!([]),
            json!(["0xMERCHANT", 1000]),
        );
        assert!(verify(Some(&raw), &expected()).is_accepted());
    }

    #[test]
    fn test_acceptance_serde() {
        let raw = tx(
            "user_transaction",
            "0xDEO::treasury::pay_merchant",
            json!([]),
            json!(["0xMERCHANT", "1000"]),
        );
        let acceptance = verify(Some(&raw), &expected()).into_result().unwrap();
        let value = serde_json::to_value(&acceptance).unwrap();
        assert_eq!(value["settlement"], json!("final"));
        assert_eq!(value["functionId"], json!("0xDEO::treasury::pay_merchant"));
        assert_eq!(value["txRef"], json!("0xabc"));
    }
}
