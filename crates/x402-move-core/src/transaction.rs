//! Decoding and staging of raw ledger transaction records.
//!
//! The fullnode returns transactions as loosely-typed JSON. [`TransactionRecord::decode`] parses
//! that JSON exactly once into a typed record; everything downstream works on the typed value.

use serde::Deserialize;
use serde_json::Value;

use crate::{
    types::render_scalar,
    verifier::{RejectReason, Settlement},
};

/// `type` of a transaction submitted to the mempool but not yet executed.
pub const PENDING_TRANSACTION: &str = "pending_transaction";
/// `type` of an executed user transaction.
pub const USER_TRANSACTION: &str = "user_transaction";
/// `type` of a payload invoking an entry function.
pub const ENTRY_FUNCTION_PAYLOAD: &str = "entry_function_payload";

/// Settlement stage of a transaction, as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Submitted, not yet executed. Carries no success flag.
    Pending,
    /// Executed and committed.
    Finalized,
    /// Any other transaction type, e.g. `genesis_transaction` or `block_metadata_transaction`.
    Unknown(String),
}

/// An entry function invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCall {
    /// Fully qualified function, e.g. `0x1::coin::transfer`.
    pub function_id: String,
    pub type_arguments: Vec<String>,
    /// Arguments rendered as text.
    pub arguments: Vec<String>,
}

impl EntryCall {
    /// The argument at `index`, or an empty string when absent.
    pub fn argument(&self, index: usize) -> &str {
        self.arguments.get(index).map(String::as_str).unwrap_or("")
    }

    /// The type argument at `index`, if present and non-empty.
    pub fn type_argument(&self, index: usize) -> Option<&str> {
        self.type_arguments
            .get(index)
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }
}

/// A typed view of a ledger transaction. Never mutated after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub stage: Stage,
    /// Meaningful only when `stage` is [`Stage::Finalized`].
    pub succeeded: bool,
    pub sender: Option<String>,
    pub hash: Option<String>,
    pub timestamp: Option<String>,
    pub entry_call: Option<EntryCall>,
}

#[derive(Deserialize)]
struct RawTransaction {
    #[serde(rename = "type")]
    kind: String,
    hash: Option<String>,
    sender: Option<String>,
    success: Option<Value>,
    timestamp: Option<Value>,
    payload: Option<Value>,
}

#[derive(Deserialize)]
struct RawEntryFunctionPayload {
    function: String,
    #[serde(default)]
    type_arguments: Vec<String>,
    #[serde(default)]
    arguments: Vec<Value>,
}

impl TransactionRecord {
    /// Decode a raw ledger record.
    ///
    /// Fails with [`RejectReason::BadTransaction`] when the record is not an object, has no
    /// `type`, or carries an entry-function payload of the wrong shape.
    pub fn decode(raw: &Value) -> Result<Self, RejectReason> {
        if !raw.is_object() {
            return Err(RejectReason::BadTransaction);
        }

        let raw = RawTransaction::deserialize(raw).map_err(|_| RejectReason::BadTransaction)?;

        let stage = match raw.kind.as_str() {
            PENDING_TRANSACTION => Stage::Pending,
            USER_TRANSACTION => Stage::Finalized,
            _ => Stage::Unknown(raw.kind),
        };

        Ok(TransactionRecord {
            stage,
            succeeded: raw.success == Some(Value::Bool(true)),
            sender: raw.sender,
            hash: raw.hash,
            timestamp: raw.timestamp.as_ref().map(render_scalar),
            entry_call: decode_entry_call(raw.payload)?,
        })
    }

    /// The settlement this record supports, or why it supports none.
    ///
    /// Pending records settle fast without consulting the success flag. Finalized records
    /// settle only when they executed successfully.
    pub fn settlement(&self) -> Result<Settlement, RejectReason> {
        match &self.stage {
            Stage::Pending => Ok(Settlement::Fast),
            Stage::Unknown(kind) => Err(RejectReason::UnexpectedType(kind.clone())),
            Stage::Finalized if !self.succeeded => Err(RejectReason::ExecutionFailed),
            Stage::Finalized => Ok(Settlement::Final),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.stage == Stage::Pending
    }
}

fn decode_entry_call(payload: Option<Value>) -> Result<Option<EntryCall>, RejectReason> {
    let Some(payload) = payload else {
        return Ok(None);
    };

    if payload.get("type").and_then(Value::as_str) != Some(ENTRY_FUNCTION_PAYLOAD) {
        return Ok(None);
    }

    let payload = RawEntryFunctionPayload::deserialize(&payload)
        .map_err(|_| RejectReason::BadTransaction)?;

    Ok(Some(EntryCall {
        function_id: payload.function,
        type_arguments: payload.type_arguments,
        arguments: payload.arguments.iter().map(render_scalar).collect(),
    }))
}

/// Decode and stage a raw ledger record.
///
/// An absent record (`None`, i.e. not found) is a [`RejectReason::BadTransaction`]. A pending
/// record is returned as is; an executed record must have succeeded.
///
/// ```
/// use serde_json::json;
/// use x402_move_core::{transaction::{Stage, classify}, verifier::RejectReason};
///
/// let pending = classify(Some(&json!({"type": "pending_transaction", "hash": "0x1"}))).unwrap();
/// assert_eq!(pending.stage, Stage::Pending);
///
/// let failed = classify(Some(&json!({"type": "user_transaction", "success": false})));
/// assert_eq!(failed, Err(RejectReason::ExecutionFailed));
///
/// assert_eq!(classify(None), Err(RejectReason::BadTransaction));
/// ```
pub fn classify(raw: Option<&Value>) -> Result<TransactionRecord, RejectReason> {
    let record = TransactionRecord::decode(raw.ok_or(RejectReason::BadTransaction)?)?;
    record.settlement()?;
    Ok(record)
}
