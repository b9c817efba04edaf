//! # X402 Move Core
//!
//! The proof-of-payment verification engine for x402 payments settled on Move ledgers
//! (Movement, Aptos).
//!
//! A client pays on-chain and presents the transaction hash as a proof. This crate decides
//! whether the transaction behind that proof is a valid payment for a given merchant, amount
//! and token. It performs no I/O: the raw transaction record is fetched by the caller.
//!
//! ## Flow
//!
//! 1. **Classify**: [`transaction::classify`] decodes the raw JSON record once into a typed
//!    [`TransactionRecord`](transaction::TransactionRecord) and stages it as pending or finalized.
//! 2. **Verify**: [`verifier::verify`] checks the entry call against an
//!    [`ExpectedPayment`](payment::ExpectedPayment) and returns a [`Verdict`](verifier::Verdict).
//! 3. **Receipt**: [`Receipt::from_acceptance`](receipt::Receipt::from_acceptance) normalizes an
//!    acceptance into the payload returned to HTTP clients.
//!
//! ```
//! use serde_json::json;
//! use x402_move_core::{
//!     payment::ExpectedPayment,
//!     verifier::{Settlement, verify},
//! };
//!
//! let expected = ExpectedPayment::builder()
//!     .merchant("0xMERCHANT")
//!     .amount("1000")
//!     .package_address("0xDEO")
//!     .token("deo::usdc::USDC")
//!     .build();
//!
//! let tx = json!({
//!     "type": "user_transaction",
//!     "hash": "0xabc",
//!     "sender": "0xAGENT",
//!     "success": true,
//!     "payload": {
//!         "type": "entry_function_payload",
//!         "function": "0xDEO::treasury::pay_merchant",
//!         "type_arguments": [],
//!         "arguments": ["0xmerchant", "1000"]
//!     }
//! });
//!
//! let verdict = verify(Some(&tx), &expected);
//! let accepted = verdict.acceptance().unwrap();
//! assert_eq!(accepted.settlement, Settlement::Final);
//! assert_eq!(accepted.amount.as_str(), "1000");
//! ```
//!
//! ## Modules
//!
//! - [`transaction`]: decoding and staging of raw ledger records.
//! - [`payment`]: the expected payment and the entry functions accepted as payment.
//! - [`verifier`]: verdicts, reject reasons and the verification algorithm.
//! - [`receipt`]: normalized receipts.
//! - [`challenge`]: the `WWW-Authenticate: x402 ...` challenge and proof presentation.
//! - [`types`]: amounts, type tags and header encodings.

pub mod challenge;
pub mod errors;
pub mod payment;
pub mod receipt;
pub mod transaction;
pub mod types;
pub mod verifier;
