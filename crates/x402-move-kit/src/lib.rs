//! # X402 Move Kit
//!
//! Ledger access and verification services around [`x402_move_core`].
//!
//! - [`ledger`]: the [`Ledger`](ledger::Ledger) trait and an in-memory implementation.
//! - [`fullnode_client`]: a [`Ledger`](ledger::Ledger) over the fullnode REST API, with retries.
//! - [`verification`]: [`ProofVerifier`](verification::ProofVerifier), which resolves proofs on a
//!   ledger, verifies them and caches finalized acceptances.
//! - [`history`] and [`balance`]: payment history, account activity and balances.
//!
//! ```
//! use serde_json::json;
//! use x402_move_core::payment::ExpectedPayment;
//! use x402_move_kit::{ledger::MemoryLedger, verification::ProofVerifier};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut ledger = MemoryLedger::default();
//! ledger.insert_transaction(json!({
//!     "type": "pending_transaction",
//!     "hash": "0xabc",
//!     "payload": {
//!         "type": "entry_function_payload",
//!         "function": "0xDEO::treasury::pay_merchant",
//!         "arguments": ["0xMERCHANT", "1000"]
//!     }
//! }));
//!
//! let verifier = ProofVerifier::builder()
//!     .ledger(ledger)
//!     .expected(
//!         ExpectedPayment::builder()
//!             .merchant("0xMERCHANT")
//!             .amount("1000")
//!             .package_address("0xDEO")
//!             .build(),
//!     )
//!     .chain_id("movement_testnet")
//!     .build();
//!
//! let verdict = verifier.verify_proof("0xabc").await.unwrap();
//! assert!(verdict.is_accepted());
//! # }
//! ```

pub mod balance;
pub mod cache;
pub mod history;
pub mod ledger;
pub mod verification;

#[cfg(feature = "fullnode-client")]
pub mod fullnode_client;

pub use x402_move_core as core;
