//! # X402 Move Paywall
//!
//! Gate HTTP resources behind payments settled on a Move ledger.
//!
//! A [`PayWall`](paywall::PayWall) reads the proof a client presents in `X-Payment-Proof` (or
//! `Authorization: x402 <proof>`), verifies it with a
//! [`ProofVerifier`](x402_move_kit::verification::ProofVerifier) and only then runs the resource
//! handler. Clients without a proof receive `402 Payment Required` and a `WWW-Authenticate`
//! challenge naming the chain, token, amount and verification endpoint.
//!
//! With the `axum` feature, a [`PayWall`](paywall::PayWall) is also a tower layer:
//!
//! ```no_run
//! use axum::{Router, routing::get};
//! use x402_move_kit::{
//!     core::payment::ExpectedPayment, ledger::MemoryLedger, verification::ProofVerifier,
//! };
//! use x402_move_paywall::paywall::PayWall;
//!
//! let verifier = ProofVerifier::builder()
//!     .ledger(MemoryLedger::default())
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
//! let app: Router = Router::new()
//!     .route("/premium", get(|| async { "paid content" }))
//!     .layer(PayWall::builder().verifier(verifier).build());
//! ```

pub mod errors;
pub mod paywall;

#[cfg(feature = "axum")]
pub mod axum;
