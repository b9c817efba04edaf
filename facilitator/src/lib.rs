//! # X402 Move Facilitator
//!
//! An HTTP service around the x402 Move verification engine: a paywalled premium resource, proof
//! verification and receipts, and payment history and balances read from the fullnode.
//!
//! In [`ServiceMode::Preview`](config::ServiceMode::Preview) every endpoint answers with
//! synthetic data and the ledger is never contacted.

pub mod app;
pub mod config;
pub mod error;
pub mod preview;
pub mod routes;
