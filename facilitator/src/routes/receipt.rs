//! `GET|POST /receipt`

use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use x402_move_kit::{
    core::receipt::Receipt,
    ledger::Ledger,
    verification::{Inspection, VerificationError},
};
use x402_move_paywall::paywall::extract_proof;

use super::{body_string, json_body, non_blank};
use crate::{app::AppState, config::ServiceMode, error::ApiError};

#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub ok: bool,
    pub mode: ServiceMode,
    pub receipt: Receipt,
    /// The raw ledger transaction, with `?include=tx`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx: Option<Value>,
}

/// The receipt of a proof taken from the proof headers, then the `txHash` or `proof` query
/// parameter (`GET`) or body field (`POST`).
pub async fn receipt<L: Ledger>(
    State(state): State<AppState<L>>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<ReceiptResponse>, ApiError> {
    let body = if method == Method::POST {
        json_body(&body)?
    } else {
        Default::default()
    };

    let from_headers = extract_proof(&headers).map_err(|_| ApiError::Invalid("proof"))?;
    let proof = from_headers
        .or_else(|| {
            if method == Method::POST {
                body_string(&body, &["txHash", "proof"])
            } else {
                non_blank(query.get("txHash")).or_else(|| non_blank(query.get("proof")))
            }
        })
        .ok_or(ApiError::Missing("proof"))?;

    let config = &state.config;
    if config.service_mode == ServiceMode::Preview {
        return Ok(Json(ReceiptResponse {
            ok: true,
            mode: ServiceMode::Preview,
            receipt: Receipt::preview(
                proof,
                config.chain_id.as_str(),
                state.verifier.expected(),
                Utc::now(),
            ),
            tx: None,
        }));
    }

    let include_tx = method == Method::GET && query.get("include").is_some_and(|v| v == "tx");
    let unavailable = |err: VerificationError<L::Error>| match err {
        VerificationError::InvalidProof(_) => ApiError::Missing("proof"),
        VerificationError::LedgerUnavailable(err) => {
            tracing::warn!(proof = %proof, "Receipt verification failed: {err}");
            ApiError::VerificationFailed
        }
    };

    let Inspection {
        verdict,
        transaction,
    } = if include_tx {
        state.verifier.inspect(&proof).await.map_err(unavailable)?
    } else {
        let verdict = state.verifier.verify_proof(&proof).await.map_err(unavailable)?;
        Inspection {
            verdict,
            transaction: None,
        }
    };

    let receipt = state
        .verifier
        .receipt_for(&proof, verdict)
        .map_err(ApiError::ProofInvalid)?;

    Ok(Json(ReceiptResponse {
        ok: true,
        mode: ServiceMode::Chain,
        receipt,
        tx: transaction.filter(|_| include_tx),
    }))
}
