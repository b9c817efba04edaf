//! `GET|POST /verify`

use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::Method,
};
use serde::Serialize;
use x402_move_kit::{
    core::{
        transaction::classify,
        verifier::{RejectReason, Verdict},
    },
    ledger::Ledger,
    verification::{Inspection, VerificationError},
};

use super::{body_string, json_body, non_blank};
use crate::{app::AppState, config::ServiceMode, error::ApiError};

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub ok: bool,
    /// `preview`, or the settlement stage of the transaction: `fast` or `final`.
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
}

/// Verify the proof in the `txHash` query parameter (`GET`) or body field (`POST`).
pub async fn verify<L: Ledger>(
    State(state): State<AppState<L>>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<VerifyResponse>, ApiError> {
    let proof = if method == Method::POST {
        body_string(&json_body(&body)?, &["txHash"])
    } else {
        non_blank(query.get("txHash"))
    }
    .ok_or(ApiError::Missing("txHash"))?;

    if state.config.service_mode == ServiceMode::Preview {
        return Ok(Json(VerifyResponse {
            ok: true,
            mode: ServiceMode::Preview.to_string(),
            proof: Some(proof),
            reason: None,
        }));
    }

    let inspection = state.verifier.inspect(&proof).await.map_err(|err| match err {
        VerificationError::InvalidProof(_) => ApiError::Missing("txHash"),
        VerificationError::LedgerUnavailable(err) => {
            tracing::warn!(proof = %proof, "Verification failed: {err}");
            ApiError::VerificationFailed
        }
    })?;

    Ok(Json(verify_response(&inspection)))
}

fn verify_response(inspection: &Inspection) -> VerifyResponse {
    match &inspection.verdict {
        Verdict::Accepted(acceptance) => VerifyResponse {
            ok: true,
            mode: acceptance.settlement.to_string(),
            proof: None,
            reason: None,
        },
        Verdict::Rejected(reason) => {
            let pending = classify(inspection.transaction.as_ref()).is_ok_and(|r| r.is_pending());
            VerifyResponse {
                ok: false,
                mode: if pending { "fast" } else { "final" }.to_string(),
                proof: None,
                reason: Some(reason.clone()),
            }
        }
    }
}
