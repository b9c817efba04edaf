//! The premium resource.

use axum::{
    Extension, Json,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use x402_move_kit::ledger::Ledger;
use x402_move_paywall::paywall::{PaymentState, extract_proof};

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct PremiumWeather {
    pub premium: bool,
    pub city: &'static str,
    pub temperature_c: i32,
    pub condition: &'static str,
    pub provider: &'static str,
    pub settlement: String,
    #[serde(rename = "txHash")]
    pub tx_hash: String,
}

impl PremiumWeather {
    fn new(settlement: impl Into<String>, tx_hash: impl Into<String>) -> Self {
        PremiumWeather {
            premium: true,
            city: "Lisbon",
            temperature_c: 22,
            condition: "Clear",
            provider: "demo",
            settlement: settlement.into(),
            tx_hash: tx_hash.into(),
        }
    }
}

/// `GET /weather` behind the paywall.
pub async fn premium(Extension(payment): Extension<PaymentState>) -> Json<PremiumWeather> {
    tracing::info!(
        proof = %payment.proof,
        settlement = %payment.acceptance.settlement,
        "Serving premium weather"
    );
    Json(PremiumWeather::new(
        payment.acceptance.settlement.to_string(),
        payment.proof,
    ))
}

/// `GET /weather` in preview mode: a proof is still required but not checked.
pub async fn preview<L: Ledger>(State(state): State<AppState<L>>, headers: HeaderMap) -> Response {
    match extract_proof(&headers) {
        Ok(Some(proof)) => Json(PremiumWeather::new("preview", proof)).into_response(),
        Ok(None) => state.paywall.payment_required(&headers).into_response(),
        Err(err) => err.into_response(),
    }
}
