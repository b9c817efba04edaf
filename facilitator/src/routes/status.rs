//! Service description endpoints.

use axum::{Json, extract::State, http::HeaderMap};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use x402_move_kit::ledger::Ledger;
use x402_move_paywall::paywall::base_url;

use crate::app::AppState;

/// `GET /status`
pub async fn status<L: Ledger>(State(state): State<AppState<L>>, headers: HeaderMap) -> Json<Value> {
    let config = &state.config;
    let base = base_url(&headers);
    let accepted: Vec<&str> = state.verifier.expected().accepted_function_ids().collect();

    Json(json!({
        "service": "DEO",
        "mode": config.service_mode.to_string(),
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "chain": {
            "chain_id": config.chain_id,
            "fullnode_url": config.fullnode_url,
        },
        "commerce": {
            "token": config.usdc_token,
            "amount": config.price_amount,
            "merchant_address": config.merchant_address,
            "accepted_functions": accepted,
        },
        "contracts": {
            "deo_package_address": config.deo_package_address,
            "pay_function": config.pay_function(),
        },
        "endpoints": {
            "status": format!("{base}/status"),
            "catalog": format!("{base}/catalog"),
            "weather": format!("{base}/weather"),
            "verify": format!("{base}/verify"),
            "receipt": format!("{base}/receipt"),
            "payments": format!("{base}/payments"),
            "balance": format!("{base}/balance"),
            "activity": format!("{base}/activity"),
        },
    }))
}

/// `GET /catalog`
pub async fn catalog<L: Ledger>(
    State(state): State<AppState<L>>,
    headers: HeaderMap,
) -> Json<Value> {
    let config = &state.config;
    let base = base_url(&headers);

    Json(json!({
        "service": "DEO",
        "mode": config.service_mode.to_string(),
        "products": [{
            "id": "weather.premium",
            "name": "Premium Weather Feed",
            "method": "GET",
            "path": "/weather",
            "price": {
                "amount": config.price_amount,
                "token": config.usdc_token,
            },
        }],
        "challenge_header": state.paywall.challenge(&headers).to_string(),
        "examples": {
            "request": format!("curl -i {base}/weather"),
            "authorized_request": format!(r#"curl -i {base}/weather -H "X-Payment-Proof: <proof>""#),
        },
    }))
}
