//! Account endpoints: treasury payments, native balance and recent activity.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde_json::{Value, json};
use x402_move_kit::{
    balance::{coin_balance, discover_native_coin},
    history::{DEFAULT_NATIVE_COIN, PaymentHistory, recent_activity},
    ledger::Ledger,
};

use super::non_blank;
use crate::{app::AppState, config::ServiceMode, error::ApiError, preview};

fn chain_unavailable(err: impl std::fmt::Display) -> ApiError {
    tracing::warn!("Ledger query failed: {err}");
    ApiError::ChainUnavailable
}

fn parse<T: std::str::FromStr>(
    query: &HashMap<String, String>,
    name: &'static str,
) -> Result<Option<T>, ApiError> {
    non_blank(query.get(name))
        .map(|v| v.parse().map_err(|_| ApiError::Invalid(name)))
        .transpose()
}

/// `GET /payments?payer=&start=&limit=`
pub async fn payments<L: Ledger>(
    State(state): State<AppState<L>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let config = &state.config;

    if config.service_mode == ServiceMode::Preview {
        return Ok(Json(json!({
            "ok": true,
            "mode": ServiceMode::Preview,
            "chain_id": config.chain_id,
            "items": preview::sample_payments(config, Utc::now()),
        })));
    }

    let payer = non_blank(query.get("payer"))
        .or_else(|| config.payer_address.clone())
        .ok_or(ApiError::Missing("payer"))?;

    let history = PaymentHistory::builder()
        .package_address(config.deo_package_address.as_str())
        .payer(payer.as_str())
        .token(config.usdc_token.as_str())
        .maybe_start(parse(&query, "start")?)
        .maybe_limit(parse(&query, "limit")?)
        .build();

    let items = history
        .fetch(state.ledger())
        .await
        .map_err(chain_unavailable)?;

    Ok(Json(json!({
        "ok": true,
        "mode": ServiceMode::Chain,
        "chain_id": config.chain_id,
        "payer": payer,
        "items": items,
    })))
}

/// `GET /balance?address=`
pub async fn balance<L: Ledger>(
    State(state): State<AppState<L>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let config = &state.config;
    let address = non_blank(query.get("address"));

    if config.service_mode == ServiceMode::Preview {
        let balance = preview::sample_balance(config, address);
        return Ok(Json(json!({
            "ok": true,
            "mode": ServiceMode::Preview,
            "address": balance.address,
            "coin_type": balance.coin_type,
            "decimals": balance.decimals,
            "value": balance.value,
        })));
    }

    let address = address.ok_or(ApiError::Missing("address"))?;

    let coin_type = match &config.native_coin_type {
        Some(coin_type) => coin_type.clone(),
        None => discover_native_coin(state.ledger())
            .await
            .map_err(chain_unavailable)?
            .ok_or(ApiError::NativeCoinUnavailable)?,
    };

    let balance = coin_balance(state.ledger(), &address, &coin_type)
        .await
        .map_err(chain_unavailable)?;

    Ok(Json(json!({
        "ok": true,
        "mode": ServiceMode::Chain,
        "address": balance.address,
        "coin_type": balance.coin_type,
        "decimals": balance.decimals,
        "value": balance.value,
    })))
}

/// `GET /activity?address=`
pub async fn activity<L: Ledger>(
    State(state): State<AppState<L>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let config = &state.config;
    let address = non_blank(query.get("address"));

    if config.service_mode == ServiceMode::Preview {
        return Ok(Json(json!({
            "ok": true,
            "mode": ServiceMode::Preview,
            "address": address,
            "items": preview::sample_activity(address.as_deref(), Utc::now()),
        })));
    }

    let address = address.ok_or(ApiError::Missing("address"))?;
    let coin_type = config
        .native_coin_type
        .as_deref()
        .unwrap_or(DEFAULT_NATIVE_COIN);

    let items = recent_activity(state.ledger(), &address, coin_type)
        .await
        .map_err(chain_unavailable)?;

    Ok(Json(json!({
        "ok": true,
        "mode": ServiceMode::Chain,
        "address": address,
        "items": items,
    })))
}
