use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use url::Url;
use x402_move_kit::{
    fullnode_client::{FullnodeClient, FullnodeError, RetryPolicy},
    ledger::{EventQuery, Ledger},
};

#[derive(Clone, Default)]
struct MockState {
    flaky_calls: Arc<AtomicUsize>,
    bad_calls: Arc<AtomicUsize>,
}

async fn by_hash(State(state): State<MockState>, Path(hash): Path<String>) -> Response {
    match hash.as_str() {
        "0xabc" => Json(json!({
            "type": "user_transaction",
            "hash": "0xabc",
            "version": "42",
            "success": true
        }))
        .into_response(),
        "0xflaky" => {
            if state.flaky_calls.fetch_add(1, Ordering::SeqCst) < 2 {
                (StatusCode::SERVICE_UNAVAILABLE, "try again").into_response()
            } else {
                Json(json!({"type": "pending_transaction", "hash": "0xflaky"})).into_response()
            }
        }
        "0xbad" => {
            state.bad_calls.fetch_add(1, Ordering::SeqCst);
            (StatusCode::BAD_REQUEST, "invalid hash").into_response()
        }
        _ => (StatusCode::NOT_FOUND, Json(json!({"error_code": "transaction_not_found"})))
            .into_response(),
    }
}

async fn by_version(Path(version): Path<u64>) -> Response {
    if version == 42 {
        Json(json!({"type": "user_transaction", "hash": "0xabc", "version": "42"})).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn resource(Path((account, resource_type)): Path<(String, String)>) -> Response {
    if account == "0xa11ce" && resource_type == "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>" {
        Json(json!({"type": resource_type, "data": {"coin": {"value": "77"}}})).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn resources(Path(account): Path<String>) -> Response {
    Json(json!([{"type": format!("{account}::m::R"), "data": {}}])).into_response()
}

async fn events(
    Path((account, handle, field)): Path<(String, String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    Json(json!([{
        "version": "42",
        "sequence_number": params.get("start").cloned().unwrap_or_else(|| "none".to_string()),
        "type": "0x1::coin::DepositEvent",
        "data": {
            "account": account,
            "handle": handle,
            "field": field,
            "limit": params.get("limit")
        }
    }]))
    .into_response()
}

async fn spawn_fullnode() -> (Url, MockState) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let state = MockState::default();
    let app = Router::new()
        .route("/v1/transactions/by_hash/{hash}", get(by_hash))
        .route("/v1/transactions/by_version/{version}", get(by_version))
        .route("/v1/accounts/{account}/resource/{resource_type}", get(resource))
        .route("/v1/accounts/{account}/resources", get(resources))
        .route("/v1/accounts/{account}/events/{handle}/{field}", get(events))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let url = Url::parse(&format!("http://{addr}/v1/")).unwrap();
    (url, state)
}

fn fast_retries() -> RetryPolicy {
    RetryPolicy::builder()
        .max_attempts(3)
        .base_delay(Duration::from_millis(5))
        .build()
}

#[tokio::test]
async fn test_transaction_by_hash() {
    let (url, _) = spawn_fullnode().await;
    let client = FullnodeClient::new(url).with_retry_policy(fast_retries());

    let tx = client.transaction_by_hash("0xabc").await.unwrap().unwrap();
    assert_eq!(tx["version"], json!("42"));

    assert!(client.transaction_by_hash("0xmissing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let (url, state) = spawn_fullnode().await;
    let client = FullnodeClient::new(url).with_retry_policy(fast_retries());

    let tx = client.transaction_by_hash("0xflaky").await.unwrap().unwrap();
    assert_eq!(tx["type"], json!("pending_transaction"));
    assert_eq!(state.flaky_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let (url, state) = spawn_fullnode().await;
    let client = FullnodeClient::new(url).with_retry_policy(
        RetryPolicy::builder()
            .max_attempts(2)
            .base_delay(Duration::from_millis(5))
            .build(),
    );

    let err = client.transaction_by_hash("0xflaky").await.unwrap_err();
    assert!(matches!(
        err,
        FullnodeError::Status { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE
    ));
    assert_eq!(state.flaky_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let (url, state) = spawn_fullnode().await;
    let client = FullnodeClient::new(url).with_retry_policy(fast_retries());

    let err = client.transaction_by_hash("0xbad").await.unwrap_err();
    match err {
        FullnodeError::Status { status, body } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, "invalid hash");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(state.bad_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_transaction_by_version() {
    let (url, _) = spawn_fullnode().await;
    let client = FullnodeClient::new(url);

    let tx = client.transaction_by_version(42).await.unwrap().unwrap();
    assert_eq!(tx["hash"], json!("0xabc"));
    assert!(client.transaction_by_version(7).await.unwrap().is_none());
}

#[tokio::test]
async fn test_account_resource_with_type_tag() {
    let (url, _) = spawn_fullnode().await;
    let client = FullnodeClient::new(url);

    let store = client
        .account_resource("0xa11ce", "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(store["data"]["coin"]["value"], json!("77"));

    assert!(
        client
            .account_resource("0xb0b", "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_account_resources() {
    let (url, _) = spawn_fullnode().await;
    let client = FullnodeClient::new(url);

    let resources: Vec<Value> = client.account_resources("0x1").await.unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0]["type"], json!("0x1::m::R"));
}

#[tokio::test]
async fn test_account_events() {
    let (url, _) = spawn_fullnode().await;
    let client = FullnodeClient::new(url);

    let query = EventQuery::builder()
        .account("0xa11ce")
        .event_handle("0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>")
        .field("deposit_events")
        .start(18)
        .limit(12)
        .build();
    let events = client.account_events(&query).await.unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].sequence_number.as_deref(), Some("18"));
    assert_eq!(
        events[0].data["handle"],
        json!("0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>")
    );
    assert_eq!(events[0].data["field"], json!("deposit_events"));
    assert_eq!(events[0].data["limit"], json!("12"));

    let query = EventQuery::builder()
        .account("0xa11ce")
        .event_handle("0xDEO::treasury::Treasury")
        .field("payment_events")
        .build();
    let events = client.account_events(&query).await.unwrap();
    assert_eq!(events[0].sequence_number.as_deref(), Some("none"));
    assert_eq!(events[0].data["limit"], Value::Null);
}
