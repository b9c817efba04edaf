//! Application state and router.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    routing::get,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use x402_move_kit::{
    core::challenge::{PAYMENT_RESPONSE_HEADER, PROOF_HEADER},
    ledger::Ledger,
    verification::ProofVerifier,
};
use x402_move_paywall::paywall::PayWall;

use crate::{
    config::{Config, ServiceMode},
    routes,
};

/// Shared state of the facilitator's handlers.
pub struct AppState<L> {
    pub config: Arc<Config>,
    pub verifier: Arc<ProofVerifier<L>>,
    pub paywall: PayWall<L>,
}

impl<L> Clone for AppState<L> {
    fn clone(&self) -> Self {
        AppState {
            config: Arc::clone(&self.config),
            verifier: Arc::clone(&self.verifier),
            paywall: self.paywall.clone(),
        }
    }
}

impl<L: Ledger> AppState<L> {
    pub fn new(config: Config, ledger: L) -> Self {
        let verifier = Arc::new(
            ProofVerifier::builder()
                .ledger(ledger)
                .expected(config.expected_payment())
                .chain_id(config.chain_id.as_str())
                .build(),
        );
        let paywall = PayWall::builder()
            .verifier(Arc::clone(&verifier))
            .maybe_facilitator(config.facilitator_url.clone())
            .build();

        AppState {
            config: Arc::new(config),
            verifier,
            paywall,
        }
    }

    pub fn ledger(&self) -> &L {
        self.verifier.ledger()
    }
}

/// Invalid `CORS_ORIGIN` value.
#[derive(Debug, thiserror::Error)]
#[error("Invalid CORS origin `{0}`")]
pub struct InvalidCorsOrigin(String);

pub fn cors_layer(origins: &str) -> Result<CorsLayer, InvalidCorsOrigin> {
    let allow_origin = if origins.trim() == "*" {
        AllowOrigin::any()
    } else {
        let origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| HeaderValue::from_str(o).map_err(|_| InvalidCorsOrigin(o.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        if origins.is_empty() {
            return Err(InvalidCorsOrigin(String::new()));
        }
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static(PROOF_HEADER),
            header::CONTENT_TYPE,
        ])
        .expose_headers([
            header::WWW_AUTHENTICATE,
            HeaderName::from_static(PAYMENT_RESPONSE_HEADER),
        ])
        .max_age(Duration::from_secs(86400)))
}

/// All facilitator routes.
///
/// | Method | Path | Description |
/// |--------|------|-------------|
/// | `GET` | `/status` | Service, chain and contract configuration |
/// | `GET` | `/catalog` | Paid products and the challenge they answer with |
/// | `GET` | `/weather` | Premium resource behind the paywall |
/// | `GET`, `POST` | `/verify` | Verify a proof |
/// | `GET`, `POST` | `/receipt` | Receipt of a verified proof |
/// | `GET` | `/payments` | Treasury payments of a payer |
/// | `GET` | `/balance` | Native coin balance of an address |
/// | `GET` | `/activity` | Recent deposits and withdrawals of an address |
pub fn router<L>(state: AppState<L>) -> Result<Router, InvalidCorsOrigin>
where
    L: Ledger + Send + Sync + 'static,
{
    let weather = match state.config.service_mode {
        ServiceMode::Preview => get(routes::weather::preview::<L>),
        ServiceMode::Chain => get(routes::weather::premium).layer(state.paywall.clone()),
    };

    let cors = cors_layer(&state.config.cors_origin)?;

    Ok(Router::new()
        .route("/status", get(routes::status::status::<L>))
        .route("/catalog", get(routes::status::catalog::<L>))
        .route("/weather", weather)
        .route(
            "/verify",
            get(routes::verify::verify::<L>).post(routes::verify::verify::<L>),
        )
        .route(
            "/receipt",
            get(routes::receipt::receipt::<L>).post(routes::receipt::receipt::<L>),
        )
        .route("/payments", get(routes::account::payments::<L>))
        .route("/balance", get(routes::account::balance::<L>))
        .route("/activity", get(routes::account::activity::<L>))
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}
