use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
};

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};
use x402_move_kit::ledger::Ledger;

use crate::paywall::PayWall;

impl<L, S> Layer<S> for PayWall<L> {
    type Service = PayWallService<L, S>;

    fn layer(&self, inner: S) -> Self::Service {
        PayWallService {
            paywall: self.clone(),
            inner,
        }
    }
}

/// Service produced by using a [`PayWall`] as a tower [`Layer`].
pub struct PayWallService<L, S> {
    paywall: PayWall<L>,
    inner: S,
}

impl<L, S: Clone> Clone for PayWallService<L, S> {
    fn clone(&self) -> Self {
        PayWallService {
            paywall: self.paywall.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<L, S> Service<Request> for PayWallService<L, S>
where
    L: Ledger + Send + Sync + 'static,
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let paywall = self.paywall.clone();
        // The ready service handles this request; a fresh clone takes its place.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let response = paywall
                .handle_payment(request, |req| async move {
                    match inner.call(req).await {
                        Ok(response) => response,
                        Err(never) => match never {},
                    }
                })
                .await
                .unwrap_or_else(IntoResponse::into_response);

            Ok(response)
        })
    }
}
