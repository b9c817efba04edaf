use std::{fmt::Display, sync::Arc};

use bon::Builder;
use http::{HeaderMap, HeaderValue, Request, Response, StatusCode, header};
use x402_move_kit::{
    core::{
        challenge::{PAYMENT_RESPONSE_HEADER, PROOF_HEADER, PaymentChallenge, SCHEME, proof_from_authorization},
        receipt::Receipt,
        types::Base64EncodedHeader,
        verifier::{Acceptance, RejectReason},
    },
    ledger::Ledger,
    verification::{ProofVerifier, VerificationError},
};

use crate::errors::{ErrorBody, ErrorResponse, ErrorResponseHeader};

const DEFAULT_HINT: &str = "Send X-Payment-Proof: <txHash> after paying on-chain";

/// A http paywall that admits requests carrying a proof of an on-chain payment.
///
/// Proofs are read from `X-Payment-Proof`, or from `Authorization: x402 <proof>` when the former
/// is absent, and verified with a [`ProofVerifier`].
#[derive(Builder, Debug)]
pub struct PayWall<L> {
    /// The verifier holding the expected payment and the ledger to check proofs against.
    #[builder(into)]
    pub verifier: Arc<ProofVerifier<L>>,
    /// URL advertised in the challenge as the place to verify proofs.
    ///
    /// When unset, it is derived from the `Host` and `X-Forwarded-*` headers of each request as
    /// `<proto>://<host>/verify`.
    #[builder(into)]
    pub facilitator: Option<String>,
    /// Hint returned in the `402` body.
    #[builder(into, default = DEFAULT_HINT.to_string())]
    pub hint: String,
}

impl<L> Clone for PayWall<L> {
    fn clone(&self) -> Self {
        PayWall {
            verifier: Arc::clone(&self.verifier),
            facilitator: self.facilitator.clone(),
            hint: self.hint.clone(),
        }
    }
}

/// The state of a payment admitted by the paywall, available to the resource handler as a
/// request extension.
#[derive(Debug, Clone)]
pub struct PaymentState {
    /// The proof, trimmed.
    pub proof: String,
    pub acceptance: Acceptance,
    pub receipt: Receipt,
}

/// The proof presented with a request, if any.
///
/// A non-empty `X-Payment-Proof` wins over `Authorization: x402 <proof>`. Authorization values
/// using another scheme are ignored.
pub fn extract_proof(headers: &HeaderMap) -> Result<Option<String>, ErrorResponse> {
    if let Some(value) = headers.get(PROOF_HEADER) {
        let proof = value
            .to_str()
            .map_err(|err| invalid_payment(format!("Failed to decode X-Payment-Proof header: {err}")))?
            .trim();
        if !proof.is_empty() {
            return Ok(Some(proof.to_string()));
        }
    }

    match headers.get(header::AUTHORIZATION) {
        Some(value) => {
            let value = value.to_str().map_err(|err| {
                invalid_payment(format!("Failed to decode Authorization header: {err}"))
            })?;
            Ok(proof_from_authorization(value.trim()).map(|p| p.trim().to_string()))
        }
        None => Ok(None),
    }
}

/// `<proto>://<host>` of a request, honouring `X-Forwarded-Proto` and `X-Forwarded-Host`.
pub fn base_url(headers: &HeaderMap) -> String {
    let first = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let proto = first("x-forwarded-proto").unwrap_or("http");
    let host = first("x-forwarded-host")
        .or_else(|| first(header::HOST.as_str()))
        .unwrap_or("localhost");
    format!("{proto}://{host}")
}

/// `<proto>://<host>/verify`, from the forwarding headers of a request.
pub fn facilitator_url(headers: &HeaderMap) -> String {
    format!("{}/verify", base_url(headers))
}

impl<L: Ledger> PayWall<L> {
    pub async fn handle_payment<Fun, Fut, Req, Res>(
        &self,
        mut request: Request<Req>,
        handler: Fun,
    ) -> Result<Response<Res>, ErrorResponse>
    where
        Fun: FnOnce(Request<Req>) -> Fut,
        Fut: Future<Output = Response<Res>>,
    {
        let proof = extract_proof(request.headers())?
            .ok_or_else(|| self.payment_required(request.headers()))?;

        let verdict = self.verifier.verify_proof(&proof).await.map_err(|err| match err {
            VerificationError::InvalidProof(reason) => invalid_payment(reason),
            VerificationError::LedgerUnavailable(err) => verification_failed(err),
        })?;

        let acceptance = verdict.into_result().map_err(payment_failed)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Payment accepted: proof='{}', payer='{}', settlement='{}'",
            proof,
            acceptance.payer.as_deref().unwrap_or("unknown"),
            acceptance.settlement
        );

        let receipt = Receipt::from_acceptance(
            &acceptance,
            proof.as_str(),
            self.verifier.chain_id(),
            chrono::Utc::now(),
        );

        let header = Base64EncodedHeader::try_from(&receipt)
            .inspect_err(|_err| {
                #[cfg(feature = "tracing")]
                tracing::warn!("Failed to encode X-Payment-Response header: {_err}; skipping");
            })
            .ok()
            .and_then(|h| HeaderValue::from_str(&h.0).ok());

        request.extensions_mut().insert(PaymentState {
            proof,
            acceptance,
            receipt,
        });

        let mut response = handler(request).await;
        if let Some(header) = header {
            response.headers_mut().insert(PAYMENT_RESPONSE_HEADER, header);
        }

        Ok(response)
    }

    /// The challenge advertised to clients that did not present a proof.
    pub fn challenge(&self, headers: &HeaderMap) -> PaymentChallenge {
        let expected = self.verifier.expected();
        PaymentChallenge::builder()
            .chain_id(self.verifier.chain_id())
            .token(expected.token.clone().unwrap_or_default())
            .amount(expected.amount.clone())
            .facilitator(
                self.facilitator
                    .clone()
                    .unwrap_or_else(|| facilitator_url(headers)),
            )
            .build()
    }

    /// Payment needed to access resource
    pub fn payment_required(&self, headers: &HeaderMap) -> ErrorResponse {
        ErrorResponse {
            status: StatusCode::PAYMENT_REQUIRED,
            header: Some(ErrorResponseHeader::Challenge(self.challenge(headers))),
            body: ErrorBody {
                scheme: Some(SCHEME.to_string()),
                hint: Some(self.hint.clone()),
                ..ErrorBody::new("Payment required")
            },
        }
    }
}

/// Malformed proof or proof header
pub fn invalid_payment(reason: impl Display) -> ErrorResponse {
    ErrorResponse {
        status: StatusCode::BAD_REQUEST,
        header: None,
        body: ErrorBody {
            detail: Some(reason.to_string()),
            ..ErrorBody::new("invalid_proof")
        },
    }
}

/// The proof does not settle the expected payment
pub fn payment_failed(reason: RejectReason) -> ErrorResponse {
    ErrorResponse {
        status: StatusCode::UNAUTHORIZED,
        header: None,
        body: ErrorBody {
            reason: Some(reason),
            ..ErrorBody::new("Invalid payment proof")
        },
    }
}

/// The ledger could not be consulted
pub fn verification_failed(detail: impl Display) -> ErrorResponse {
    ErrorResponse {
        status: StatusCode::BAD_GATEWAY,
        header: None,
        body: ErrorBody {
            detail: Some(detail.to_string()),
            ..ErrorBody::new("verification_failed")
        },
    }
}
