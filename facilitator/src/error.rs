use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use x402_move_kit::core::verifier::RejectReason;

/// A failed API request. Rendered as `{"ok": false, "error": <code>}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid_json")]
    InvalidJson(#[source] serde_json::Error),
    /// A required input is absent. Rendered as `missing_<name>`.
    #[error("missing_{0}")]
    Missing(&'static str),
    /// An input could not be parsed. Rendered as `invalid_<name>`.
    #[error("invalid_{0}")]
    Invalid(&'static str),
    #[error("proof_invalid")]
    ProofInvalid(RejectReason),
    #[error("verification_failed")]
    VerificationFailed,
    #[error("chain_unavailable")]
    ChainUnavailable,
    #[error("native_coin_unavailable")]
    NativeCoinUnavailable,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_) | ApiError::Missing(_) | ApiError::Invalid(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ProofInvalid(_) => StatusCode::UNAUTHORIZED,
            ApiError::VerificationFailed
            | ApiError::ChainUnavailable
            | ApiError::NativeCoinUnavailable => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::ProofInvalid(reason) => {
                json!({"ok": false, "error": self.to_string(), "reason": reason})
            }
            _ => json!({"ok": false, "error": self.to_string()}),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ApiError::Missing("txHash").to_string(), "missing_txHash");
        assert_eq!(ApiError::Invalid("limit").to_string(), "invalid_limit");
        assert_eq!(
            ApiError::ProofInvalid(RejectReason::WrongMerchant).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::ChainUnavailable.status(), StatusCode::BAD_GATEWAY);
    }
}
