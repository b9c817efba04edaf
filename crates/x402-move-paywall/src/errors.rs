use bytes::Bytes;
use http::{HeaderName, HeaderValue, Response, StatusCode, header::WWW_AUTHENTICATE};
use http_body_util::Full;
use serde::Serialize;
use x402_move_kit::core::{challenge::PaymentChallenge, verifier::RejectReason};

/// An error response from the paywall.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub header: Option<ErrorResponseHeader>,
    pub body: ErrorBody,
}

/// JSON body of a paywall error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorBody {
            error: error.into(),
            scheme: None,
            hint: None,
            reason: None,
            detail: None,
        }
    }
}

/// Header attached to a paywall error response.
#[derive(Debug, Clone)]
pub enum ErrorResponseHeader {
    /// `WWW-Authenticate: x402 ...`
    Challenge(PaymentChallenge),
}

impl ErrorResponseHeader {
    /// Get the header to include in the response.
    ///
    /// Returns `None` if the header value could not be created.
    pub fn header_value(self) -> Option<(HeaderName, HeaderValue)> {
        match self {
            ErrorResponseHeader::Challenge(challenge) => HeaderValue::from_str(&challenge.to_string())
                .inspect_err(|_err| {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Failed to encode WWW-Authenticate header: {_err}; skipping");
                })
                .ok()
                .map(|v| (WWW_AUTHENTICATE, v)),
        }
    }
}

impl From<ErrorResponse> for Response<Full<Bytes>> {
    fn from(value: ErrorResponse) -> Self {
        let body = match serde_json::to_vec(&value.body) {
            Ok(b) => b,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Failed to serialize paywall error body: {_err}");

                let mut response = Response::new(Full::new(Bytes::from_static(
                    b"Failed to serialize paywall error body",
                )));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                return response;
            }
        };

        let mut response = Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = value.status;
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some((name, val)) = value.header.and_then(ErrorResponseHeader::header_value) {
            response.headers_mut().insert(name, val);
        }
        response
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        let mut response = (self.status, axum::extract::Json(self.body)).into_response();
        if let Some((name, val)) = self.header.and_then(ErrorResponseHeader::header_value) {
            response.headers_mut().insert(name, val);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    #[tokio::test]
    async fn test_error_response_into_http_response() {
        let challenge = PaymentChallenge::builder()
            .chain_id("movement_testnet")
            .token("deo::usdc::USDC")
            .amount("1000")
            .facilitator("http://localhost:3000/verify")
            .build();

        let response: Response<Full<Bytes>> = ErrorResponse {
            status: StatusCode::PAYMENT_REQUIRED,
            header: Some(ErrorResponseHeader::Challenge(challenge.clone())),
            body: ErrorBody {
                scheme: Some("x402".to_string()),
                ..ErrorBody::new("Payment required")
            },
        }
        .into();

        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(
            response.headers()[WWW_AUTHENTICATE].to_str().unwrap(),
            challenge.to_string()
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"error": "Payment required", "scheme": "x402"})
        );
    }

    #[test]
    fn test_reason_serializes_as_code() {
        let body = ErrorBody {
            reason: Some(RejectReason::WrongAmount),
            ..ErrorBody::new("Invalid payment proof")
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"error": "Invalid payment proof", "reason": "wrong_amount"})
        );
    }
}
