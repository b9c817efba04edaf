//! Route handlers.

use axum::body::Bytes;
use serde_json::{Map, Value};

use crate::error::ApiError;

pub mod account;
pub mod receipt;
pub mod status;
pub mod verify;
pub mod weather;

/// A JSON request body. An empty body reads as `{}`.
pub(crate) fn json_body(body: &Bytes) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice(body).map_err(ApiError::InvalidJson)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

/// The first of `keys` holding a non-blank string in `body`.
pub(crate) fn body_string(body: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| body.get(*key)?.as_str())
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// A query parameter, trimmed, if non-blank.
pub(crate) fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_body() {
        assert!(json_body(&Bytes::new()).unwrap().is_empty());
        assert!(json_body(&Bytes::from_static(b"[1, 2]")).unwrap().is_empty());
        assert!(matches!(
            json_body(&Bytes::from_static(b"{not json")),
            Err(ApiError::InvalidJson(_))
        ));

        let body = json_body(&Bytes::from_static(br#"{"txHash": " ", "proof": "0xabc"}"#)).unwrap();
        assert_eq!(body_string(&body, &["txHash", "proof"]).as_deref(), Some("0xabc"));
    }
}
