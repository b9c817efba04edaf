//! Miscellaneous common types used throughout the X402 Move codebase.

use std::fmt::Display;

use base64::{Engine, prelude::BASE64_STANDARD};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Represents any JSON value. Raw ledger records are handled as this type until decoded.
pub type AnyJson = serde_json::Value;

/// Represents a base64-encoded JSON header value, e.g. `X-Payment-Response`.
///
/// ```
/// use serde_json::json;
/// use x402_move_core::types::Base64EncodedHeader;
///
/// let header = Base64EncodedHeader::encode(&json!({"settlement": "final"})).unwrap();
/// let decoded: serde_json::Value = header.decode().unwrap();
/// assert_eq!(decoded, json!({"settlement": "final"}));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64EncodedHeader(pub String);

impl Base64EncodedHeader {
    /// Encode a value as base64 JSON.
    pub fn encode<T: Serialize>(value: &T) -> crate::errors::Result<Self> {
        let json = serde_json::to_string(value)?;
        Ok(Base64EncodedHeader(BASE64_STANDARD.encode(json)))
    }

    /// Decode the base64 JSON payload.
    pub fn decode<T: DeserializeOwned>(&self) -> crate::errors::Result<T> {
        let decoded_bytes = BASE64_STANDARD.decode(&self.0)?;
        let json_str = String::from_utf8(decoded_bytes)?;
        Ok(serde_json::from_str(&json_str)?)
    }
}

impl Serialize for Base64EncodedHeader {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Base64EncodedHeader {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Base64EncodedHeader(s))
    }
}

impl Display for Base64EncodedHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
