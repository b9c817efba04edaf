/// Error types for X402 Move core operations.
///
/// Verification rejections are not errors; they are reported through
/// [`Verdict`](crate::verifier::Verdict).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// JSON serialization/deserialization errors.
    #[error("Serde JSON error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// Base64 encoding/decoding errors.
    #[error("Base64 decode error: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),

    /// UTF-8 decoding errors.
    #[error("UTF-8 decode error: {0}")]
    Utf8DecodeError(#[from] std::string::FromUtf8Error),

    /// The challenge does not use the `x402` scheme or is not a list of `key="value"` pairs.
    #[error("Invalid x402 challenge: {0}")]
    InvalidChallenge(String),

    /// A mandatory challenge parameter is absent.
    #[error("x402 challenge is missing `{0}`")]
    MissingChallengeParameter(&'static str),
}

/// A specialized `Result` type for X402 Move core operations.
pub type Result<T> = std::result::Result<T, Error>;
