//! [`Amount`] represents a token amount in the ledger's smallest unit.
//!
//! Amounts are compared as strings, never as numbers: Move `u64`/`u128` values exceed the
//! precision of a JSON float and the ledger reports them in decimal string form.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A token amount kept in its decimal string form.
///
/// [`Amount::new`] trims surrounding whitespace from configured prices. Ledger arguments go
/// through [`Amount::verbatim`] and are never normalized. Leading zeros, signs and decimal
/// points are significant, so `"01000"` and `"1000"` are different amounts.
///
/// ```
/// use x402_move_core::types::Amount;
///
/// assert_eq!(Amount::from(" 1000 "), Amount::from(1000u64));
/// assert_ne!(Amount::verbatim(" 1000 "), Amount::from(1000u64));
/// assert_ne!(Amount::from("01000"), Amount::from("1000"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Amount(String);

impl Amount {
    /// Create an amount from its textual form.
    pub fn new(value: impl AsRef<str>) -> Self {
        Amount(value.as_ref().trim().to_string())
    }

    /// Take a ledger argument exactly as rendered.
    pub fn verbatim(value: impl Into<String>) -> Self {
        Amount(value.into())
    }

    /// Render a JSON argument as an amount.
    ///
    /// Strings are taken verbatim, numbers and booleans use their JSON text and `null` is empty.
    pub fn from_json(value: &Value) -> Self {
        Amount::new(render_scalar(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Render a JSON value the way ledger arguments are compared: as plain text.
pub fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl From<&str> for Amount {
    fn from(value: &str) -> Self {
        Amount::new(value)
    }
}

impl From<String> for Amount {
    fn from(value: String) -> Self {
        Amount::new(value)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(value.to_string())
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Amount(value.to_string())
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(_) | Value::Number(_) => Ok(Amount::from_json(&value)),
            other => Err(serde::de::Error::custom(format!(
                "Expected an amount string or number, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_amount_from_json_arguments() {
        assert_eq!(Amount::from_json(&json!("1000")).as_str(), "1000");
        assert_eq!(Amount::from_json(&json!(1000)).as_str(), "1000");
        assert_eq!(Amount::from_json(&Value::Null).as_str(), "");
        assert!(Amount::from_json(&Value::Null).is_empty());
    }

    #[test]
    fn test_amount_is_not_numerically_coerced() {
        assert_ne!(Amount::from("1000.0"), Amount::from("1000"));
        assert_ne!(Amount::from("1e3"), Amount::from("1000"));
        assert_eq!(
            Amount::from("340282366920938463463374607431768211455"),
            Amount::from(u128::MAX)
        );
    }

    #[test]
    fn test_verbatim_keeps_whitespace() {
        assert_eq!(Amount::verbatim(" 1000 ").as_str(), " 1000 ");
        assert_ne!(Amount::verbatim("1000\n"), Amount::new("1000"));
        assert_eq!(Amount::verbatim("1000"), Amount::new(" 1000"));
    }

    #[test]
    fn test_amount_serde() {
        let amount: Amount = serde_json::from_value(json!("1000")).unwrap();
        assert_eq!(amount, Amount::from(1000u64));
        assert_eq!(serde_json::to_value(&amount).unwrap(), json!("1000"));

        let numeric: Amount = serde_json::from_value(json!(25)).unwrap();
        assert_eq!(numeric.as_str(), "25");

        assert!(serde_json::from_value::<Amount>(json!({"value": 1})).is_err());
    }
}
