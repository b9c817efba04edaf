//! The `WWW-Authenticate: x402 ...` payment challenge and how clients present proofs.

use std::{fmt::Display, str::FromStr};

use bon::Builder;

use crate::{
    errors::{Error, Result},
    types::Amount,
};

/// Authentication scheme of the challenge and of `Authorization: x402 <proof>`.
pub const SCHEME: &str = "x402";

/// Header carrying a proof directly.
pub const PROOF_HEADER: &str = "x-payment-proof";

/// Header carrying the base64-encoded receipt of a verified payment.
pub const PAYMENT_RESPONSE_HEADER: &str = "x-payment-response";

/// A payment challenge, sent with `402 Payment Required`.
///
/// ```
/// use x402_move_core::challenge::PaymentChallenge;
///
/// let challenge = PaymentChallenge::builder()
///     .chain_id("movement_testnet")
///     .token("deo::usdc::USDC")
///     .amount("1000")
///     .facilitator("https://pay.example.com/verify")
///     .build();
///
/// let header = challenge.to_string();
/// assert_eq!(
///     header,
///     r#"x402 chain_id="movement_testnet" token="deo::usdc::USDC" amount="1000" facilitator="https://pay.example.com/verify""#
/// );
/// assert_eq!(header.parse::<PaymentChallenge>().unwrap(), challenge);
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct PaymentChallenge {
    #[builder(into)]
    pub chain_id: String,
    #[builder(into)]
    pub token: String,
    #[builder(into)]
    pub amount: Amount,
    /// URL where proofs can be verified.
    #[builder(into)]
    pub facilitator: String,
}

impl Display for PaymentChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            r#"{SCHEME} chain_id="{}" token="{}" amount="{}" facilitator="{}""#,
            self.chain_id, self.token, self.amount, self.facilitator
        )
    }
}

impl FromStr for PaymentChallenge {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let params = s
            .get(..SCHEME.len())
            .filter(|scheme| scheme.eq_ignore_ascii_case(SCHEME))
            .and_then(|_| s.get(SCHEME.len()..))
            .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
            .ok_or_else(|| Error::InvalidChallenge(format!("Expected the {SCHEME} scheme")))?;

        let mut chain_id = None;
        let mut token = None;
        let mut amount = None;
        let mut facilitator = None;

        for (key, value) in parse_params(params)? {
            match key {
                "chain_id" => chain_id = Some(value),
                "token" => token = Some(value),
                "amount" => amount = Some(value),
                "facilitator" => facilitator = Some(value),
                _ => {}
            }
        }

        Ok(PaymentChallenge {
            chain_id: chain_id
                .ok_or(Error::MissingChallengeParameter("chain_id"))?
                .to_string(),
            token: token
                .ok_or(Error::MissingChallengeParameter("token"))?
                .to_string(),
            amount: Amount::new(amount.ok_or(Error::MissingChallengeParameter("amount"))?),
            facilitator: facilitator
                .ok_or(Error::MissingChallengeParameter("facilitator"))?
                .to_string(),
        })
    }
}

/// Split `key="value" key2="value2"` into pairs. Values may not contain quotes.
fn parse_params(mut rest: &str) -> Result<Vec<(&str, &str)>> {
    let mut params = Vec::new();
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            return Ok(params);
        }

        let (key, after_key) = rest
            .split_once("=\"")
            .ok_or_else(|| Error::InvalidChallenge(format!("Expected key=\"value\" at `{rest}`")))?;
        let (value, after_value) = after_key
            .split_once('"')
            .ok_or_else(|| Error::InvalidChallenge(format!("Unterminated value for `{key}`")))?;

        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(Error::InvalidChallenge(format!("Invalid parameter name `{key}`")));
        }

        params.push((key, value));
        rest = after_value;
    }
}

/// The proof in an `Authorization: x402 <proof>` value, if it uses the x402 scheme.
///
/// ```
/// use x402_move_core::challenge::proof_from_authorization;
///
/// assert_eq!(proof_from_authorization("x402 0xabc"), Some("0xabc"));
/// assert_eq!(proof_from_authorization("X402   0xabc"), Some("0xabc"));
/// assert_eq!(proof_from_authorization("Bearer 0xabc"), None);
/// assert_eq!(proof_from_authorization("x402"), None);
/// ```
pub fn proof_from_authorization(value: &str) -> Option<&str> {
    let scheme = value.get(..SCHEME.len())?;
    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return None;
    }
    let rest = &value[SCHEME.len()..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let proof = rest.trim_start();
    (!proof.is_empty()).then_some(proof)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_in_any_order() {
        let challenge: PaymentChallenge =
            r#"x402 facilitator="http://localhost:3000/verify", amount="1000" token="deo::usdc::USDC" chain_id="movement_testnet""#
                .parse()
                .unwrap();
        assert_eq!(challenge.chain_id, "movement_testnet");
        assert_eq!(challenge.token, "deo::usdc::USDC");
        assert_eq!(challenge.amount, Amount::from(1000u64));
        assert_eq!(challenge.facilitator, "http://localhost:3000/verify");
    }

    #[test]
    fn test_unknown_parameters_are_ignored() {
        let challenge: PaymentChallenge =
            r#"X402 chain_id="a" token="b" amount="1" facilitator="c" nonce="xyz""#
                .parse()
                .unwrap();
        assert_eq!(challenge.facilitator, "c");
    }

    #[test]
    fn test_missing_parameter() {
        let err = r#"x402 chain_id="a" token="b" facilitator="c""#
            .parse::<PaymentChallenge>()
            .unwrap_err();
        assert!(matches!(err, Error::MissingChallengeParameter("amount")));
    }

    #[test]
    fn test_wrong_scheme() {
        for header in [
            r#"Bearer chain_id="a""#,
            r#"x4021 chain_id="a" token="b" amount="1" facilitator="c""#,
            "",
        ] {
            assert!(matches!(
                header.parse::<PaymentChallenge>(),
                Err(Error::InvalidChallenge(_))
            ));
        }
    }

    #[test]
    fn test_malformed_parameters() {
        for header in [r#"x402 chain_id=a"#, r#"x402 chain_id="a"#, r#"x402 ="a""#] {
            assert!(matches!(
                header.parse::<PaymentChallenge>(),
                Err(Error::InvalidChallenge(_))
            ));
        }
    }

    #[test]
    fn test_proof_from_authorization() {
        assert_eq!(proof_from_authorization("x402 0xabc "), Some("0xabc "));
        assert_eq!(proof_from_authorization("x402\t0xabc"), Some("0xabc"));
        assert_eq!(proof_from_authorization("x4020xabc"), None);
        assert_eq!(proof_from_authorization("x402    "), None);
        assert_eq!(proof_from_authorization(""), None);
    }
}
