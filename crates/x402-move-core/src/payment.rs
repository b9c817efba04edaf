//! The payment a merchant expects, and the entry functions accepted as payment.

use crate::types::Amount;

/// Framework coin transfer, generic over the coin type.
pub const COIN_TRANSFER: &str = "0x1::coin::transfer";

/// Native coin transfer through the account framework. Carries no type argument.
pub const NATIVE_TRANSFER: &str = "0x1::aptos_account::transfer";

/// Module and function of the merchant treasury entry point, relative to its package.
pub const PAY_MERCHANT: &str = "treasury::pay_merchant";

/// An entry function that counts as a payment.
///
/// All accepted functions take the recipient as argument 0 and the amount as argument 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptedFunction {
    /// `<package>::treasury::pay_merchant`.
    PayMerchant { function_id: String },
    /// `0x1::coin::transfer<CoinType>`.
    CoinTransfer,
    /// `0x1::aptos_account::transfer`.
    NativeTransfer,
}

impl AcceptedFunction {
    pub fn pay_merchant(package_address: &str) -> Self {
        AcceptedFunction::PayMerchant {
            function_id: format!("{package_address}::{PAY_MERCHANT}"),
        }
    }

    pub fn function_id(&self) -> &str {
        match self {
            AcceptedFunction::PayMerchant { function_id } => function_id,
            AcceptedFunction::CoinTransfer => COIN_TRANSFER,
            AcceptedFunction::NativeTransfer => NATIVE_TRANSFER,
        }
    }

    /// Whether the coin type is read from type argument 0 and must match the expected token.
    pub fn requires_token(&self) -> bool {
        matches!(self, AcceptedFunction::CoinTransfer)
    }

    pub fn recipient_index(&self) -> usize {
        0
    }

    pub fn amount_index(&self) -> usize {
        1
    }
}

/// What a merchant expects to be paid.
///
/// The accepted functions are derived from the configuration, in order: the treasury
/// `pay_merchant`, then `0x1::coin::transfer` when a token is configured, then
/// `0x1::aptos_account::transfer` when native transfers are allowed.
///
/// ```
/// use x402_move_core::payment::{AcceptedFunction, ExpectedPayment};
///
/// let expected = ExpectedPayment::builder()
///     .merchant("0xMERCHANT")
///     .amount("1000")
///     .package_address("0xDEO")
///     .token("deo::usdc::USDC")
///     .build();
///
/// assert_eq!(expected.accepted.len(), 2);
/// assert_eq!(expected.accepted[0].function_id(), "0xDEO::treasury::pay_merchant");
/// assert_eq!(expected.accepted[1], AcceptedFunction::CoinTransfer);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedPayment {
    /// Recipient account address. Compared case-insensitively.
    pub merchant: String,
    pub amount: Amount,
    /// Expected coin type tag, if any.
    pub token: Option<String>,
    /// Accepted entry functions, in precedence order.
    pub accepted: Vec<AcceptedFunction>,
}

#[bon::bon]
impl ExpectedPayment {
    #[builder]
    pub fn new(
        #[builder(into)] merchant: String,
        #[builder(into)] amount: Amount,
        #[builder(into)] package_address: String,
        #[builder(into)] token: Option<String>,
        #[builder(default)] allow_native_transfer: bool,
    ) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());

        let mut accepted = vec![AcceptedFunction::pay_merchant(&package_address)];
        if token.is_some() {
            accepted.push(AcceptedFunction::CoinTransfer);
        }
        if allow_native_transfer {
            accepted.push(AcceptedFunction::NativeTransfer);
        }

        ExpectedPayment {
            merchant,
            amount,
            token,
            accepted,
        }
    }

    /// The accepted function with this exact identifier.
    pub fn match_function(&self, function_id: &str) -> Option<&AcceptedFunction> {
        self.accepted.iter().find(|f| f.function_id() == function_id)
    }

    pub fn accepted_function_ids(&self) -> impl Iterator<Item = &str> {
        self.accepted.iter().map(AcceptedFunction::function_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_functions_without_token() {
        let expected = ExpectedPayment::builder()
            .merchant("0xMERCHANT")
            .amount("1000")
            .package_address("0xDEO")
            .build();

        assert_eq!(expected.token, None);
        assert_eq!(
            expected.accepted_function_ids().collect::<Vec<_>>(),
            vec!["0xDEO::treasury::pay_merchant"]
        );
        assert!(expected.match_function(COIN_TRANSFER).is_none());
    }

    #[test]
    fn test_accepted_functions_with_native_transfer() {
        let expected = ExpectedPayment::builder()
            .merchant("0xMERCHANT")
            .amount(1000u64)
            .package_address("0xDEO")
            .token("deo::usdc::USDC")
            .allow_native_transfer(true)
            .build();

        assert_eq!(
            expected.accepted_function_ids().collect::<Vec<_>>(),
            vec![
                "0xDEO::treasury::pay_merchant",
                COIN_TRANSFER,
                NATIVE_TRANSFER
            ]
        );
        assert_eq!(
            expected.match_function(NATIVE_TRANSFER),
            Some(&AcceptedFunction::NativeTransfer)
        );
    }

    #[test]
    fn test_blank_token_counts_as_unset() {
        let expected = ExpectedPayment::builder()
            .merchant("0xMERCHANT")
            .amount("1000")
            .package_address("0xDEO")
            .token("  ")
            .build();

        assert_eq!(expected.token, None);
        assert_eq!(expected.accepted.len(), 1);
    }

    #[test]
    fn test_function_match_is_exact() {
        let expected = ExpectedPayment::builder()
            .merchant("0xMERCHANT")
            .amount("1000")
            .package_address("0xDEO")
            .build();

        assert!(expected.match_function("0xdeo::treasury::pay_merchant").is_none());
        assert!(expected.match_function("0xDEO::treasury::pay_merchant").is_some());
    }

    #[test]
    fn test_argument_positions() {
        for function in [
            AcceptedFunction::pay_merchant("0xDEO"),
            AcceptedFunction::CoinTransfer,
            AcceptedFunction::NativeTransfer,
        ] {
            assert_eq!(function.recipient_index(), 0);
            assert_eq!(function.amount_index(), 1);
        }
        assert!(AcceptedFunction::CoinTransfer.requires_token());
        assert!(!AcceptedFunction::NativeTransfer.requires_token());
        assert!(!AcceptedFunction::pay_merchant("0xDEO").requires_token());
    }
}
