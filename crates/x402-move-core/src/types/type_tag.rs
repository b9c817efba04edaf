//! Matching of Move type tags and account addresses.

/// Prefix of an address-qualified type tag or account address.
pub const ADDRESS_PREFIX: &str = "0x";

/// Separator between the address, module and struct parts of a type tag.
pub const TYPE_TAG_SEPARATOR: &str = "::";

/// Whether `actual` satisfies the `expected` token type tag.
///
/// Both sides are compared case-insensitively and an empty side never matches. When `expected`
/// is not address-qualified (`deo::usdc::USDC` rather than `0x..::usdc::USDC`), only the
/// trailing `module::Type` segments are compared, so the same token deployed at different
/// addresses matches. An address-qualified expectation requires an exact match.
///
/// ```
/// use x402_move_core::types::type_tag_matches;
///
/// assert!(type_tag_matches("mod::Coin", "0xABC::mod::Coin"));
/// assert!(!type_tag_matches("0xABC::mod::Coin", "0xDEF::mod::Coin"));
/// assert!(type_tag_matches("0xabc::mod::coin", "0xABC::mod::Coin"));
/// ```
pub fn type_tag_matches(expected: &str, actual: &str) -> bool {
    let expected = expected.to_ascii_lowercase();
    let actual = actual.to_ascii_lowercase();

    if expected.is_empty() || actual.is_empty() {
        return false;
    }
    if expected == actual {
        return true;
    }
    if is_address_qualified(&expected) {
        return false;
    }

    module_suffix(&expected) == module_suffix(&actual)
}

/// Whether a type tag starts with an account address.
pub fn is_address_qualified(tag: &str) -> bool {
    tag.get(..ADDRESS_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(ADDRESS_PREFIX))
}

/// Whether two account addresses are the same, ignoring case.
pub fn addresses_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// The last two `::`-separated segments of a tag, i.e. `module::Type`.
fn module_suffix(tag: &str) -> String {
    let mut segments: Vec<&str> = tag.rsplitn(3, TYPE_TAG_SEPARATOR).take(2).collect();
    segments.reverse();
    segments.join(TYPE_TAG_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(type_tag_matches("0x1::aptos_coin::AptosCoin", "0x1::aptos_coin::AptosCoin"));
        assert!(type_tag_matches("deo::usdc::USDC", "DEO::USDC::usdc"));
    }

    #[test]
    fn test_relaxed_suffix_match() {
        assert!(type_tag_matches("deo::usdc::USDC", "0xdeadbeef::usdc::USDC"));
        assert!(type_tag_matches("usdc::USDC", "0x1::usdc::USDC"));
        assert!(!type_tag_matches("deo::usdc::USDC", "0xdeadbeef::usdt::USDT"));
        assert!(!type_tag_matches("deo::usdc::USDC", "0xdeadbeef::usdc::Wrapped"));
    }

    #[test]
    fn test_address_qualified_expectation_is_strict() {
        assert!(!type_tag_matches("0xABC::mod::Coin", "0xDEF::mod::Coin"));
        assert!(!type_tag_matches("0XABC::mod::Coin", "0xDEF::mod::Coin"));
    }

    #[test]
    fn test_empty_tags_never_match() {
        assert!(!type_tag_matches("", ""));
        assert!(!type_tag_matches("deo::usdc::USDC", ""));
        assert!(!type_tag_matches("", "0x1::usdc::USDC"));
    }

    #[test]
    fn test_module_suffix() {
        assert_eq!(module_suffix("0x1::coin::transfer"), "coin::transfer");
        assert_eq!(module_suffix("a::b::c::d"), "c::d");
        assert_eq!(module_suffix("usdc"), "usdc");
    }

    #[test]
    fn test_addresses_match() {
        assert!(addresses_match("0xMERCHANT", "0xmerchant"));
        assert!(!addresses_match("0xMERCHANT", "0xmerchant2"));
    }

    fn type_tag() -> impl Strategy<Value = String> {
        (
            prop_oneof![Just(String::new()), "0x[0-9a-fA-F]{1,64}::"],
            "[a-z][a-z0-9_]{0,15}",
            "[A-Za-z][A-Za-z0-9_]{0,15}",
        )
            .prop_map(|(address, module, name)| format!("{address}{module}::{name}"))
    }

    proptest! {
        #[test]
        fn prop_reflexive(tag in type_tag()) {
            prop_assert!(type_tag_matches(&tag, &tag));
        }

        #[test]
        fn prop_case_insensitive(tag in type_tag()) {
            prop_assert!(type_tag_matches(&tag, &tag.to_uppercase()));
            prop_assert!(type_tag_matches(&tag.to_uppercase(), &tag));
        }

        #[test]
        fn prop_unqualified_matches_any_deployment(
            module in "[a-z][a-z0-9_]{0,15}",
            name in "[A-Za-z][A-Za-z0-9_]{0,15}",
            address in "0x[0-9a-f]{1,64}",
        ) {
            let expected = format!("{module}::{name}");
            let actual = format!("{address}::{module}::{name}");
            prop_assert!(type_tag_matches(&expected, &actual));
        }

        #[test]
        fn prop_qualified_rejects_other_deployments(
            module in "[a-z][a-z0-9_]{0,15}",
            name in "[A-Za-z][A-Za-z0-9_]{0,15}",
            a in "0x[0-9a-f]{1,64}",
            b in "0x[0-9a-f]{1,64}",
        ) {
            prop_assume!(!a.eq_ignore_ascii_case(&b));
            let expected = format!("{a}::{module}::{name}");
            let actual = format!("{b}::{module}::{name}");
            prop_assert!(!type_tag_matches(&expected, &actual));
        }
    }
}
