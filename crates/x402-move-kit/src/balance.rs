//! Native coin balances.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use x402_move_core::types::render_scalar;

use crate::{history::coin_store_type, ledger::Ledger};

/// Decimals of the native coin.
pub const NATIVE_DECIMALS: u8 = 8;

/// Symbol of the native coin looked for during discovery.
pub const NATIVE_SYMBOL: &str = "MOVE";

const COIN_INFO_PREFIX: &str = "0x1::coin::CoinInfo<";

/// A coin balance in the smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub address: String,
    pub coin_type: String,
    pub decimals: u8,
    pub value: String,
}

/// The balance of `coin_type` held by `address`. An account without a coin store holds `"0"`.
pub async fn coin_balance<L: Ledger>(
    ledger: &L,
    address: &str,
    coin_type: &str,
) -> Result<Balance, L::Error> {
    let store = ledger
        .account_resource(address, &coin_store_type(coin_type))
        .await?;

    let value = store
        .as_ref()
        .and_then(|s| s.pointer("/data/coin/value"))
        .filter(|v| !v.is_null())
        .map(render_scalar)
        .unwrap_or_else(|| "0".to_string());

    Ok(Balance {
        address: address.to_string(),
        coin_type: coin_type.to_string(),
        decimals: NATIVE_DECIMALS,
        value,
    })
}

/// Find the native coin type among the `0x1` resources: the `CoinInfo<T>` whose symbol is
/// `MOVE`.
pub async fn discover_native_coin<L: Ledger>(ledger: &L) -> Result<Option<String>, L::Error> {
    let resources = ledger.account_resources("0x1").await?;
    Ok(resources.iter().find_map(native_coin_type))
}

fn native_coin_type(resource: &Value) -> Option<String> {
    let resource_type = resource.get("type")?.as_str()?;
    let inner = resource_type.strip_prefix(COIN_INFO_PREFIX)?;

    let symbol = resource.pointer("/data/symbol").map(render_scalar)?;
    if !symbol.eq_ignore_ascii_case(NATIVE_SYMBOL) {
        return None;
    }

    let end = inner.rfind('>')?;
    let coin_type = &inner[..end];
    (!coin_type.is_empty()).then(|| coin_type.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ledger::MemoryLedger;

    #[tokio::test]
    async fn test_coin_balance() {
        let mut ledger = MemoryLedger::default();
        ledger.insert_resource(
            "0xA11CE",
            json!({
                "type": "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>",
                "data": {"coin": {"value": "1234500000"}}
            }),
        );

        let balance = coin_balance(&ledger, "0xA11CE", "0x1::aptos_coin::AptosCoin")
            .await
            .unwrap();
        assert_eq!(balance.value, "1234500000");
        assert_eq!(balance.decimals, 8);

        let empty = coin_balance(&ledger, "0xB0B", "0x1::aptos_coin::AptosCoin")
            .await
            .unwrap();
        assert_eq!(empty.value, "0");
    }

    #[tokio::test]
    async fn test_discover_native_coin() {
        let mut ledger = MemoryLedger::default();
        ledger
            .insert_resource(
                "0x1",
                json!({"type": "0x1::coin::CoinInfo<0x1::usdc::USDC>", "data": {"symbol": "USDC"}}),
            )
            .insert_resource(
                "0x1",
                json!({
                    "type": "0x1::coin::CoinInfo<0x1::aptos_coin::AptosCoin>",
                    "data": {"symbol": "move"}
                }),
            );

        assert_eq!(
            discover_native_coin(&ledger).await.unwrap().as_deref(),
            Some("0x1::aptos_coin::AptosCoin")
        );
        assert_eq!(
            discover_native_coin(&MemoryLedger::default()).await.unwrap(),
            None
        );
    }

    #[test]
    fn test_native_coin_type_requires_inner_type() {
        let resource = json!({"type": "0x1::coin::CoinInfo<>", "data": {"symbol": "MOVE"}});
        assert_eq!(native_coin_type(&resource), None);
    }
}
