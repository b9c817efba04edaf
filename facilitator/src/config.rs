//! Facilitator configuration.

use std::{fmt::Display, path::Path};

use serde::{Deserialize, Serialize};
use x402_move_kit::{
    core::payment::{AcceptedFunction, ExpectedPayment},
    fullnode_client::DEFAULT_FULLNODE_URL,
};

/// Errors while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Whether the facilitator consults the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    /// Synthetic answers. The ledger is never contacted.
    #[default]
    Preview,
    /// Proofs, balances and history come from the fullnode.
    Chain,
}

impl Display for ServiceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceMode::Preview => write!(f, "preview"),
            ServiceMode::Chain => write!(f, "chain"),
        }
    }
}

/// Facilitator configuration, as read from a TOML file and overridden from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub fullnode_url: String,
    pub chain_id: String,
    /// Price of the premium resource in the token's smallest unit.
    pub price_amount: String,
    /// Coin type tag of the accepted token.
    pub usdc_token: String,
    /// Address of the package publishing `treasury::pay_merchant`.
    pub deo_package_address: String,
    pub merchant_address: String,
    pub service_mode: ServiceMode,
    /// Accept `0x1::aptos_account::transfer` payments.
    pub allow_apt_transfer: bool,
    /// Allowed CORS origins, comma separated, or `*`.
    pub cors_origin: String,
    /// Native coin type. Discovered from the ledger when unset.
    pub native_coin_type: Option<String>,
    /// Verification URL advertised in challenges. Derived from each request when unset.
    pub facilitator_url: Option<String>,
    /// Payer whose history `/payments` returns when the query names none.
    pub payer_address: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3000,
            fullnode_url: DEFAULT_FULLNODE_URL.to_string(),
            chain_id: "movement_testnet".to_string(),
            price_amount: "1000".to_string(),
            usdc_token: "deo::usdc::USDC".to_string(),
            deo_package_address: "0xDEO".to_string(),
            merchant_address: "0xMERCHANT".to_string(),
            service_mode: ServiceMode::default(),
            allow_apt_transfer: false,
            cors_origin: "*".to_string(),
            native_coin_type: None,
            facilitator_url: None,
            payer_address: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. Missing keys take their default value.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn expected_payment(&self) -> ExpectedPayment {
        ExpectedPayment::builder()
            .merchant(self.merchant_address.as_str())
            .amount(self.price_amount.as_str())
            .package_address(self.deo_package_address.as_str())
            .token(self.usdc_token.as_str())
            .allow_native_transfer(self.allow_apt_transfer)
            .build()
    }

    /// `<package>::treasury::pay_merchant`.
    pub fn pay_function(&self) -> String {
        AcceptedFunction::pay_merchant(&self.deo_package_address)
            .function_id()
            .to_string()
    }
}
