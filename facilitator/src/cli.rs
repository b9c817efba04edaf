//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, ValueEnum, builder::BoolishValueParser};
use x402_move_facilitator::config::{Config, ServiceMode};

/// x402 payment facilitator for Move ledgers.
#[derive(Parser, Debug)]
#[command(name = "x402-move-facilitator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Listening port.
    #[arg(long, short, env = "PORT")]
    pub port: Option<u16>,

    /// Fullnode REST API base URL, including `/v1`.
    #[arg(long, env = "FULLNODE_URL")]
    pub fullnode_url: Option<String>,

    /// Chain identifier advertised in challenges and receipts.
    #[arg(long, env = "CHAIN_ID")]
    pub chain_id: Option<String>,

    /// Price of the premium resource, in the token's smallest unit.
    #[arg(long, env = "PRICE_AMOUNT")]
    pub price_amount: Option<String>,

    /// Coin type tag of the accepted token.
    #[arg(long, env = "USDC_TOKEN")]
    pub usdc_token: Option<String>,

    /// Address of the package publishing `treasury::pay_merchant`.
    #[arg(long, env = "DEO_PACKAGE_ADDRESS")]
    pub deo_package_address: Option<String>,

    /// Address receiving payments.
    #[arg(long, env = "MERCHANT_ADDRESS")]
    pub merchant_address: Option<String>,

    /// Service mode.
    #[arg(long, value_enum, env = "SERVICE_MODE", ignore_case = true)]
    pub service_mode: Option<CliServiceMode>,

    /// Accept native coin transfers as payment.
    #[arg(long, env = "ALLOW_APT_TRANSFER", value_parser = BoolishValueParser::new())]
    pub allow_apt_transfer: Option<bool>,

    /// Allowed CORS origins, comma separated, or `*`.
    #[arg(long, env = "CORS_ORIGIN")]
    pub cors_origin: Option<String>,

    /// Native coin type. Discovered from the ledger when unset.
    #[arg(long, env = "NATIVE_COIN_TYPE")]
    pub native_coin_type: Option<String>,

    /// Verification URL advertised in challenges.
    #[arg(long, env = "FACILITATOR_URL")]
    pub facilitator_url: Option<String>,

    /// Default payer for `/payments`.
    #[arg(long, env = "PAYER_ADDRESS")]
    pub payer_address: Option<String>,

    /// Log level, used when `RUST_LOG` is unset. Defaults to the config file value.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

/// Service mode CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliServiceMode {
    /// Synthetic data, no ledger access.
    Preview,
    /// Verify against the fullnode.
    Chain,
}

impl From<CliServiceMode> for ServiceMode {
    fn from(mode: CliServiceMode) -> Self {
        match mode {
            CliServiceMode::Preview => ServiceMode::Preview,
            CliServiceMode::Chain => ServiceMode::Chain,
        }
    }
}

impl Cli {
    /// Convert CLI arguments into a [`Config`], overriding the configuration file if any.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is specified but cannot be loaded.
    pub fn into_config(self) -> color_eyre::Result<Config> {
        let config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        Ok(self.apply(config))
    }

    /// Override `config` with every argument that was given.
    fn apply(self, mut config: Config) -> Config {
        let non_empty = |v: Option<String>| v.filter(|v| !v.trim().is_empty());

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(v) = non_empty(self.fullnode_url) {
            config.fullnode_url = v;
        }
        if let Some(v) = non_empty(self.chain_id) {
            config.chain_id = v;
        }
        if let Some(v) = non_empty(self.price_amount) {
            config.price_amount = v;
        }
        if let Some(v) = non_empty(self.usdc_token) {
            config.usdc_token = v;
        }
        if let Some(v) = non_empty(self.deo_package_address) {
            config.deo_package_address = v;
        }
        if let Some(v) = non_empty(self.merchant_address) {
            config.merchant_address = v;
        }
        if let Some(mode) = self.service_mode {
            config.service_mode = mode.into();
        }
        if let Some(allow) = self.allow_apt_transfer {
            config.allow_apt_transfer = allow;
        }
        if let Some(v) = non_empty(self.cors_origin) {
            config.cors_origin = v;
        }
        config.native_coin_type = non_empty(self.native_coin_type).or(config.native_coin_type);
        config.facilitator_url = non_empty(self.facilitator_url).or(config.facilitator_url);
        config.payer_address = non_empty(self.payer_address).or(config.payer_address);
        if let Some(v) = non_empty(self.log_level) {
            config.log_level = v;
        }

        config
    }
}
