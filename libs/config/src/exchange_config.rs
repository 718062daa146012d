//! Exchange Client Configuration Module
//!
//! Loads the client configuration from an optional TOML file with
//! `CDEX_`-prefixed environment overrides, then validates it.

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use ethers_core::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::defaults;

/// Main client configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Network the wallet must be connected to
    pub network: NetworkConfig,

    /// Deployed contract addresses
    pub contracts: ContractsConfig,

    /// Asset precision and labels
    pub assets: AssetConfig,

    /// Transaction signing
    pub wallet: WalletConfig,
}

/// Network settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Wallet/node JSON-RPC endpoint
    pub rpc_url: String,
    /// The only chain id the client accepts
    pub chain_id: u64,
}

/// Contract addresses (parsed to `Address` on use)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractsConfig {
    pub exchange: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub ether_decimals: u8,
    pub token_decimals: u8,
    pub token_symbol: String,
}

/// Signing settings
///
/// With `private_key` set, transactions are signed locally. Without it the
/// wallet behind `rpc_url` signs them for `account` (or its first account).
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub private_key: Option<String>,
    pub account: Option<String>,
    /// Confirmations awaited per transaction
    pub confirmations: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: defaults::network::RPC_URL.to_string(),
            chain_id: defaults::network::CHAIN_ID,
        }
    }
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            exchange: defaults::ZERO_ADDRESS.to_string(),
            token: defaults::ZERO_ADDRESS.to_string(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            ether_decimals: defaults::assets::ETHER_DECIMALS,
            token_decimals: defaults::assets::TOKEN_DECIMALS,
            token_symbol: defaults::assets::TOKEN_SYMBOL.to_string(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key: None,
            account: None,
            confirmations: defaults::wallet::CONFIRMATIONS,
        }
    }
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("account", &self.account)
            .field("confirmations", &self.confirmations)
            .finish()
    }
}

impl ExchangeConfig {
    /// Load configuration from an optional file with environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading configuration from {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        // Nested keys use a double underscore: CDEX_NETWORK__RPC_URL
        builder = builder.add_source(
            Environment::with_prefix(defaults::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.expand_env_vars()?;

        debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }

    /// Load from the flat environment variables with defaults
    ///
    /// `CDEX_RPC_URL`, `CDEX_CHAIN_ID`, `CDEX_EXCHANGE_ADDRESS`,
    /// `CDEX_TOKEN_ADDRESS`, `CDEX_PRIVATE_KEY`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(rpc_url) = std::env::var("CDEX_RPC_URL") {
            config.network.rpc_url = rpc_url;
        }

        if let Ok(chain_id) = std::env::var("CDEX_CHAIN_ID") {
            if let Ok(value) = chain_id.parse::<u64>() {
                config.network.chain_id = value;
            }
        }

        if let Ok(exchange) = std::env::var("CDEX_EXCHANGE_ADDRESS") {
            config.contracts.exchange = exchange;
        }

        if let Ok(token) = std::env::var("CDEX_TOKEN_ADDRESS") {
            config.contracts.token = token;
        }

        if let Ok(key) = std::env::var("CDEX_PRIVATE_KEY") {
            if !key.is_empty() {
                config.wallet.private_key = Some(key);
            }
        }

        config
    }

    /// Expand `${VAR}` references in string values
    pub fn expand_env_vars(&mut self) -> Result<()> {
        let expanded = shellexpand::env(&self.network.rpc_url)
            .context("Failed to expand RPC URL")?;
        self.network.rpc_url = expanded.to_string();

        if let Some(key) = &self.wallet.private_key {
            let expanded = shellexpand::env(key).context("Failed to expand private key")?;
            self.wallet.private_key = Some(expanded.to_string());
        }

        Ok(())
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.network.chain_id == 0 {
            bail!("chain_id must be non-zero");
        }

        if self.network.rpc_url.is_empty() {
            bail!("rpc_url must be set");
        }

        self.exchange_address()?;
        self.token_address()?;

        if self.contracts.exchange.eq_ignore_ascii_case(&self.contracts.token) {
            bail!("exchange and token contracts must differ");
        }

        if self.assets.ether_decimals > 77 || self.assets.token_decimals > 77 {
            bail!("decimals must be <= 77");
        }

        if self.wallet.confirmations == 0 {
            bail!("confirmations must be at least 1");
        }

        if let Some(account) = &self.wallet.account {
            account
                .parse::<Address>()
                .with_context(|| format!("Invalid wallet account '{}'", account))?;
        }

        Ok(())
    }

    pub fn exchange_address(&self) -> Result<Address> {
        parse_contract("exchange", &self.contracts.exchange)
    }

    pub fn token_address(&self) -> Result<Address> {
        parse_contract("token", &self.contracts.token)
    }
}

fn parse_contract(name: &str, value: &str) -> Result<Address> {
    let address = value
        .parse::<Address>()
        .with_context(|| format!("Invalid {} contract address '{}'", name, value))?;
    if address.is_zero() {
        bail!("{} contract address is not configured", name);
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const EXCHANGE: &str = "0x1111111111111111111111111111111111111111";
    const TOKEN: &str = "0x2222222222222222222222222222222222222222";

    fn configured() -> ExchangeConfig {
        let mut config = ExchangeConfig::default();
        config.contracts.exchange = EXCHANGE.to_string();
        config.contracts.token = TOKEN.to_string();
        config
    }

    #[test]
    fn test_default_needs_contracts() {
        let config = ExchangeConfig::default();
        assert_eq!(config.network.chain_id, 4);
        assert_eq!(config.wallet.confirmations, 1);
        assert!(config.validate().is_err());
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cdex.toml");

        let content = format!(
            r#"
[network]
rpc_url = "http://localhost:8545"
chain_id = 31337

[contracts]
exchange = "{}"
token = "{}"
"#,
            EXCHANGE, TOKEN
        );
        fs::write(&path, content).unwrap();

        let config = ExchangeConfig::load(Some(path.as_path())).unwrap();

        assert_eq!(config.network.rpc_url, "http://localhost:8545");
        assert_eq!(config.network.chain_id, 31337);
        assert_eq!(config.exchange_address().unwrap(), EXCHANGE.parse().unwrap());
        // Unset sections fall back to defaults
        assert_eq!(config.assets.ether_decimals, 18);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(ExchangeConfig::load(Some(missing.as_path())).is_err());
    }

    #[test]
    fn test_nested_env_override() {
        std::env::set_var("CDEX_ASSETS__TOKEN_SYMBOL", "DEVX");

        let config = ExchangeConfig::load(None).unwrap();
        assert_eq!(config.assets.token_symbol, "DEVX");

        std::env::remove_var("CDEX_ASSETS__TOKEN_SYMBOL");
    }

    #[test]
    fn test_flat_env_override() {
        std::env::set_var("CDEX_CHAIN_ID", "5");
        std::env::set_var("CDEX_EXCHANGE_ADDRESS", EXCHANGE);

        let config = ExchangeConfig::from_env();
        assert_eq!(config.network.chain_id, 5);
        assert_eq!(config.contracts.exchange, EXCHANGE);

        std::env::remove_var("CDEX_CHAIN_ID");
        std::env::remove_var("CDEX_EXCHANGE_ADDRESS");
    }

    #[test]
    fn test_validation_failures() {
        let mut config = configured();
        config.contracts.token = EXCHANGE.to_string();
        assert!(config.validate().is_err());

        let mut config = configured();
        config.wallet.confirmations = 0;
        assert!(config.validate().is_err());

        let mut config = configured();
        config.contracts.exchange = "not-an-address".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_private_key_redacted() {
        let mut config = configured();
        config.wallet.private_key = Some("deadbeef".to_string());
        let debug = format!("{:?}", config);
        assert!(!debug.contains("deadbeef"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = configured();
        let text = toml::to_string(&config).unwrap();
        let parsed: ExchangeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.contracts.token, TOKEN);
    }
}
