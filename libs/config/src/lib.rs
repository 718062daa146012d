//! # CDEX Configuration
//!
//! Centralized configuration for the exchange client: which network is
//! required, where the exchange and token contracts live, asset precision,
//! and how transactions are signed.
//!
//! ## Sources (later wins)
//!
//! - **Defaults**: [`defaults`] constants
//! - **TOML file**: optional, passed with `--config`
//! - **Environment**: `CDEX_` prefix, `__` between nested keys
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cdex_config::ExchangeConfig;
//!
//! let config = ExchangeConfig::load(Some("cdex.toml".as_ref())).unwrap();
//! config.validate().unwrap();
//! let exchange = config.exchange_address().unwrap();
//! ```

pub mod defaults;
pub mod exchange_config;

pub use exchange_config::{
    AssetConfig, ContractsConfig, ExchangeConfig, NetworkConfig, WalletConfig,
};
