//! Default values and constants
//!
//! Shared by the config loader and the client so a missing setting and an
//! explicit default always agree.

/// Network defaults
pub mod network {
    /// Rinkeby, where the exchange and token contracts are deployed
    pub const CHAIN_ID: u64 = 4;

    /// Local wallet RPC endpoint (wallets such as Frame expose one)
    pub const RPC_URL: &str = "http://127.0.0.1:1248";
}

/// Asset defaults
pub mod assets {
    /// Native ether precision
    pub const ETHER_DECIMALS: u8 = 18;

    /// CD token precision (standard ERC-20)
    pub const TOKEN_DECIMALS: u8 = 18;

    pub const TOKEN_SYMBOL: &str = "CD";
}

/// Wallet defaults
pub mod wallet {
    /// One confirmation is enough for every step
    pub const CONFIRMATIONS: usize = 1;
}

/// Zero address constant for unconfigured contracts
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Prefix for environment overrides (`CDEX_NETWORK__CHAIN_ID=5`)
pub const ENV_PREFIX: &str = "CDEX";
