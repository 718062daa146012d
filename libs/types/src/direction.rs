//! Swap direction and balance target selectors

use ethers_core::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which asset the user pays in a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SwapDirection {
    /// Pay ether, receive tokens (`ethToCryptoDevToken`)
    #[default]
    EtherToToken,
    /// Pay tokens, receive ether (`cryptoDevTokenToEth`, needs approval)
    TokenToEther,
}

impl SwapDirection {
    /// Flip the input asset
    pub fn toggled(self) -> Self {
        match self {
            Self::EtherToToken => Self::TokenToEther,
            Self::TokenToEther => Self::EtherToToken,
        }
    }

    /// Whether the exchange must be approved to pull tokens first
    pub fn requires_approval(self) -> bool {
        matches!(self, Self::TokenToEther)
    }

    /// Order `(ether_reserve, token_reserve)` as `(input_reserve, output_reserve)`
    pub fn order_reserves<T>(self, ether_reserve: T, token_reserve: T) -> (T, T) {
        match self {
            Self::EtherToToken => (ether_reserve, token_reserve),
            Self::TokenToEther => (token_reserve, ether_reserve),
        }
    }
}

impl fmt::Display for SwapDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EtherToToken => write!(f, "eth->token"),
            Self::TokenToEther => write!(f, "token->eth"),
        }
    }
}

impl FromStr for SwapDirection {
    type Err = String;

    /// Parse the asset being paid: `eth` or `token`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eth" | "ether" => Ok(Self::EtherToToken),
            "token" | "cd" => Ok(Self::TokenToEther),
            other => Err(format!("unknown swap input asset '{}', use eth or token", other)),
        }
    }
}

/// Whose ether balance to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceTarget {
    Account(Address),
    /// The exchange contract itself (its ether reserve)
    Exchange,
}
