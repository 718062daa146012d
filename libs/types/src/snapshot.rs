//! Balances and reserves read from chain in one refresh

use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

/// Everything the view shows about the user and the exchange.
///
/// Each field is `None` when its read failed. A snapshot is replaced
/// wholesale on every refresh; fields are never patched individually.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveSnapshot {
    /// Ether held by the connected account
    pub ether_balance: Option<U256>,
    /// CD tokens held by the connected account
    pub token_balance: Option<U256>,
    /// LP tokens held by the connected account
    pub lp_balance: Option<U256>,
    /// CD tokens held by the exchange contract (`getReserve()`)
    pub token_reserve: Option<U256>,
    /// Ether held by the exchange contract
    pub ether_reserve: Option<U256>,
    /// Total LP supply (`totalSupply()` on the exchange)
    pub lp_total_supply: Option<U256>,
}

impl ReserveSnapshot {
    /// True when every read succeeded
    pub fn is_complete(&self) -> bool {
        self.ether_balance.is_some()
            && self.token_balance.is_some()
            && self.lp_balance.is_some()
            && self.token_reserve.is_some()
            && self.ether_reserve.is_some()
            && self.lp_total_supply.is_some()
    }

    /// Both exchange reserves, if known
    pub fn reserves(&self) -> Option<(U256, U256)> {
        Some((self.ether_reserve?, self.token_reserve?))
    }

    /// Names of the fields whose read failed
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let fields = [
            ("ether_balance", self.ether_balance.is_none()),
            ("token_balance", self.token_balance.is_none()),
            ("lp_balance", self.lp_balance.is_none()),
            ("token_reserve", self.token_reserve.is_none()),
            ("ether_reserve", self.ether_reserve.is_none()),
            ("lp_total_supply", self.lp_total_supply.is_none()),
        ];
        fields
            .iter()
            .filter(|(_, missing)| *missing)
            .map(|(name, _)| *name)
            .collect()
    }
}
