//! Proportional add/remove liquidity math with exact integer division
//!
//! Every formula here is a single multiply-then-divide on `U256`, truncating
//! toward zero. Remainders stay in the pool.

use cdex_types::U256;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How an add-liquidity form is filled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityMode {
    /// Exchange holds no tokens: the user picks both amounts freely
    Initial,
    /// Token amount follows from the ether amount and current reserves
    Proportional,
}

impl LiquidityMode {
    /// Pick the mode from the exchange's token reserve
    pub fn from_token_reserve(token_reserve: U256) -> Self {
        if token_reserve.is_zero() {
            Self::Initial
        } else {
            Self::Proportional
        }
    }
}

/// Assets returned by burning LP tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPayout {
    pub ether: U256,
    pub token: U256,
}

/// Liquidity ratio functions with zero precision loss
pub struct LiquidityMath;

impl LiquidityMath {
    /// Tokens that must accompany `ether_to_add` to keep the pool ratio
    ///
    /// `token = ether_to_add * token_reserve / ether_reserve`, floored.
    ///
    /// # Returns
    /// Zero when `ether_reserve` is zero (first deposit has no ratio) or the
    /// product overflows 256 bits.
    pub fn add_liquidity_counterpart(
        ether_to_add: U256,
        ether_reserve: U256,
        token_reserve: U256,
    ) -> U256 {
        Self::mul_div(ether_to_add, token_reserve, ether_reserve)
    }

    /// Ether and tokens paid out for burning `lp_to_remove`
    ///
    /// ```text
    /// ether = ether_reserve * lp_to_remove / total_supply
    /// token = token_reserve * lp_to_remove / total_supply
    /// ```
    ///
    /// Both sides are floored independently. Zero supply pays nothing.
    pub fn remove_liquidity_payout(
        lp_to_remove: U256,
        total_supply: U256,
        ether_reserve: U256,
        token_reserve: U256,
    ) -> LiquidityPayout {
        LiquidityPayout {
            ether: Self::mul_div(ether_reserve, lp_to_remove, total_supply),
            token: Self::mul_div(token_reserve, lp_to_remove, total_supply),
        }
    }

    /// `a * b / denominator` with the zero-denominator and overflow guards
    fn mul_div(a: U256, b: U256, denominator: U256) -> U256 {
        if denominator.is_zero() {
            return U256::zero();
        }
        match a.checked_mul(b) {
            Some(product) => product / denominator,
            None => {
                warn!("Ratio product overflowed 256 bits: {} * {}", a, b);
                U256::zero()
            }
        }
    }
}
