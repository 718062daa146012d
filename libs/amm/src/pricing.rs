//! Display-only decimal views of reserves
//!
//! Nothing here feeds a submitted amount. Values outside `Decimal`'s 96-bit
//! mantissa or 28-digit scale come back as `None`.

use cdex_types::U256;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Convert smallest units to a `Decimal` in whole units
pub fn to_decimal(value: U256, decimals: u8) -> Option<Decimal> {
    if value > U256::from(i128::MAX as u128) {
        return None;
    }
    Decimal::try_from_i128_with_scale(value.as_u128() as i128, decimals as u32).ok()
}

/// Tokens per ether implied by the reserves
pub fn spot_price(
    ether_reserve: U256,
    token_reserve: U256,
    ether_decimals: u8,
    token_decimals: u8,
) -> Option<Decimal> {
    let ether = to_decimal(ether_reserve, ether_decimals)?;
    let token = to_decimal(token_reserve, token_decimals)?;
    token.checked_div(ether).map(|price| price.round_dp(6))
}

/// Percentage of the pool owned by `lp_balance`
pub fn pool_share_pct(lp_balance: U256, total_supply: U256) -> Option<Decimal> {
    let balance = to_decimal(lp_balance, 0)?;
    let supply = to_decimal(total_supply, 0)?;
    balance
        .checked_div(supply)
        .map(|share| (share * dec!(100)).round_dp(4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spot_price() {
        let price = spot_price(U256::from(100), U256::from(500), 0, 0).unwrap();
        assert_eq!(price, dec!(5));

        let wei = U256::exp10(18);
        let price = spot_price(wei * U256::from(2), wei * U256::from(7), 18, 18).unwrap();
        assert_eq!(price, dec!(3.5));
    }

    #[test]
    fn test_spot_price_empty_pool() {
        assert_eq!(spot_price(U256::zero(), U256::from(5), 18, 18), None);
    }

    #[test]
    fn test_pool_share() {
        let share = pool_share_pct(U256::from(250), U256::from(1000)).unwrap();
        assert_eq!(share, dec!(25));
        assert_eq!(pool_share_pct(U256::one(), U256::zero()), None);
    }

    #[test]
    fn test_out_of_range_is_none() {
        assert_eq!(to_decimal(U256::MAX, 18), None);
        assert_eq!(to_decimal(U256::one(), 40), None);
    }
}
