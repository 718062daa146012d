//! Liquidity Ratio Property Tests
//!
//! Properties that must hold for the add/remove liquidity previews
//! regardless of pool size.

use cdex_amm::LiquidityMath;
use cdex_types::U256;
use proptest::prelude::*;

fn u(v: u128) -> U256 {
    U256::from(v)
}

proptest! {
    /// Counterpart equals the floored product over the ether reserve
    #[test]
    fn counterpart_is_floor_of_ratio(
        ether_in in 0u128..=u64::MAX as u128,
        ether_reserve in 1u128..=u64::MAX as u128,
        token_reserve in 0u128..=u64::MAX as u128,
    ) {
        let token = LiquidityMath::add_liquidity_counterpart(
            u(ether_in),
            u(ether_reserve),
            u(token_reserve),
        );
        let expected = ether_in * token_reserve / ether_reserve;
        prop_assert_eq!(token, u(expected));
    }

    /// Depositing the counterpart never improves on the pool price
    #[test]
    fn counterpart_never_exceeds_exact_ratio(
        ether_in in 1u128..=1_000_000_000_000u128,
        ether_reserve in 1u128..=1_000_000_000_000u128,
        token_reserve in 1u128..=1_000_000_000_000u128,
    ) {
        let token = LiquidityMath::add_liquidity_counterpart(
            u(ether_in),
            u(ether_reserve),
            u(token_reserve),
        );
        prop_assert!(token * u(ether_reserve) <= u(ether_in) * u(token_reserve));
    }

    /// Each payout side is floored independently
    #[test]
    fn payout_sides_are_independent_floors(
        total_supply in 1u128..=u64::MAX as u128,
        share in 0u128..=u64::MAX as u128,
        ether_reserve in 0u128..=u64::MAX as u128,
        token_reserve in 0u128..=u64::MAX as u128,
    ) {
        let lp = share % (total_supply + 1);
        let payout = LiquidityMath::remove_liquidity_payout(
            u(lp),
            u(total_supply),
            u(ether_reserve),
            u(token_reserve),
        );
        prop_assert_eq!(payout.ether, u(ether_reserve * lp / total_supply));
        prop_assert_eq!(payout.token, u(token_reserve * lp / total_supply));
    }

    /// Splitting the full supply among holders never pays out more than the reserves
    #[test]
    fn full_withdrawal_never_exceeds_reserves(
        holdings in prop::collection::vec(1u128..=1_000_000_000u128, 1..20),
        ether_reserve in 0u128..=1_000_000_000_000_000u128,
        token_reserve in 0u128..=1_000_000_000_000_000u128,
    ) {
        let total: u128 = holdings.iter().sum();
        let mut supply = total;
        let mut ether_left = ether_reserve;
        let mut token_left = token_reserve;

        // Withdraw one holder at a time against the shrinking pool
        for lp in holdings {
            let payout = LiquidityMath::remove_liquidity_payout(
                u(lp),
                u(supply),
                u(ether_left),
                u(token_left),
            );
            prop_assert!(payout.ether <= u(ether_left));
            prop_assert!(payout.token <= u(token_left));
            ether_left -= payout.ether.as_u128();
            token_left -= payout.token.as_u128();
            supply -= lp;
        }

        prop_assert_eq!(supply, 0);
    }
}

#[test]
fn scenario_proportional_deposit() {
    let token = LiquidityMath::add_liquidity_counterpart(u(10), u(100), u(500));
    assert_eq!(token, u(50));
}

#[test]
fn scenario_partial_withdrawal() {
    let payout = LiquidityMath::remove_liquidity_payout(u(100), u(1000), u(200), u(800));
    assert_eq!((payout.ether, payout.token), (u(20), u(80)));
}
