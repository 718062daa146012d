//! # Chain Reader
//!
//! Balance and reserve queries over a read-only handle. Every query is
//! side-effect free; a failed query logs a warning and comes back as
//! `ExchangeError::ReadFailure`, which `refresh` turns into an unknown
//! (`None`) snapshot field.

use cdex_types::{Address, BalanceTarget, ReserveSnapshot, SwapDirection, U256};
use std::sync::Arc;
use tracing::warn;

use crate::error::{ExchangeError, GatewayError, Result};
use crate::log_search;
use crate::wallet::ReadHandle;

/// Queries against the exchange and token contracts
#[derive(Clone)]
pub struct ChainReader {
    handle: Arc<dyn ReadHandle>,
}

impl ChainReader {
    pub fn new(handle: Arc<dyn ReadHandle>) -> Self {
        Self { handle }
    }

    /// Ether held by an account, or by the exchange contract itself
    pub async fn ether_balance(&self, target: BalanceTarget) -> Result<U256> {
        let owner = match target {
            BalanceTarget::Account(address) => address,
            BalanceTarget::Exchange => self.handle.exchange_address(),
        };
        let query = match target {
            BalanceTarget::Account(_) => "ether_balance",
            BalanceTarget::Exchange => "ether_reserve",
        };
        read(query, self.handle.ether_balance(owner).await)
    }

    pub async fn token_balance(&self, owner: Address) -> Result<U256> {
        read("token_balance", self.handle.token_balance(owner).await)
    }

    pub async fn lp_balance(&self, owner: Address) -> Result<U256> {
        read("lp_balance", self.handle.lp_balance(owner).await)
    }

    /// Tokens held by the exchange
    pub async fn token_reserve(&self) -> Result<U256> {
        read("token_reserve", self.handle.token_reserve().await)
    }

    pub async fn lp_total_supply(&self) -> Result<U256> {
        read("lp_total_supply", self.handle.lp_total_supply().await)
    }

    /// Run every read concurrently and collect the results
    ///
    /// Failed reads become `None`; the snapshot is always returned whole.
    pub async fn refresh(&self, account: Address) -> ReserveSnapshot {
        log_search!("Refreshing balances for {:?}", account);

        let (
            ether_balance,
            token_balance,
            lp_balance,
            token_reserve,
            ether_reserve,
            lp_total_supply,
        ) = tokio::join!(
            self.ether_balance(BalanceTarget::Account(account)),
            self.token_balance(account),
            self.lp_balance(account),
            self.token_reserve(),
            self.ether_balance(BalanceTarget::Exchange),
            self.lp_total_supply(),
        );

        let snapshot = ReserveSnapshot {
            ether_balance: ether_balance.ok(),
            token_balance: token_balance.ok(),
            lp_balance: lp_balance.ok(),
            token_reserve: token_reserve.ok(),
            ether_reserve: ether_reserve.ok(),
            lp_total_supply: lp_total_supply.ok(),
        };

        let missing = snapshot.missing_fields();
        if !missing.is_empty() {
            warn!("Refresh incomplete, unknown fields: {}", missing.join(", "));
        }
        snapshot
    }

    /// Output the exchange would pay for `amount` of the input asset
    ///
    /// The contract's `getAmountOfTokens` prices the swap; this only picks the
    /// reserve order. Zero input or unknown reserves give zero without a call.
    pub async fn swap_estimate(
        &self,
        amount: U256,
        direction: SwapDirection,
        snapshot: &ReserveSnapshot,
    ) -> Result<U256> {
        if amount.is_zero() {
            return Ok(U256::zero());
        }
        let Some((ether_reserve, token_reserve)) = snapshot.reserves() else {
            warn!("Swap estimate skipped: reserves unknown");
            return Ok(U256::zero());
        };

        let (input_reserve, output_reserve) =
            direction.order_reserves(ether_reserve, token_reserve);
        log_search!(
            "Estimating {} swap of {} (reserves in={}, out={})",
            direction,
            amount,
            input_reserve,
            output_reserve
        );
        read(
            "amount_of_tokens",
            self.handle
                .amount_of_tokens(amount, input_reserve, output_reserve)
                .await,
        )
    }
}

fn read(query: &'static str, result: std::result::Result<U256, GatewayError>) -> Result<U256> {
    result.map_err(|e| {
        warn!("Read of {} failed: {}", query, e);
        ExchangeError::ReadFailure {
            query,
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockWallet;
    use crate::wallet::WalletProvider;

    fn account() -> Address {
        Address::repeat_byte(0xaa)
    }

    #[tokio::test]
    async fn test_exchange_target_reads_exchange_address() {
        let wallet = MockWallet::new(4).with_reserves(
            U256::from(200),
            U256::from(800),
            U256::from(1000),
        );
        let reader = ChainReader::new(wallet.reader());

        let reserve = reader.ether_balance(BalanceTarget::Exchange).await.unwrap();
        assert_eq!(reserve, U256::from(200));
    }

    #[tokio::test]
    async fn test_failed_read_is_read_failure() {
        let wallet = MockWallet::new(4);
        wallet.fail_reads(true);
        let reader = ChainReader::new(wallet.reader());

        let err = reader.token_reserve().await.unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::ReadFailure {
                query: "token_reserve",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_refresh_marks_failures_unknown() {
        let wallet = MockWallet::new(4);
        wallet.fail_reads(true);
        let reader = ChainReader::new(wallet.reader());

        let snapshot = reader.refresh(account()).await;
        assert_eq!(snapshot, ReserveSnapshot::default());
    }

    #[tokio::test]
    async fn test_swap_estimate_short_circuits() {
        let wallet = MockWallet::new(4).with_reserves(
            U256::from(100),
            U256::from(500),
            U256::from(100),
        );
        let calls = wallet.calls();
        let reader = ChainReader::new(wallet.reader());

        let zero = reader
            .swap_estimate(U256::zero(), SwapDirection::EtherToToken, &ReserveSnapshot::default())
            .await
            .unwrap();
        assert!(zero.is_zero());

        let unknown = reader
            .swap_estimate(U256::from(10), SwapDirection::EtherToToken, &ReserveSnapshot::default())
            .await
            .unwrap();
        assert!(unknown.is_zero());

        assert!(!calls.lock().iter().any(|c| c == "amount_of_tokens"));
    }

    #[tokio::test]
    async fn test_swap_estimate_orders_reserves_by_direction() {
        let wallet = MockWallet::new(4).with_reserves(
            U256::from(1000),
            U256::from(5000),
            U256::from(1000),
        );
        let reader = ChainReader::new(wallet.reader());
        let snapshot = reader.refresh(account()).await;

        // 100 * 99 * 5000 / (1000 * 100 + 100 * 99) = 450
        let tokens = reader
            .swap_estimate(U256::from(100), SwapDirection::EtherToToken, &snapshot)
            .await
            .unwrap();
        assert_eq!(tokens, U256::from(450));

        // 100 * 99 * 1000 / (5000 * 100 + 100 * 99) = 19
        let ether = reader
            .swap_estimate(U256::from(100), SwapDirection::TokenToEther, &snapshot)
            .await
            .unwrap();
        assert_eq!(ether, U256::from(19));
    }
}
