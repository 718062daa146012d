//! Wallet and chain handle traits
//!
//! The seams between the client's orchestration and whatever actually talks
//! to the chain. The ethers backend implements them against a JSON-RPC
//! endpoint; `testing::MockWallet` implements them in memory.

use async_trait::async_trait;
use cdex_types::{Address, U256};
use ethers::types::H256;
use std::sync::Arc;

use crate::error::{GatewayError, TxError};
use crate::submitter::TxStep;

/// Read-only access to chain state
#[async_trait]
pub trait ReadHandle: Send + Sync {
    /// Exchange contract this handle reads from
    fn exchange_address(&self) -> Address;

    /// Native ether balance of `owner`
    async fn ether_balance(&self, owner: Address) -> Result<U256, GatewayError>;

    /// `token.balanceOf(owner)`
    async fn token_balance(&self, owner: Address) -> Result<U256, GatewayError>;

    /// `exchange.balanceOf(owner)`, the LP token balance
    async fn lp_balance(&self, owner: Address) -> Result<U256, GatewayError>;

    /// `exchange.getReserve()`
    async fn token_reserve(&self) -> Result<U256, GatewayError>;

    /// `exchange.totalSupply()`
    async fn lp_total_supply(&self) -> Result<U256, GatewayError>;

    /// `exchange.getAmountOfTokens(input, inputReserve, outputReserve)`
    async fn amount_of_tokens(
        &self,
        input_amount: U256,
        input_reserve: U256,
        output_reserve: U256,
    ) -> Result<U256, GatewayError>;
}

/// Confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
}

/// Access that can authorize state-changing transactions
#[async_trait]
pub trait SigningHandle: Send + Sync {
    /// Account transactions are sent from
    fn account(&self) -> Address;

    /// Exchange contract steps are addressed to (and the approval spender)
    fn exchange_address(&self) -> Address;

    /// Submit one step and wait until it is confirmed
    async fn submit(&self, step: &TxStep) -> Result<TxOutcome, TxError>;
}

/// The user's wallet: the source of the account, the network, and handles
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet for an account (may prompt the user)
    async fn request_account(&self) -> Result<Address, GatewayError>;

    /// Chain id the wallet is connected to
    async fn chain_id(&self) -> Result<u64, GatewayError>;

    fn reader(&self) -> Arc<dyn ReadHandle>;

    fn signer(&self, account: Address) -> Arc<dyn SigningHandle>;
}
