//! JSON-RPC wallet backend on ethers
//!
//! `EthersWallet` talks to the wallet or node at `network.rpc_url`. With a
//! configured private key, transactions are signed locally through
//! `SignerMiddleware`; otherwise they are sent with `from = account` and the
//! wallet behind the endpoint signs them, possibly after asking the user.

use anyhow::{Context, Result};
use async_trait::async_trait;
use cdex_config::ExchangeConfig;
use ethers::abi::AbiEncode;
use ethers::prelude::*;
use ethers::providers::{Http, MiddlewareError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::abi::exchange::{
    AddLiquidityCall, CryptoDevTokenToEthCall, EthToCryptoDevTokenCall, RemoveLiquidityCall,
};
use crate::abi::token::ApproveCall;
use crate::abi::{ExchangeContract, TokenContract};
use crate::error::{GatewayError, TxError};
use crate::log_execution;
use crate::submitter::TxStep;
use crate::wallet::{ReadHandle, SigningHandle, TxOutcome, WalletProvider};

/// EIP-1193 "user rejected request"
const USER_REJECTED: i64 = 4001;

/// Wallet reached over HTTP JSON-RPC
pub struct EthersWallet {
    provider: Provider<Http>,
    local_key: Option<LocalWallet>,
    configured_account: Option<Address>,
    exchange: Address,
    token: Address,
    confirmations: usize,
}

impl EthersWallet {
    pub fn from_config(config: &ExchangeConfig) -> Result<Self> {
        // No request timeout: a wallet may hold a signature request open
        // until the user answers it.
        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(2)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        let url: Url = config
            .network
            .rpc_url
            .parse()
            .context("Invalid RPC URL")?;
        let provider = Provider::<Http>::new(Http::new_with_client(url, http_client));

        let local_key = config
            .wallet
            .private_key
            .as_deref()
            .map(|key| key.trim_start_matches("0x").parse::<LocalWallet>())
            .transpose()
            .context("Invalid private key format")?
            .map(|wallet| wallet.with_chain_id(config.network.chain_id));

        let configured_account = config
            .wallet
            .account
            .as_deref()
            .map(str::parse::<Address>)
            .transpose()
            .context("Invalid wallet account")?;

        info!(
            "Wallet backend: {} via {}",
            if local_key.is_some() { "local key" } else { "remote signer" },
            config.network.rpc_url
        );

        Ok(Self {
            provider,
            local_key,
            configured_account,
            exchange: config.exchange_address()?,
            token: config.token_address()?,
            confirmations: config.wallet.confirmations,
        })
    }
}

#[async_trait]
impl WalletProvider for EthersWallet {
    async fn request_account(&self) -> Result<Address, GatewayError> {
        if let Some(key) = &self.local_key {
            return Ok(key.address());
        }
        if let Some(account) = self.configured_account {
            return Ok(account);
        }

        let requested: std::result::Result<Vec<Address>, ProviderError> = self
            .provider
            .request("eth_requestAccounts", Vec::<()>::new())
            .await;
        let accounts = match requested {
            Ok(accounts) => accounts,
            Err(err) => {
                if rpc_code(&err) == Some(USER_REJECTED) {
                    return Err(GatewayError::Rejected(err.to_string()));
                }
                // Plain nodes do not implement the EIP-1102 request
                debug!("eth_requestAccounts unavailable ({}), using eth_accounts", err);
                self.provider.get_accounts().await.map_err(provider_error)?
            }
        };

        accounts
            .first()
            .copied()
            .ok_or_else(|| GatewayError::Rejected("wallet exposed no accounts".to_string()))
    }

    async fn chain_id(&self) -> Result<u64, GatewayError> {
        let chain_id = self.provider.get_chainid().await.map_err(provider_error)?;
        Ok(chain_id.as_u64())
    }

    fn reader(&self) -> Arc<dyn ReadHandle> {
        Arc::new(EthersReader::new(
            Arc::new(self.provider.clone()),
            self.exchange,
            self.token,
        ))
    }

    fn signer(&self, account: Address) -> Arc<dyn SigningHandle> {
        match &self.local_key {
            Some(key) => {
                let client = SignerMiddleware::new(self.provider.clone(), key.clone());
                Arc::new(EthersSigner::new(
                    Arc::new(client),
                    account,
                    self.exchange,
                    self.token,
                    self.confirmations,
                ))
            }
            None => Arc::new(EthersSigner::new(
                Arc::new(self.provider.clone()),
                account,
                self.exchange,
                self.token,
                self.confirmations,
            )),
        }
    }
}

/// Contract reads over any middleware
pub struct EthersReader<M: Middleware> {
    client: Arc<M>,
    exchange: ExchangeContract<M>,
    token: TokenContract<M>,
}

impl<M: Middleware + 'static> EthersReader<M> {
    pub fn new(client: Arc<M>, exchange: Address, token: Address) -> Self {
        Self {
            exchange: ExchangeContract::new(exchange, client.clone()),
            token: TokenContract::new(token, client.clone()),
            client,
        }
    }
}

#[async_trait]
impl<M: Middleware + 'static> ReadHandle for EthersReader<M> {
    fn exchange_address(&self) -> Address {
        self.exchange.address()
    }

    async fn ether_balance(&self, owner: Address) -> Result<U256, GatewayError> {
        self.client
            .get_balance(owner, None)
            .await
            .map_err(|e| middleware_error(&e))
    }

    async fn token_balance(&self, owner: Address) -> Result<U256, GatewayError> {
        self.token.balance_of(owner).call().await.map_err(contract_error)
    }

    async fn lp_balance(&self, owner: Address) -> Result<U256, GatewayError> {
        self.exchange.balance_of(owner).call().await.map_err(contract_error)
    }

    async fn token_reserve(&self) -> Result<U256, GatewayError> {
        self.exchange.get_reserve().call().await.map_err(contract_error)
    }

    async fn lp_total_supply(&self) -> Result<U256, GatewayError> {
        self.exchange.total_supply().call().await.map_err(contract_error)
    }

    async fn amount_of_tokens(
        &self,
        input_amount: U256,
        input_reserve: U256,
        output_reserve: U256,
    ) -> Result<U256, GatewayError> {
        self.exchange
            .get_amount_of_tokens(input_amount, input_reserve, output_reserve)
            .call()
            .await
            .map_err(contract_error)
    }
}

/// Sends steps from one account and waits for their receipts
pub struct EthersSigner<M: Middleware> {
    client: Arc<M>,
    account: Address,
    exchange: Address,
    token: Address,
    confirmations: usize,
}

impl<M: Middleware + 'static> EthersSigner<M> {
    pub fn new(
        client: Arc<M>,
        account: Address,
        exchange: Address,
        token: Address,
        confirmations: usize,
    ) -> Self {
        Self {
            client,
            account,
            exchange,
            token,
            confirmations,
        }
    }

    /// Target contract and calldata for a step
    fn encode(&self, step: &TxStep) -> (Address, Vec<u8>) {
        match *step {
            TxStep::Approve { spender, amount } => {
                (self.token, ApproveCall { spender, amount }.encode())
            }
            TxStep::AddLiquidity { token_amount, .. } => (
                self.exchange,
                AddLiquidityCall {
                    amount: token_amount,
                }
                .encode(),
            ),
            TxStep::RemoveLiquidity { lp_amount } => {
                (self.exchange, RemoveLiquidityCall { amount: lp_amount }.encode())
            }
            TxStep::EthToToken { min_tokens, .. } => {
                (self.exchange, EthToCryptoDevTokenCall { min_tokens }.encode())
            }
            TxStep::TokenToEth {
                tokens_sold,
                min_eth,
            } => (
                self.exchange,
                CryptoDevTokenToEthCall {
                    tokens_sold,
                    min_eth,
                }
                .encode(),
            ),
        }
    }
}

#[async_trait]
impl<M: Middleware + 'static> SigningHandle for EthersSigner<M> {
    fn account(&self) -> Address {
        self.account
    }

    fn exchange_address(&self) -> Address {
        self.exchange
    }

    async fn submit(&self, step: &TxStep) -> Result<TxOutcome, TxError> {
        let (to, data) = self.encode(step);
        let tx = TransactionRequest::new()
            .from(self.account)
            .to(to)
            .data(data)
            .value(step.value());

        log_execution!("Sending {} to {:?}", step.name(), to);

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| send_error(&e))?;
        let tx_hash = pending.tx_hash();
        info!("Submitted {}: 0x{:x}", step.name(), tx_hash);

        let receipt = pending
            .confirmations(self.confirmations)
            .await
            .map_err(|e| TxError::Transport(e.to_string()))?;

        match receipt {
            None => Err(TxError::Dropped(format!("0x{:x}", tx_hash))),
            Some(receipt) if receipt.status == Some(U64::zero()) => {
                Err(TxError::Reverted(format!(
                    "0x{:x} in block {:?}",
                    tx_hash, receipt.block_number
                )))
            }
            Some(receipt) => Ok(TxOutcome {
                tx_hash,
                block_number: receipt.block_number.map(|block| block.as_u64()),
            }),
        }
    }
}

fn rpc_code<E: MiddlewareError>(err: &E) -> Option<i64> {
    err.as_error_response().map(|response| response.code)
}

fn provider_error(err: ProviderError) -> GatewayError {
    middleware_error(&err)
}

fn middleware_error<E: MiddlewareError>(err: &E) -> GatewayError {
    if rpc_code(err) == Some(USER_REJECTED) {
        GatewayError::Rejected(err.to_string())
    } else {
        GatewayError::Transport(err.to_string())
    }
}

fn contract_error<M: Middleware>(err: ContractError<M>) -> GatewayError {
    if let Some(inner) = err.as_middleware_error() {
        return middleware_error(inner);
    }
    match err {
        ContractError::DecodingError(e) => GatewayError::Decode(e.to_string()),
        ContractError::DetokenizationError(e) => GatewayError::Decode(e.to_string()),
        other => GatewayError::Transport(other.to_string()),
    }
}

/// Classify a `send_transaction` failure
///
/// Gas estimation runs the call first, so a call that would revert fails
/// here rather than on chain.
fn send_error<E: MiddlewareError>(err: &E) -> TxError {
    match err.as_error_response() {
        Some(response) if response.code == USER_REJECTED => {
            TxError::Rejected(response.message.clone())
        }
        Some(response) if response.message.contains("revert") => {
            TxError::Reverted(response.message.clone())
        }
        _ => TxError::Transport(err.to_string()),
    }
}
