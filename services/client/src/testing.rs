//! Testing utilities for the exchange client
//!
//! `MockWallet` stands in for a wallet plus the two contracts. It keeps a
//! small in-memory pool that add/remove/swap steps actually move, records
//! every call in order, and can be told to reject or revert specific steps.

use async_trait::async_trait;
use cdex_types::{Address, U256};
use ethers::types::H256;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{GatewayError, TxError};
use crate::submitter::TxStep;
use crate::wallet::{ReadHandle, SigningHandle, TxOutcome, WalletProvider};

/// Shared, ordered log of mock calls
pub type CallLog = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Default)]
struct MockState {
    chain_id: u64,
    account: Address,
    reject_account: bool,
    fail_reads: bool,
    reject_steps: HashSet<&'static str>,
    revert_steps: HashSet<&'static str>,
    submitted: u64,

    ether_reserve: U256,
    token_reserve: U256,
    lp_supply: U256,

    ether_balance: U256,
    token_balance: U256,
    lp_balance: U256,
    allowance: U256,
}

/// In-memory wallet, exchange and token
#[derive(Clone)]
pub struct MockWallet {
    state: Arc<Mutex<MockState>>,
    calls: CallLog,
}

impl MockWallet {
    pub fn new(chain_id: u64) -> Self {
        let state = MockState {
            chain_id,
            account: Self::default_account(),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn default_account() -> Address {
        Address::repeat_byte(0xaa)
    }

    pub fn exchange() -> Address {
        Address::repeat_byte(0xee)
    }

    /// Set the exchange's ether reserve, token reserve and LP supply
    pub fn with_reserves(self, ether: U256, token: U256, lp_supply: U256) -> Self {
        {
            let mut state = self.state.lock();
            state.ether_reserve = ether;
            state.token_reserve = token;
            state.lp_supply = lp_supply;
        }
        self
    }

    /// Set the user's ether, token and LP balances
    pub fn with_balances(self, ether: U256, token: U256, lp: U256) -> Self {
        {
            let mut state = self.state.lock();
            state.ether_balance = ether;
            state.token_balance = token;
            state.lp_balance = lp;
        }
        self
    }

    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    /// Names of the submitted steps, in order
    pub fn submitted_steps(&self) -> Vec<String> {
        const STEPS: [&str; 5] = [
            "approve",
            "addLiquidity",
            "removeLiquidity",
            "ethToCryptoDevToken",
            "cryptoDevTokenToEth",
        ];
        self.calls
            .lock()
            .iter()
            .filter(|call| STEPS.contains(&call.as_str()))
            .cloned()
            .collect()
    }

    /// The wallet moves to another network
    pub fn switch_chain(&self, chain_id: u64) {
        self.state.lock().chain_id = chain_id;
    }

    pub fn reject_account_requests(&self, reject: bool) {
        self.state.lock().reject_account = reject;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    /// User declines to sign the named step
    pub fn reject_step(&self, name: &'static str) {
        self.state.lock().reject_steps.insert(name);
    }

    /// The named step reverts on chain
    pub fn revert_step(&self, name: &'static str) {
        self.state.lock().revert_steps.insert(name);
    }

    /// Ether reserve, token reserve and LP supply
    pub fn pool(&self) -> (U256, U256, U256) {
        let state = self.state.lock();
        (state.ether_reserve, state.token_reserve, state.lp_supply)
    }

    pub fn allowance(&self) -> U256 {
        self.state.lock().allowance
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }

    fn read<T>(&self, call: &str, f: impl FnOnce(&MockState) -> T) -> Result<T, GatewayError> {
        self.record(call);
        let state = self.state.lock();
        if state.fail_reads {
            return Err(GatewayError::Transport("connection refused".to_string()));
        }
        Ok(f(&state))
    }
}

/// `getAmountOfTokens` with the exchange's 1% fee
pub fn amount_out(input: U256, input_reserve: U256, output_reserve: U256) -> U256 {
    let input_with_fee = input * U256::from(99);
    let denominator = input_reserve * U256::from(100) + input_with_fee;
    if denominator.is_zero() {
        return U256::zero();
    }
    input_with_fee * output_reserve / denominator
}

fn mul_div(a: U256, b: U256, denominator: U256) -> U256 {
    if denominator.is_zero() {
        U256::zero()
    } else {
        a * b / denominator
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_account(&self) -> Result<Address, GatewayError> {
        self.record("request_account");
        let state = self.state.lock();
        if state.reject_account {
            return Err(GatewayError::Rejected("user rejected the request".to_string()));
        }
        Ok(state.account)
    }

    async fn chain_id(&self) -> Result<u64, GatewayError> {
        self.record("chain_id");
        Ok(self.state.lock().chain_id)
    }

    fn reader(&self) -> Arc<dyn ReadHandle> {
        Arc::new(self.clone())
    }

    fn signer(&self, account: Address) -> Arc<dyn SigningHandle> {
        Arc::new(MockSigner {
            wallet: self.clone(),
            account,
        })
    }
}

#[async_trait]
impl ReadHandle for MockWallet {
    fn exchange_address(&self) -> Address {
        Self::exchange()
    }

    async fn ether_balance(&self, owner: Address) -> Result<U256, GatewayError> {
        self.read("ether_balance", |s| {
            if owner == Self::exchange() {
                s.ether_reserve
            } else {
                s.ether_balance
            }
        })
    }

    async fn token_balance(&self, _owner: Address) -> Result<U256, GatewayError> {
        self.read("token_balance", |s| s.token_balance)
    }

    async fn lp_balance(&self, _owner: Address) -> Result<U256, GatewayError> {
        self.read("lp_balance", |s| s.lp_balance)
    }

    async fn token_reserve(&self) -> Result<U256, GatewayError> {
        self.read("token_reserve", |s| s.token_reserve)
    }

    async fn lp_total_supply(&self) -> Result<U256, GatewayError> {
        self.read("lp_total_supply", |s| s.lp_supply)
    }

    async fn amount_of_tokens(
        &self,
        input_amount: U256,
        input_reserve: U256,
        output_reserve: U256,
    ) -> Result<U256, GatewayError> {
        self.read("amount_of_tokens", |_| {
            amount_out(input_amount, input_reserve, output_reserve)
        })
    }
}

/// Signing side of [`MockWallet`]
pub struct MockSigner {
    wallet: MockWallet,
    account: Address,
}

#[async_trait]
impl SigningHandle for MockSigner {
    fn account(&self) -> Address {
        self.account
    }

    fn exchange_address(&self) -> Address {
        MockWallet::exchange()
    }

    async fn submit(&self, step: &TxStep) -> Result<TxOutcome, TxError> {
        self.wallet.record(step.name());
        let mut state = self.wallet.state.lock();

        if state.reject_steps.contains(step.name()) {
            return Err(TxError::Rejected("user denied transaction signature".to_string()));
        }
        if state.revert_steps.contains(step.name()) {
            return Err(TxError::Reverted("execution reverted".to_string()));
        }

        apply_step(&mut state, step).map_err(|reason| TxError::Reverted(reason.to_string()))?;

        state.submitted += 1;
        Ok(TxOutcome {
            tx_hash: H256::from_low_u64_be(state.submitted),
            block_number: Some(state.submitted),
        })
    }
}

/// Move the pool the way the contracts would
fn apply_step(state: &mut MockState, step: &TxStep) -> Result<(), &'static str> {
    match *step {
        TxStep::Approve { amount, .. } => {
            state.allowance = amount;
        }
        TxStep::AddLiquidity { token_amount, value } => {
            if state.allowance < token_amount {
                return Err("insufficient allowance");
            }
            let minted = if state.token_reserve.is_zero() {
                value
            } else {
                mul_div(value, state.lp_supply, state.ether_reserve)
            };
            state.allowance -= token_amount;
            state.ether_reserve += value;
            state.token_reserve += token_amount;
            state.lp_supply += minted;
            state.ether_balance = state.ether_balance.saturating_sub(value);
            state.token_balance = state.token_balance.saturating_sub(token_amount);
            state.lp_balance += minted;
        }
        TxStep::RemoveLiquidity { lp_amount } => {
            if lp_amount > state.lp_balance || state.lp_supply.is_zero() {
                return Err("insufficient LP balance");
            }
            let ether = mul_div(state.ether_reserve, lp_amount, state.lp_supply);
            let token = mul_div(state.token_reserve, lp_amount, state.lp_supply);
            state.ether_reserve -= ether;
            state.token_reserve -= token;
            state.lp_supply -= lp_amount;
            state.lp_balance -= lp_amount;
            state.ether_balance += ether;
            state.token_balance += token;
        }
        TxStep::EthToToken { min_tokens, value } => {
            let out = amount_out(value, state.ether_reserve, state.token_reserve);
            if out < min_tokens {
                return Err("insufficient output amount");
            }
            state.ether_reserve += value;
            state.token_reserve -= out;
            state.ether_balance = state.ether_balance.saturating_sub(value);
            state.token_balance += out;
        }
        TxStep::TokenToEth {
            tokens_sold,
            min_eth,
        } => {
            if state.allowance < tokens_sold {
                return Err("insufficient allowance");
            }
            let out = amount_out(tokens_sold, state.token_reserve, state.ether_reserve);
            if out < min_eth {
                return Err("insufficient output amount");
            }
            state.allowance -= tokens_sold;
            state.token_reserve += tokens_sold;
            state.ether_reserve -= out;
            state.token_balance = state.token_balance.saturating_sub(tokens_sold);
            state.ether_balance += out;
        }
    }
    Ok(())
}
