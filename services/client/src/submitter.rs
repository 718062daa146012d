//! # Transaction Submitter
//!
//! Each exchange action is an ordered list of steps executed one at a time.
//! A step is only submitted after the previous one is confirmed, and the
//! first failure halts the plan:
//!
//! ```text
//! add liquidity   : [Approve(exchange, token_amount), AddLiquidity]
//! remove liquidity: [RemoveLiquidity]
//! swap ether→token: [EthToToken]
//! swap token→ether: [Approve(exchange, amount), TokenToEth]
//! ```

use cdex_types::{Address, SwapDirection, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{ExchangeError, Result, TxError};
use crate::logging::LogEmoji;
use crate::wallet::{SigningHandle, TxOutcome};
use crate::{log_error, log_execution, log_success};

/// One contract call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStep {
    /// `token.approve(spender, amount)`
    Approve { spender: Address, amount: U256 },
    /// `exchange.addLiquidity(token_amount)` paying `value` ether
    AddLiquidity { token_amount: U256, value: U256 },
    /// `exchange.removeLiquidity(lp_amount)`
    RemoveLiquidity { lp_amount: U256 },
    /// `exchange.ethToCryptoDevToken(min_tokens)` paying `value` ether
    EthToToken { min_tokens: U256, value: U256 },
    /// `exchange.cryptoDevTokenToEth(tokens_sold, min_eth)`
    TokenToEth { tokens_sold: U256, min_eth: U256 },
}

impl TxStep {
    /// Contract function name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Approve { .. } => "approve",
            Self::AddLiquidity { .. } => "addLiquidity",
            Self::RemoveLiquidity { .. } => "removeLiquidity",
            Self::EthToToken { .. } => "ethToCryptoDevToken",
            Self::TokenToEth { .. } => "cryptoDevTokenToEth",
        }
    }

    /// Ether attached to the call
    pub fn value(&self) -> U256 {
        match self {
            Self::AddLiquidity { value, .. } | Self::EthToToken { value, .. } => *value,
            _ => U256::zero(),
        }
    }
}

/// User-facing action a plan implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    AddLiquidity,
    RemoveLiquidity,
    Swap,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddLiquidity => write!(f, "add liquidity"),
            Self::RemoveLiquidity => write!(f, "remove liquidity"),
            Self::Swap => write!(f, "swap"),
        }
    }
}

impl ActionKind {
    fn emoji(self) -> &'static str {
        match self {
            Self::AddLiquidity => LogEmoji::ADD,
            Self::RemoveLiquidity => LogEmoji::REMOVE,
            Self::Swap => LogEmoji::SWAP,
        }
    }
}

/// Ordered steps for one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub kind: ActionKind,
    pub steps: Vec<TxStep>,
}

impl ActionPlan {
    /// Approve the exchange for `token_amount`, then add liquidity
    pub fn add_liquidity(exchange: Address, token_amount: U256, ether_amount: U256) -> Self {
        Self {
            kind: ActionKind::AddLiquidity,
            steps: vec![
                TxStep::Approve {
                    spender: exchange,
                    amount: token_amount,
                },
                TxStep::AddLiquidity {
                    token_amount,
                    value: ether_amount,
                },
            ],
        }
    }

    pub fn remove_liquidity(lp_amount: U256) -> Self {
        Self {
            kind: ActionKind::RemoveLiquidity,
            steps: vec![TxStep::RemoveLiquidity { lp_amount }],
        }
    }

    /// Swap `amount` of the input asset, expecting at least `expected_out`
    pub fn swap(
        exchange: Address,
        amount: U256,
        expected_out: U256,
        direction: SwapDirection,
    ) -> Self {
        let mut steps = Vec::with_capacity(2);
        if direction.requires_approval() {
            steps.push(TxStep::Approve {
                spender: exchange,
                amount,
            });
        }
        steps.push(match direction {
            SwapDirection::EtherToToken => TxStep::EthToToken {
                min_tokens: expected_out,
                value: amount,
            },
            SwapDirection::TokenToEther => TxStep::TokenToEth {
                tokens_sold: amount,
                min_eth: expected_out,
            },
        });
        Self {
            kind: ActionKind::Swap,
            steps,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Validated amounts for one action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionRequest {
    AddLiquidity {
        token_amount: U256,
        ether_amount: U256,
    },
    RemoveLiquidity {
        lp_amount: U256,
    },
    Swap {
        amount: U256,
        expected_out: U256,
        direction: SwapDirection,
    },
}

impl ActionRequest {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::AddLiquidity { .. } => ActionKind::AddLiquidity,
            Self::RemoveLiquidity { .. } => ActionKind::RemoveLiquidity,
            Self::Swap { .. } => ActionKind::Swap,
        }
    }

    /// Build the step list, approvals addressed to `exchange`
    pub fn plan(&self, exchange: Address) -> ActionPlan {
        match *self {
            Self::AddLiquidity {
                token_amount,
                ether_amount,
            } => ActionPlan::add_liquidity(exchange, token_amount, ether_amount),
            Self::RemoveLiquidity { lp_amount } => ActionPlan::remove_liquidity(lp_amount),
            Self::Swap {
                amount,
                expected_out,
                direction,
            } => ActionPlan::swap(exchange, amount, expected_out, direction),
        }
    }
}

/// Runs a plan step by step
pub struct Sequencer;

impl Sequencer {
    /// Submit each step and wait for its confirmation before the next
    ///
    /// # Returns
    /// One outcome per step, or the first failure. A rejected signature is
    /// `WalletRejection`; anything else is `TransactionFailure` carrying the
    /// step index and name.
    pub async fn execute(signer: &dyn SigningHandle, plan: &ActionPlan) -> Result<Vec<TxOutcome>> {
        log_execution!(
            "{} Starting {} ({} step{}) from {:?}",
            plan.kind.emoji(),
            plan.kind,
            plan.len(),
            if plan.len() == 1 { "" } else { "s" },
            signer.account()
        );

        let mut outcomes = Vec::with_capacity(plan.len());
        for (index, step) in plan.steps.iter().enumerate() {
            tracing::info!(
                "{} Step {}/{}: {} awaiting wallet and confirmation",
                LogEmoji::WAIT,
                index + 1,
                plan.len(),
                step.name()
            );

            match signer.submit(step).await {
                Ok(outcome) => {
                    tracing::debug!(
                        "Step {} confirmed: tx {:?} in block {:?}",
                        step.name(),
                        outcome.tx_hash,
                        outcome.block_number
                    );
                    outcomes.push(outcome);
                }
                Err(TxError::Rejected(reason)) => {
                    tracing::warn!(
                        "{} {} cancelled: {} signature rejected ({})",
                        LogEmoji::WARNING,
                        plan.kind,
                        step.name(),
                        reason
                    );
                    return Err(ExchangeError::WalletRejection {
                        request: step.name().to_string(),
                    });
                }
                Err(err) => {
                    log_error!("{} failed at step {} ({}): {}", plan.kind, index, step.name(), err);
                    return Err(ExchangeError::TransactionFailure {
                        step: index,
                        action: step.name(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        log_success!("{} {} confirmed", plan.kind.emoji(), plan.kind);
        Ok(outcomes)
    }
}

/// One entry point per exchange action over a signing handle
#[derive(Clone)]
pub struct TransactionSubmitter {
    signer: Arc<dyn SigningHandle>,
}

impl TransactionSubmitter {
    pub fn new(signer: Arc<dyn SigningHandle>) -> Self {
        Self { signer }
    }

    pub async fn add_liquidity(
        &self,
        token_amount: U256,
        ether_amount: U256,
    ) -> Result<Vec<TxOutcome>> {
        self.execute(ActionRequest::AddLiquidity {
            token_amount,
            ether_amount,
        })
        .await
    }

    pub async fn remove_liquidity(&self, lp_amount: U256) -> Result<Vec<TxOutcome>> {
        self.execute(ActionRequest::RemoveLiquidity { lp_amount }).await
    }

    pub async fn swap(
        &self,
        amount: U256,
        expected_out: U256,
        direction: SwapDirection,
    ) -> Result<Vec<TxOutcome>> {
        self.execute(ActionRequest::Swap {
            amount,
            expected_out,
            direction,
        })
        .await
    }

    pub async fn execute(&self, request: ActionRequest) -> Result<Vec<TxOutcome>> {
        let plan = request.plan(self.signer.exchange_address());
        Sequencer::execute(self.signer.as_ref(), &plan).await
    }
}
