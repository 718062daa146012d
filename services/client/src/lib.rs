//! # CDEX Client
//!
//! Orchestration layer over the CDEX exchange and token contracts: connects
//! a wallet, reads balances and reserves, previews liquidity and swap amounts,
//! and runs approve-then-act transaction plans.
//!
//! ## Architecture
//!
//! ```text
//! WalletProvider ──► WalletManager (session) ──► ChainReader ──► ReserveSnapshot
//!                                          └──► TransactionSubmitter ──► Sequencer
//!                          ViewState::apply(Event) -> Vec<Command>
//!                          Controller runs commands, feeds events back
//! ```
//!
//! The chain is reached through the `ReadHandle`/`SigningHandle` traits.
//! `ethers_backend` implements them over JSON-RPC and `testing::MockWallet`
//! implements them in memory.

pub mod abi;
pub mod controller;
pub mod error;
pub mod ethers_backend;
pub mod logging;
pub mod reader;
pub mod render;
pub mod session;
pub mod submitter;
pub mod testing;
pub mod wallet;

pub use controller::{Command, Controller, Event, Tab, ViewState};
pub use error::{ExchangeError, GatewayError, Result, TxError};
pub use ethers_backend::EthersWallet;
pub use reader::ChainReader;
pub use session::{Handle, WalletManager, WalletSession};
pub use submitter::{ActionKind, ActionPlan, ActionRequest, Sequencer, TransactionSubmitter, TxStep};
pub use wallet::{ReadHandle, SigningHandle, TxOutcome, WalletProvider};
