//! # CDEX AMM Library - Client-Side Liquidity Ratios
//!
//! ## Purpose
//!
//! Integer arithmetic the client needs to present liquidity actions before they
//! are submitted: how many tokens must accompany an ether deposit, and what a
//! withdrawal of LP tokens pays out. The exchange contract enforces the same
//! formulas on-chain; this crate only previews them.
//!
//! Swap output is deliberately absent. The contract's `getAmountOfTokens`
//! owns the fee and curve, so the client asks the chain rather than
//! re-deriving it.
//!
//! ## Precision
//!
//! - All ratio math runs on `U256` smallest units with floor division
//! - Zero denominators short-circuit to zero, never panic
//! - `Decimal` appears only in display helpers (spot price, pool share)

pub mod pricing;
pub mod ratio;

pub use pricing::{pool_share_pct, spot_price, to_decimal};
pub use ratio::{LiquidityMath, LiquidityMode, LiquidityPayout};

pub use rust_decimal::Decimal;
