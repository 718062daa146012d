//! # CDEX Shared Types
//!
//! Types shared by every CDEX crate: amounts in smallest units, the reserve
//! snapshot read from chain, and the small enums that pick a swap direction or
//! a balance target.
//!
//! ## Design Philosophy
//!
//! - **Smallest Units Only**: every amount is a `U256` of wei (or token base units)
//! - **Exact Boundary Conversion**: decimal strings are parsed and formatted only
//!   at the user boundary, and parsing never rounds
//! - **Unknown Is Not Zero**: a failed read is `None`, never a silent zero
//!
//! ## Quick Start
//!
//! ```rust
//! use cdex_types::{format_amount, parse_amount};
//!
//! let wei = parse_amount("1.5", 18).unwrap();
//! assert_eq!(format_amount(wei, 18), "1.5");
//! ```

pub mod direction;
pub mod snapshot;
pub mod units;

pub use direction::{BalanceTarget, SwapDirection};
pub use snapshot::ReserveSnapshot;
pub use units::{format_amount, parse_amount, UnitsError, MAX_DECIMALS};

/// Re-exported so downstream crates name one `U256`/`Address`.
pub use ethers_core::types::{Address, U256};
