//! Contract bindings generated from human-readable ABIs
//!
//! Kept in separate modules since both contracts expose `balanceOf`.

pub mod exchange;
pub mod token;

pub use exchange::ExchangeContract;
pub use token::TokenContract;
