//! Exact conversion between decimal strings and smallest-unit integers
//!
//! ## Precision Requirements
//!
//! - **Ether**: 18 decimal places (`1 ETH = 1_000_000_000_000_000_000 wei`)
//! - **CD token**: configured decimals, 18 for the deployed contract
//!
//! ## Critical Rules
//!
//! 1. **NO FLOATING POINT**: amounts never pass through f32/f64
//! 2. **No Silent Truncation**: input with more fractional digits than the asset
//!    supports is rejected, not rounded
//! 3. **Empty Means Zero**: an empty field is a zero amount, matching how the
//!    form treats a cleared input

use ethers_core::types::U256;
use thiserror::Error;

/// Largest decimals value whose scale factor fits in a `U256` (10^77 < 2^256).
pub const MAX_DECIMALS: u8 = 77;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("Invalid amount '{input}': expected a non-negative decimal number")]
    InvalidFormat { input: String },

    #[error("Amount '{input}' has {found} fractional digits, asset supports {decimals}")]
    ExcessPrecision {
        input: String,
        found: usize,
        decimals: u8,
    },

    #[error("Amount '{input}' overflows 256 bits")]
    Overflow { input: String },

    #[error("Unsupported decimals {0} (max {MAX_DECIMALS})")]
    UnsupportedDecimals(u8),
}

pub type Result<T> = std::result::Result<T, UnitsError>;

/// Parse a human-readable decimal string into smallest units.
///
/// `"1.5"` with 18 decimals becomes `1_500_000_000_000_000_000`. Leading and
/// trailing whitespace is ignored; `""` parses as zero.
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256> {
    if decimals > MAX_DECIMALS {
        return Err(UnitsError::UnsupportedDecimals(decimals));
    }

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(U256::zero());
    }

    let invalid = || UnitsError::InvalidFormat {
        input: input.to_string(),
    };

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    // Trailing zeros carry no precision ("1.50" is fine for 1 decimal)
    let significant = fraction.trim_end_matches('0');
    if significant.len() > decimals as usize {
        return Err(UnitsError::ExcessPrecision {
            input: input.to_string(),
            found: significant.len(),
            decimals,
        });
    }

    let overflow = || UnitsError::Overflow {
        input: input.to_string(),
    };

    let whole_units = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole).map_err(|_| overflow())?
    };
    let scale = U256::exp10(decimals as usize);

    let fraction_units = if significant.is_empty() {
        U256::zero()
    } else {
        let padded = format!("{:0<width$}", significant, width = decimals as usize);
        U256::from_dec_str(&padded).map_err(|_| overflow())?
    };

    whole_units
        .checked_mul(scale)
        .and_then(|scaled| scaled.checked_add(fraction_units))
        .ok_or_else(overflow)
}

/// Format smallest units as a decimal string.
///
/// Mirrors the `formatEther` convention: at least one fractional digit is
/// always shown (`"1.0"`), trailing zeros beyond it are dropped.
pub fn format_amount(value: U256, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let decimals = decimals.min(MAX_DECIMALS) as usize;

    let (whole, remainder) = value.div_mod(U256::exp10(decimals));
    let fraction = format!("{:0>width$}", remainder.to_string(), width = decimals);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, fraction)
    }
}
