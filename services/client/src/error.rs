//! Error types for the exchange client
//!
//! Four outcomes reach the view: a wrong network (blocking), a wallet
//! rejection (silent reset), a failed read (value shown as unknown) and a
//! failed transaction (reset and logged). Lower-level gateway and
//! transaction errors fold into these.

use cdex_types::UnitsError;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ExchangeError>;

/// Main error type surfaced to the view controller
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExchangeError {
    /// Wallet is on a different chain than the contracts
    #[error("Wrong network: expected chain {expected}, wallet is on chain {actual}")]
    NetworkMismatch {
        /// Required chain id
        expected: u64,
        /// Chain id reported by the wallet
        actual: u64,
    },

    /// User declined a connection or signature request
    #[error("Wallet rejected {request}")]
    WalletRejection {
        /// What was being requested
        request: String,
    },

    /// A balance or reserve query failed
    #[error("Read of {query} failed: {reason}")]
    ReadFailure {
        /// Which query failed
        query: &'static str,
        /// Underlying error message
        reason: String,
    },

    /// A submitted step reverted, was dropped, or never reached the chain
    #[error("Transaction failed at step {step} ({action}): {reason}")]
    TransactionFailure {
        /// Zero-based index into the action plan
        step: usize,
        /// Step name
        action: &'static str,
        /// Underlying error message
        reason: String,
    },

    /// Wallet endpoint unreachable while connecting
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// User-entered amount could not be converted
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] UnitsError),
}

impl ExchangeError {
    /// Whether the session can keep going after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::NetworkMismatch { .. })
    }

    /// Whether the user should see a blocking notice
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::NetworkMismatch { .. })
    }
}

/// Errors reported by a wallet or node behind a handle
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GatewayError {
    /// User declined in the wallet UI (EIP-1193 code 4001)
    #[error("request rejected by user: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// Response did not decode to the expected type
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Errors from submitting one transaction step
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TxError {
    /// User declined to sign
    #[error("signature rejected by user: {0}")]
    Rejected(String),

    /// Transaction (or its gas estimate) reverted
    #[error("reverted: {0}")]
    Reverted(String),

    /// Sent but no receipt arrived
    #[error("dropped before confirmation: {0}")]
    Dropped(String),

    #[error("transport error: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_network_mismatch_blocks() {
        let mismatch = ExchangeError::NetworkMismatch {
            expected: 4,
            actual: 1,
        };
        assert!(mismatch.is_blocking());
        assert!(!mismatch.is_recoverable());

        let rejection = ExchangeError::WalletRejection {
            request: "approve".to_string(),
        };
        assert!(!rejection.is_blocking());
        assert!(rejection.is_recoverable());
    }

    #[test]
    fn test_error_formatting() {
        let err = ExchangeError::TransactionFailure {
            step: 1,
            action: "addLiquidity",
            reason: "reverted: insufficient allowance".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Transaction failed at step 1 (addLiquidity): reverted: insufficient allowance"
        );
    }

    #[test]
    fn test_units_error_converts() {
        let err: ExchangeError = cdex_types::parse_amount("abc", 18).unwrap_err().into();
        assert!(matches!(err, ExchangeError::InvalidAmount(_)));
    }
}
