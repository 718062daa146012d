//! Standardized emoji logging for the exchange client
//!
//! Keeps emoji usage consistent across session, reader and submitter logs.

/// Standard emoji set for client logging
pub struct LogEmoji;

impl LogEmoji {
    // Status indicators
    pub const SUCCESS: &'static str = "✅"; // Operation succeeded
    pub const ERROR: &'static str = "❌"; // Operation failed
    pub const WARNING: &'static str = "⚠️"; // Warning or caution

    // Module-specific
    pub const SEARCH: &'static str = "🔍"; // Reading chain state
    pub const EXECUTE: &'static str = "⚡"; // Submitting a transaction
    pub const NETWORK: &'static str = "🌐"; // Wallet/network connection
    pub const WAIT: &'static str = "⏳"; // Awaiting confirmation or approval

    // Actions
    pub const SWAP: &'static str = "🔄";
    pub const ADD: &'static str = "➕";
    pub const REMOVE: &'static str = "➖";
}

#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::SUCCESS, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        tracing::error!("{} {}", $crate::logging::LogEmoji::ERROR, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_search {
    ($($arg:tt)*) => {
        tracing::debug!("{} {}", $crate::logging::LogEmoji::SEARCH, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_execution {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::EXECUTE, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_network {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::NETWORK, format!($($arg)*))
    };
}
