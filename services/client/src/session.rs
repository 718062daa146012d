//! # Wallet Session Manager
//!
//! Establishes the single wallet session for the lifetime of the client and
//! hands out read-only or signing handles from it.
//!
//! ## Lifecycle
//!
//! ```text
//! connect(require_signer) ─► session cached? ─yes─► chain still required?
//!                                  │ no               │ no         │ yes
//!                                  │                  ▼            ▼
//!                                  │          NetworkMismatch    Handle
//!                                  ▼
//!                      wallet.chain_id() == required?
//!                          │ no                 │ yes
//!                          ▼                    ▼
//!                  NetworkMismatch     wallet.request_account()
//!                  (not cached)                 │
//!                                               ▼
//!                                   cache WalletSession ─► Handle
//! ```
//!
//! A mismatch or a rejection leaves nothing cached, so a later `connect`
//! starts over. A successful session is never re-initialized, but the wallet
//! may switch networks underneath it, so every `connect` on a cached session
//! re-reads the chain id before handing out a handle.

use cdex_types::Address;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::{ExchangeError, GatewayError, Result};
use crate::wallet::{ReadHandle, SigningHandle, WalletProvider};
use crate::{log_error, log_network, log_success};

/// The established connection
#[derive(Clone)]
pub struct WalletSession {
    pub account: Address,
    pub chain_id: u64,
    reader: Arc<dyn ReadHandle>,
    signer: Arc<dyn SigningHandle>,
}

impl WalletSession {
    pub fn reader(&self) -> Arc<dyn ReadHandle> {
        self.reader.clone()
    }

    pub fn signer(&self) -> Arc<dyn SigningHandle> {
        self.signer.clone()
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

/// Handle returned by [`WalletManager::connect`]
#[derive(Clone)]
pub enum Handle {
    ReadOnly(Arc<dyn ReadHandle>),
    Signing(Arc<dyn SigningHandle>),
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadOnly(_) => f.write_str("ReadOnly"),
            Self::Signing(_) => f.write_str("Signing"),
        }
    }
}

impl Handle {
    pub fn is_signing(&self) -> bool {
        matches!(self, Self::Signing(_))
    }
}

/// Owns the wallet provider and the lazily created session
pub struct WalletManager<W: WalletProvider> {
    wallet: W,
    required_chain_id: u64,
    session: OnceCell<WalletSession>,
}

impl<W: WalletProvider> WalletManager<W> {
    pub fn new(wallet: W, required_chain_id: u64) -> Self {
        Self {
            wallet,
            required_chain_id,
            session: OnceCell::new(),
        }
    }

    pub fn required_chain_id(&self) -> u64 {
        self.required_chain_id
    }

    /// Whether a session has been established
    pub fn is_connected(&self) -> bool {
        self.session.initialized()
    }

    /// The session, establishing it on first use
    pub async fn session(&self) -> Result<&WalletSession> {
        self.session.get_or_try_init(|| self.establish()).await
    }

    /// Return a signing handle when `require_signer`, otherwise a read-only one
    pub async fn connect(&self, require_signer: bool) -> Result<Handle> {
        let session = self.checked_session().await?;
        Ok(if require_signer {
            Handle::Signing(session.signer())
        } else {
            Handle::ReadOnly(session.reader())
        })
    }

    /// The session, with the wallet's current chain checked if it was cached
    pub async fn checked_session(&self) -> Result<&WalletSession> {
        if let Some(session) = self.session.get() {
            self.verify_chain().await?;
            return Ok(session);
        }
        self.session().await
    }

    async fn establish(&self) -> Result<WalletSession> {
        log_network!("Connecting to wallet (required chain {})", self.required_chain_id);

        let chain_id = self.verify_chain().await?;

        let account = self
            .wallet
            .request_account()
            .await
            .map_err(|e| connect_error("account access", e))?;

        log_success!("Wallet connected: account {:?} on chain {}", account, chain_id);

        Ok(WalletSession {
            account,
            chain_id,
            reader: self.wallet.reader(),
            signer: self.wallet.signer(account),
        })
    }

    async fn verify_chain(&self) -> Result<u64> {
        let chain_id = self
            .wallet
            .chain_id()
            .await
            .map_err(|e| connect_error("chain id", e))?;

        if chain_id != self.required_chain_id {
            log_error!(
                "Change network: wallet is on chain {}, exchange requires chain {}",
                chain_id,
                self.required_chain_id
            );
            return Err(ExchangeError::NetworkMismatch {
                expected: self.required_chain_id,
                actual: chain_id,
            });
        }
        Ok(chain_id)
    }
}

fn connect_error(request: &str, err: GatewayError) -> ExchangeError {
    match err {
        GatewayError::Rejected(reason) => {
            tracing::warn!("Wallet declined {}: {}", request, reason);
            ExchangeError::WalletRejection {
                request: request.to_string(),
            }
        }
        other => {
            log_error!("Wallet {} request failed: {}", request, other);
            ExchangeError::WalletUnavailable(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockWallet;

    #[tokio::test]
    async fn test_connect_returns_requested_handle() {
        let wallet = MockWallet::new(4);
        let manager = WalletManager::new(wallet, 4);

        assert!(!manager.connect(false).await.unwrap().is_signing());
        assert!(manager.connect(true).await.unwrap().is_signing());
        assert!(manager.is_connected());
    }

    #[tokio::test]
    async fn test_session_established_once() {
        let wallet = MockWallet::new(4);
        let calls = wallet.calls();
        let manager = WalletManager::new(wallet, 4);

        manager.session().await.unwrap();
        manager.session().await.unwrap();
        manager.connect(true).await.unwrap();

        let log = calls.lock();
        // One check to establish, one more for the cached connect
        assert_eq!(log.iter().filter(|c| *c == "chain_id").count(), 2);
        assert_eq!(log.iter().filter(|c| *c == "request_account").count(), 1);
    }

    #[tokio::test]
    async fn test_network_switch_after_connect_is_rejected() {
        let wallet = MockWallet::new(4);
        let control = wallet.clone();
        let manager = WalletManager::new(wallet, 4);
        assert!(manager.connect(true).await.unwrap().is_signing());

        control.switch_chain(1);
        let err = manager.connect(true).await.unwrap_err();
        assert_eq!(
            err,
            ExchangeError::NetworkMismatch {
                expected: 4,
                actual: 1
            }
        );
        assert!(manager.connect(false).await.is_err());
        assert!(manager.checked_session().await.is_err());

        // Session survives; switching back restores access
        control.switch_chain(4);
        assert!(manager.connect(true).await.unwrap().is_signing());
    }

    #[tokio::test]
    async fn test_network_mismatch_not_cached() {
        let wallet = MockWallet::new(1);
        let manager = WalletManager::new(wallet, 4);

        let err = manager.connect(false).await.unwrap_err();
        assert_eq!(
            err,
            ExchangeError::NetworkMismatch {
                expected: 4,
                actual: 1
            }
        );
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn test_rejected_account_is_recoverable() {
        let wallet = MockWallet::new(4);
        wallet.reject_account_requests(true);
        let control = wallet.clone();
        let manager = WalletManager::new(wallet, 4);

        let err = manager.connect(false).await.unwrap_err();
        assert!(matches!(err, ExchangeError::WalletRejection { .. }));

        control.reject_account_requests(false);
        assert!(manager.connect(false).await.is_ok());
    }
}
