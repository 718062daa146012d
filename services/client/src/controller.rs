//! # View Controller
//!
//! Page state as a plain struct with a pure reducer. `ViewState::apply`
//! takes one event and returns the commands it implies; `Controller` runs
//! those commands against the wallet session and feeds the results back as
//! events until the queue drains.
//!
//! ## Submission lifecycle
//!
//! ```text
//! SubmitRequested ──guard──► loading = true ──► Submit
//!                                                  │
//!                   ┌──────────────────────────────┴───────────────┐
//!                   ▼ Ok                                           ▼ Err
//!      pending_reset = kind, Refresh               reset form, loading = false, Refresh
//!                   │
//!                   ▼ Refreshed
//!      reset form, loading = false
//! ```

use cdex_amm::{LiquidityMath, LiquidityMode, LiquidityPayout};
use cdex_types::{parse_amount, Address, ReserveSnapshot, SwapDirection, UnitsError, U256};
use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::error::{ExchangeError, Result};
use crate::reader::ChainReader;
use crate::session::{Handle, WalletManager};
use crate::submitter::{ActionKind, ActionRequest, TransactionSubmitter};
use crate::wallet::{TxOutcome, WalletProvider};

/// LP tokens are minted by the exchange with 18 decimals
pub const LP_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Liquidity,
    Swap,
}

impl Tab {
    pub fn toggled(self) -> Self {
        match self {
            Self::Liquidity => Self::Swap,
            Self::Swap => Self::Liquidity,
        }
    }
}

/// Pending add-liquidity amounts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddLiquidityForm {
    pub ether_input: String,
    pub token_input: String,
    pub ether_amount: U256,
    /// User-entered when the pool is empty, derived from reserves otherwise
    pub token_amount: U256,
    /// `None` until the token reserve is known
    pub mode: Option<LiquidityMode>,
    pub input_error: Option<UnitsError>,
}

/// Pending remove-liquidity amounts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveLiquidityForm {
    pub lp_input: String,
    pub lp_amount: U256,
    pub payout: LiquidityPayout,
    pub input_error: Option<UnitsError>,
}

/// Pending swap
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapForm {
    pub input: String,
    pub amount: U256,
    pub direction: SwapDirection,
    /// Last estimate from the exchange for `amount`, used as the minimum out
    pub expected_out: U256,
    /// Whether `expected_out` belongs to the current amount and direction
    pub estimated: bool,
    pub input_error: Option<UnitsError>,
}

impl SwapForm {
    fn clear(&mut self) {
        *self = Self {
            direction: self.direction,
            ..Self::default()
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connected { account: Address },
    ConnectFailed(ExchangeError),
    Refreshed(ReserveSnapshot),
    TabSelected(Tab),
    AddEtherChanged(String),
    AddTokenChanged(String),
    RemoveLpChanged(String),
    SwapAmountChanged(String),
    SwapDirectionToggled,
    SwapEstimated {
        amount: U256,
        direction: SwapDirection,
        output: U256,
    },
    SubmitRequested(ActionKind),
    SubmitFinished(ActionKind, Result<Vec<TxOutcome>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Refresh,
    EstimateSwap { amount: U256, direction: SwapDirection },
    Submit(ActionRequest),
}

/// Everything the page shows
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub connected: bool,
    pub account: Option<Address>,
    /// Blocking notice (wrong network)
    pub notice: Option<String>,
    pub last_error: Option<ExchangeError>,
    pub tab: Tab,
    pub snapshot: ReserveSnapshot,
    pub add: AddLiquidityForm,
    pub remove: RemoveLiquidityForm,
    pub swap: SwapForm,
    /// A plan is in flight
    pub loading: bool,
    /// Succeeded plan whose form resets on the next refresh
    pub pending_reset: Option<ActionKind>,
    pub last_outcome: Option<(ActionKind, Vec<TxOutcome>)>,
    pub ether_decimals: u8,
    pub token_decimals: u8,
}

impl ViewState {
    pub fn new(ether_decimals: u8, token_decimals: u8) -> Self {
        Self {
            connected: false,
            account: None,
            notice: None,
            last_error: None,
            tab: Tab::default(),
            snapshot: ReserveSnapshot::default(),
            add: AddLiquidityForm::default(),
            remove: RemoveLiquidityForm::default(),
            swap: SwapForm::default(),
            loading: false,
            pending_reset: None,
            last_outcome: None,
            ether_decimals,
            token_decimals,
        }
    }

    /// A submission is running or waiting for its post-success refresh
    pub fn is_busy(&self) -> bool {
        self.loading || self.pending_reset.is_some()
    }

    /// Apply one event and return the commands it triggers
    pub fn apply(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::Connected { account } => {
                self.connected = true;
                self.account = Some(account);
                self.notice = None;
                self.last_error = None;
                vec![Command::Refresh]
            }
            Event::ConnectFailed(err) => {
                self.connected = false;
                if err.is_blocking() {
                    self.notice = Some(err.to_string());
                }
                self.last_error = Some(err);
                Vec::new()
            }
            Event::Refreshed(snapshot) => self.on_refreshed(snapshot),
            Event::TabSelected(tab) => {
                self.tab = tab;
                Vec::new()
            }
            Event::AddEtherChanged(input) => {
                let parsed = parse_amount(&input, self.ether_decimals);
                self.add.ether_input = input;
                (self.add.ether_amount, self.add.input_error) = split(parsed);
                self.recompute_add();
                Vec::new()
            }
            Event::AddTokenChanged(input) => {
                let parsed = parse_amount(&input, self.token_decimals);
                self.add.token_input = input;
                // Outside initial mode the counterpart is derived and the input ignored
                if self.add.mode == Some(LiquidityMode::Initial) {
                    (self.add.token_amount, self.add.input_error) = split(parsed);
                }
                Vec::new()
            }
            Event::RemoveLpChanged(input) => {
                let parsed = parse_amount(&input, LP_DECIMALS);
                self.remove.lp_input = input;
                (self.remove.lp_amount, self.remove.input_error) = split(parsed);
                self.recompute_remove();
                Vec::new()
            }
            Event::SwapAmountChanged(input) => {
                let decimals = self.swap_input_decimals();
                let parsed = parse_amount(&input, decimals);
                self.swap.input = input;
                (self.swap.amount, self.swap.input_error) = split(parsed);
                self.request_swap_estimate()
            }
            Event::SwapDirectionToggled => {
                self.swap.direction = self.swap.direction.toggled();
                self.swap.clear();
                Vec::new()
            }
            Event::SwapEstimated {
                amount,
                direction,
                output,
            } => {
                if amount != self.swap.amount || direction != self.swap.direction {
                    debug!("Dropping stale swap estimate for {} ({})", amount, direction);
                } else {
                    self.swap.expected_out = output;
                    self.swap.estimated = true;
                }
                Vec::new()
            }
            Event::SubmitRequested(kind) => self.on_submit_requested(kind),
            Event::SubmitFinished(kind, result) => self.on_submit_finished(kind, result),
        }
    }

    fn on_refreshed(&mut self, snapshot: ReserveSnapshot) -> Vec<Command> {
        self.snapshot = snapshot;

        if let Some(kind) = self.pending_reset.take() {
            self.reset_form(kind);
            self.loading = false;
        }

        self.recompute_add();
        self.recompute_remove();
        self.request_swap_estimate()
    }

    fn on_submit_requested(&mut self, kind: ActionKind) -> Vec<Command> {
        if !self.connected {
            warn!("Ignoring {} request: wallet not connected", kind);
            return Vec::new();
        }
        if self.is_busy() {
            warn!("Ignoring {} request: another submission is in flight", kind);
            return Vec::new();
        }

        let request = match kind {
            ActionKind::AddLiquidity => {
                if self.add.ether_amount.is_zero() || self.add.token_amount.is_zero() {
                    None
                } else {
                    Some(ActionRequest::AddLiquidity {
                        token_amount: self.add.token_amount,
                        ether_amount: self.add.ether_amount,
                    })
                }
            }
            ActionKind::RemoveLiquidity => (!self.remove.lp_amount.is_zero()).then_some(
                ActionRequest::RemoveLiquidity {
                    lp_amount: self.remove.lp_amount,
                },
            ),
            ActionKind::Swap => {
                if !self.swap.amount.is_zero() && !self.swap.estimated {
                    warn!("Ignoring swap request: estimate for current amount not available");
                    return Vec::new();
                }
                if self.swap.amount.is_zero() || self.swap.expected_out.is_zero() {
                    None
                } else {
                    Some(ActionRequest::Swap {
                        amount: self.swap.amount,
                        expected_out: self.swap.expected_out,
                        direction: self.swap.direction,
                    })
                }
            }
        };

        match request {
            Some(request) => {
                self.loading = true;
                self.last_error = None;
                vec![Command::Submit(request)]
            }
            None => {
                debug!("Nothing to submit for {}, resetting form", kind);
                self.reset_form(kind);
                Vec::new()
            }
        }
    }

    fn on_submit_finished(
        &mut self,
        kind: ActionKind,
        result: Result<Vec<TxOutcome>>,
    ) -> Vec<Command> {
        match result {
            Ok(outcomes) => {
                self.last_outcome = Some((kind, outcomes));
                self.pending_reset = Some(kind);
            }
            Err(err) => {
                self.reset_form(kind);
                self.loading = false;
                if err.is_blocking() {
                    self.notice = Some(err.to_string());
                }
                self.last_error = Some(err);
            }
        }
        vec![Command::Refresh]
    }

    fn reset_form(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::AddLiquidity => {
                self.add = AddLiquidityForm::default();
                self.recompute_add();
            }
            ActionKind::RemoveLiquidity => self.remove = RemoveLiquidityForm::default(),
            ActionKind::Swap => self.swap.clear(),
        }
    }

    fn recompute_add(&mut self) {
        self.add.mode = self.snapshot.token_reserve.map(LiquidityMode::from_token_reserve);
        self.add.token_amount = match self.add.mode {
            Some(LiquidityMode::Initial) => {
                parse_amount(&self.add.token_input, self.token_decimals).unwrap_or_default()
            }
            Some(LiquidityMode::Proportional) => match self.snapshot.reserves() {
                Some((ether_reserve, token_reserve)) => LiquidityMath::add_liquidity_counterpart(
                    self.add.ether_amount,
                    ether_reserve,
                    token_reserve,
                ),
                None => U256::zero(),
            },
            None => U256::zero(),
        };
    }

    fn recompute_remove(&mut self) {
        let snapshot = &self.snapshot;
        self.remove.payout = match (snapshot.lp_total_supply, snapshot.reserves()) {
            (Some(supply), Some((ether_reserve, token_reserve))) => {
                LiquidityMath::remove_liquidity_payout(
                    self.remove.lp_amount,
                    supply,
                    ether_reserve,
                    token_reserve,
                )
            }
            _ => LiquidityPayout::default(),
        };
    }

    fn request_swap_estimate(&mut self) -> Vec<Command> {
        self.swap.expected_out = U256::zero();
        if self.swap.amount.is_zero() {
            self.swap.estimated = true;
            return Vec::new();
        }
        self.swap.estimated = false;
        vec![Command::EstimateSwap {
            amount: self.swap.amount,
            direction: self.swap.direction,
        }]
    }

    /// Decimals of the asset the swap pays in
    pub fn swap_input_decimals(&self) -> u8 {
        match self.swap.direction {
            SwapDirection::EtherToToken => self.ether_decimals,
            SwapDirection::TokenToEther => self.token_decimals,
        }
    }

    /// Decimals of the asset the swap pays out
    pub fn swap_output_decimals(&self) -> u8 {
        match self.swap.direction {
            SwapDirection::EtherToToken => self.token_decimals,
            SwapDirection::TokenToEther => self.ether_decimals,
        }
    }
}

fn split(parsed: std::result::Result<U256, UnitsError>) -> (U256, Option<UnitsError>) {
    match parsed {
        Ok(amount) => (amount, None),
        Err(err) => {
            debug!("Rejected amount input: {}", err);
            (U256::zero(), Some(err))
        }
    }
}

/// Runs reducer commands against a wallet session
pub struct Controller<W: WalletProvider> {
    manager: WalletManager<W>,
    state: ViewState,
}

impl<W: WalletProvider> Controller<W> {
    pub fn new(manager: WalletManager<W>, state: ViewState) -> Self {
        Self { manager, state }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Establish the session and load the first snapshot
    pub async fn connect(&mut self) -> Result<()> {
        let account = self
            .manager
            .checked_session()
            .await
            .map(|session| session.account);
        match account {
            Ok(account) => {
                self.dispatch(Event::Connected { account }).await;
                Ok(())
            }
            Err(err) => {
                self.dispatch(Event::ConnectFailed(err.clone())).await;
                Err(err)
            }
        }
    }

    /// Apply `event` and every event its commands produce
    pub async fn dispatch(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            for command in self.state.apply(event) {
                queue.push_back(self.run(command).await);
            }
        }
    }

    async fn run(&self, command: Command) -> Event {
        match command {
            Command::Refresh => Event::Refreshed(self.refresh().await),
            Command::EstimateSwap { amount, direction } => {
                let output = match self.reader().await {
                    Ok(reader) => reader
                        .swap_estimate(amount, direction, &self.state.snapshot)
                        .await
                        .unwrap_or_default(),
                    Err(_) => U256::zero(),
                };
                Event::SwapEstimated {
                    amount,
                    direction,
                    output,
                }
            }
            Command::Submit(request) => {
                let kind = request.kind();
                let result = match self.manager.connect(true).await {
                    Ok(Handle::Signing(signer)) => {
                        TransactionSubmitter::new(signer).execute(request).await
                    }
                    Ok(Handle::ReadOnly(_)) => Err(ExchangeError::WalletUnavailable(
                        "session returned no signer".to_string(),
                    )),
                    Err(err) => Err(err),
                };
                Event::SubmitFinished(kind, result)
            }
        }
    }

    async fn refresh(&self) -> ReserveSnapshot {
        match self.manager.checked_session().await {
            Ok(session) => {
                ChainReader::new(session.reader())
                    .refresh(session.account)
                    .await
            }
            Err(err) => {
                warn!("Refresh skipped: {}", err);
                ReserveSnapshot::default()
            }
        }
    }

    async fn reader(&self) -> Result<ChainReader> {
        match self.manager.connect(false).await? {
            Handle::ReadOnly(reader) => Ok(ChainReader::new(reader)),
            Handle::Signing(_) => Err(ExchangeError::WalletUnavailable(
                "session returned no reader".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wei(n: u64) -> U256 {
        U256::from(n)
    }

    fn connected() -> ViewState {
        let mut state = ViewState::new(0, 0);
        state.apply(Event::Connected {
            account: Address::repeat_byte(0xaa),
        });
        state
    }

    fn pool(ether_reserve: u64, token_reserve: u64, supply: u64) -> ReserveSnapshot {
        ReserveSnapshot {
            ether_balance: Some(wei(1_000)),
            token_balance: Some(wei(1_000)),
            lp_balance: Some(wei(100)),
            token_reserve: Some(wei(token_reserve)),
            ether_reserve: Some(wei(ether_reserve)),
            lp_total_supply: Some(wei(supply)),
        }
    }

    #[test]
    fn test_connect_triggers_refresh() {
        let mut state = ViewState::new(18, 18);
        let commands = state.apply(Event::Connected {
            account: Address::repeat_byte(1),
        });
        assert_eq!(commands, vec![Command::Refresh]);
        assert!(state.connected);
    }

    #[test]
    fn test_network_mismatch_sets_notice() {
        let mut state = ViewState::new(18, 18);
        state.apply(Event::ConnectFailed(ExchangeError::NetworkMismatch {
            expected: 4,
            actual: 1,
        }));
        assert!(state.notice.is_some());
        assert!(!state.connected);
    }

    #[test]
    fn test_initial_liquidity_accepts_both_amounts() {
        let mut state = connected();
        state.apply(Event::Refreshed(pool(0, 0, 0)));
        state.apply(Event::AddEtherChanged("10".into()));
        state.apply(Event::AddTokenChanged("100".into()));

        assert_eq!(state.add.mode, Some(LiquidityMode::Initial));
        assert_eq!(state.add.ether_amount, wei(10));
        assert_eq!(state.add.token_amount, wei(100));
    }

    #[test]
    fn test_proportional_counterpart() {
        let mut state = connected();
        state.apply(Event::Refreshed(pool(100, 500, 100)));
        state.apply(Event::AddEtherChanged("10".into()));

        assert_eq!(state.add.mode, Some(LiquidityMode::Proportional));
        assert_eq!(state.add.token_amount, wei(50));

        // Token field is ignored once the pool has a ratio
        state.apply(Event::AddTokenChanged("999".into()));
        assert_eq!(state.add.token_amount, wei(50));
    }

    #[test]
    fn test_ignored_token_input_is_not_an_error() {
        let mut state = connected();
        state.apply(Event::Refreshed(pool(100, 500, 100)));
        state.apply(Event::AddEtherChanged("10".into()));
        state.apply(Event::AddTokenChanged("x".into()));

        assert!(state.add.input_error.is_none());
        assert_eq!(state.add.token_amount, wei(50));
        let commands = state.apply(Event::SubmitRequested(ActionKind::AddLiquidity));
        assert!(matches!(commands.as_slice(), [Command::Submit(_)]));
    }

    #[test]
    fn test_initial_token_input_error_is_kept() {
        let mut state = connected();
        state.apply(Event::Refreshed(pool(0, 0, 0)));
        state.apply(Event::AddEtherChanged("10".into()));
        state.apply(Event::AddTokenChanged("x".into()));

        assert!(state.add.input_error.is_some());
        assert!(state.add.token_amount.is_zero());
    }

    #[test]
    fn test_unknown_reserve_blocks_add() {
        let mut state = connected();
        state.apply(Event::Refreshed(ReserveSnapshot::default()));
        state.apply(Event::AddEtherChanged("10".into()));
        state.apply(Event::AddTokenChanged("100".into()));
        assert_eq!(state.add.mode, None);
        assert!(state.add.token_amount.is_zero());

        let commands = state.apply(Event::SubmitRequested(ActionKind::AddLiquidity));
        assert!(commands.is_empty());
        assert!(!state.loading);
    }

    #[test]
    fn test_remove_payout_estimate() {
        let mut state = connected();
        state.apply(Event::Refreshed(pool(200, 800, 1000)));
        state.apply(Event::RemoveLpChanged("100".into()));
        assert_eq!(
            state.remove.payout,
            LiquidityPayout {
                ether: wei(20),
                token: wei(80)
            }
        );
    }

    #[test]
    fn test_invalid_input_is_zero_with_error() {
        let mut state = connected();
        state.apply(Event::RemoveLpChanged("1.5".into()));
        assert!(state.remove.lp_amount.is_zero());
        assert!(state.remove.input_error.is_some());
        assert_eq!(state.remove.lp_input, "1.5");
    }

    #[test]
    fn test_swap_estimate_requested_and_stale_dropped() {
        let mut state = connected();
        state.apply(Event::Refreshed(pool(1000, 5000, 1000)));

        let commands = state.apply(Event::SwapAmountChanged("100".into()));
        assert_eq!(
            commands,
            vec![Command::EstimateSwap {
                amount: wei(100),
                direction: SwapDirection::EtherToToken
            }]
        );

        state.apply(Event::SwapAmountChanged("200".into()));
        state.apply(Event::SwapEstimated {
            amount: wei(100),
            direction: SwapDirection::EtherToToken,
            output: wei(450),
        });
        assert!(state.swap.expected_out.is_zero());
        assert!(!state.swap.estimated);

        state.apply(Event::SwapEstimated {
            amount: wei(200),
            direction: SwapDirection::EtherToToken,
            output: wei(800),
        });
        assert_eq!(state.swap.expected_out, wei(800));
    }

    #[test]
    fn test_direction_toggle_clears_swap() {
        let mut state = connected();
        state.apply(Event::Refreshed(pool(1000, 5000, 1000)));
        state.apply(Event::SwapAmountChanged("100".into()));
        state.apply(Event::SwapDirectionToggled);

        assert_eq!(state.swap.direction, SwapDirection::TokenToEther);
        assert!(state.swap.amount.is_zero());
        assert!(state.swap.input.is_empty());
    }

    #[test]
    fn test_swap_needs_current_estimate() {
        let mut state = connected();
        state.apply(Event::Refreshed(pool(1000, 5000, 1000)));
        state.apply(Event::SwapAmountChanged("100".into()));

        assert!(state.apply(Event::SubmitRequested(ActionKind::Swap)).is_empty());
        assert_eq!(state.swap.amount, wei(100));

        state.apply(Event::SwapEstimated {
            amount: wei(100),
            direction: SwapDirection::EtherToToken,
            output: wei(450),
        });
        let commands = state.apply(Event::SubmitRequested(ActionKind::Swap));
        assert_eq!(
            commands,
            vec![Command::Submit(ActionRequest::Swap {
                amount: wei(100),
                expected_out: wei(450),
                direction: SwapDirection::EtherToToken
            })]
        );
    }

    #[test]
    fn test_zero_amount_resets_instead_of_submitting() {
        let mut state = connected();
        state.apply(Event::Refreshed(pool(100, 500, 100)));
        state.apply(Event::AddEtherChanged("0".into()));

        let commands = state.apply(Event::SubmitRequested(ActionKind::AddLiquidity));
        assert!(commands.is_empty());
        assert_eq!(state.add.ether_input, "");
        assert!(!state.loading);
    }

    #[test]
    fn test_reentrant_submit_ignored() {
        let mut state = connected();
        state.apply(Event::Refreshed(pool(200, 800, 1000)));
        state.apply(Event::RemoveLpChanged("100".into()));

        assert_eq!(state.apply(Event::SubmitRequested(ActionKind::RemoveLiquidity)).len(), 1);
        assert!(state.loading);
        assert!(state.apply(Event::SubmitRequested(ActionKind::RemoveLiquidity)).is_empty());
    }

    #[test]
    fn test_success_resets_after_refresh() {
        let mut state = connected();
        state.apply(Event::Refreshed(pool(200, 800, 1000)));
        state.apply(Event::RemoveLpChanged("100".into()));
        state.apply(Event::SubmitRequested(ActionKind::RemoveLiquidity));

        let commands = state.apply(Event::SubmitFinished(
            ActionKind::RemoveLiquidity,
            Ok(Vec::new()),
        ));
        assert_eq!(commands, vec![Command::Refresh]);
        // Form held until the post-success refresh lands
        assert_eq!(state.remove.lp_amount, wei(100));
        assert!(state.is_busy());

        state.apply(Event::Refreshed(pool(180, 720, 900)));
        assert!(state.remove.lp_amount.is_zero());
        assert!(!state.is_busy());
    }

    #[test]
    fn test_failure_resets_immediately() {
        let mut state = connected();
        state.apply(Event::Refreshed(pool(100, 500, 100)));
        state.apply(Event::AddEtherChanged("10".into()));
        state.apply(Event::SubmitRequested(ActionKind::AddLiquidity));

        let commands = state.apply(Event::SubmitFinished(
            ActionKind::AddLiquidity,
            Err(ExchangeError::WalletRejection {
                request: "approve".into(),
            }),
        ));
        assert_eq!(commands, vec![Command::Refresh]);
        assert!(!state.loading);
        assert!(state.add.ether_amount.is_zero());
        assert!(state.add.token_amount.is_zero());
        assert!(state.notice.is_none());
    }

    #[test]
    fn test_tab_toggle() {
        let mut state = ViewState::new(18, 18);
        assert_eq!(state.tab, Tab::Liquidity);
        state.apply(Event::TabSelected(state.tab.toggled()));
        assert_eq!(state.tab, Tab::Swap);
    }
}
