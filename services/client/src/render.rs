//! Text rendering of the view state
//!
//! Formats amounts with `format_amount` and marks unknown reads as
//! `unavailable`. Spot price and pool share are display-only decimals.

use cdex_amm::{pool_share_pct, spot_price, LiquidityMode};
use cdex_types::{format_amount, SwapDirection, U256};
use serde::Serialize;

use crate::controller::{Tab, ViewState, LP_DECIMALS};

const UNAVAILABLE: &str = "unavailable";

/// Labels for the two assets
#[derive(Debug, Clone)]
pub struct Labels {
    pub token_symbol: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            token_symbol: "CD".to_string(),
        }
    }
}

fn amount(value: Option<U256>, decimals: u8) -> String {
    value
        .map(|v| format_amount(v, decimals))
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

/// Balances and pool figures
pub fn balances(state: &ViewState, labels: &Labels) -> Vec<String> {
    let s = &state.snapshot;
    let mut lines = vec![
        "You have:".to_string(),
        format!(
            "  {} {} tokens",
            amount(s.token_balance, state.token_decimals),
            labels.token_symbol
        ),
        format!("  {} Ether", amount(s.ether_balance, state.ether_decimals)),
        format!("  {} LP tokens", amount(s.lp_balance, LP_DECIMALS)),
        "Exchange reserves:".to_string(),
        format!("  {} Ether", amount(s.ether_reserve, state.ether_decimals)),
        format!(
            "  {} {} tokens",
            amount(s.token_reserve, state.token_decimals),
            labels.token_symbol
        ),
        format!("  {} LP tokens issued", amount(s.lp_total_supply, LP_DECIMALS)),
    ];

    let price = s.reserves().and_then(|(ether, token)| {
        spot_price(ether, token, state.ether_decimals, state.token_decimals)
    });
    lines.push(match price {
        Some(price) => format!("Price: 1 Ether = {} {}", price, labels.token_symbol),
        None => format!("Price: {}", UNAVAILABLE),
    });

    let share = s
        .lp_balance
        .zip(s.lp_total_supply)
        .and_then(|(balance, supply)| pool_share_pct(balance, supply));
    lines.push(match share {
        Some(share) => format!("Pool share: {}%", share),
        None => format!("Pool share: {}", UNAVAILABLE),
    });

    lines
}

/// Liquidity tab summary
pub fn liquidity(state: &ViewState, labels: &Labels) -> Vec<String> {
    let mut lines = Vec::new();
    match state.add.mode {
        Some(LiquidityMode::Initial) => lines.push(format!(
            "Initial liquidity: {} Ether and {} {} tokens, no ratio applied",
            format_amount(state.add.ether_amount, state.ether_decimals),
            format_amount(state.add.token_amount, state.token_decimals),
            labels.token_symbol
        )),
        Some(LiquidityMode::Proportional) => lines.push(format!(
            "You will need {} {} tokens",
            format_amount(state.add.token_amount, state.token_decimals),
            labels.token_symbol
        )),
        None => lines.push(format!("You will need {} {} tokens", UNAVAILABLE, labels.token_symbol)),
    }
    lines.push(format!(
        "You will get {} {} tokens and {} Ether",
        format_amount(state.remove.payout.token, state.token_decimals),
        labels.token_symbol,
        format_amount(state.remove.payout.ether, state.ether_decimals)
    ));
    lines
}

/// Swap tab summary
pub fn swap(state: &ViewState, labels: &Labels) -> Vec<String> {
    let output = format_amount(state.swap.expected_out, state.swap_output_decimals());
    let line = match state.swap.direction {
        SwapDirection::EtherToToken => {
            format!("You will get {} {} tokens", output, labels.token_symbol)
        }
        SwapDirection::TokenToEther => format!("You will get {} Ether", output),
    };
    vec![line]
}

/// Every line for the current state
pub fn summary(state: &ViewState, labels: &Labels) -> Vec<String> {
    if let Some(notice) = &state.notice {
        return vec![format!("Change network: {}", notice)];
    }
    if !state.connected {
        return vec!["Connect your wallet".to_string()];
    }

    let mut lines = Vec::new();
    if let Some(account) = state.account {
        lines.push(format!("Account: {:?}", account));
    }
    if state.loading {
        lines.push("Loading...".to_string());
    }
    lines.extend(balances(state, labels));
    lines.extend(match state.tab {
        Tab::Liquidity => liquidity(state, labels),
        Tab::Swap => swap(state, labels),
    });
    if let Some((kind, outcomes)) = &state.last_outcome {
        for outcome in outcomes {
            lines.push(format!(
                "{} tx 0x{:x} (block {:?})",
                kind, outcome.tx_hash, outcome.block_number
            ));
        }
    }
    if let Some(err) = &state.last_error {
        lines.push(format!("Last error: {}", err));
    }
    lines
}

/// Machine-readable view for `--json`
#[derive(Debug, Serialize)]
pub struct StatusReport<'a> {
    pub account: Option<String>,
    pub snapshot: &'a cdex_types::ReserveSnapshot,
    pub lines: Vec<String>,
}

impl<'a> StatusReport<'a> {
    pub fn new(state: &'a ViewState, labels: &Labels) -> Self {
        Self {
            account: state.account.map(|a| format!("{:?}", a)),
            snapshot: &state.snapshot,
            lines: summary(state, labels),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Event;
    use cdex_types::{Address, ReserveSnapshot};

    fn eth(n: u64) -> U256 {
        U256::exp10(18) * U256::from(n)
    }

    fn state() -> ViewState {
        let mut state = ViewState::new(18, 18);
        state.apply(Event::Connected {
            account: Address::repeat_byte(0xaa),
        });
        state
    }

    #[test]
    fn test_unknown_values_render_unavailable() {
        let mut state = state();
        state.apply(Event::Refreshed(ReserveSnapshot::default()));
        let lines = balances(&state, &Labels::default());
        assert!(lines.iter().any(|l| l == "  unavailable Ether"));
        assert!(lines.iter().any(|l| l == "Price: unavailable"));
    }

    #[test]
    fn test_need_tokens_line() {
        let mut state = state();
        state.apply(Event::Refreshed(ReserveSnapshot {
            ether_reserve: Some(eth(100)),
            token_reserve: Some(eth(500)),
            lp_total_supply: Some(eth(100)),
            ..Default::default()
        }));
        state.apply(Event::AddEtherChanged("10".into()));
        let lines = liquidity(&state, &Labels::default());
        assert_eq!(lines[0], "You will need 50.0 CD tokens");
    }

    #[test]
    fn test_swap_line_follows_direction() {
        let mut state = state();
        state.apply(Event::SwapDirectionToggled);
        assert_eq!(swap(&state, &Labels::default()), vec!["You will get 0.0 Ether".to_string()]);
    }

    #[test]
    fn test_notice_replaces_everything() {
        let mut state = ViewState::new(18, 18);
        state.notice = Some("wrong chain".to_string());
        assert_eq!(summary(&state, &Labels::default()), vec!["Change network: wrong chain"]);
    }
}
