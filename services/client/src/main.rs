//! `cdex` command-line client entry point

use anyhow::{bail, Context, Result};
use cdex_amm::LiquidityMode;
use cdex_client::render::{self, Labels, StatusReport};
use cdex_client::{ActionKind, Controller, EthersWallet, Event, Tab, ViewState, WalletManager};
use cdex_config::ExchangeConfig;
use cdex_types::{SwapDirection, UnitsError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Crypto Devs exchange client", long_about = None)]
struct Args {
    /// Configuration file path (flat CDEX_* environment variables otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// JSON logs and JSON output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show balances, reserves and price
    Status,

    /// Add liquidity (tokens follow the pool ratio unless the pool is empty)
    AddLiquidity {
        /// Ether to deposit
        #[arg(long)]
        ether: String,
        /// Tokens to deposit, only used for the first deposit
        #[arg(long)]
        token: Option<String>,
    },

    /// Burn LP tokens for ether and tokens
    RemoveLiquidity {
        #[arg(long)]
        lp: String,
    },

    /// Preview a liquidity removal
    QuoteRemove {
        #[arg(long)]
        lp: String,
    },

    /// Swap ether for tokens or tokens for ether
    Swap {
        #[arg(long)]
        amount: String,
        /// Asset paid in: eth or token
        #[arg(long, default_value = "eth")]
        from: SwapDirection,
    },

    /// Preview a swap
    QuoteSwap {
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "eth")]
        from: SwapDirection,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cdex=info,cdex_client=info,warn".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ExchangeConfig> {
    let config = match path {
        Some(path) => ExchangeConfig::load(Some(path.as_path()))?,
        None => {
            let mut config = ExchangeConfig::from_env();
            config.expand_env_vars()?;
            config
        }
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn check_input(field: &str, error: &Option<UnitsError>) -> Result<()> {
    if let Some(err) = error {
        bail!("Invalid {} amount: {}", field, err);
    }
    Ok(())
}

fn print(state: &ViewState, labels: &Labels, json: bool) -> Result<()> {
    if json {
        let report = StatusReport::new(state, labels);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in render::summary(state, labels) {
            println!("{}", line);
        }
    }
    Ok(())
}

async fn select_swap(
    controller: &mut Controller<EthersWallet>,
    from: SwapDirection,
    amount: String,
) -> Result<()> {
    controller.dispatch(Event::TabSelected(Tab::Swap)).await;
    if controller.state().swap.direction != from {
        controller.dispatch(Event::SwapDirectionToggled).await;
    }
    controller.dispatch(Event::SwapAmountChanged(amount)).await;
    check_input("swap", &controller.state().swap.input_error)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json);

    info!("Starting cdex v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(args.config.as_ref())?;
    let labels = Labels {
        token_symbol: config.assets.token_symbol.clone(),
    };

    let wallet = EthersWallet::from_config(&config)?;
    let manager = WalletManager::new(wallet, config.network.chain_id);
    let state = ViewState::new(config.assets.ether_decimals, config.assets.token_decimals);
    let mut controller = Controller::new(manager, state);

    if let Err(err) = controller.connect().await {
        print(controller.state(), &labels, args.json)?;
        return Err(err).context("Failed to connect wallet");
    }

    match args.command {
        Commands::Status => {}
        Commands::AddLiquidity { ether, token } => {
            controller.dispatch(Event::TabSelected(Tab::Liquidity)).await;
            controller.dispatch(Event::AddEtherChanged(ether)).await;
            if let Some(token) = token {
                if controller.state().add.mode == Some(LiquidityMode::Proportional) {
                    warn!("--token ignored: the pool ratio sets the token amount");
                }
                controller.dispatch(Event::AddTokenChanged(token)).await;
            }
            check_input("liquidity", &controller.state().add.input_error)?;
            controller
                .dispatch(Event::SubmitRequested(ActionKind::AddLiquidity))
                .await;
        }
        Commands::RemoveLiquidity { lp } => {
            controller.dispatch(Event::RemoveLpChanged(lp)).await;
            check_input("LP", &controller.state().remove.input_error)?;
            controller
                .dispatch(Event::SubmitRequested(ActionKind::RemoveLiquidity))
                .await;
        }
        Commands::QuoteRemove { lp } => {
            controller.dispatch(Event::RemoveLpChanged(lp)).await;
            check_input("LP", &controller.state().remove.input_error)?;
        }
        Commands::Swap { amount, from } => {
            select_swap(&mut controller, from, amount).await?;
            controller
                .dispatch(Event::SubmitRequested(ActionKind::Swap))
                .await;
        }
        Commands::QuoteSwap { amount, from } => {
            select_swap(&mut controller, from, amount).await?;
        }
    }

    print(controller.state(), &labels, args.json)?;

    if let Some(err) = &controller.state().last_error {
        bail!("{}", err);
    }
    Ok(())
}
