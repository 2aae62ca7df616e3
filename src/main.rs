//! Monad Frontrunner - interactive frontrunner game bot
//!
//! Connects a wallet to the game contract and plays repeated `frontrun()`
//! calls with sequential nonces at a fixed pace, driven by a terminal menu.

use anyhow::Result;
use colored::Colorize;
use std::io;
use std::time::Duration;
use tracing::{error, info, warn};

mod chain;
mod config;
mod contract;
mod error;
mod metrics;
mod sequencer;
mod session;

use chain::ChainGateway;
use config::Settings;
use contract::FrontrunnerContract;
use error::FrontrunnerError;
use metrics::MetricsServer;
use session::{GameMode, GamePlan, InterruptHandler, Menu, Session};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    session::report::print_banner();
    info!("Starting Monad Frontrunner v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    let game = settings.game_settings.clone();
    info!("Loaded configuration with {} RPC endpoints", settings.rpc_urls().len());

    // Start metrics server
    let metrics_handle = if settings.metrics.enabled {
        let server = MetricsServer::new(settings.metrics.port);
        Some(tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        }))
    } else {
        None
    };

    println!("{}", "\n🚀 Initializing Frontrunner Bot...".green());

    // Connect to the network
    let gateway = match ChainGateway::connect(&settings).await {
        Ok(gateway) => gateway,
        Err(e) => {
            println!("{}", "\n❌ Failed to connect to the Monad network.".red());
            return Err(e.into());
        }
    };
    println!("{}", format!("\n👤 Active Account: {:?}", gateway.address()).cyan());
    println!(
        "{}",
        format!(
            "\n✅ Successfully connected to the Monad network! (chain {})",
            gateway.chain_id()
        )
        .green()
    );

    // Check balance
    let balance = gateway.balance().await?;
    let balance_mon = ethers::utils::format_ether(balance);
    metrics::record_wallet_balance(balance_mon.parse().unwrap_or_default());
    println!(
        "{}",
        format!("\n💰 Account Balance: {} Testnet Monad", balance_mon).yellow()
    );

    match chain::ensure_balance(balance, game.balance_threshold) {
        Ok(()) => {}
        Err(e @ FrontrunnerError::InsufficientBalance { .. }) => {
            warn!("{}", e);
            println!(
                "{}",
                "\n❌ Insufficient account balance. Please add more funds to continue.".red()
            );
            println!("{}", "⚠️ Exiting game...".yellow());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    // Check gas price
    let gas_price = gateway.gas_price().await?;
    let gas_gwei = ethers::utils::format_units(gas_price, "gwei")
        .map_err(|e| FrontrunnerError::Internal(e.to_string()))?;
    metrics::record_gas_price(gas_gwei.parse().unwrap_or_default());
    let attempt_cost = ethers::utils::format_ether(chain::attempt_cost(game.gas_limit, gas_price));
    println!("{}", format!("\n⛽ Current Gas Price: {} GWEI", gas_gwei).yellow());
    println!(
        "{}",
        format!("💸 Max cost per attempt: {} MON", attempt_cost).yellow()
    );

    let contract = FrontrunnerContract::new(
        settings.contract_address()?,
        settings.contract_abi()?,
        gateway.signer_client(),
    )
    .with_confirmations(game.confirmations)
    .with_confirmation_timeout(game.confirmation_timeout_secs.map(Duration::from_secs));
    info!("Using frontrunner contract {:?}", contract.address());

    let session = Session::new(&contract, gateway.address(), game.gas_limit);
    let interrupts = InterruptHandler::new();
    let interrupt_handle = interrupts.spawn();

    let mut menu = Menu::new(io::BufReader::new(io::stdin()), io::stdout());

    loop {
        let (next, mode) = menu.ask(|m| m.select_mode()).await?;
        menu = next;

        let plan = match mode {
            GameMode::Exit => {
                println!(
                    "{}",
                    "\n👋 Thanks for playing! See you next time!".yellow()
                );
                break;
            }
            GameMode::Automatic => GamePlan::automatic(&game),
            GameMode::Manual => {
                let (default_attempts, default_interval) =
                    (game.automatic_attempts, game.default_interval_secs);
                let (next, (total_attempts, interval_secs)) = menu
                    .ask(move |m| m.manual_settings(default_attempts, default_interval))
                    .await?;
                menu = next;
                GamePlan {
                    total_attempts,
                    interval_secs,
                }
            }
        };

        println!(
            "{}",
            format!(
                "\n🎯 Starting game with {} attempts and {} second intervals",
                plan.total_attempts, plan.interval_secs
            )
            .green()
        );

        session.show_score().await;

        // Nonce is read once per game; attempts count up from it locally
        let base_nonce = match gateway.next_nonce().await {
            Ok(nonce) => nonce,
            Err(e) => {
                error!("Failed to read starting nonce: {}", e);
                println!("{}", format!("\n❌ Could not read nonce: {}", e).red());
                continue;
            }
        };
        println!("{}", format!("\n📝 Starting Nonce: {}", base_nonce).yellow());

        let result = session.play(plan, base_nonce, &interrupts).await;

        match result {
            Ok(summary) => info!(
                "Game finished ({}): {} confirmed, {} failed",
                summary.state, summary.succeeded, summary.failed
            ),
            Err(e) if e.is_fatal() => {
                error!("Game aborted: {}", e);
                println!("{}", format!("\n❌ {}", e).red());
            }
            Err(e) => {
                error!("Game error: {}", e);
                return Err(e.into());
            }
        }
    }

    interrupt_handle.abort();
    if let Some(h) = metrics_handle {
        h.abort();
    }

    info!("Monad Frontrunner stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,monad_frontrunner=debug,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
