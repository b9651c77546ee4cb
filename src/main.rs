mod bindings;
mod chain;
mod commands;
mod config;
mod formatter;
mod monitor;
mod notifier;
mod proposal;
mod state;
mod subscribers;
mod telegram;

use crate::{
    chain::ScrollChainReader, commands::CommandHandler, config::Config, monitor::ProposalMonitor,
    notifier::Dispatcher, state::StateStore, telegram::TelegramClient,
};
use anyhow::Error;
use std::sync::{Arc, atomic::AtomicU64};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let parse_error = "Failed to parse env filter directive";
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("alloy_transport_http=off".parse().expect(parse_error))
        .add_directive("alloy_rpc_client=off".parse().expect(parse_error))
        .add_directive("reqwest=off".parse().expect(parse_error))
        .add_directive("hyper_util=off".parse().expect(parse_error));

    tracing_subscriber::fmt()
        .with_env_filter(filter) // reads RUST_LOG
        .init();

    info!(
        "🚀 Starting Scroll governance notifier v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Missing BOT_TOKEN or GOVERNANCE_CONTRACT is fatal here; everything
    // after startup degrades instead of exiting.
    let config = Config::new()?;

    let store = Arc::new(StateStore::new(&config.state_dir));
    let registry = Arc::new(RwLock::new(store.load_subscribers()));
    let last_processed_block = Arc::new(AtomicU64::new(store.load_checkpoint()));

    let telegram = Arc::new(TelegramClient::new(&config.bot_token)?);
    if let Err(e) = telegram.set_my_commands(commands::BOT_COMMANDS).await {
        warn!("Failed to register bot commands: {e}");
    }

    let cancel_token = CancellationToken::new();

    let chain = ScrollChainReader::new(&config.rpc_url, config.governance_contract)?;
    let dispatcher = Dispatcher::new(telegram.clone(), registry.clone(), store.clone());
    let proposal_monitor = ProposalMonitor::new(
        chain,
        dispatcher,
        store.clone(),
        last_processed_block.clone(),
        config.governance_contract.to_string(),
        config.poll_interval(),
        cancel_token.clone(),
    );
    let command_handler = CommandHandler::new(
        telegram,
        registry,
        store,
        last_processed_block,
        config.governance_contract.to_string(),
        config.poll_interval_minutes,
        cancel_token.clone(),
    );

    tokio::spawn(proposal_monitor.run());
    tokio::spawn(command_handler.run());

    wait_for_the_termination(cancel_token).await;
    Ok(())
}

async fn wait_for_the_termination(cancel_token: CancellationToken) {
    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to set up SIGTERM handler");
    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }
    cancel_token.cancel();
    // Give tasks a little time to finish
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
}
