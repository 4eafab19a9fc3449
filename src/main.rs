use std::sync::atomic::Ordering;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};

use golos_balance_monitor::api::ApiServer;
use golos_balance_monitor::chain::{ChainApi, RpcClient};
use golos_balance_monitor::config::AppConfig;
use golos_balance_monitor::monitor::{
    balance_event_channel, block_event_channel, BlockPoller, TrackedAddresses,
};

#[derive(Parser, Debug)]
#[command(name = "monitor", about = "Balance-change monitor for a Golos-style chain")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Chain JSON-RPC endpoint, overrides the configured one
    #[arg(long)]
    endpoint: Option<String>,

    /// Block height to start polling from; defaults to the current head
    #[arg(long)]
    start_height: Option<u64>,

    /// Account to track; repeatable
    #[arg(long = "track")]
    tracked: Vec<String>,

    /// Port for the HTTP API, overrides the configured one
    #[arg(long)]
    api_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(path) = &args.config {
        std::env::set_var("CONFIG_FILE", path);
    }

    let mut config = AppConfig::load()?;
    if let Some(endpoint) = args.endpoint {
        config.rpc.endpoint = endpoint;
    }
    if args.start_height.is_some() {
        config.monitor.start_height = args.start_height;
    }
    if let Some(port) = args.api_port {
        config.api.port = port;
    }
    config.validate()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.clone()),
    )
    .init();

    info!("Starting Golos balance monitor, endpoint {}", config.rpc.endpoint);

    let chain: Arc<dyn ChainApi> = Arc::new(RpcClient::new_with_config(
        config.rpc.endpoint.clone(),
        config.rpc.timeout_seconds,
    ));

    let registry = Arc::new(TrackedAddresses::new());
    registry.add(config.monitor.tracked_addresses.iter().cloned());
    registry.add(args.tracked);
    if !registry.is_empty() {
        info!("tracking {} account(s)", registry.len());
    }

    let start_height = match config.monitor.start_height {
        Some(height) => height,
        None => {
            let props = chain.get_dynamic_global_properties().await?;
            props.head_block_number
        }
    };

    let (block_tx, mut block_rx) = block_event_channel();
    let (balance_tx, mut balance_rx) = balance_event_channel();

    let poller = Arc::new(BlockPoller::new(Arc::clone(&chain), Arc::clone(&registry)));

    // ctrl-c raises the shared shutdown flag; the poller observes it at its
    // next publish point and closes both streams.
    let shutdown = poller.shutdown_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                shutdown.store(true, Ordering::Relaxed);
            }
            Err(err) => {
                error!("Unable to listen for shutdown signal: {}", err);
            }
        }
    });

    if config.api.enabled {
        let api = ApiServer::new(
            Arc::clone(&registry),
            Arc::clone(&chain),
            config.api.host.clone(),
            config.api.port,
        );
        tokio::spawn(async move {
            if let Err(e) = api.start().await {
                error!("HTTP API server failed: {}", e);
            }
        });
    }

    // The binary's subscriber just logs what arrives; library users plug in
    // their own consumers.
    tokio::spawn(async move {
        while let Some(event) = block_rx.recv().await {
            info!(
                "block {} at {} with {} transaction(s)",
                event.height,
                event.time,
                event.transactions.len()
            );
        }
        info!("block event stream closed");
    });
    tokio::spawn(async move {
        while let Some(event) = balance_rx.recv().await {
            for balance in &event.balances {
                info!(
                    "balance change: {} now {} / savings {} / {} / savings {} / vesting {}",
                    balance.name,
                    balance.balance,
                    balance.savings_balance,
                    balance.sbd_balance,
                    balance.savings_sbd_balance,
                    balance.vesting_balance
                );
            }
        }
        info!("balance event stream closed");
    });

    if let Err(e) = poller.run(start_height, block_tx, balance_tx).await {
        warn!("block poller stopped: {}", e);
        return Err(e.into());
    }

    info!("monitor stopped");
    Ok(())
}
