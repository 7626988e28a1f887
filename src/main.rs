use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use log::{error, info};

use storefront_wallet::config::{self, Config};
use storefront_wallet::models::{ConnectorKind, TransactionRequest};
use storefront_wallet::utils::{format_address, parse_chain_id};
use storefront_wallet::wallet::{self, Subscription, WalletConnectionManager};

#[derive(Parser)]
#[command(name = "storefront-wallet", about = "Drive a simulated storefront wallet session")]
struct Cli {
    /// Print every state snapshot as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the supported networks
    Networks,
    /// Connect and print the session
    Connect {
        #[arg(long)]
        connector: Option<ConnectorKind>,
    },
    /// Connect, then switch to another chain (decimal or 0x hex)
    Switch {
        #[arg(value_parser = parse_chain_arg)]
        chain_id: u64,
    },
    /// Connect, then send one or more simulated transactions
    Send {
        #[arg(long)]
        to: String,
        #[arg(long)]
        value: String,
        /// Number of transactions to submit concurrently
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment variables
    dotenv().ok();

    // Initialize logging
    init_logger();

    // Parse arguments and load configuration
    let cli = Cli::parse();
    let config = config::load_config()?;
    info!("Configuration loaded");

    // Initialize the wallet session against the simulated provider
    let (manager, _provider) = wallet::create_manager_from_config(&config);

    // Mirror every snapshot to stdout when requested
    let subscription = cli.json.then(|| print_snapshots(&manager));

    let result = run(cli.command, &manager, &config).await;

    // Release the subscriber before reporting
    if let Some(subscription) = subscription {
        subscription.unsubscribe();
    }
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn run(command: Command, manager: &WalletConnectionManager, config: &Config) -> Result<()> {
    match command {
        Command::Networks => {
            for network in manager.registry().iter() {
                println!(
                    "{:>6}  {:<18} {:<6} {}",
                    network.chain_id, network.name, network.native_currency_symbol, network.explorer_url
                );
            }
        }
        Command::Connect { connector } => {
            connect(manager, connector.unwrap_or(config.default_connector)).await?;
        }
        Command::Switch { chain_id } => {
            // A switch needs a live session
            connect(manager, config.default_connector).await?;
            manager
                .switch_network(chain_id)
                .await
                .with_context(|| format!("Failed to switch to chain {}", chain_id))?;
            println!("Now on {}", manager.network_name(chain_id));
        }
        Command::Send { to, value, count } => {
            connect(manager, config.default_connector).await?;

            // Submit everything first so the transactions are pending together
            let mut handles = Vec::with_capacity(count);
            for _ in 0..count {
                let handle = manager.send_transaction(TransactionRequest::new(&to, &value)).await?;
                println!("Pending {}", handle.hash());
                handles.push(handle);
            }
            println!("{} transaction(s) pending", manager.pending_count());

            // Wait for every confirmation
            let results = futures::future::join_all(handles.into_iter().map(|h| h.wait())).await;
            for result in results {
                match result {
                    Ok(tx) => println!("Confirmed {} at {:?}", tx.hash, tx.confirmed_at),
                    Err(e) => println!("Failed: {}", e),
                }
            }
        }
    }

    // Tear down the session before exit
    manager.disconnect();
    Ok(())
}

async fn connect(manager: &WalletConnectionManager, connector: ConnectorKind) -> Result<()> {
    // Request accounts from the wallet
    let info = manager
        .connect(connector)
        .await
        .context("Could not connect wallet")?;
    // Chains outside the registry still connect, they just have no name
    let network = info
        .network
        .as_ref()
        .map(|n| n.name.as_str())
        .unwrap_or("Unsupported network");
    println!("Connected {} via {} on {}", format_address(&info.address), connector, network);
    Ok(())
}

fn print_snapshots(manager: &WalletConnectionManager) -> Subscription {
    manager.subscribe(|state| match serde_json::to_string(state) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to encode wallet state: {}", e),
    })
}

fn parse_chain_arg(value: &str) -> Result<u64, String> {
    parse_chain_id(value).map_err(|e| e.to_string())
}

fn init_logger() {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or("RUST_LOG", "info")
    );
}
