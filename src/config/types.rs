use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

use crate::models::ConnectorKind;

/// Configuration for the simulated wallet session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Accounts the simulated wallet authorizes
    pub accounts: Vec<String>,
    /// Chain the simulated wallet starts on
    pub chain_id: u64,
    /// How long a simulated transaction takes to confirm
    pub confirmation_delay_ms: u64,
    /// Connector used when none is given on the command line
    pub default_connector: ConnectorKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            accounts: vec!["0x71c7656ec7ab88b098defb751b7401b5f6d8976f".to_string()],
            chain_id: 1,
            confirmation_delay_ms: 3000,
            default_connector: ConnectorKind::MetaMask,
        }
    }
}

/// Loads configuration from environment variables, falling back to default values
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();

    if let Ok(accounts) = env::var("WALLET_ACCOUNTS") {
        config.accounts = parse_accounts(&accounts);
    }

    if let Ok(chain_id) = env::var("WALLET_CHAIN_ID") {
        if let Ok(value) = crate::utils::parse_chain_id(&chain_id) {
            config.chain_id = value;
        }
    }

    if let Ok(delay) = env::var("WALLET_CONFIRMATION_DELAY_MS") {
        if let Ok(value) = delay.parse::<u64>() {
            config.confirmation_delay_ms = value;
        }
    }

    if let Ok(connector) = env::var("WALLET_CONNECTOR") {
        config.default_connector = connector
            .parse::<ConnectorKind>()
            .map_err(anyhow::Error::msg)
            .context("Invalid WALLET_CONNECTOR")?;
    }

    Ok(config)
}

fn parse_accounts(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}
