use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Decimals used for the native currency of every built-in chain
pub const NATIVE_DECIMALS: u8 = 18;

/// Static description of a supported chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDescriptor {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub explorer_url: String,
    pub native_currency_symbol: String,
    pub native_decimals: u8,
    /// CSS colour used by the UI for the network badge
    pub display_color: String,
}

impl NetworkDescriptor {
    pub fn new(
        chain_id: u64,
        name: &str,
        rpc_url: &str,
        explorer_url: &str,
        symbol: &str,
        display_color: &str,
    ) -> Self {
        Self {
            chain_id,
            name: name.to_string(),
            rpc_url: rpc_url.to_string(),
            explorer_url: explorer_url.to_string(),
            native_currency_symbol: symbol.to_string(),
            native_decimals: NATIVE_DECIMALS,
            display_color: display_color.to_string(),
        }
    }

    /// Chain id in the `0x`-prefixed hex form wallet providers expect
    pub fn chain_id_hex(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }

    /// Explorer link for a transaction hash
    pub fn tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), hash)
    }

    /// Explorer link for an account
    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{}", self.explorer_url.trim_end_matches('/'), address)
    }
}

/// Table of chains the storefront knows how to add to a wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRegistry {
    networks: BTreeMap<u64, NetworkDescriptor>,
}

impl NetworkRegistry {
    /// An empty registry. Every switch to an unknown chain will be rejected.
    pub fn empty() -> Self {
        Self { networks: BTreeMap::new() }
    }

    /// The chains supported out of the box
    pub fn builtin() -> Self {
        Self::empty()
            .with_network(NetworkDescriptor::new(
                1,
                "Ethereum Mainnet",
                "https://rpc.ankr.com/eth",
                "https://etherscan.io",
                "ETH",
                "#627EEA",
            ))
            .with_network(NetworkDescriptor::new(
                5,
                "Goerli Testnet",
                "https://rpc.ankr.com/eth_goerli",
                "https://goerli.etherscan.io",
                "ETH",
                "#627EEA",
            ))
            .with_network(NetworkDescriptor::new(
                137,
                "Polygon Mainnet",
                "https://polygon-rpc.com",
                "https://polygonscan.com",
                "MATIC",
                "#8247E5",
            ))
            .with_network(NetworkDescriptor::new(
                80001,
                "Mumbai Testnet",
                "https://rpc.ankr.com/polygon_mumbai",
                "https://mumbai.polygonscan.com",
                "MATIC",
                "#8247E5",
            ))
    }

    /// Add or replace a chain
    pub fn with_network(mut self, network: NetworkDescriptor) -> Self {
        self.networks.insert(network.chain_id, network);
        self
    }

    pub fn get(&self, chain_id: u64) -> Option<&NetworkDescriptor> {
        self.networks.get(&chain_id)
    }

    pub fn is_supported(&self, chain_id: u64) -> bool {
        self.networks.contains_key(&chain_id)
    }

    /// Display name for a chain, `"Unknown Network"` if not registered
    pub fn network_name(&self, chain_id: u64) -> &str {
        self.get(chain_id).map(|n| n.name.as_str()).unwrap_or("Unknown Network")
    }

    /// Registered chains ordered by chain id
    pub fn iter(&self) -> impl Iterator<Item = &NetworkDescriptor> {
        self.networks.values()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
