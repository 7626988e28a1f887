use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::models::network::NetworkDescriptor;
use crate::models::transaction::Transaction;

/// Wallet integration used for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    MetaMask,
    WalletConnect,
    Coinbase,
}

impl ConnectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorKind::MetaMask => "metamask",
            ConnectorKind::WalletConnect => "walletconnect",
            ConnectorKind::Coinbase => "coinbase",
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metamask" => Ok(ConnectorKind::MetaMask),
            "walletconnect" => Ok(ConnectorKind::WalletConnect),
            "coinbase" => Ok(ConnectorKind::Coinbase),
            other => Err(format!("unknown connector kind: {}", other)),
        }
    }
}

/// Identity of a connected wallet. Address and chain only exist together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveConnection {
    pub address: String,
    pub chain_id: u64,
    /// `None` when the session was restored without an explicit connect
    pub connector: Option<ConnectorKind>,
}

/// Snapshot of the wallet session as seen by the UI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    pub connection: Option<ActiveConnection>,
    /// Set while a connect request is waiting on the provider
    pub connecting: Option<ConnectorKind>,
    /// Registry entry for the current chain, absent for unsupported chains
    pub network: Option<NetworkDescriptor>,
    pub pending_transactions: HashMap<String, Transaction>,
    pub transaction_history: Vec<Transaction>,
    /// Bumped on every notified change
    pub revision: u64,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting.is_some()
    }

    pub fn address(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.address.as_str())
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.connection.as_ref().map(|c| c.chain_id)
    }

    pub fn connector_kind(&self) -> Option<ConnectorKind> {
        self.connection.as_ref().and_then(|c| c.connector)
    }

    /// Look a transaction up by hash, pending entries first
    pub fn transaction(&self, hash: &str) -> Option<&Transaction> {
        self.pending_transactions
            .get(hash)
            .or_else(|| self.transaction_history.iter().find(|tx| tx.hash == hash))
    }

    pub fn pending_count(&self) -> usize {
        self.pending_transactions.len()
    }

    pub(crate) fn contains_hash(&self, hash: &str) -> bool {
        self.transaction(hash).is_some()
    }
}
