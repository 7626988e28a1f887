use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{NetworkDescriptor, TransactionRequest};

/// Error code wallets return when asked to switch to a chain they don't know
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

/// Error code for a request the user dismissed
pub const USER_REJECTED_CODE: i64 = 4001;

/// Failures reported by the injected wallet
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("User rejected the request: {0}")]
    UserRejected(String),

    #[error("Unrecognized chain {0}")]
    UnrecognizedChain(u64),

    #[error("Provider RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
}

impl ProviderError {
    /// Map a raw provider error code the way EIP-1193 wallets report them
    pub fn from_code(code: i64, message: impl Into<String>, chain_id: Option<u64>) -> Self {
        let message = message.into();
        match (code, chain_id) {
            (UNRECOGNIZED_CHAIN_CODE, Some(chain_id)) => ProviderError::UnrecognizedChain(chain_id),
            (USER_REJECTED_CODE, _) => ProviderError::UserRejected(message),
            _ => ProviderError::Rpc { code, message },
        }
    }
}

/// Push notifications coming from the wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(u64),
}

/// Callback registered with the provider
pub type EventListener = Arc<dyn Fn(&ProviderEvent) + Send + Sync>;

/// Token returned by `add_listener`, used to remove the listener again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// What the manager needs from a browser wallet
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the user to authorize accounts
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;

    /// Accounts already authorized for this origin. Never prompts.
    async fn accounts(&self) -> Result<Vec<String>, ProviderError>;

    async fn current_chain_id(&self) -> Result<u64, ProviderError>;

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError>;

    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), ProviderError>;

    /// Submit a transaction and wait for it to land; returns the provider's hash
    async fn submit_transaction(&self, request: &TransactionRequest) -> Result<String, ProviderError>;

    fn add_listener(&self, listener: EventListener) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}
