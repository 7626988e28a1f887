pub mod manager;
pub mod provider;
pub mod simulated;
mod subscribers;

pub use manager::{ConnectionInfo, TransactionHandle, WalletConnectionManager};
pub use provider::{EventListener, ListenerId, ProviderError, ProviderEvent, WalletProvider};
pub use simulated::SimulatedProvider;
pub use subscribers::{StateCallback, Subscription};

use crate::config::Config;
use crate::models::NetworkRegistry;
use std::sync::Arc;

/// Create a simulated provider from the application configuration
pub fn create_simulated_provider_from_config(config: &Config) -> SimulatedProvider {
    SimulatedProvider::from_config(config)
}

/// Create a manager backed by the simulated provider and the built-in networks
pub fn create_manager_from_config(config: &Config) -> (WalletConnectionManager, Arc<SimulatedProvider>) {
    let provider = Arc::new(create_simulated_provider_from_config(config));
    let manager = WalletConnectionManager::new(
        Some(provider.clone() as Arc<dyn WalletProvider>),
        NetworkRegistry::builtin(),
    );
    (manager, provider)
}
