use async_trait::async_trait;
use log::{debug, info};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time;

use crate::config::Config;
use crate::models::{NetworkDescriptor, TransactionRequest};
use crate::utils::generate_tx_hash;
use crate::wallet::provider::{EventListener, ListenerId, ProviderError, ProviderEvent, WalletProvider};

/// In-process stand-in for a browser wallet.
///
/// Transactions are never broadcast: submission just waits for the
/// configured confirmation delay and returns a random hash.
pub struct SimulatedProvider {
    confirmation_delay: Duration,
    state: Mutex<SimulatedState>,
}

struct SimulatedState {
    accounts: Vec<String>,
    chain_id: u64,
    known_chains: BTreeSet<u64>,
    listeners: HashMap<ListenerId, EventListener>,
    next_listener: u64,
}

impl SimulatedProvider {
    pub fn new(accounts: Vec<String>, chain_id: u64, confirmation_delay: Duration) -> Self {
        Self {
            confirmation_delay,
            state: Mutex::new(SimulatedState {
                accounts,
                chain_id,
                known_chains: BTreeSet::from([1, chain_id]),
                listeners: HashMap::new(),
                next_listener: 0,
            }),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.accounts.clone(),
            config.chain_id,
            Duration::from_millis(config.confirmation_delay_ms),
        )
    }

    /// Chains the wallet can switch to without an add-chain request
    pub fn known_chains(&self) -> Vec<u64> {
        self.lock().known_chains.iter().copied().collect()
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Replace the authorized accounts, as if the user changed them in the
    /// wallet, and tell the listeners
    pub fn set_accounts(&self, accounts: Vec<String>) {
        self.lock().accounts = accounts.clone();
        self.emit(&ProviderEvent::AccountsChanged(accounts));
    }

    /// Deliver an event to every registered listener
    pub fn emit(&self, event: &ProviderEvent) {
        let listeners: Vec<EventListener> = self.lock().listeners.values().cloned().collect();
        debug!("Simulated wallet emitting {:?} to {} listener(s)", event, listeners.len());
        for listener in listeners {
            listener(event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl WalletProvider for SimulatedProvider {
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.lock().accounts.clone())
    }

    async fn accounts(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.lock().accounts.clone())
    }

    async fn current_chain_id(&self) -> Result<u64, ProviderError> {
        Ok(self.lock().chain_id)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        {
            let mut state = self.lock();
            if !state.known_chains.contains(&chain_id) {
                return Err(ProviderError::UnrecognizedChain(chain_id));
            }
            if state.chain_id == chain_id {
                return Ok(());
            }
            state.chain_id = chain_id;
        }
        self.emit(&ProviderEvent::ChainChanged(chain_id));
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), ProviderError> {
        info!("Simulated wallet adding {} ({})", network.name, network.chain_id_hex());
        self.lock().known_chains.insert(network.chain_id);
        Ok(())
    }

    async fn submit_transaction(&self, request: &TransactionRequest) -> Result<String, ProviderError> {
        debug!("Simulating transaction to {} for {:?}", request.to, self.confirmation_delay);
        time::sleep(self.confirmation_delay).await;
        Ok(generate_tx_hash())
    }

    fn add_listener(&self, listener: EventListener) -> ListenerId {
        let mut state = self.lock();
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.insert(id, listener);
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.lock().listeners.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn provider() -> SimulatedProvider {
        SimulatedProvider::new(vec!["0xABC0000000000000000000000000000000001234".into()], 1, Duration::ZERO)
    }

    #[tokio::test]
    async fn unknown_chain_needs_adding() {
        let provider = provider();
        assert_eq!(provider.switch_chain(137).await, Err(ProviderError::UnrecognizedChain(137)));

        let polygon = crate::models::NetworkRegistry::builtin().get(137).cloned().unwrap();
        provider.add_chain(&polygon).await.unwrap();
        provider.switch_chain(137).await.unwrap();

        assert_eq!(provider.current_chain_id().await.unwrap(), 137);
        assert_eq!(provider.known_chains(), vec![1, 137]);
    }

    #[tokio::test]
    async fn switching_emits_chain_changed() {
        let provider = provider();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = provider.add_listener(Arc::new(move |event: &ProviderEvent| {
            sink.lock().unwrap().push(event.clone());
        }));

        let polygon = crate::models::NetworkRegistry::builtin().get(137).cloned().unwrap();
        provider.add_chain(&polygon).await.unwrap();
        provider.switch_chain(137).await.unwrap();
        provider.switch_chain(137).await.unwrap();
        provider.remove_listener(id);
        provider.switch_chain(1).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![ProviderEvent::ChainChanged(137)]);
        assert_eq!(provider.listener_count(), 0);
    }

    #[tokio::test]
    async fn submission_returns_a_hash() {
        let provider = provider();
        let hash = provider
            .submit_transaction(&TransactionRequest::new("0xdead", "1"))
            .await
            .unwrap();
        assert_eq!(hash.len(), 66);
    }

    #[test]
    fn set_accounts_notifies() {
        let provider = provider();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        provider.add_listener(Arc::new(move |_: &ProviderEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        provider.set_accounts(Vec::new());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
