use log::{debug, info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::oneshot;

use crate::error::{WalletError, WalletResult};
use crate::models::{
    ActiveConnection, ConnectionState, ConnectorKind, NetworkDescriptor, NetworkRegistry,
    Transaction, TransactionRequest,
};
use crate::utils::{generate_tx_hash, normalize_address};
use crate::wallet::provider::{EventListener, ListenerId, ProviderError, ProviderEvent, WalletProvider};
use crate::wallet::subscribers::{StateCallback, SubscriberSet, Subscription};

/// Result of a successful connect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub address: String,
    pub chain_id: u64,
    pub network: Option<NetworkDescriptor>,
}

/// Handle to a submitted transaction. The transaction is already tracked as
/// pending when the handle is returned.
pub struct TransactionHandle {
    hash: String,
    outcome: oneshot::Receiver<WalletResult<Transaction>>,
}

impl TransactionHandle {
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Wait for the provider to resolve the transaction
    pub async fn wait(self) -> WalletResult<Transaction> {
        let hash = self.hash;
        self.outcome
            .await
            .unwrap_or(Err(WalletError::TransactionAbandoned { hash }))
    }
}

struct Inner {
    state: ConnectionState,
    /// Bumped on every disconnect; work started under an older value is stale
    generation: u64,
    listener: Option<ListenerId>,
}

struct Shared {
    provider: Option<Arc<dyn WalletProvider>>,
    registry: NetworkRegistry,
    inner: Mutex<Inner>,
    subscribers: SubscriberSet,
}

/// Owner of the wallet session.
///
/// One instance per application session, handed to whatever renders the
/// wallet UI. Clones share the same session. All mutations happen between
/// provider calls and are followed by a synchronous notification of every
/// subscriber with a fresh snapshot.
#[derive(Clone)]
pub struct WalletConnectionManager {
    shared: Arc<Shared>,
}

impl WalletConnectionManager {
    /// Create a manager. `provider` is `None` when no browser wallet is injected.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, registry: NetworkRegistry) -> Self {
        Self {
            shared: Arc::new(Shared {
                provider,
                registry,
                inner: Mutex::new(Inner {
                    state: ConnectionState::default(),
                    generation: 0,
                    listener: None,
                }),
                subscribers: SubscriberSet::default(),
            }),
        }
    }

    /// Ask the wallet for accounts and start a session
    pub async fn connect(&self, connector: ConnectorKind) -> WalletResult<ConnectionInfo> {
        let provider = self.provider()?;
        info!("Connecting wallet via {}", connector);

        let generation = self
            .mutate(|inner| {
                inner.state.connecting = Some(connector);
                Some(inner.generation)
            })
            .unwrap_or_default();

        let outcome = async {
            let accounts = provider.request_accounts().await?;
            let address = accounts
                .first()
                .map(|a| normalize_address(a))
                .ok_or(WalletError::NoAccounts)?;
            let chain_id = provider.current_chain_id().await?;
            Ok::<_, WalletError>((address, chain_id))
        }
        .await;

        match outcome {
            Ok((address, chain_id)) => {
                let connection = ActiveConnection {
                    address,
                    chain_id,
                    connector: Some(connector),
                };
                let info = self.attach(&provider, connection, generation)?;
                info!(
                    "Wallet connected: {} on {}",
                    info.address,
                    self.shared.registry.network_name(info.chain_id)
                );
                Ok(info)
            }
            Err(e) => {
                warn!("Wallet connection failed: {}", e);
                self.mutate(|inner| inner.state.connecting.take().map(|_| ()));
                Err(e)
            }
        }
    }

    /// Restore a session from accounts the wallet already authorized, without
    /// prompting. Returns true if the wallet is connected afterwards.
    pub async fn check_connection(&self) -> bool {
        let provider = match self.provider() {
            Ok(provider) => provider,
            Err(_) => return false,
        };
        let generation = self.lock().generation;

        let outcome = async {
            let accounts = provider.accounts().await?;
            let Some(address) = accounts.first().map(|a| normalize_address(a)) else {
                return Ok(None);
            };
            let chain_id = provider.current_chain_id().await?;
            Ok::<_, ProviderError>(Some((address, chain_id)))
        }
        .await;

        match outcome {
            Ok(Some((address, chain_id))) => {
                let connection = ActiveConnection {
                    address,
                    chain_id,
                    connector: self.lock().state.connector_kind(),
                };
                match self.attach(&provider, connection, generation) {
                    Ok(info) => {
                        info!("Restored wallet session for {}", info.address);
                        true
                    }
                    Err(_) => false,
                }
            }
            Ok(None) => {
                debug!("No previously authorized accounts");
                false
            }
            Err(e) => {
                warn!("Error checking wallet connection: {}", e);
                false
            }
        }
    }

    /// End the session. Pending transactions are abandoned, history is kept.
    pub fn disconnect(&self) {
        let mut listener = None;
        let abandoned = self.mutate(|inner| {
            let state = &inner.state;
            if !state.is_connected() && !state.is_connecting() && state.pending_transactions.is_empty() {
                return None;
            }
            inner.generation += 1;
            listener = inner.listener.take();

            let state = &mut inner.state;
            state.connection = None;
            state.connecting = None;
            state.network = None;
            let abandoned = state.pending_transactions.len();
            state.pending_transactions.clear();
            Some(abandoned)
        });

        if let (Some(id), Some(provider)) = (listener, self.shared.provider.as_ref()) {
            provider.remove_listener(id);
        }

        match abandoned {
            None => debug!("Disconnect requested while already disconnected"),
            Some(0) => info!("Wallet disconnected"),
            Some(n) => warn!("Wallet disconnected with {} pending transaction(s) abandoned", n),
        }
    }

    /// Ask the wallet to move to `chain_id`, adding the chain from the registry
    /// if the wallet doesn't know it yet
    pub async fn switch_network(&self, chain_id: u64) -> WalletResult<()> {
        let provider = self.connected_provider()?;
        let generation = {
            let inner = self.lock();
            if !inner.state.is_connected() {
                return Err(WalletError::NotConnected);
            }
            inner.generation
        };

        info!("Switching network to {}", self.shared.registry.network_name(chain_id));
        match provider.switch_chain(chain_id).await {
            Ok(()) => {}
            Err(ProviderError::UnrecognizedChain(_)) => {
                let network = self
                    .shared
                    .registry
                    .get(chain_id)
                    .ok_or(WalletError::UnsupportedNetwork(chain_id))?;

                info!("Chain {} unknown to wallet, adding {}", chain_id, network.name);
                provider.add_chain(network).await.map_err(|e| {
                    warn!("Adding {} to the wallet failed: {}", network.name, e);
                    WalletError::SwitchFailed(format!("failed to add {} to the wallet: {}", network.name, e))
                })?;
                provider.switch_chain(chain_id).await.map_err(|e| {
                    warn!("Network switch to {} failed after adding it: {}", chain_id, e);
                    WalletError::SwitchFailed(e.to_string())
                })?;
            }
            Err(e) => {
                warn!("Network switch to {} failed: {}", chain_id, e);
                return Err(WalletError::SwitchFailed(e.to_string()));
            }
        }

        let registry = &self.shared.registry;
        let applied = self.mutate(|inner| {
            if inner.generation != generation {
                return None;
            }
            let connection = inner.state.connection.as_mut()?;
            if connection.chain_id == chain_id {
                return None;
            }
            connection.chain_id = chain_id;
            inner.state.network = registry.get(chain_id).cloned();
            Some(())
        });

        // The wallet's chainChanged event may already have applied the switch
        if applied.is_some() || self.lock().state.chain_id() == Some(chain_id) {
            Ok(())
        } else {
            Err(WalletError::NotConnected)
        }
    }

    /// Track a new pending transaction and hand it to the provider.
    ///
    /// Returns once the pending entry is visible to subscribers; the outcome
    /// is delivered through the handle.
    pub async fn send_transaction(&self, request: TransactionRequest) -> WalletResult<TransactionHandle> {
        let provider = self.connected_provider()?;

        let (hash, generation) = self
            .mutate(|inner| {
                if !inner.state.is_connected() {
                    return None;
                }
                let mut hash = generate_tx_hash();
                while inner.state.contains_hash(&hash) {
                    hash = generate_tx_hash();
                }
                let tx = Transaction::pending(hash.clone(), request.clone());
                inner.state.pending_transactions.insert(hash.clone(), tx);
                Some((hash, inner.generation))
            })
            .ok_or(WalletError::NotConnected)?;

        info!("Submitted transaction {} to {} (value {})", hash, request.to, request.value);

        let (sender, outcome) = oneshot::channel();
        let manager = self.clone();
        let task_hash = hash.clone();
        tokio::spawn(async move {
            let result = provider.submit_transaction(&request).await;
            let finished = manager.finish_transaction(&task_hash, generation, result);
            let _ = sender.send(finished);
        });

        Ok(TransactionHandle { hash, outcome })
    }

    /// Immutable copy of the current state
    pub fn get_state(&self) -> ConnectionState {
        self.lock().state.clone()
    }

    /// Register a callback invoked with a snapshot after every change
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ConnectionState) + Send + Sync + 'static,
    {
        let callback: StateCallback = Arc::new(callback);
        self.shared.subscribers.subscribe(callback)
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.len()
    }

    /// Apply an event pushed by the wallet
    pub fn handle_provider_event(&self, event: &ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) if accounts.is_empty() => {
                info!("Wallet revoked all accounts");
                self.disconnect();
            }
            ProviderEvent::AccountsChanged(accounts) => {
                let address = normalize_address(&accounts[0]);
                let changed = self.mutate(|inner| {
                    let connection = inner.state.connection.as_mut()?;
                    if connection.address == address {
                        return None;
                    }
                    connection.address = address.clone();
                    Some(())
                });
                if changed.is_some() {
                    info!("Active account changed to {}", address);
                }
            }
            ProviderEvent::ChainChanged(chain_id) => {
                let registry = &self.shared.registry;
                let changed = self.mutate(|inner| {
                    let connection = inner.state.connection.as_mut()?;
                    if connection.chain_id == *chain_id {
                        return None;
                    }
                    connection.chain_id = *chain_id;
                    inner.state.network = registry.get(*chain_id).cloned();
                    Some(())
                });
                if changed.is_some() {
                    info!("Wallet moved to {}", registry.network_name(*chain_id));
                }
            }
        }
    }

    pub fn transaction_status(&self, hash: &str) -> Option<Transaction> {
        self.lock().state.transaction(hash).cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().state.pending_count()
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.shared.registry
    }

    pub fn is_network_supported(&self, chain_id: u64) -> bool {
        self.shared.registry.is_supported(chain_id)
    }

    pub fn network_name(&self, chain_id: u64) -> &str {
        self.shared.registry.network_name(chain_id)
    }

    fn provider(&self) -> WalletResult<Arc<dyn WalletProvider>> {
        self.shared.provider.clone().ok_or(WalletError::ProviderUnavailable)
    }

    /// A session can only exist with a provider, so a missing one means not connected
    fn connected_provider(&self) -> WalletResult<Arc<dyn WalletProvider>> {
        self.shared.provider.clone().ok_or(WalletError::NotConnected)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` under the state lock. If it returns `Some`, the snapshot is
    /// queued before the lock is released and delivered after, so
    /// subscribers see changes in the order they were made.
    fn mutate<T>(&self, f: impl FnOnce(&mut Inner) -> Option<T>) -> Option<T> {
        let result = {
            let mut inner = self.lock();
            let result = f(&mut *inner)?;
            inner.state.revision += 1;
            self.shared.subscribers.enqueue(inner.state.clone());
            result
        };
        self.shared.subscribers.flush();
        Some(result)
    }

    /// Install `connection` unless a disconnect happened since `generation`.
    /// The provider listener slot is filled in the same critical section, so
    /// a concurrent disconnect either sees and removes it or wins outright.
    fn attach(
        &self,
        provider: &Arc<dyn WalletProvider>,
        connection: ActiveConnection,
        generation: u64,
    ) -> WalletResult<ConnectionInfo> {
        let listener = provider.add_listener(self.event_listener());
        let registry = &self.shared.registry;
        let mut previous = None;
        let info = self.mutate(|inner| {
            if inner.generation != generation {
                return None;
            }
            let network = registry.get(connection.chain_id).cloned();
            let info = ConnectionInfo {
                address: connection.address.clone(),
                chain_id: connection.chain_id,
                network: network.clone(),
            };
            inner.state.connection = Some(connection);
            inner.state.connecting = None;
            inner.state.network = network;
            previous = inner.listener.replace(listener);
            Some(info)
        });

        match info {
            Some(info) => {
                if let Some(previous) = previous {
                    provider.remove_listener(previous);
                }
                Ok(info)
            }
            None => {
                provider.remove_listener(listener);
                debug!("Connection superseded by a disconnect");
                Err(WalletError::NotConnected)
            }
        }
    }

    /// Provider callback that forwards events to this manager while it lives
    fn event_listener(&self) -> EventListener {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        Arc::new(move |event: &ProviderEvent| {
            if let Some(shared) = weak.upgrade() {
                WalletConnectionManager { shared }.handle_provider_event(event);
            }
        })
    }

    fn finish_transaction(
        &self,
        hash: &str,
        generation: u64,
        result: Result<String, ProviderError>,
    ) -> WalletResult<Transaction> {
        let finalized = self.mutate(|inner| {
            if inner.generation != generation {
                return None;
            }
            let tx = inner.state.pending_transactions.remove(hash)?;
            let tx = match &result {
                Ok(provider_hash) => tx.confirm(provider_hash.clone()),
                Err(e) => tx.fail(e.to_string()),
            };
            inner.state.transaction_history.push(tx.clone());
            Some(tx)
        });

        let Some(tx) = finalized else {
            debug!("Ignoring late provider result for abandoned transaction {}", hash);
            return Err(WalletError::TransactionAbandoned { hash: hash.to_string() });
        };

        match result {
            Ok(_) => {
                info!("Transaction {} confirmed", hash);
                Ok(tx)
            }
            Err(e) => {
                warn!("Transaction {} failed: {}", hash, e);
                Err(WalletError::TransactionFailed(e.to_string()))
            }
        }
    }
}
