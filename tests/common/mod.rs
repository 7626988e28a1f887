#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use storefront_wallet::models::{ConnectionState, NetworkDescriptor, NetworkRegistry, TransactionRequest};
use storefront_wallet::wallet::{
    EventListener, ListenerId, ProviderError, ProviderEvent, Subscription, WalletConnectionManager,
    WalletProvider,
};

pub const ALICE: &str = "0xabc0000000000000000000000000000000001234";
pub const BOB: &str = "0xb0b0000000000000000000000000000000005678";

/// Provider calls recorded by the fake, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RequestAccounts,
    Accounts,
    CurrentChain,
    SwitchChain(u64),
    AddChain(u64),
    Submit(String),
}

/// Deterministic provider. Submissions wait on a semaphore when gated so
/// tests decide when each transaction resolves.
pub struct FakeProvider {
    pub accounts: Mutex<Vec<String>>,
    pub chain_id: Mutex<u64>,
    pub known_chains: Mutex<BTreeSet<u64>>,
    pub request_error: Mutex<Option<ProviderError>>,
    pub switch_error: Mutex<Option<ProviderError>>,
    pub add_chain_error: Mutex<Option<ProviderError>>,
    pub submit_results: Mutex<VecDeque<Result<String, ProviderError>>>,
    /// Scripted switch outcomes, used before the known-chain check
    pub switch_results: Mutex<VecDeque<Result<(), ProviderError>>>,
    pub calls: Mutex<Vec<Call>>,
    gate: Option<Semaphore>,
    account_gate: Option<Semaphore>,
    listeners: Mutex<HashMap<ListenerId, EventListener>>,
    next_listener: Mutex<u64>,
}

impl FakeProvider {
    pub fn new(accounts: &[&str], chain_id: u64) -> Self {
        Self {
            accounts: Mutex::new(accounts.iter().map(|a| a.to_string()).collect()),
            chain_id: Mutex::new(chain_id),
            known_chains: Mutex::new(BTreeSet::from([chain_id])),
            request_error: Mutex::new(None),
            switch_error: Mutex::new(None),
            add_chain_error: Mutex::new(None),
            submit_results: Mutex::new(VecDeque::new()),
            switch_results: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            gate: None,
            account_gate: None,
            listeners: Mutex::new(HashMap::new()),
            next_listener: Mutex::new(0),
        }
    }

    /// Hold every submission until `release` is called
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Hold account requests (prompted and silent) until `release_accounts`
    pub fn gated_accounts(mut self) -> Self {
        self.account_gate = Some(Semaphore::new(0));
        self
    }

    pub fn release_accounts(&self, count: usize) {
        if let Some(gate) = &self.account_gate {
            gate.add_permits(count);
        }
    }

    pub fn push_switch_result(&self, result: Result<(), ProviderError>) {
        self.switch_results.lock().unwrap().push_back(result);
    }

    pub fn knows(self, chain_id: u64) -> Self {
        self.known_chains.lock().unwrap().insert(chain_id);
        self
    }

    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    pub fn push_submit_result(&self, result: Result<String, ProviderError>) {
        self.submit_results.lock().unwrap().push_back(result);
    }

    pub fn emit(&self, event: ProviderEvent) {
        let listeners: Vec<EventListener> = self.listeners.lock().unwrap().values().cloned().collect();
        for listener in listeners {
            listener(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    async fn wait_for_accounts(&self) {
        if let Some(gate) = &self.account_gate {
            gate.acquire().await.unwrap().forget();
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WalletProvider for FakeProvider {
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.record(Call::RequestAccounts);
        self.wait_for_accounts().await;
        if let Some(err) = self.request_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.record(Call::Accounts);
        self.wait_for_accounts().await;
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn current_chain_id(&self) -> Result<u64, ProviderError> {
        self.record(Call::CurrentChain);
        Ok(*self.chain_id.lock().unwrap())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.record(Call::SwitchChain(chain_id));
        let scripted = self.switch_results.lock().unwrap().pop_front();
        if let Some(result) = scripted {
            if result.is_ok() {
                *self.chain_id.lock().unwrap() = chain_id;
            }
            return result;
        }
        if let Some(err) = self.switch_error.lock().unwrap().clone() {
            return Err(err);
        }
        if !self.known_chains.lock().unwrap().contains(&chain_id) {
            return Err(ProviderError::UnrecognizedChain(chain_id));
        }
        *self.chain_id.lock().unwrap() = chain_id;
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), ProviderError> {
        self.record(Call::AddChain(network.chain_id));
        if let Some(err) = self.add_chain_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.known_chains.lock().unwrap().insert(network.chain_id);
        Ok(())
    }

    async fn submit_transaction(&self, request: &TransactionRequest) -> Result<String, ProviderError> {
        self.record(Call::Submit(request.to.clone()));
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        let scripted = self.submit_results.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok("0xfeed".to_string()))
    }

    fn add_listener(&self, listener: EventListener) -> ListenerId {
        let mut next = self.next_listener.lock().unwrap();
        let id = ListenerId(*next);
        *next += 1;
        self.listeners.lock().unwrap().insert(id, listener);
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.lock().unwrap().remove(&id);
    }
}

pub fn manager_with(provider: Arc<FakeProvider>) -> WalletConnectionManager {
    WalletConnectionManager::new(Some(provider as Arc<dyn WalletProvider>), NetworkRegistry::builtin())
}

/// Collect every snapshot delivered to a subscriber
pub fn record_snapshots(manager: &WalletConnectionManager) -> (Arc<Mutex<Vec<ConnectionState>>>, Subscription) {
    let snapshots = Arc::new(Mutex::new(Vec::new()));
    let sink = snapshots.clone();
    let subscription = manager.subscribe(move |state| sink.lock().unwrap().push(state.clone()));
    (snapshots, subscription)
}

/// Connection fields are present together, and every known hash sits in
/// exactly one of pending or history
pub fn assert_consistent(state: &ConnectionState, hashes: &[&str]) {
    assert_eq!(state.is_connected(), state.address().is_some() && state.chain_id().is_some());
    for hash in hashes {
        let pending = state.pending_transactions.contains_key(*hash);
        let in_history = state.transaction_history.iter().filter(|tx| tx.hash == *hash).count();
        assert!(
            (pending && in_history == 0) || (!pending && in_history == 1),
            "hash {} is pending={} and {} time(s) in history",
            hash,
            pending,
            in_history
        );
    }
}

/// Yield to other tasks until `condition` holds
pub async fn until(mut condition: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}
