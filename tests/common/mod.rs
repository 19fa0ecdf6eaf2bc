//! Scripted wallet doubles shared by the integration tests.
//!
//! Every async provider call yields once before answering, so `join!` can
//! interleave a second operation while the first waits on its "prompt".

#![allow(dead_code)]

use async_trait::async_trait;
use futures::channel::mpsc::UnboundedReceiver;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use presale::config::RelayConfig;
use presale::wallet::{
    EventSink, HostProviders, InjectedHost, ProviderError, ProviderEvent, ProviderFlags, RelayClient,
    RelayConnector, Subscription, WalletProvider,
};
use presale::{ChainSpec, Notification, Presale, SaleConfig};

pub const ALICE: &str = "0x52908400098527886E0F7030069857D2E4169EE7";
pub const BOB: &str = "0x8617E340B3D01FA5F11F306F4090FD50E238070D";
pub const ETHEREUM: u64 = 1;
pub const BSC: u64 = 56;

// ============================================================================
// Injected provider
// ============================================================================

pub struct MockProvider {
    pub flags: ProviderFlags,
    pub calls: RefCell<Vec<String>>,
    pub accounts: RefCell<Result<Vec<String>, ProviderError>>,
    pub chain: Cell<u64>,
    pub chain_read_fails: Cell<bool>,
    /// Consumed front to back; an empty queue means success.
    pub switch_results: RefCell<VecDeque<Result<(), ProviderError>>>,
    pub add_result: RefCell<Result<(), ProviderError>>,
    live: Rc<RefCell<Vec<EventSink>>>,
    history: RefCell<Vec<EventSink>>,
    detached: Rc<Cell<usize>>,
}

impl MockProvider {
    pub fn new(flags: ProviderFlags) -> Rc<Self> {
        Rc::new(Self {
            flags,
            calls: RefCell::new(Vec::new()),
            accounts: RefCell::new(Ok(vec![ALICE.to_string()])),
            chain: Cell::new(BSC),
            chain_read_fails: Cell::new(false),
            switch_results: RefCell::new(VecDeque::new()),
            add_result: RefCell::new(Ok(())),
            live: Rc::new(RefCell::new(Vec::new())),
            history: RefCell::new(Vec::new()),
            detached: Rc::new(Cell::new(0)),
        })
    }

    pub fn metamask() -> Rc<Self> {
        Self::new(ProviderFlags { is_metamask: true, ..Default::default() })
    }

    pub fn trust() -> Rc<Self> {
        Self::new(ProviderFlags { is_trust_wallet: true, ..Default::default() })
    }

    pub fn on_chain(self: Rc<Self>, chain_id: u64) -> Rc<Self> {
        self.chain.set(chain_id);
        self
    }

    pub fn with_accounts(self: Rc<Self>, accounts: Result<Vec<String>, ProviderError>) -> Rc<Self> {
        *self.accounts.borrow_mut() = accounts;
        self
    }

    /// Deliver an event to every attached listener.
    pub fn emit(&self, event: ProviderEvent) {
        for sink in self.live.borrow().iter() {
            sink.emit(event.clone());
        }
    }

    /// Deliver through a listener even after it was detached, like a wallet
    /// that fires one last event during teardown.
    pub fn emit_through_released(&self, event: ProviderEvent) {
        for sink in self.history.borrow().iter() {
            sink.emit(event.clone());
        }
    }

    pub fn listener_count(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn detach_count(&self) -> usize {
        self.detached.get()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.as_str() == call).count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }
}

#[async_trait(?Send)]
impl WalletProvider for MockProvider {
    fn flags(&self) -> ProviderFlags {
        self.flags
    }

    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.record("eth_requestAccounts");
        tokio::task::yield_now().await;
        self.accounts.borrow().clone()
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.record("eth_chainId");
        tokio::task::yield_now().await;
        if self.chain_read_fails.get() {
            return Err(ProviderError::Other("chain id unavailable".into()));
        }
        Ok(self.chain.get())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.record(format!("switch:{chain_id}"));
        tokio::task::yield_now().await;
        let result = self.switch_results.borrow_mut().pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            self.chain.set(chain_id);
        }
        result
    }

    async fn add_chain(&self, chain: &ChainSpec) -> Result<(), ProviderError> {
        self.record(format!("add:{}", chain.id()));
        tokio::task::yield_now().await;
        self.add_result.borrow().clone()
    }

    fn subscribe(&self, sink: EventSink) -> Subscription {
        self.record("subscribe");
        self.live.borrow_mut().push(sink.clone());
        self.history.borrow_mut().push(sink);
        let live = self.live.clone();
        let detached = self.detached.clone();
        Subscription::new(move || {
            live.borrow_mut().clear();
            detached.set(detached.get() + 1);
        })
    }
}

// ============================================================================
// Host page
// ============================================================================

pub struct MockHost {
    providers: HostProviders<Rc<dyn WalletProvider>>,
}

impl MockHost {
    pub fn empty() -> Rc<Self> {
        Rc::new(Self { providers: HostProviders::Absent })
    }

    pub fn single(provider: Rc<MockProvider>) -> Rc<Self> {
        Rc::new(Self { providers: HostProviders::Single(provider as Rc<dyn WalletProvider>) })
    }

    pub fn many(providers: Vec<Rc<MockProvider>>) -> Rc<Self> {
        let providers = providers.into_iter().map(|p| p as Rc<dyn WalletProvider>).collect();
        Rc::new(Self { providers: HostProviders::Many(providers) })
    }
}

impl InjectedHost for MockHost {
    fn providers(&self) -> HostProviders<Rc<dyn WalletProvider>> {
        self.providers.clone()
    }
}

// ============================================================================
// Relay pairing
// ============================================================================

pub struct MockRelay {
    pub wallet: Rc<MockProvider>,
    pub session: Cell<bool>,
    pub cached: RefCell<Vec<String>>,
    pub connect_result: RefCell<Result<(), ProviderError>>,
    pub enable_result: RefCell<Option<Result<Vec<String>, ProviderError>>>,
    pub connects: Cell<usize>,
    pub disconnects: Cell<usize>,
}

impl MockRelay {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            wallet: MockProvider::new(ProviderFlags::default()),
            session: Cell::new(false),
            cached: RefCell::new(Vec::new()),
            connect_result: RefCell::new(Ok(())),
            enable_result: RefCell::new(None),
            connects: Cell::new(0),
            disconnects: Cell::new(0),
        })
    }

    /// A session left over from a previous visit.
    pub fn with_cached_session(self: Rc<Self>, account: &str) -> Rc<Self> {
        self.session.set(true);
        self.cached.borrow_mut().push(account.to_string());
        self
    }
}

#[async_trait(?Send)]
impl RelayClient for MockRelay {
    fn has_session(&self) -> bool {
        self.session.get()
    }

    fn accounts(&self) -> Vec<String> {
        self.cached.borrow().clone()
    }

    async fn connect(&self) -> Result<(), ProviderError> {
        self.connects.set(self.connects.get() + 1);
        tokio::task::yield_now().await;
        self.connect_result.borrow().clone()?;
        self.session.set(true);
        *self.cached.borrow_mut() = vec![ALICE.to_string()];
        Ok(())
    }

    async fn enable(&self) -> Result<Vec<String>, ProviderError> {
        tokio::task::yield_now().await;
        match self.enable_result.borrow().clone() {
            Some(result) => result,
            None => Ok(self.cached.borrow().clone()),
        }
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.disconnects.set(self.disconnects.get() + 1);
        self.session.set(false);
        self.cached.borrow_mut().clear();
        Ok(())
    }

    fn provider(self: Rc<Self>) -> Rc<dyn WalletProvider> {
        self.wallet.clone()
    }
}

pub struct MockConnector {
    pub relay: Rc<MockRelay>,
    pub inits: Cell<usize>,
    pub fail_next: Cell<bool>,
}

impl MockConnector {
    pub fn new(relay: Rc<MockRelay>) -> Rc<Self> {
        Rc::new(Self { relay, inits: Cell::new(0), fail_next: Cell::new(false) })
    }
}

#[async_trait(?Send)]
impl RelayConnector for MockConnector {
    async fn init(&self, config: &RelayConfig) -> Result<Rc<dyn RelayClient>, ProviderError> {
        self.inits.set(self.inits.get() + 1);
        assert_eq!(config.chains, vec![BSC]);
        tokio::task::yield_now().await;
        if self.fail_next.replace(false) {
            return Err(ProviderError::Other("relay unreachable".into()));
        }
        Ok(self.relay.clone())
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn presale_with(host: Rc<MockHost>, connector: Rc<MockConnector>) -> Presale {
    Presale::new(SaleConfig::default(), host, connector).expect("presale")
}

pub fn presale_for(provider: Rc<MockProvider>) -> Presale {
    presale_with(MockHost::single(provider), MockConnector::new(MockRelay::new()))
}

/// Everything published since the last drain.
pub fn drain(rx: &mut UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        out.push(notification);
    }
    out
}
