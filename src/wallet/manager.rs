//! Connection Manager: the wallet state machine.
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──ok──▶ Connected
//!       ▲                        │                 │
//!       └────────failure─────────┘                 │
//!       └──disconnect / accountsChanged([]) / remote disconnect
//! ```
//!
//! Every attempt is stamped with the current epoch. `disconnect` bumps the
//! epoch, so an attempt that resumes after its prompt resolves can tell it was
//! cancelled and backs off without touching state. Provider events carry the
//! epoch of the subscription that produced them for the same reason.

use futures::channel::mpsc;
use futures::StreamExt;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::error::{ProviderError, WalletError};
use super::network::{NetworkReconciler, NetworkStatus};
use super::provider::{
    EventSink, InjectedHost, InjectedKind, ProviderEvent, ProviderKind, RelayClient, Subscription, TaggedEvent,
    WalletChoice, WalletProvider,
};
use super::resolver::resolve;
use super::session::SessionStore;
use crate::core::chain::ChainSpec;
use crate::core::notify::{Notification, Notifier};
use crate::core::status::StatusLine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected { address: String, provider: ProviderKind },
}

impl ConnectionState {
    pub fn address(&self) -> Option<&str> {
        match self {
            ConnectionState::Connected { address, .. } => Some(address.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConnectOutcome {
    Connected { address: String, provider: ProviderKind },
    /// Another attempt owns the state machine; nothing was requested.
    AlreadyInFlight,
    /// A disconnect happened while this attempt was waiting.
    Superseded,
    /// Nothing cached to restore.
    NoSession,
}

/// The provider the page currently talks to, with its listeners.
struct ActiveProvider {
    provider: Rc<dyn WalletProvider>,
    kind: ProviderKind,
    epoch: u64,
    _subscription: Subscription,
}

pub struct ConnectionManager {
    host: Rc<dyn InjectedHost>,
    sessions: SessionStore,
    reconciler: NetworkReconciler,
    notifier: Notifier<Notification>,
    state: RefCell<ConnectionState>,
    active: RefCell<Option<ActiveProvider>>,
    network: Cell<NetworkStatus>,
    epoch: Cell<u64>,
    events_tx: mpsc::UnboundedSender<TaggedEvent>,
    events_rx: RefCell<mpsc::UnboundedReceiver<TaggedEvent>>,
}

impl ConnectionManager {
    pub fn new(
        host: Rc<dyn InjectedHost>,
        sessions: SessionStore,
        target: ChainSpec,
        notifier: Notifier<Notification>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded();
        Self {
            host,
            sessions,
            reconciler: NetworkReconciler::new(target),
            notifier,
            state: RefCell::new(ConnectionState::Disconnected),
            active: RefCell::new(None),
            network: Cell::new(NetworkStatus::NotApplicable),
            epoch: Cell::new(0),
            events_tx,
            events_rx: RefCell::new(events_rx),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn address(&self) -> Option<String> {
        self.state.borrow().address().map(str::to_string)
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.state.borrow(), ConnectionState::Connected { .. })
    }

    pub fn active_kind(&self) -> Option<ProviderKind> {
        self.active.borrow().as_ref().map(|active| active.kind)
    }

    /// Last published network status.
    pub fn network_status(&self) -> NetworkStatus {
        self.network.get()
    }

    pub fn target_chain(&self) -> &ChainSpec {
        self.reconciler.target()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn active_provider(&self) -> Option<Rc<dyn WalletProvider>> {
        self.active.borrow().as_ref().map(|active| active.provider.clone())
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.get() == epoch
    }

    // ------------------------------------------------------------------
    // Connect
    // ------------------------------------------------------------------

    pub async fn connect(&self, choice: WalletChoice) -> Result<ConnectOutcome, WalletError> {
        match choice {
            WalletChoice::MetaMask => self.connect_injected(InjectedKind::MetaMask).await,
            WalletChoice::Trust => self.connect_injected(InjectedKind::Trust).await,
            WalletChoice::WalletConnect => self.connect_relay().await,
        }
    }

    pub async fn connect_injected(&self, kind: InjectedKind) -> Result<ConnectOutcome, WalletError> {
        let Some(epoch) = self.begin_attempt(true) else {
            tracing::debug!(wallet = kind.label(), "connect already in flight");
            return Ok(ConnectOutcome::AlreadyInFlight);
        };

        let Some(provider) = resolve(&self.host.providers(), Some(kind)) else {
            tracing::info!(wallet = kind.label(), "injected provider not found");
            return Err(self.fail(WalletError::NotDetected(kind)));
        };

        let accounts = provider.request_accounts().await;
        if !self.is_current(epoch) {
            tracing::debug!(epoch, "connect superseded while awaiting authorization");
            return Ok(ConnectOutcome::Superseded);
        }
        let address = match accounts.map(|accounts| accounts.into_iter().next()) {
            Ok(Some(address)) => address,
            Ok(None) => return Err(self.fail(WalletError::TransientFailure("no accounts returned".into()))),
            Err(err) => return Err(self.fail(err.into())),
        };

        Ok(self.commit(epoch, provider, ProviderKind::Injected(kind), address).await)
    }

    pub async fn connect_relay(&self) -> Result<ConnectOutcome, WalletError> {
        let Some(epoch) = self.begin_attempt(true) else {
            tracing::debug!("relay connect already in flight");
            return Ok(ConnectOutcome::AlreadyInFlight);
        };

        let client = self.sessions.init().await;
        if !self.is_current(epoch) {
            return Ok(ConnectOutcome::Superseded);
        }
        let client = client.map_err(|err| self.fail(WalletError::from_relay(err)))?;

        let accounts = Self::open_pairing(client.as_ref()).await;
        if !self.is_current(epoch) {
            tracing::debug!(epoch, "relay pairing superseded");
            return Ok(ConnectOutcome::Superseded);
        }
        let address = match accounts.map(|accounts| accounts.into_iter().next()) {
            Ok(Some(address)) => address,
            Ok(None) => return Err(self.fail(WalletError::RelayFailure("relay returned no accounts".into()))),
            Err(err) => return Err(self.fail(WalletError::from_relay(err))),
        };

        Ok(self.commit(epoch, client.provider(), ProviderKind::Relay, address).await)
    }

    /// Fresh pairing when there is no session, otherwise re-enable it.
    async fn open_pairing(client: &dyn RelayClient) -> Result<Vec<String>, ProviderError> {
        if client.has_session() {
            return client.enable().await;
        }
        client.connect().await?;
        let accounts = client.accounts();
        if accounts.is_empty() {
            client.enable().await
        } else {
            Ok(accounts)
        }
    }

    /// Page-load restoration of a cached relay session. Silent when there is
    /// nothing to restore.
    pub async fn restore_session(&self) -> ConnectOutcome {
        if let ConnectionState::Connected { address, provider } = self.state() {
            return ConnectOutcome::Connected { address, provider };
        }
        let Some(epoch) = self.begin_attempt(false) else {
            return ConnectOutcome::AlreadyInFlight;
        };

        let restored = self.sessions.restore().await;
        if !self.is_current(epoch) {
            return ConnectOutcome::Superseded;
        }
        let Some(address) = restored.and_then(|accounts| accounts.into_iter().next()) else {
            *self.state.borrow_mut() = ConnectionState::Disconnected;
            return ConnectOutcome::NoSession;
        };
        let Some(client) = self.sessions.client() else {
            *self.state.borrow_mut() = ConnectionState::Disconnected;
            return ConnectOutcome::NoSession;
        };

        tracing::info!(address = %address, "relay session restored");
        self.commit(epoch, client.provider(), ProviderKind::Relay, address).await
    }

    /// Claim the state machine for a new attempt. `None` if one is running.
    fn begin_attempt(&self, announce: bool) -> Option<u64> {
        if matches!(*self.state.borrow(), ConnectionState::Connecting) {
            return None;
        }
        let epoch = self.epoch.get() + 1;
        self.epoch.set(epoch);

        if self.active.borrow_mut().take().is_some() {
            self.set_network(NetworkStatus::NotApplicable);
        }
        if announce {
            self.set_state(ConnectionState::Connecting);
        } else {
            *self.state.borrow_mut() = ConnectionState::Connecting;
        }
        Some(epoch)
    }

    async fn commit(
        &self,
        epoch: u64,
        provider: Rc<dyn WalletProvider>,
        kind: ProviderKind,
        address: String,
    ) -> ConnectOutcome {
        let subscription = provider.subscribe(EventSink::new(epoch, self.events_tx.clone()));
        *self.active.borrow_mut() = Some(ActiveProvider { provider, kind, epoch, _subscription: subscription });

        tracing::info!(address = %address, provider = ?kind, "wallet connected");
        self.set_state(ConnectionState::Connected { address: address.clone(), provider: kind });
        self.refresh_network().await;

        ConnectOutcome::Connected { address, provider: kind }
    }

    fn fail(&self, err: WalletError) -> WalletError {
        tracing::warn!(error = %err, "wallet connect failed");
        self.active.borrow_mut().take();
        self.set_state(ConnectionState::Disconnected);
        self.notifier.notify(Notification::Status(StatusLine::for_error(&err)));
        err
    }

    // ------------------------------------------------------------------
    // Disconnect
    // ------------------------------------------------------------------

    /// Always clears local state. `clear_remote` also closes the relay pairing.
    pub async fn disconnect(&self, clear_remote: bool) {
        let idle = matches!(*self.state.borrow(), ConnectionState::Disconnected) && self.active.borrow().is_none();
        if idle {
            return;
        }

        self.epoch.set(self.epoch.get() + 1);
        // dropping the guard detaches the listeners
        self.active.borrow_mut().take();
        self.set_state(ConnectionState::Disconnected);
        self.set_network(NetworkStatus::NotApplicable);
        self.notifier.notify(Notification::Status(StatusLine::idle()));
        tracing::info!(clear_remote, "wallet disconnected");

        if clear_remote {
            self.sessions.disconnect().await;
        }
    }

    // ------------------------------------------------------------------
    // Network
    // ------------------------------------------------------------------

    /// Re-read the active provider's chain and publish the result.
    pub async fn refresh_network(&self) -> NetworkStatus {
        let epoch = self.epoch.get();
        let provider = self.active_provider();
        let status = self.reconciler.check(provider.as_deref()).await;
        if !self.is_current(epoch) {
            return self.network.get();
        }
        self.set_network(status);
        status
    }

    pub async fn switch_network(&self) -> Result<NetworkStatus, WalletError> {
        let epoch = self.epoch.get();
        let provider = self.active_provider();
        let switched = self.reconciler.switch_to_target(provider.as_deref()).await;
        if !self.is_current(epoch) {
            return switched.map(|()| self.network.get());
        }
        match switched {
            Ok(()) => Ok(self.refresh_network().await),
            Err(err) => {
                self.notifier.notify(Notification::Status(StatusLine::for_error(&err)));
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Handle everything queued so far, then return.
    pub async fn pump_events(&self) -> usize {
        let mut handled = 0;
        loop {
            let next = self.events_rx.borrow_mut().try_recv();
            match next {
                Ok(event) => {
                    self.handle_event(event).await;
                    handled += 1;
                }
                _ => return handled,
            }
        }
    }

    /// Handle events as they arrive. Runs for the life of the manager.
    pub async fn run_events(&self) {
        loop {
            let next = futures::future::poll_fn(|cx| self.events_rx.borrow_mut().poll_next_unpin(cx)).await;
            match next {
                Some(event) => self.handle_event(event).await,
                None => return,
            }
        }
    }

    async fn handle_event(&self, tagged: TaggedEvent) {
        let kind = self
            .active
            .borrow()
            .as_ref()
            .filter(|active| active.epoch == tagged.epoch && self.is_current(tagged.epoch))
            .map(|active| active.kind);
        let Some(kind) = kind else {
            tracing::debug!(epoch = tagged.epoch, event = ?tagged.event, "dropping event from released provider");
            return;
        };

        match tagged.event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
                Some(address) => {
                    tracing::info!(address = %address, "account changed");
                    self.set_state(ConnectionState::Connected { address, provider: kind });
                    self.refresh_network().await;
                }
                None => self.disconnect(false).await,
            },
            ProviderEvent::ChainChanged(chain_id) => {
                tracing::info!(chain_id, "chain changed");
                self.refresh_network().await;
            }
            ProviderEvent::Disconnect => {
                tracing::info!("provider reported disconnect");
                self.disconnect(false).await;
            }
        }
    }

    // ------------------------------------------------------------------
    // Publishing
    // ------------------------------------------------------------------

    fn set_state(&self, next: ConnectionState) {
        let changed = *self.state.borrow() != next;
        if changed {
            *self.state.borrow_mut() = next.clone();
            self.notifier.notify(Notification::Connection(next));
        }
    }

    fn set_network(&self, next: NetworkStatus) {
        if self.network.get() == next {
            return;
        }
        self.network.set(next);
        self.notifier.notify(Notification::Network(next));
        if self.is_connected() {
            if let Some(line) = StatusLine::for_network(next, self.reconciler.target().name()) {
                self.notifier.notify(Notification::Status(line));
            }
        }
    }
}
