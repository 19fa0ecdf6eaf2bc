//! Session Store: the memoized relay client.
//!
//! The relay SDK is initialized at most once per page. Callers that arrive
//! while initialization is in flight await the same future instead of
//! starting a second handshake. A failed init clears the memo so the next
//! call starts over.

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::error::ProviderError;
use super::provider::{RelayClient, RelayConnector};
use crate::config::RelayConfig;

type InitResult = Result<Rc<dyn RelayClient>, ProviderError>;
type PendingInit = Shared<LocalBoxFuture<'static, InitResult>>;

pub struct SessionStore {
    connector: Rc<dyn RelayConnector>,
    config: RelayConfig,
    client: RefCell<Option<Rc<dyn RelayClient>>>,
    pending: RefCell<Option<(u64, PendingInit)>>,
    generation: Cell<u64>,
}

impl SessionStore {
    pub fn new(connector: Rc<dyn RelayConnector>, config: RelayConfig) -> Self {
        Self {
            connector,
            config,
            client: RefCell::new(None),
            pending: RefCell::new(None),
            generation: Cell::new(0),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The client, if initialization already finished.
    pub fn client(&self) -> Option<Rc<dyn RelayClient>> {
        self.client.borrow().clone()
    }

    pub async fn init(&self) -> InitResult {
        if let Some(client) = self.client() {
            return Ok(client);
        }

        let (generation, pending) = self.pending_init();
        let result = pending.await;

        if self.generation.get() == generation {
            self.pending.borrow_mut().take();
        }
        match &result {
            Ok(client) => {
                self.client.borrow_mut().get_or_insert_with(|| client.clone());
            }
            Err(err) => tracing::warn!(error = %err, "relay client init failed"),
        }
        result
    }

    fn pending_init(&self) -> (u64, PendingInit) {
        if let Some((generation, pending)) = self.pending.borrow().as_ref() {
            return (*generation, pending.clone());
        }

        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        tracing::debug!(generation, project_id = %self.config.project_id, "initializing relay client");

        let connector = self.connector.clone();
        let config = self.config.clone();
        let pending = async move { connector.init(&config).await }.boxed_local().shared();
        *self.pending.borrow_mut() = Some((generation, pending.clone()));
        (generation, pending)
    }

    /// A live pairing or a cached account list exists. Only meaningful after
    /// [`init`](Self::init); a fresh visitor gets `false` and no prompt.
    pub fn has_restorable_session(&self) -> bool {
        self.client()
            .map(|client| client.has_session() || !client.accounts().is_empty())
            .unwrap_or(false)
    }

    /// Re-activate a cached session without prompting.
    ///
    /// Any failure tears the half-open session down and yields `None`.
    pub async fn restore(&self) -> Option<Vec<String>> {
        let client = match self.init().await {
            Ok(client) => client,
            Err(err) => {
                tracing::debug!(error = %err, "no relay client, nothing to restore");
                return None;
            }
        };
        if !self.has_restorable_session() {
            return None;
        }

        match client.enable().await {
            Ok(accounts) if !accounts.is_empty() => Some(accounts),
            Ok(_) => {
                let cached = client.accounts();
                if cached.is_empty() {
                    tracing::warn!("restored relay session has no accounts");
                    Self::teardown(client.as_ref()).await;
                    None
                } else {
                    Some(cached)
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "relay session restore failed");
                Self::teardown(client.as_ref()).await;
                None
            }
        }
    }

    /// Close the remote session, if a client exists. Errors are logged only.
    pub async fn disconnect(&self) {
        if let Some(client) = self.client() {
            Self::teardown(client.as_ref()).await;
        }
    }

    async fn teardown(client: &dyn RelayClient) {
        if let Err(err) = client.disconnect().await {
            tracing::warn!(error = %err, "relay disconnect failed");
        }
    }
}
