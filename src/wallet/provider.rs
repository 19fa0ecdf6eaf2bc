//! Provider capability shared by injected wallets and relay sessions.
//!
//! The manager only talks to [`WalletProvider`]. Browser extensions and relay
//! pairings are two implementations of it; the relay side adds the pairing
//! lifecycle through [`RelayClient`].

use async_trait::async_trait;
use futures::channel::mpsc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use super::error::ProviderError;
use crate::config::RelayConfig;
use crate::core::chain::ChainSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InjectedKind {
    #[serde(rename = "metamask")]
    MetaMask,
    #[serde(rename = "trust")]
    Trust,
}

impl InjectedKind {
    pub fn label(&self) -> &'static str {
        match self {
            InjectedKind::MetaMask => "MetaMask",
            InjectedKind::Trust => "Trust Wallet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "wallet", rename_all = "snake_case")]
pub enum ProviderKind {
    Injected(InjectedKind),
    Relay,
}

/// What the visitor picked in the wallet modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletChoice {
    #[serde(rename = "metamask")]
    MetaMask,
    #[serde(rename = "trust")]
    Trust,
    #[serde(rename = "walletconnect")]
    WalletConnect,
}

impl WalletChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletChoice::MetaMask => "metamask",
            WalletChoice::Trust => "trust",
            WalletChoice::WalletConnect => "walletconnect",
        }
    }
}

impl FromStr for WalletChoice {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "metamask" => Ok(WalletChoice::MetaMask),
            "trust" | "trustwallet" => Ok(WalletChoice::Trust),
            "walletconnect" | "relay" => Ok(WalletChoice::WalletConnect),
            other => Err(format!("unknown wallet choice: {other}")),
        }
    }
}

impl fmt::Display for WalletChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Self-reported identity flags of an injected provider object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderFlags {
    pub is_metamask: bool,
    pub is_trust: bool,
    pub is_trust_wallet: bool,
}

impl ProviderFlags {
    pub fn matches(&self, kind: InjectedKind) -> bool {
        match kind {
            InjectedKind::MetaMask => self.is_metamask,
            InjectedKind::Trust => self.is_trust || self.is_trust_wallet,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(u64),
    Disconnect,
}

#[derive(Debug, Clone)]
pub(crate) struct TaggedEvent {
    pub epoch: u64,
    pub event: ProviderEvent,
}

/// Where a provider delivers its events. Each sink is stamped with the
/// subscription it belongs to, so events from a released provider can be
/// told apart from the live one.
#[derive(Debug, Clone)]
pub struct EventSink {
    epoch: u64,
    tx: mpsc::UnboundedSender<TaggedEvent>,
}

impl EventSink {
    pub(crate) fn new(epoch: u64, tx: mpsc::UnboundedSender<TaggedEvent>) -> Self {
        Self { epoch, tx }
    }

    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.tx.unbounded_send(TaggedEvent { epoch: self.epoch, event });
    }
}

/// Listener registration on one provider. Dropping it detaches the listeners.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self { detach: Some(Box::new(detach)) }
    }

    /// For providers that never emit.
    pub fn none() -> Self {
        Self { detach: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("attached", &self.detach.is_some()).finish()
    }
}

#[async_trait(?Send)]
pub trait WalletProvider {
    fn flags(&self) -> ProviderFlags {
        ProviderFlags::default()
    }

    /// Interactive account authorization (`eth_requestAccounts`).
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;

    async fn chain_id(&self) -> Result<u64, ProviderError>;

    /// `wallet_switchEthereumChain`
    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError>;

    /// `wallet_addEthereumChain`
    async fn add_chain(&self, chain: &ChainSpec) -> Result<(), ProviderError>;

    /// Attach `accountsChanged`, `chainChanged` and `disconnect` listeners.
    fn subscribe(&self, sink: EventSink) -> Subscription;
}

/// A relay pairing client (WalletConnect style).
#[async_trait(?Send)]
pub trait RelayClient {
    /// A live pairing session exists.
    fn has_session(&self) -> bool;

    /// Accounts cached by the client, possibly from a previous visit.
    fn accounts(&self) -> Vec<String>;

    /// Open a fresh interactive pairing.
    async fn connect(&self) -> Result<(), ProviderError>;

    /// Re-activate the existing session without prompting.
    async fn enable(&self) -> Result<Vec<String>, ProviderError>;

    async fn disconnect(&self) -> Result<(), ProviderError>;

    fn provider(self: Rc<Self>) -> Rc<dyn WalletProvider>;
}

/// Builds relay clients. Called at most once per successful init.
#[async_trait(?Send)]
pub trait RelayConnector {
    async fn init(&self, config: &RelayConfig) -> Result<Rc<dyn RelayClient>, ProviderError>;
}

/// Providers the host page exposes.
#[derive(Clone)]
pub enum HostProviders<P> {
    Absent,
    Single(P),
    Many(Vec<P>),
}

pub trait InjectedHost {
    fn providers(&self) -> HostProviders<Rc<dyn WalletProvider>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trust_matches_either_flag() {
        let legacy = ProviderFlags { is_trust: true, ..Default::default() };
        let current = ProviderFlags { is_trust_wallet: true, ..Default::default() };
        assert!(legacy.matches(InjectedKind::Trust));
        assert!(current.matches(InjectedKind::Trust));
        assert!(!current.matches(InjectedKind::MetaMask));
    }

    #[test]
    fn parses_choices() {
        assert_eq!("MetaMask".parse::<WalletChoice>(), Ok(WalletChoice::MetaMask));
        assert_eq!("walletconnect".parse::<WalletChoice>(), Ok(WalletChoice::WalletConnect));
        assert!("coinbase".parse::<WalletChoice>().is_err());
    }

    #[test]
    fn subscription_detaches_once() {
        use std::cell::Cell;
        let detached = Rc::new(Cell::new(0));
        let counter = detached.clone();
        let sub = Subscription::new(move || counter.set(counter.get() + 1));
        drop(sub);
        assert_eq!(detached.get(), 1);
    }
}
