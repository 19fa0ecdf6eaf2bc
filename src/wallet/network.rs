//! Network Reconciler: keeps the active wallet on the sale chain.

use serde::Serialize;

use super::error::{ProviderError, WalletError};
use super::provider::WalletProvider;
use crate::core::chain::ChainSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NetworkStatus {
    OnTarget,
    Mismatched { actual: u64 },
    /// No wallet, or its chain could not be read yet.
    NotApplicable,
}

impl NetworkStatus {
    pub fn is_on_target(&self) -> bool {
        matches!(self, NetworkStatus::OnTarget)
    }
}

pub struct NetworkReconciler {
    target: ChainSpec,
}

impl NetworkReconciler {
    pub fn new(target: ChainSpec) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &ChainSpec {
        &self.target
    }

    pub async fn check(&self, provider: Option<&dyn WalletProvider>) -> NetworkStatus {
        let Some(provider) = provider else {
            return NetworkStatus::NotApplicable;
        };
        match provider.chain_id().await {
            Ok(actual) if actual == self.target.id() => NetworkStatus::OnTarget,
            Ok(actual) => {
                tracing::info!(actual, expected = self.target.id(), "wallet on wrong network");
                NetworkStatus::Mismatched { actual }
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not read wallet chain id");
                NetworkStatus::NotApplicable
            }
        }
    }

    /// Ask the wallet to switch. An unknown chain is registered once and the
    /// switch retried once; anything else is reported, never assumed.
    pub async fn switch_to_target(&self, provider: Option<&dyn WalletProvider>) -> Result<(), WalletError> {
        let provider = provider.ok_or(WalletError::NotConnected)?;
        let chain_id = self.target.id();

        match provider.switch_chain(chain_id).await {
            Ok(()) => return Ok(()),
            Err(ProviderError::UnrecognizedChain) => {
                tracing::info!(chain = %self.target.hex_id(), "chain unknown to wallet, registering");
            }
            Err(err) => {
                tracing::warn!(error = %err, "network switch failed");
                return Err(self.switch_manually());
            }
        }

        if let Err(err) = provider.add_chain(&self.target).await {
            tracing::warn!(error = %err, "chain registration failed");
            return Err(self.add_manually());
        }
        provider.switch_chain(chain_id).await.map_err(|err| {
            tracing::warn!(error = %err, "switch after registration failed");
            self.add_manually()
        })
    }

    fn switch_manually(&self) -> WalletError {
        WalletError::NetworkMismatch(format!("Please switch to {} in your wallet", self.target.name()))
    }

    fn add_manually(&self) -> WalletError {
        WalletError::NetworkMismatch(format!(
            "Please add/switch to {} manually in your wallet",
            self.target.name()
        ))
    }
}
