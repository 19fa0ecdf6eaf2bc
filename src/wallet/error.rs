//! Wallet error taxonomy.
//!
//! [`ProviderError`] classifies what a transport reported. [`WalletError`] is
//! what the UI sees; every provider failure is folded into one of its kinds at
//! the boundary where it happened.

use thiserror::Error;

use super::provider::InjectedKind;

/// EIP-1193 / EIP-3326 error codes.
pub mod codes {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const DISCONNECTED: i64 = 4900;
    pub const CHAIN_DISCONNECTED: i64 = 4901;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("request rejected by user")]
    UserRejected,
    #[error("chain is not registered in the wallet")]
    UnrecognizedChain,
    #[error("origin not allowed: {0}")]
    OriginNotAllowed(String),
    #[error("provider disconnected")]
    Disconnected,
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Classify a JSON-RPC style failure by code, then by message text.
    pub fn from_rpc(code: Option<i64>, message: &str) -> Self {
        let lowered = message.to_ascii_lowercase();
        match code {
            Some(codes::USER_REJECTED) => Self::UserRejected,
            Some(codes::UNRECOGNIZED_CHAIN) => Self::UnrecognizedChain,
            _ if lowered.contains("origin") => Self::OriginNotAllowed(message.to_string()),
            Some(codes::DISCONNECTED | codes::CHAIN_DISCONNECTED) => Self::Disconnected,
            _ if lowered.contains("user rejected") => Self::UserRejected,
            Some(code) => Self::Rpc { code, message: message.to_string() },
            None => Self::Other(message.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("{} not detected", .0.label())]
    NotDetected(InjectedKind),
    #[error("Connection rejected")]
    UserRejected,
    #[error("WalletConnect blocked: origin not allowed")]
    OriginBlocked(String),
    #[error("{0}")]
    NetworkMismatch(String),
    #[error("Wallet not connected")]
    NotConnected,
    #[error("Connection failed: {0}")]
    TransientFailure(String),
    /// Relay pairing broke for a reason the page cannot fix; the detail is for logs.
    #[error("WalletConnect failed. Try Private tab / hard refresh.")]
    RelayFailure(String),
}

impl WalletError {
    /// Relay flavour of a failure: transient causes get the relay advice.
    pub fn from_relay(err: ProviderError) -> Self {
        match Self::from(err) {
            Self::TransientFailure(detail) => Self::RelayFailure(detail),
            other => other,
        }
    }
}

impl From<ProviderError> for WalletError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::UserRejected => Self::UserRejected,
            ProviderError::OriginNotAllowed(message) => Self::OriginBlocked(message),
            other => Self::TransientFailure(other.to_string()),
        }
    }
}
