//! Status bar and sale hint texts shown by the page.

use serde::Serialize;

use crate::wallet::{NetworkStatus, WalletError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    Disconnected,
    Connected,
    WrongNetwork,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub state: StatusState,
    pub message: String,
}

impl StatusLine {
    pub fn new(state: StatusState, message: impl Into<String>) -> Self {
        Self { state, message: message.into() }
    }

    pub fn idle() -> Self {
        Self::new(StatusState::Disconnected, "Connect your wallet")
    }

    /// `None` while the network cannot be validated yet.
    pub fn for_network(status: NetworkStatus, chain_name: &str) -> Option<Self> {
        match status {
            NetworkStatus::OnTarget => Some(Self::new(StatusState::Connected, "Wallet connected ✅")),
            NetworkStatus::Mismatched { .. } => Some(Self::new(
                StatusState::WrongNetwork,
                format!("Please switch to {chain_name}"),
            )),
            NetworkStatus::NotApplicable => None,
        }
    }

    pub fn for_error(err: &WalletError) -> Self {
        let state = match err {
            WalletError::NetworkMismatch(_) => StatusState::WrongNetwork,
            _ => StatusState::Disconnected,
        };
        Self::new(state, err.to_string())
    }
}

/// Tone of the inline hint under the amount input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Good,
    Bad,
}

/// `0x1234…abcd`
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
