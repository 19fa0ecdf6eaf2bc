//! Wallet module - connection state machine over EIP-1193 style providers
//!
//! Injected browser wallets and relay pairings implement the same
//! [`WalletProvider`] capability. The manager only ever holds one of them.
//!
//! # Architecture
//!
//! ```text
//! ConnectionManager ──────────────▶ Notifier<Notification>
//!     │
//!     ├── resolve(host, kind) ──▶ InjectedHost (window.ethereum)
//!     │
//!     ├── SessionStore ──init once──▶ RelayConnector ──▶ RelayClient
//!     │
//!     └── NetworkReconciler ──switch / add chain──▶ WalletProvider
//! ```
//!
//! # Errors
//!
//! | Kind | Status text |
//! |------|-------------|
//! | `NotDetected` | `MetaMask not detected` |
//! | `UserRejected` | `Connection rejected` |
//! | `OriginBlocked` | `WalletConnect blocked: origin not allowed` |
//! | `NetworkMismatch` | `Please switch to BNB Smart Chain in your wallet` |
//! | `TransientFailure` | `Connection failed: ...` |
//! | `RelayFailure` | `WalletConnect failed. Try Private tab / hard refresh.` |

mod error;
mod manager;
mod network;
mod provider;
mod resolver;
mod session;

pub use error::{codes, ProviderError, WalletError};
pub use manager::{ConnectOutcome, ConnectionManager, ConnectionState};
pub use network::{NetworkReconciler, NetworkStatus};
pub use provider::{
    EventSink, HostProviders, InjectedHost, InjectedKind, ProviderEvent, ProviderFlags, ProviderKind, RelayClient,
    RelayConnector, Subscription, WalletChoice, WalletProvider,
};
pub use resolver::{resolve, Identified};
pub use session::SessionStore;
