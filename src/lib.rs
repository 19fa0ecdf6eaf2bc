//! Presale: wallet gate and fixed-price sale ledger for a token presale page.
//!
//! # Architecture
//!
//! ```text
//! Presale (entry point, one per page)
//!   │
//!   ├── ConnectionManager (Disconnected → Connecting → Connected)
//!   │     ├── resolve(host, kind) → injected wallet (MetaMask, Trust Wallet)
//!   │     ├── SessionStore → relay pairing (WalletConnect), memoized init
//!   │     └── NetworkReconciler → switch / register the sale chain
//!   │
//!   ├── SaleLedger (capped supply, fixed price, in-memory commitments)
//!   │
//!   └── Notifier → connection, network, ledger and status notifications
//! ```
//!
//! # Operations
//!
//! | Operation | Method | Description |
//! |-----------|--------|-------------|
//! | connect | `presale.connect(choice)` | Authorize a wallet |
//! | restore | `presale.restore_session()` | Silent relay restore on page load |
//! | disconnect | `presale.disconnect()` | Drop local state and the relay pairing |
//! | switch | `presale.switch_network()` | Move the wallet to the sale chain |
//! | preview | `presale.set_purchase_amount_input(raw)` | Live quote and hint |
//! | buy | `presale.submit_purchase_input(text)` | Commit a simulated purchase |
//!
//! # Features
//!
//! - `native` - tracing-subscriber logging for tests and tooling
//! - `wasm` - browser bindings (`window.ethereum`, relay SDK bridge, `PresaleWidget`)
//!
//! # Usage
//!
//! ```ignore
//! use presale::{Presale, SaleConfig, WalletChoice};
//!
//! let presale = Presale::new(SaleConfig::default(), host, relay)?;
//! let mut updates = presale.watch();
//!
//! presale.restore_session().await;
//! presale.connect(WalletChoice::MetaMask).await?;
//!
//! let preview = presale.set_purchase_amount_input("10");
//! if preview.can_buy {
//!     presale.submit_purchase_input(&preview.input)?;
//! }
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod config;
pub mod core;
pub mod presale;
pub mod wallet;

// =============================================================================
// Native-only modules
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports
// =============================================================================
pub use config::{ConfigError, RelayConfig, SaleConfig, DEFAULT_RELAY_PROJECT_ID};
pub use core::{Amount, ChainSpec, LedgerSnapshot, Notification, Price, SaleLedger, SaleRejection, StatusLine};
pub use presale::{Presale, PurchaseError, PurchasePreview, PurchaseReceipt};
pub use wallet::{
    ConnectOutcome, ConnectionState, InjectedHost, InjectedKind, NetworkStatus, ProviderError, ProviderKind,
    RelayClient, RelayConnector, WalletChoice, WalletError, WalletProvider,
};

#[cfg(feature = "native")]
pub use logging::init_logging;

#[cfg(feature = "wasm")]
pub use wasm::PresaleWidget;
