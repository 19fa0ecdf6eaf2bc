//! WASM module: browser bindings for the presale widget
//!
//! Architecture:
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        PresaleWidget (JS API)           │
//! │  connect, disconnect, switchNetwork,    │
//! │  setPurchaseAmountInput, submitPurchase │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │              Presale                    │
//! └───────┬─────────────────────┬───────────┘
//!         │                     │
//! ┌───────▼─────────┐  ┌────────▼──────────┐
//! │  BrowserHost    │  │ JsRelayConnector  │
//! │ window.ethereum │  │ EthereumProvider  │
//! └─────────────────┘  └───────────────────┘
//! ```

mod eip1193;
mod injected;
mod relay;
mod widget;

pub use injected::{BrowserHost, InjectedProvider};
pub use relay::{JsRelayClient, JsRelayConnector};
pub use widget::PresaleWidget;

use wasm_bindgen::prelude::*;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Log to browser console
pub fn console_log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

macro_rules! log {
    ($($t:tt)*) => {
        crate::wasm::console_log(&format!($($t)*))
    }
}

pub(crate) use log;
