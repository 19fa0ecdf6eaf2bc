//! PresaleWidget: the presale exposed to the page via wasm-bindgen

use futures::StreamExt;
use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use super::injected::BrowserHost;
use super::log;
use super::relay::JsRelayConnector;
use crate::config::SaleConfig;
use crate::core::ledger::LedgerSnapshot;
use crate::core::status::short_address;
use crate::presale::Presale;
use crate::wallet::{ConnectionState, NetworkStatus, WalletChoice};

fn to_js<T: Serialize>(value: &T) -> JsValue {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    value.serialize(&serializer).unwrap_or(JsValue::NULL)
}

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WidgetState {
    connection: ConnectionState,
    /// Connect button label, e.g. `0x5290…9EE7`.
    short_address: Option<String>,
    network: NetworkStatus,
    ledger: LedgerSnapshot,
    remaining_display: String,
}

#[wasm_bindgen]
pub struct PresaleWidget {
    presale: Rc<Presale>,
}

#[wasm_bindgen]
impl PresaleWidget {
    /// `config` is a partial sale config object (or `undefined` for the
    /// defaults). `relay_init` is the relay SDK's `init(options)` function.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, relay_init: js_sys::Function) -> Result<PresaleWidget, JsValue> {
        let config: SaleConfig = if config.is_undefined() || config.is_null() {
            SaleConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(js_err)?
        };
        log!("[Presale] {} on chain {}", config.token_symbol, config.chain.id());

        let presale = Rc::new(
            Presale::new(config, Rc::new(BrowserHost), Rc::new(JsRelayConnector::new(relay_init))).map_err(js_err)?,
        );

        let events = presale.clone();
        wasm_bindgen_futures::spawn_local(async move {
            events.run_events().await;
        });

        Ok(Self { presale })
    }

    #[wasm_bindgen]
    pub async fn connect(&self, choice: String) -> Result<JsValue, JsValue> {
        let choice: WalletChoice = choice.parse().map_err(js_err)?;
        let outcome = self.presale.connect(choice).await.map_err(js_err)?;
        Ok(to_js(&outcome))
    }

    #[wasm_bindgen(js_name = "restoreSession")]
    pub async fn restore_session(&self) -> JsValue {
        to_js(&self.presale.restore_session().await)
    }

    #[wasm_bindgen]
    pub async fn disconnect(&self) {
        self.presale.disconnect().await
    }

    #[wasm_bindgen(js_name = "switchNetwork")]
    pub async fn switch_network(&self) -> Result<JsValue, JsValue> {
        let status = self.presale.switch_network().await.map_err(js_err)?;
        Ok(to_js(&status))
    }

    #[wasm_bindgen(js_name = "setPurchaseAmountInput")]
    pub fn set_purchase_amount_input(&self, raw: &str) -> JsValue {
        to_js(&self.presale.set_purchase_amount_input(raw))
    }

    #[wasm_bindgen(js_name = "submitPurchase")]
    pub fn submit_purchase(&self, amount: &str) -> Result<JsValue, JsValue> {
        let receipt = self.presale.submit_purchase_input(amount).map_err(js_err)?;
        Ok(to_js(&receipt))
    }

    /// Input text for the "max" button.
    #[wasm_bindgen(js_name = "maxPurchase")]
    pub fn max_purchase(&self) -> String {
        self.presale.max_purchase().to_string()
    }

    #[wasm_bindgen]
    pub fn state(&self) -> JsValue {
        let connection = self.presale.connection_state();
        to_js(&WidgetState {
            short_address: connection.address().map(short_address),
            connection,
            network: self.presale.network_status(),
            ledger: self.presale.ledger(),
            remaining_display: self.presale.remaining_display(),
        })
    }

    /// Forward every notification to `callback`.
    #[wasm_bindgen]
    pub fn watch(&self, callback: js_sys::Function) {
        let mut rx = self.presale.watch();
        let this = JsValue::NULL;
        wasm_bindgen_futures::spawn_local(async move {
            while let Some(notification) = rx.next().await {
                let _ = callback.call1(&this, &to_js(&notification));
            }
        });
    }
}
