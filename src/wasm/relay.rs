//! Relay pairing through the page's WalletConnect `EthereumProvider`.
//!
//! The page hands in the SDK's `init(config)` function; everything after that
//! is the same EIP-1193 surface an injected wallet has, plus the pairing
//! lifecycle.

use async_trait::async_trait;
use js_sys::{Function, Promise};
use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use super::eip1193::{js_error, string_list, Eip1193};
use super::injected::InjectedProvider;
use crate::config::RelayConfig;
use crate::core::chain::ChainSpec;
use crate::wallet::{EventSink, ProviderError, RelayClient, RelayConnector, Subscription, WalletProvider};

pub struct JsRelayConnector {
    init: Function,
}

impl JsRelayConnector {
    pub fn new(init: Function) -> Self {
        Self { init }
    }
}

#[async_trait(?Send)]
impl RelayConnector for JsRelayConnector {
    async fn init(&self, config: &RelayConfig) -> Result<Rc<dyn RelayClient>, ProviderError> {
        let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
        let options = config.serialize(&serializer).map_err(|e| ProviderError::Other(e.to_string()))?;

        let result = self.init.call1(&JsValue::NULL, &options).map_err(js_error)?;
        let provider = match result.dyn_into::<Promise>() {
            Ok(promise) => JsFuture::from(promise).await.map_err(js_error)?,
            Err(value) => value,
        };
        if provider.is_undefined() || provider.is_null() {
            return Err(ProviderError::Other("relay init returned no provider".into()));
        }
        Ok(Rc::new(JsRelayClient::new(provider)))
    }
}

pub struct JsRelayClient {
    js: Eip1193,
    requests: InjectedProvider,
}

impl JsRelayClient {
    fn new(inner: JsValue) -> Self {
        Self { js: Eip1193::new(inner.clone()), requests: InjectedProvider::new(inner) }
    }
}

#[async_trait(?Send)]
impl RelayClient for JsRelayClient {
    fn has_session(&self) -> bool {
        self.js.get("session").is_truthy()
    }

    fn accounts(&self) -> Vec<String> {
        string_list(&self.js.get("accounts"))
    }

    async fn connect(&self) -> Result<(), ProviderError> {
        self.js.call_async("connect", &[]).await.map(drop)
    }

    async fn enable(&self) -> Result<Vec<String>, ProviderError> {
        let accounts = self.js.call_async("enable", &[]).await?;
        Ok(string_list(&accounts))
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.js.call_async("disconnect", &[]).await.map(drop)
    }

    fn provider(self: Rc<Self>) -> Rc<dyn WalletProvider> {
        self
    }
}

#[async_trait(?Send)]
impl WalletProvider for JsRelayClient {
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.requests.request_accounts().await
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.requests.chain_id().await
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.requests.switch_chain(chain_id).await
    }

    async fn add_chain(&self, chain: &ChainSpec) -> Result<(), ProviderError> {
        self.requests.add_chain(chain).await
    }

    fn subscribe(&self, sink: EventSink) -> Subscription {
        self.js.subscribe(sink)
    }
}
