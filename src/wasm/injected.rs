//! Browser extension wallets found on `window.ethereum`.

use async_trait::async_trait;
use js_sys::Array;
use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::JsValue;

use super::eip1193::{chain_id_from_js, get_prop, string_list, Eip1193};
use crate::core::chain::ChainSpec;
use crate::wallet::{
    EventSink, HostProviders, InjectedHost, ProviderError, ProviderFlags, Subscription, WalletProvider,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SwitchChain {
    chain_id: String,
}

pub struct InjectedProvider {
    js: Eip1193,
}

impl InjectedProvider {
    pub fn new(inner: JsValue) -> Self {
        Self { js: Eip1193::new(inner) }
    }
}

#[async_trait(?Send)]
impl WalletProvider for InjectedProvider {
    fn flags(&self) -> ProviderFlags {
        self.js.flags()
    }

    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        let accounts = self.js.request("eth_requestAccounts", None).await?;
        Ok(string_list(&accounts))
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        let raw = self.js.request("eth_chainId", None).await?;
        chain_id_from_js(&raw).ok_or_else(|| ProviderError::Other(format!("unreadable chain id {raw:?}")))
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        let params = serde_wasm_bindgen::to_value(&[SwitchChain { chain_id: format!("{chain_id:#x}") }])
            .map_err(|e| ProviderError::Other(e.to_string()))?;
        self.js.request("wallet_switchEthereumChain", Some(params)).await.map(drop)
    }

    async fn add_chain(&self, chain: &ChainSpec) -> Result<(), ProviderError> {
        let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
        let params = [chain]
            .serialize(&serializer)
            .map_err(|e| ProviderError::Other(e.to_string()))?;
        self.js.request("wallet_addEthereumChain", Some(params)).await.map(drop)
    }

    fn subscribe(&self, sink: EventSink) -> Subscription {
        self.js.subscribe(sink)
    }
}

/// `window.ethereum`, or `window.ethereum.providers` when several extensions
/// share the page.
#[derive(Default)]
pub struct BrowserHost;

impl InjectedHost for BrowserHost {
    fn providers(&self) -> HostProviders<Rc<dyn WalletProvider>> {
        let Some(window) = web_sys::window() else {
            return HostProviders::Absent;
        };
        let ethereum = match get_prop(&window.into(), "ethereum") {
            Ok(value) if !value.is_undefined() && !value.is_null() => value,
            _ => return HostProviders::Absent,
        };

        let list = get_prop(&ethereum, "providers").unwrap_or(JsValue::UNDEFINED);
        if Array::is_array(&list) {
            let providers: Vec<Rc<dyn WalletProvider>> = Array::from(&list)
                .iter()
                .map(|p| Rc::new(InjectedProvider::new(p)) as Rc<dyn WalletProvider>)
                .collect();
            if !providers.is_empty() {
                return HostProviders::Many(providers);
            }
        }
        HostProviders::Single(Rc::new(InjectedProvider::new(ethereum)))
    }
}
