//! Thin wrapper over a JS EIP-1193 provider object.

use js_sys::{Array, Function, Object, Promise, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::core::chain::parse_chain_id;
use crate::wallet::{EventSink, ProviderError, ProviderEvent, ProviderFlags, Subscription};

type Listener = Closure<dyn FnMut(JsValue)>;

#[derive(Clone)]
pub(crate) struct Eip1193 {
    inner: JsValue,
}

impl Eip1193 {
    pub fn new(inner: JsValue) -> Self {
        Self { inner }
    }

    pub fn flags(&self) -> ProviderFlags {
        ProviderFlags {
            is_metamask: self.flag("isMetaMask"),
            is_trust: self.flag("isTrust"),
            is_trust_wallet: self.flag("isTrustWallet"),
        }
    }

    fn flag(&self, name: &str) -> bool {
        get_prop(&self.inner, name).map(|v| v.is_truthy()).unwrap_or(false)
    }

    pub fn get(&self, name: &str) -> JsValue {
        get_prop(&self.inner, name).unwrap_or(JsValue::UNDEFINED)
    }

    /// `provider.request({ method, params })`
    pub async fn request(&self, method: &str, params: Option<JsValue>) -> Result<JsValue, ProviderError> {
        let args = Object::new();
        Reflect::set(&args, &JsValue::from_str("method"), &JsValue::from_str(method)).map_err(js_error)?;
        if let Some(params) = params {
            Reflect::set(&args, &JsValue::from_str("params"), &params).map_err(js_error)?;
        }
        self.call_async("request", &[args.into()]).await
    }

    /// Call a method and await the promise it returns. Plain values resolve immediately.
    pub async fn call_async(&self, name: &str, args: &[JsValue]) -> Result<JsValue, ProviderError> {
        let result = self.call_method(name, args)?;
        match result.dyn_into::<Promise>() {
            Ok(promise) => JsFuture::from(promise).await.map_err(js_error),
            Err(value) => Ok(value),
        }
    }

    fn call_method(&self, name: &str, args: &[JsValue]) -> Result<JsValue, ProviderError> {
        let function = get_prop(&self.inner, name)
            .ok()
            .and_then(|v| v.dyn_into::<Function>().ok())
            .ok_or_else(|| ProviderError::Other(format!("provider has no {name}()")))?;
        let args: Array = args.iter().collect();
        function.apply(&self.inner, &args).map_err(js_error)
    }

    /// Register `accountsChanged`, `chainChanged` and `disconnect` listeners.
    /// The returned guard removes them again.
    pub fn subscribe(&self, sink: EventSink) -> Subscription {
        let accounts_sink = sink.clone();
        let chain_sink = sink.clone();
        let listeners: Vec<(&'static str, Listener)> = vec![
            (
                "accountsChanged",
                Closure::new(move |value: JsValue| {
                    accounts_sink.emit(ProviderEvent::AccountsChanged(string_list(&value)));
                }),
            ),
            (
                "chainChanged",
                Closure::new(move |value: JsValue| {
                    if let Some(chain_id) = chain_id_from_js(&value) {
                        chain_sink.emit(ProviderEvent::ChainChanged(chain_id));
                    }
                }),
            ),
            (
                "disconnect",
                Closure::new(move |_: JsValue| {
                    sink.emit(ProviderEvent::Disconnect);
                }),
            ),
        ];

        for (event, listener) in &listeners {
            let args = [JsValue::from_str(event), listener.as_ref().clone()];
            if let Err(err) = self.call_method("on", &args) {
                tracing::warn!(event, error = %err, "could not attach provider listener");
            }
        }

        let provider = self.clone();
        Subscription::new(move || {
            for (event, listener) in &listeners {
                let args = [JsValue::from_str(event), listener.as_ref().clone()];
                if let Err(err) = provider.call_method("removeListener", &args) {
                    tracing::debug!(event, error = %err, "could not detach provider listener");
                }
            }
        })
    }
}

pub(crate) fn get_prop(target: &JsValue, key: &str) -> Result<JsValue, ProviderError> {
    Reflect::get(target, &JsValue::from_str(key)).map_err(js_error)
}

/// Classify a rejected promise by its `code` and `message`.
pub(crate) fn js_error(err: JsValue) -> ProviderError {
    let code = get_prop(&err, "code").ok().and_then(|c| c.as_f64()).map(|c| c as i64);
    let message = get_prop(&err, "message")
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| err.as_string())
        .unwrap_or_else(|| "unknown provider error".to_string());
    ProviderError::from_rpc(code, &message)
}

pub(crate) fn string_list(value: &JsValue) -> Vec<String> {
    if !Array::is_array(value) {
        return Vec::new();
    }
    Array::from(value).iter().filter_map(|item| item.as_string()).collect()
}

pub(crate) fn chain_id_from_js(value: &JsValue) -> Option<u64> {
    if let Some(raw) = value.as_string() {
        return parse_chain_id(&raw);
    }
    value.as_f64().filter(|n| n.is_finite() && *n >= 0.0).map(|n| n as u64)
}
