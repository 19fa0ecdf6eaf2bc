//! Sale Configuration - passed in by the page

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::amount::Amount;
use crate::core::chain::ChainSpec;
use crate::core::ledger::Price;

pub const DEFAULT_RELAY_PROJECT_ID: &str = "6cd9185e9e8517c636ebaff85041eaf4";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("price must be positive")]
    NonPositivePrice,
    #[error("minimum purchase {minimum} exceeds total supply {total_supply}")]
    MinimumAboveSupply { minimum: Amount, total_supply: Amount },
    #[error("chain {0} has no RPC URL")]
    MissingRpc(String),
    #[error("relay project id is empty")]
    MissingProjectId,
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Relay SDK init payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelayConfig {
    pub project_id: String,
    pub chains: Vec<u64>,
    /// Chain id (decimal string) to RPC URL.
    pub rpc_map: BTreeMap<String, String>,
    pub show_qr_modal: bool,
}

impl RelayConfig {
    pub fn for_chain(project_id: impl Into<String>, chain: &ChainSpec) -> Self {
        let rpc_map = chain
            .primary_rpc()
            .map(|rpc| BTreeMap::from([(chain.id().to_string(), rpc.to_string())]))
            .unwrap_or_default();
        Self { project_id: project_id.into(), chains: vec![chain.id()], rpc_map, show_qr_modal: true }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::for_chain(DEFAULT_RELAY_PROJECT_ID, &ChainSpec::bsc())
    }
}

/// Sale configuration. The page constructs this, usually from a partial JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaleConfig {
    pub token_symbol: String,
    pub payment_symbol: String,
    pub total_supply: Amount,
    pub price: Price,
    pub minimum: Amount,
    pub chain: ChainSpec,
    pub relay: RelayConfig,
}

impl Default for SaleConfig {
    fn default() -> Self {
        Self {
            token_symbol: "WESEE".into(),
            payment_symbol: "USDT".into(),
            total_supply: Amount::from_whole(50_000),
            price: Price::ONE,
            minimum: Amount::from_whole(1),
            chain: ChainSpec::bsc(),
            relay: RelayConfig::default(),
        }
    }
}

impl SaleConfig {
    pub fn new(token_symbol: impl Into<String>) -> Self {
        Self { token_symbol: token_symbol.into(), ..Default::default() }
    }
    pub fn with_payment_symbol(mut self, s: impl Into<String>) -> Self { self.payment_symbol = s.into(); self }
    pub fn with_total_supply(mut self, supply: Amount) -> Self { self.total_supply = supply; self }
    pub fn with_price(mut self, price: Price) -> Self { self.price = price; self }
    pub fn with_minimum(mut self, minimum: Amount) -> Self { self.minimum = minimum; self }
    pub fn with_relay(mut self, relay: RelayConfig) -> Self { self.relay = relay; self }

    /// Also points the relay at the new chain.
    pub fn with_chain(mut self, chain: ChainSpec) -> Self {
        self.relay = RelayConfig::for_chain(std::mem::take(&mut self.relay.project_id), &chain);
        self.chain = chain;
        self
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.price.is_positive() {
            return Err(ConfigError::NonPositivePrice);
        }
        if self.minimum > self.total_supply {
            return Err(ConfigError::MinimumAboveSupply { minimum: self.minimum, total_supply: self.total_supply });
        }
        if self.chain.primary_rpc().is_none() {
            return Err(ConfigError::MissingRpc(self.chain.chain_name.clone()));
        }
        if self.relay.project_id.trim().is_empty() {
            return Err(ConfigError::MissingProjectId);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_sale() {
        let config = SaleConfig::default();
        assert_eq!(config.token_symbol, "WESEE");
        assert_eq!(config.total_supply, Amount::from_whole(50_000));
        assert_eq!(config.chain.id(), 56);
        assert_eq!(config.relay.chains, vec![56]);
        assert_eq!(config.relay.rpc_map.get("56").map(String::as_str), Some("https://bsc-dataseed.binance.org/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = SaleConfig::from_json(r#"{"tokenSymbol":"ABC","totalSupply":"1000","price":{"numerator":2,"denominator":1}}"#)
            .unwrap();
        assert_eq!(config.token_symbol, "ABC");
        assert_eq!(config.total_supply, Amount::from_whole(1000));
        assert_eq!(config.price, Price { numerator: 2, denominator: 1 });
        assert_eq!(config.payment_symbol, "USDT");
    }

    #[test]
    fn rejects_bad_configs() {
        let zero_price = SaleConfig::default().with_price(Price { numerator: 0, denominator: 1 });
        assert_eq!(zero_price.validate(), Err(ConfigError::NonPositivePrice));

        let high_minimum = SaleConfig::default().with_minimum(Amount::from_whole(60_000));
        assert!(matches!(high_minimum.validate(), Err(ConfigError::MinimumAboveSupply { .. })));

        let mut no_rpc = ChainSpec::bsc();
        no_rpc.rpc_urls.clear();
        assert!(matches!(SaleConfig::default().with_chain(no_rpc).validate(), Err(ConfigError::MissingRpc(_))));
    }

    #[test]
    fn with_chain_retargets_relay() {
        let mut testnet = ChainSpec::bsc();
        testnet.chain_id = 97;
        testnet.rpc_urls = vec!["https://data-seed-prebsc-1-s1.binance.org:8545/".into()];
        let config = SaleConfig::default().with_chain(testnet);
        assert_eq!(config.relay.chains, vec![97]);
        assert_eq!(config.relay.project_id, DEFAULT_RELAY_PROJECT_ID);
        assert!(config.relay.rpc_map.contains_key("97"));
    }
}
