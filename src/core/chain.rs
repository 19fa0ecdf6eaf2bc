//! Required network identity.
//!
//! `ChainSpec` serializes to exactly the object `wallet_addEthereumChain`
//! expects, so the reconciler can hand it to a wallet unchanged.

use serde::{Deserialize, Serialize};

pub const BSC_CHAIN_ID: u64 = 56;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSpec {
    #[serde(with = "chain_id_hex")]
    pub chain_id: u64,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl ChainSpec {
    /// BNB Smart Chain mainnet.
    pub fn bsc() -> Self {
        Self {
            chain_id: BSC_CHAIN_ID,
            chain_name: "BNB Smart Chain".into(),
            native_currency: NativeCurrency {
                name: "BNB".into(),
                symbol: "BNB".into(),
                decimals: 18,
            },
            rpc_urls: vec!["https://bsc-dataseed.binance.org/".into()],
            block_explorer_urls: vec!["https://bscscan.com".into()],
        }
    }

    pub fn id(&self) -> u64 {
        self.chain_id
    }

    /// `0x`-prefixed lowercase hex, the form wallets use on the wire.
    pub fn hex_id(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    pub fn name(&self) -> &str {
        &self.chain_name
    }

    pub fn primary_rpc(&self) -> Option<&str> {
        self.rpc_urls.first().map(String::as_str)
    }
}

impl Default for ChainSpec {
    fn default() -> Self {
        Self::bsc()
    }
}

/// Accepts `"0x38"`, `"0X38"` and `"56"`.
pub fn parse_chain_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

mod chain_id_hex {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:#x}", id))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(id) => Ok(id),
            Raw::Text(text) => super::parse_chain_id(&text)
                .ok_or_else(|| D::Error::custom(format!("invalid chain id: {text}"))),
        }
    }
}
