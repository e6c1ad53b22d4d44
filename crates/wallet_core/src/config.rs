use std::time::Duration;

use shared::{domain::Address, protocol::ChainDescriptor};
use thiserror::Error;
use url::Url;

use crate::units::{self, UnitsError};

pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x6F446e3A8159B325a3CBd71e00dE7A067EB1B620";
pub const DEFAULT_MINT_PRICE: &str = "0.01";
pub const DEFAULT_INSTALL_URL: &str = "https://metamask.io/download.html";
pub const DEFAULT_COLLECTION_TITLE: &str = "Base Genesis NFT";
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(5);
pub const DEFAULT_MINT_LATENCY: Duration = Duration::from_secs(2);
pub const DEFAULT_MINT_FAILURE_RATE: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub target_chain: ChainDescriptor,
    pub contract_address: Address,
    pub mint_price: String,
    pub install_url: String,
    pub collection_title: String,
    pub notification_ttl: Duration,
    /// Refuse to mint while the wallet reports a chain other than `target_chain`.
    pub require_target_chain: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            target_chain: ChainDescriptor::base_mainnet(),
            contract_address: Address::from(DEFAULT_CONTRACT_ADDRESS),
            mint_price: DEFAULT_MINT_PRICE.into(),
            install_url: DEFAULT_INSTALL_URL.into(),
            collection_title: DEFAULT_COLLECTION_TITLE.into(),
            notification_ttl: DEFAULT_NOTIFICATION_TTL,
            require_target_chain: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid mint price '{price}': {source}")]
    MintPrice { price: String, source: UnitsError },
    #[error("invalid url '{url}' for {field}")]
    Url { field: &'static str, url: String },
    #[error("target chain needs at least one rpc url")]
    MissingRpcUrl,
    #[error("contract address '{0}' is not a 0x-prefixed hex address")]
    ContractAddress(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    pub price: String,
    pub price_wei: u128,
    pub contract_address: Address,
}

impl WidgetConfig {
    pub fn validate(&self) -> Result<MintRequest, ConfigError> {
        let decimals = self.target_chain.native_currency.decimals;
        let price_wei =
            units::parse_units(&self.mint_price, decimals).map_err(|source| {
                ConfigError::MintPrice {
                    price: self.mint_price.clone(),
                    source,
                }
            })?;

        if self.target_chain.rpc_urls.is_empty() {
            return Err(ConfigError::MissingRpcUrl);
        }
        for url in &self.target_chain.rpc_urls {
            check_url("rpc_urls", url)?;
        }
        for url in &self.target_chain.block_explorer_urls {
            check_url("block_explorer_urls", url)?;
        }
        check_url("install_url", &self.install_url)?;

        if !is_hex_address(self.contract_address.as_str()) {
            return Err(ConfigError::ContractAddress(
                self.contract_address.to_string(),
            ));
        }

        Ok(MintRequest {
            price: self.mint_price.trim().to_string(),
            price_wei,
            contract_address: self.contract_address.clone(),
        })
    }
}

fn check_url(field: &'static str, raw: &str) -> Result<(), ConfigError> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::Url {
            field,
            url: raw.to_string(),
        }),
    }
}

fn is_hex_address(raw: &str) -> bool {
    raw.strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
