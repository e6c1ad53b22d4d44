//! Adapter from the raw `request({ method, params })` interface of an injected
//! provider to [`WalletCapability`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{parse_hex_quantity, Address, ChainId},
    error::ProviderError,
    protocol::{ChainDescriptor, WalletEvent, WalletRequest},
};
use tokio::sync::broadcast;
use tracing::debug;

use crate::WalletCapability;

#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    async fn request(&self, request: WalletRequest) -> Result<Value, ProviderError>;
    fn subscribe_events(&self) -> broadcast::Receiver<WalletEvent>;
}

pub struct Eip1193Capability<P: Eip1193Provider + ?Sized> {
    provider: Arc<P>,
}

impl<P: Eip1193Provider + ?Sized> Eip1193Capability<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    async fn call<T: DeserializeOwned>(&self, request: WalletRequest) -> Result<T, ProviderError> {
        let method = request.method();
        let value = self.provider.request(request).await?;
        debug!(method, result = %value, "wallet: provider response");
        serde_json::from_value(value).map_err(|err| {
            ProviderError::internal(format!("malformed {method} response: {err}"))
        })
    }

    async fn call_unit(&self, request: WalletRequest) -> Result<(), ProviderError> {
        let method = request.method();
        let value = self.provider.request(request).await?;
        debug!(method, result = %value, "wallet: provider response");
        Ok(())
    }
}

#[async_trait]
impl<P: Eip1193Provider + ?Sized> WalletCapability for Eip1193Capability<P> {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.call(WalletRequest::RequestAccounts).await
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.call(WalletRequest::Accounts).await
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        self.call(WalletRequest::ChainId).await
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError> {
        self.call_unit(WalletRequest::switch_chain(chain_id)).await
    }

    async fn add_chain(&self, descriptor: &ChainDescriptor) -> Result<(), ProviderError> {
        self.call_unit(WalletRequest::add_chain(descriptor.clone()))
            .await
    }

    async fn get_balance(&self, address: &Address) -> Result<u128, ProviderError> {
        let raw: String = self
            .call(WalletRequest::balance_at_latest(address.clone()))
            .await?;
        parse_hex_quantity(&raw)
            .map_err(|err| ProviderError::internal(format!("malformed eth_getBalance response: {err}")))
    }

    fn subscribe_events(&self) -> broadcast::Receiver<WalletEvent> {
        self.provider.subscribe_events()
    }
}

#[cfg(test)]
#[path = "tests/eip1193_tests.rs"]
mod tests;
