use async_trait::async_trait;
use shared::{
    domain::{Address, ChainId},
    error::ProviderError,
    protocol::{ChainDescriptor, WalletEvent},
};
use tokio::sync::broadcast;

pub mod config;
mod controller;
pub mod eip1193;
pub mod error;
pub mod events;
pub mod mint;
pub mod notifications;
pub mod session;
pub mod units;
pub mod view;

pub use config::{MintRequest, WidgetConfig};
pub use controller::ConnectionController;
pub use error::ControllerError;
pub use events::ControllerEvent;
pub use session::{Balance, ConnectionState, Session};
pub use view::WidgetView;

#[async_trait]
pub trait WalletCapability: Send + Sync {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;
    async fn chain_id(&self) -> Result<ChainId, ProviderError>;
    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError>;
    async fn add_chain(&self, descriptor: &ChainDescriptor) -> Result<(), ProviderError>;
    async fn get_balance(&self, address: &Address) -> Result<u128, ProviderError>;
    fn subscribe_events(&self) -> broadcast::Receiver<WalletEvent>;
}

#[async_trait]
pub trait MintExecutor: Send + Sync {
    async fn execute(&self, request: &MintRequest) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait UserPrompt: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
    async fn open_url(&self, url: &str);
}

pub struct FixedPrompt {
    pub answer: bool,
}

#[async_trait]
impl UserPrompt for FixedPrompt {
    async fn confirm(&self, message: &str) -> bool {
        tracing::debug!(message, answer = self.answer, "prompt: fixed answer");
        self.answer
    }

    async fn open_url(&self, url: &str) {
        tracing::info!(url, "prompt: open url");
    }
}
