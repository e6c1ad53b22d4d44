//! In-process wallet speaking the EIP-1193 request vocabulary, so the widget
//! can be exercised from a terminal without a browser extension.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::{
    domain::{format_hex_quantity, Address, ChainId},
    error::ProviderError,
    protocol::{WalletEvent, WalletRequest},
};
use tokio::sync::{broadcast, Mutex};
use tracing::info;
use wallet_core::eip1193::Eip1193Provider;

#[derive(Debug, Clone)]
pub struct DevWalletOptions {
    pub accounts: Vec<Address>,
    pub pre_authorized: bool,
    pub chain_id: ChainId,
    pub known_chains: Vec<ChainId>,
    pub balance_wei: u128,
    pub reject_connect: bool,
}

struct DevWalletState {
    accounts: Vec<Address>,
    authorized: bool,
    chain_id: ChainId,
    known_chains: HashSet<ChainId>,
    balance_wei: u128,
}

pub struct DevWallet {
    state: Mutex<DevWalletState>,
    reject_connect: bool,
    events: broadcast::Sender<WalletEvent>,
}

impl DevWallet {
    pub fn new(options: DevWalletOptions) -> Self {
        let (events, _) = broadcast::channel(64);
        let mut known_chains: HashSet<ChainId> = options.known_chains.into_iter().collect();
        known_chains.insert(options.chain_id);
        Self {
            state: Mutex::new(DevWalletState {
                accounts: options.accounts,
                authorized: options.pre_authorized,
                chain_id: options.chain_id,
                known_chains,
                balance_wei: options.balance_wei,
            }),
            reject_connect: options.reject_connect,
            events,
        }
    }

    /// Makes `address` the selected account, as if picked in the wallet UI.
    pub async fn select_account(&self, address: Address) {
        let accounts = {
            let mut state = self.state.lock().await;
            state.accounts.retain(|a| a != &address);
            state.accounts.insert(0, address);
            state.authorized.then(|| state.accounts.clone())
        };
        if let Some(accounts) = accounts {
            self.emit(WalletEvent::AccountsChanged(accounts));
        }
    }

    /// Revokes the site's access; the wallet reports no accounts.
    pub async fn revoke(&self) {
        self.state.lock().await.authorized = false;
        self.emit(WalletEvent::AccountsChanged(Vec::new()));
    }

    /// Switches chains from the wallet side.
    pub async fn switch_externally(&self, chain_id: ChainId) {
        {
            let mut state = self.state.lock().await;
            state.known_chains.insert(chain_id);
            state.chain_id = chain_id;
        }
        self.emit(WalletEvent::ChainChanged(chain_id));
    }

    pub async fn set_balance(&self, wei: u128) {
        self.state.lock().await.balance_wei = wei;
    }

    fn emit(&self, event: WalletEvent) {
        info!(?event, "dev wallet: emitting event");
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl Eip1193Provider for DevWallet {
    async fn request(&self, request: WalletRequest) -> Result<Value, ProviderError> {
        info!(method = request.method(), "dev wallet: request");
        match request {
            WalletRequest::RequestAccounts => {
                if self.reject_connect {
                    return Err(ProviderError::user_rejected("User rejected the request."));
                }
                let mut state = self.state.lock().await;
                state.authorized = true;
                Ok(json!(state.accounts))
            }
            WalletRequest::Accounts => {
                let state = self.state.lock().await;
                if state.authorized {
                    Ok(json!(state.accounts))
                } else {
                    Ok(json!([]))
                }
            }
            WalletRequest::ChainId => {
                let state = self.state.lock().await;
                Ok(json!(state.chain_id))
            }
            WalletRequest::SwitchChain([parameter]) => {
                {
                    let mut state = self.state.lock().await;
                    if !state.known_chains.contains(&parameter.chain_id) {
                        return Err(ProviderError::unrecognized_chain(format!(
                            "Unrecognized chain ID \"{}\". Try adding the chain using wallet_addEthereumChain first.",
                            parameter.chain_id
                        )));
                    }
                    state.chain_id = parameter.chain_id;
                }
                self.emit(WalletEvent::ChainChanged(parameter.chain_id));
                Ok(Value::Null)
            }
            WalletRequest::AddChain([descriptor]) => {
                {
                    let mut state = self.state.lock().await;
                    state.known_chains.insert(descriptor.chain_id);
                    state.chain_id = descriptor.chain_id;
                }
                info!(chain = %descriptor.chain_name, "dev wallet: chain added");
                self.emit(WalletEvent::ChainChanged(descriptor.chain_id));
                Ok(Value::Null)
            }
            WalletRequest::GetBalance(address, _block) => {
                let state = self.state.lock().await;
                let wei = if state.accounts.contains(&address) {
                    state.balance_wei
                } else {
                    0
                };
                Ok(json!(format_hex_quantity(wei)))
            }
        }
    }

    fn subscribe_events(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wallet_core::{eip1193::Eip1193Capability, WalletCapability};

    use super::*;

    fn options() -> DevWalletOptions {
        DevWalletOptions {
            accounts: vec![Address::from("0xaaa")],
            pre_authorized: false,
            chain_id: ChainId(1),
            known_chains: Vec::new(),
            balance_wei: 42,
            reject_connect: false,
        }
    }

    #[tokio::test]
    async fn accounts_are_hidden_until_authorized() {
        let capability = Eip1193Capability::new(Arc::new(DevWallet::new(options())));
        assert!(capability.accounts().await.expect("accounts").is_empty());
        assert_eq!(
            capability.request_accounts().await.expect("grant"),
            vec![Address::from("0xaaa")]
        );
        assert_eq!(
            capability.accounts().await.expect("accounts"),
            vec![Address::from("0xaaa")]
        );
        assert_eq!(
            capability
                .get_balance(&Address::from("0xaaa"))
                .await
                .expect("balance"),
            42
        );
    }

    #[tokio::test]
    async fn unknown_chain_must_be_added_before_switching() {
        let wallet = Arc::new(DevWallet::new(options()));
        let capability = Eip1193Capability::new(wallet.clone());
        let mut events = capability.subscribe_events();

        let err = capability
            .switch_chain(ChainId(0x2105))
            .await
            .expect_err("unknown chain");
        assert_eq!(err.code, shared::error::UNRECOGNIZED_CHAIN);

        capability
            .add_chain(&shared::protocol::ChainDescriptor::base_mainnet())
            .await
            .expect("add chain");
        assert_eq!(capability.chain_id().await.expect("chain"), ChainId(0x2105));
        assert_eq!(
            events.recv().await.expect("event"),
            WalletEvent::ChainChanged(ChainId(0x2105))
        );
    }

    #[tokio::test]
    async fn rejecting_wallet_returns_user_rejection() {
        let wallet = DevWallet::new(DevWalletOptions {
            reject_connect: true,
            ..options()
        });
        let err = wallet
            .request(WalletRequest::RequestAccounts)
            .await
            .expect_err("rejected");
        assert!(err.is_user_rejection());
    }
}
