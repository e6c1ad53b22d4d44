use std::sync::{Arc, Mutex, PoisonError};

use shared::{
    domain::{Address, ChainId},
    error::ProviderErrorKind,
    protocol::WalletEvent,
};
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    config::{ConfigError, MintRequest, WidgetConfig},
    error::{ControllerError, ErrorContext},
    events::ControllerEvent,
    notifications::NotificationCenter,
    session::{Balance, ConnectionState, Session},
    view::{self, WidgetView},
    MintExecutor, UserPrompt, WalletCapability,
};

const CONNECTED_MESSAGE: &str = "Wallet connected successfully!";
const DISCONNECTED_MESSAGE: &str = "Wallet disconnected";
const ACCOUNT_CHANGED_MESSAGE: &str = "Account changed";
const MINTED_MESSAGE: &str = "NFT minted successfully! Check your wallet.";
const INSTALL_PROMPT: &str =
    "A Web3 wallet is required to mint NFTs. Would you like to install MetaMask?";

struct ControllerState {
    session: Session,
    state: ConnectionState,
}

pub struct ConnectionController {
    config: WidgetConfig,
    mint_request: MintRequest,
    capability: Option<Arc<dyn WalletCapability>>,
    mint_executor: Arc<dyn MintExecutor>,
    prompt: Arc<dyn UserPrompt>,
    inner: Mutex<ControllerState>,
    notifications: NotificationCenter,
    wallet_events_task: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<ControllerEvent>,
}

/// Puts the mint button back to idle when a mint attempt ends, however it ends.
struct MintingGuard<'a> {
    controller: &'a ConnectionController,
}

impl Drop for MintingGuard<'_> {
    fn drop(&mut self) {
        self.controller.finish_minting();
    }
}

impl ConnectionController {
    pub fn new(
        config: WidgetConfig,
        capability: Option<Arc<dyn WalletCapability>>,
        mint_executor: Arc<dyn MintExecutor>,
        prompt: Arc<dyn UserPrompt>,
    ) -> Result<Arc<Self>, ConfigError> {
        let mint_request = config.validate()?;
        let (events, _) = broadcast::channel(256);
        Ok(Arc::new(Self {
            notifications: NotificationCenter::new(config.notification_ttl, events.clone()),
            config,
            mint_request,
            capability,
            mint_executor,
            prompt,
            inner: Mutex::new(ControllerState {
                session: Session::default(),
                state: ConnectionState::Disconnected,
            }),
            wallet_events_task: Mutex::new(None),
            events,
        }))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn mint_request(&self) -> &MintRequest {
        &self.mint_request
    }

    pub fn session(&self) -> Session {
        self.with_state(|inner| inner.session.clone())
    }

    pub fn state(&self) -> ConnectionState {
        self.with_state(|inner| inner.state)
    }

    pub fn view(&self) -> WidgetView {
        let notification = self.notifications.visible();
        self.with_state(|inner| {
            view::render(
                &inner.session,
                inner.state,
                &self.config,
                notification.as_ref(),
            )
        })
    }

    pub async fn initialize(self: &Arc<Self>) -> ConnectionState {
        let Some(capability) = self.capability.clone() else {
            debug!("wallet: no capability injected; starting disconnected");
            self.publish_view();
            return self.state();
        };

        match capability.accounts().await {
            Ok(accounts) => {
                if let Some(address) = accounts.into_iter().next() {
                    info!(address = %address, "wallet: restoring authorized account");
                    self.with_state(|inner| {
                        inner.session.adopt(address);
                        inner.state = ConnectionState::Connecting;
                    });
                    if !self.post_connect(&capability).await {
                        warn!("wallet: restored session was reset during startup");
                    }
                } else {
                    debug!("wallet: no previously authorized accounts");
                }
            }
            Err(err) => {
                warn!(code = err.code, message = %err.message, "wallet: eth_accounts failed during startup");
            }
        }

        self.publish_view();
        self.state()
    }

    pub async fn connect(self: &Arc<Self>) -> Result<(), ControllerError> {
        let Some(capability) = self.capability.clone() else {
            warn!("wallet: connect requested without an injected wallet");
            let err = self.fail(ErrorContext::Connect, ControllerError::CapabilityUnavailable);
            self.prompt_install().await;
            return Err(err);
        };

        let previous = self.with_state(|inner| {
            if inner.state.is_busy() {
                return Err(ControllerError::Busy);
            }
            let previous = inner.state;
            inner.state = ConnectionState::Connecting;
            Ok(previous)
        });
        let previous = match previous {
            Ok(previous) => previous,
            Err(err) => return Err(self.fail(ErrorContext::Connect, err)),
        };
        self.publish_view();

        info!("wallet: requesting account access");
        let accounts = match capability.request_accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                error!(code = err.code, message = %err.message, "wallet: account request failed");
                self.restore_state(previous);
                return Err(self.fail(
                    ErrorContext::Connect,
                    ControllerError::from_provider(ErrorContext::Connect, &err),
                ));
            }
        };

        let Some(address) = accounts.into_iter().next() else {
            warn!("wallet: no accounts granted");
            self.restore_state(previous);
            return Err(self.fail(ErrorContext::Connect, ControllerError::NoAccountGranted));
        };

        info!(address = %address, "wallet: account granted");
        // A wallet event handled while the request was pending may already
        // have reset the session.
        let adopted = self.with_state(|inner| {
            if inner.state != ConnectionState::Connecting {
                return false;
            }
            if inner.session.address.as_ref() != Some(&address) {
                inner.session.balance = Balance::zero();
            }
            inner.session.adopt(address.clone());
            true
        });
        if !adopted || !self.post_connect(&capability).await {
            warn!(address = %address, "wallet: session reset while connecting");
            self.publish_view();
            return Err(ControllerError::ConnectionInterrupted);
        }

        self.notifications.success(CONNECTED_MESSAGE);
        self.publish_view();
        Ok(())
    }

    /// Returns false when a wallet event disconnected or reset the session
    /// while the sequence was running; nothing is subscribed in that case.
    async fn post_connect(self: &Arc<Self>, capability: &Arc<dyn WalletCapability>) -> bool {
        if let Err(err) = self.verify_network().await {
            debug!(%err, "wallet: continuing on unverified network");
        }
        if let Err(err) = self.refresh_balance().await {
            debug!(%err, "wallet: continuing with previous balance");
        }
        let established = self.with_state(|inner| {
            if inner.session.connected && inner.state == ConnectionState::Connecting {
                inner.state = ConnectionState::Connected;
                true
            } else {
                false
            }
        });
        self.publish_view();
        if established {
            self.subscribe_wallet_events(capability);
        }
        established
    }

    /// Checks the wallet is on the target chain and offers to switch (or add
    /// the chain) when it is not. Failures never drop the connection.
    pub async fn verify_network(&self) -> Result<(), ControllerError> {
        let Some(capability) = self.capability.as_ref() else {
            return Err(ControllerError::CapabilityUnavailable);
        };
        let target = &self.config.target_chain;

        let current = match capability.chain_id().await {
            Ok(chain_id) => chain_id,
            Err(err) => {
                error!(code = err.code, message = %err.message, "wallet: eth_chainId failed");
                return Err(ControllerError::CapabilityError(err.message));
            }
        };
        self.record_network(current);

        if current == target.chain_id {
            debug!(chain_id = %current, "wallet: on target chain");
            return Ok(());
        }

        warn!(expected = %target.chain_id, actual = %current, "wallet: wrong chain");
        let question = format!(
            "Please switch to {} to mint NFTs. Switch now?",
            target.chain_name
        );
        if !self.prompt.confirm(&question).await {
            info!("wallet: user declined network switch");
            return Err(ControllerError::WrongNetwork {
                expected: target.chain_id,
                actual: current,
            });
        }

        match capability.switch_chain(target.chain_id).await {
            Ok(()) => {
                info!(chain_id = %target.chain_id, "wallet: switched chain");
                self.record_network(target.chain_id);
                self.notifications
                    .success(format!("Switched to {}!", target.chain_name));
                Ok(())
            }
            Err(err) if err.kind() == ProviderErrorKind::UnrecognizedChain => {
                info!(chain_id = %target.chain_id, "wallet: chain unknown to wallet; adding it");
                match capability.add_chain(target).await {
                    Ok(()) => {
                        match capability.chain_id().await {
                            Ok(chain_id) => self.record_network(chain_id),
                            Err(err) => {
                                warn!(code = err.code, message = %err.message, "wallet: eth_chainId failed after add");
                            }
                        }
                        self.notifications
                            .success(format!("Added {} to your wallet", target.chain_name));
                        Ok(())
                    }
                    Err(err) => {
                        error!(code = err.code, message = %err.message, "wallet: add chain failed");
                        Err(self.fail(
                            ErrorContext::Connect,
                            ControllerError::NetworkSwitchError(format!(
                                "Failed to add {} network: {}",
                                target.chain_name, err.message
                            )),
                        ))
                    }
                }
            }
            Err(err) => {
                error!(code = err.code, message = %err.message, "wallet: switch chain failed");
                Err(self.fail(
                    ErrorContext::Connect,
                    ControllerError::NetworkSwitchError(format!(
                        "Failed to switch network: {}",
                        err.message
                    )),
                ))
            }
        }
    }

    pub async fn refresh_balance(&self) -> Result<Balance, ControllerError> {
        let Some(capability) = self.capability.as_ref() else {
            return Err(ControllerError::CapabilityUnavailable);
        };
        let Some(address) = self.with_state(|inner| inner.session.address.clone()) else {
            return Err(ControllerError::NotConnected);
        };

        match capability.get_balance(&address).await {
            Ok(wei) => {
                let balance = Balance::from_wei(wei);
                let applied = self.with_state(|inner| {
                    if inner.session.address.as_ref() == Some(&address) {
                        inner.session.balance = balance.clone();
                        true
                    } else {
                        false
                    }
                });
                if applied {
                    info!(address = %address, balance = %balance.display, "wallet: balance refreshed");
                    self.publish_view();
                } else {
                    debug!(address = %address, "wallet: discarding balance for replaced account");
                }
                Ok(balance)
            }
            Err(err) => {
                error!(address = %address, code = err.code, message = %err.message, "wallet: balance check failed");
                Err(ControllerError::CapabilityError(err.message))
            }
        }
    }

    pub async fn mint(&self) -> Result<(), ControllerError> {
        let target_chain = self.config.target_chain.chain_id;
        let precheck = self.with_state(|inner| {
            if !inner.session.connected {
                return Err(ControllerError::NotConnected);
            }
            if inner.state.is_busy() {
                return Err(ControllerError::Busy);
            }
            if self.config.require_target_chain {
                if let Some(actual) = inner.session.network.filter(|c| *c != target_chain) {
                    return Err(ControllerError::WrongNetwork {
                        expected: target_chain,
                        actual,
                    });
                }
            }
            if inner.session.effective_wei() < self.mint_request.price_wei {
                return Err(ControllerError::InsufficientBalance {
                    required: self.mint_request.price.clone(),
                    available: inner.session.balance.display.clone(),
                });
            }
            inner.state = ConnectionState::Minting;
            Ok(())
        });
        if let Err(err) = precheck {
            warn!(%err, "mint: rejected before submission");
            return Err(self.fail(ErrorContext::Mint, err));
        }

        let _restore = MintingGuard { controller: self };
        self.publish_view();

        info!(contract = %self.mint_request.contract_address, price = %self.mint_request.price, "mint: started");
        match self.mint_executor.execute(&self.mint_request).await {
            Ok(()) => {
                info!("mint: confirmed");
                self.notifications.success(MINTED_MESSAGE);
                if let Err(err) = self.refresh_balance().await {
                    debug!(%err, "mint: balance refresh after mint failed");
                }
                Ok(())
            }
            Err(err) => {
                error!(code = err.code, message = %err.message, "mint: failed");
                Err(self.fail(
                    ErrorContext::Mint,
                    ControllerError::from_provider(ErrorContext::Mint, &err),
                ))
            }
        }
    }

    pub async fn handle_accounts_changed(&self, accounts: &[Address]) {
        let Some(address) = accounts.first() else {
            self.disconnect();
            return;
        };

        info!(address = %address, "wallet: account changed");
        self.with_state(|inner| {
            if inner.session.address.as_ref() != Some(address) {
                inner.session.balance = Balance::zero();
            }
            inner.session.adopt(address.clone());
            if inner.state == ConnectionState::Disconnected {
                inner.state = ConnectionState::Connected;
            }
        });
        self.notifications.success(ACCOUNT_CHANGED_MESSAGE);
        self.publish_view();

        if let Err(err) = self.refresh_balance().await {
            debug!(%err, "wallet: balance refresh after account change failed");
        }
    }

    /// A chain switch invalidates everything cached about the wallet, so the
    /// whole widget is reset and the host is asked to rebuild it.
    pub fn handle_chain_changed(&self, chain_id: ChainId) {
        info!(chain_id = %chain_id, "wallet: chain changed; reloading");
        self.unsubscribe_wallet_events();
        self.with_state(|inner| {
            inner.session.clear();
            inner.state = ConnectionState::Disconnected;
        });
        self.notifications.clear();
        let _ = self.events.send(ControllerEvent::ReloadRequested);
    }

    fn record_network(&self, chain_id: ChainId) {
        self.with_state(|inner| {
            if inner.session.connected {
                inner.session.network = Some(chain_id);
            }
        });
    }

    /// Undoes `Connecting` after a failed account request, unless a wallet
    /// event already moved the state on.
    fn restore_state(&self, previous: ConnectionState) {
        self.with_state(|inner| {
            if inner.state == ConnectionState::Connecting {
                inner.state = if inner.session.connected {
                    previous
                } else {
                    ConnectionState::Disconnected
                };
            }
        });
    }

    fn disconnect(&self) {
        info!("wallet: disconnected");
        self.unsubscribe_wallet_events();
        self.with_state(|inner| {
            inner.session.clear();
            inner.state = ConnectionState::Disconnected;
        });
        self.notifications.error(DISCONNECTED_MESSAGE);
        self.publish_view();
    }

    fn subscribe_wallet_events(self: &Arc<Self>, capability: &Arc<dyn WalletCapability>) {
        let mut rx = capability.subscribe_events();
        let controller = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            loop {
                let event = match rx.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "wallet: provider events dropped");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                match event {
                    WalletEvent::AccountsChanged(accounts) => {
                        controller.handle_accounts_changed(&accounts).await;
                    }
                    WalletEvent::ChainChanged(chain_id) => {
                        controller.handle_chain_changed(chain_id);
                        break;
                    }
                }
            }
        });

        let previous = self
            .wallet_events_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn unsubscribe_wallet_events(&self) {
        let task = self
            .wallet_events_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }

    async fn prompt_install(&self) {
        if self.prompt.confirm(INSTALL_PROMPT).await {
            info!(url = %self.config.install_url, "wallet: opening install page");
            self.prompt.open_url(&self.config.install_url).await;
        }
    }

    fn finish_minting(&self) {
        self.with_state(|inner| {
            if inner.state == ConnectionState::Minting {
                inner.state = if inner.session.connected {
                    ConnectionState::Connected
                } else {
                    ConnectionState::Disconnected
                };
            }
        });
        self.publish_view();
        let _ = self.events.send(ControllerEvent::MintFinished);
    }

    fn fail(&self, context: ErrorContext, err: ControllerError) -> ControllerError {
        self.notifications.error(err.user_message(context));
        self.publish_view();
        err
    }

    fn publish_view(&self) {
        let _ = self.events.send(ControllerEvent::ViewChanged(self.view()));
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ControllerState) -> R) -> R {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut inner)
    }
}

impl Drop for ConnectionController {
    fn drop(&mut self) {
        self.unsubscribe_wallet_events();
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
