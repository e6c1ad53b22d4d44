//! Wires the controller to the dev wallet, the simulated mint and the
//! terminal, and rebuilds everything when a chain change asks for a reload.

use std::{ops::ControlFlow, sync::Arc};

use anyhow::Context;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use wallet_core::{
    eip1193::Eip1193Capability,
    mint::SimulatedMintExecutor,
    notifications::NotificationKind,
    ConnectionController, ControllerEvent, MintExecutor, UserPrompt, WalletCapability, WidgetView,
};

use crate::{
    commands::{WidgetCommand, HELP},
    config::Settings,
    dev_wallet::DevWallet,
};

pub struct WidgetHost {
    settings: Settings,
    wallet: Option<Arc<DevWallet>>,
    prompt: Arc<dyn UserPrompt>,
    mint_executor: Arc<dyn MintExecutor>,
    reload_tx: mpsc::UnboundedSender<()>,
    controller: Arc<ConnectionController>,
    printer: JoinHandle<()>,
}

impl WidgetHost {
    /// Builds the controller, starts printing its events and runs the
    /// page-load initialization. Reload requests are signalled on `reload_tx`.
    pub async fn start(
        settings: Settings,
        wallet: Option<Arc<DevWallet>>,
        prompt: Arc<dyn UserPrompt>,
        reload_tx: mpsc::UnboundedSender<()>,
    ) -> anyhow::Result<Self> {
        let mint_executor: Arc<dyn MintExecutor> = Arc::new(SimulatedMintExecutor::new(
            settings.mint_latency,
            settings.mint_failure_rate,
        ));
        let controller = build_controller(&settings, wallet.as_ref(), &prompt, &mint_executor)?;
        let printer = spawn_printer(controller.subscribe_events(), reload_tx.clone());

        let host = Self {
            settings,
            wallet,
            prompt,
            mint_executor,
            reload_tx,
            controller,
            printer,
        };
        host.initialize().await;
        Ok(host)
    }

    /// Tears down the current controller and starts over with a fresh one,
    /// as a page reload would.
    pub async fn reload(&mut self) -> anyhow::Result<()> {
        info!("widget: reloading after chain change");
        self.printer.abort();
        self.controller = build_controller(
            &self.settings,
            self.wallet.as_ref(),
            &self.prompt,
            &self.mint_executor,
        )?;
        self.printer = spawn_printer(self.controller.subscribe_events(), self.reload_tx.clone());
        self.initialize().await;
        Ok(())
    }

    async fn initialize(&self) {
        let state = self.controller.initialize().await;
        debug!(?state, "widget: initialized");
        println!("{}", describe_view(&self.controller.view()));
    }

    pub async fn dispatch(&self, command: WidgetCommand) -> ControlFlow<()> {
        debug!(?command, "widget: dispatching command");
        match command {
            WidgetCommand::Connect => {
                if let Err(err) = self.controller.connect().await {
                    warn!(%err, "widget: connect failed");
                }
            }
            WidgetCommand::Mint => {
                if let Err(err) = self.controller.mint().await {
                    warn!(%err, "widget: mint failed");
                }
            }
            WidgetCommand::Balance => match self.controller.refresh_balance().await {
                Ok(balance) => println!("balance: {} ETH", balance.display),
                Err(err) => println!("balance unavailable: {err}"),
            },
            WidgetCommand::Status => {
                let session = self.controller.session();
                println!(
                    "state: {:?} | connected: {} | address: {} | balance: {} ETH | network: {}",
                    self.controller.state(),
                    session.connected,
                    session
                        .address
                        .as_ref()
                        .map(|a| a.as_str())
                        .unwrap_or("-"),
                    session.balance.display,
                    session
                        .network
                        .map_or_else(|| "-".to_string(), |chain| chain.to_string()),
                );
                println!("{}", describe_view(&self.controller.view()));
            }
            WidgetCommand::Account(address) => match &self.wallet {
                Some(wallet) => wallet.select_account(address).await,
                None => println!("no wallet injected"),
            },
            WidgetCommand::Revoke => match &self.wallet {
                Some(wallet) => wallet.revoke().await,
                None => println!("no wallet injected"),
            },
            WidgetCommand::Chain(chain_id) => match &self.wallet {
                Some(wallet) => wallet.switch_externally(chain_id).await,
                None => println!("no wallet injected"),
            },
            WidgetCommand::Fund(wei) => match &self.wallet {
                Some(wallet) => wallet.set_balance(wei).await,
                None => println!("no wallet injected"),
            },
            WidgetCommand::Help => println!("{HELP}"),
            WidgetCommand::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }
}

impl Drop for WidgetHost {
    fn drop(&mut self) {
        self.printer.abort();
    }
}

fn build_controller(
    settings: &Settings,
    wallet: Option<&Arc<DevWallet>>,
    prompt: &Arc<dyn UserPrompt>,
    mint_executor: &Arc<dyn MintExecutor>,
) -> anyhow::Result<Arc<ConnectionController>> {
    let capability = wallet.map(|wallet| {
        Arc::new(Eip1193Capability::new(Arc::clone(wallet))) as Arc<dyn WalletCapability>
    });
    ConnectionController::new(
        settings.widget.clone(),
        capability,
        Arc::clone(mint_executor),
        Arc::clone(prompt),
    )
    .context("failed to build connection controller")
}

/// Prints views and banners as they change; forwards reload requests to the
/// main loop.
fn spawn_printer(
    mut events: broadcast::Receiver<ControllerEvent>,
    reload_tx: mpsc::UnboundedSender<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_view: Option<WidgetView> = None;
        loop {
            match events.recv().await {
                Ok(ControllerEvent::ViewChanged(mut view)) => {
                    view.notification = None;
                    if last_view.as_ref() != Some(&view) {
                        println!("{}", describe_view(&view));
                        last_view = Some(view);
                    }
                }
                Ok(ControllerEvent::Notification(notification)) => {
                    let tag = match notification.kind {
                        NotificationKind::Success => "success",
                        NotificationKind::Error => "error",
                    };
                    println!("[{tag}] {}", notification.message);
                }
                Ok(ControllerEvent::NotificationDismissed(id)) => {
                    debug!(%id, "widget: notification dismissed");
                }
                Ok(ControllerEvent::MintFinished) => {
                    debug!("widget: mint finished");
                }
                Ok(ControllerEvent::ReloadRequested) => {
                    let _ = reload_tx.send(());
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "widget: dropped controller events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

pub fn describe_view(view: &WidgetView) -> String {
    let connect = &view.connect_button;
    format!(
        "{} | [{}{}]{} | [{}{}]",
        view.title,
        connect.button.label,
        if connect.button.enabled { "" } else { " (disabled)" },
        if connect.connected { " connected" } else { "" },
        view.mint_button.label,
        if view.mint_button.enabled { "" } else { " (disabled)" },
    )
}

#[cfg(test)]
mod tests {
    use wallet_core::{
        config::WidgetConfig,
        session::{ConnectionState, Session},
        view,
    };

    use super::*;

    #[test]
    fn describes_disconnected_widget() {
        let config = WidgetConfig::default();
        let view = view::render(
            &Session::default(),
            ConnectionState::Disconnected,
            &config,
            None,
        );
        assert_eq!(
            describe_view(&view),
            "Base Genesis NFT | Foundation Collection | [Connect Wallet] | [Connect Wallet to Mint (disabled)]"
        );
    }
}
