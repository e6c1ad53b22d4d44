//! Pure projection of controller state onto the widget's visible controls.

use crate::{
    config::WidgetConfig,
    notifications::Notification,
    session::{ConnectionState, Session},
};

pub const CONNECT_LABEL: &str = "Connect Wallet";
pub const CONNECTING_LABEL: &str = "Connecting...";
pub const MINT_DISCONNECTED_LABEL: &str = "Connect Wallet to Mint";
pub const MINT_PENDING_LABEL: &str = "Confirm in Wallet...";
const IDLE_TITLE_SUFFIX: &str = "Foundation Collection";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectButtonView {
    pub button: ButtonView,
    /// Rendered in the "connected" style (green, check mark).
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetView {
    pub connect_button: ConnectButtonView,
    pub mint_button: ButtonView,
    pub title: String,
    pub notification: Option<Notification>,
}

pub fn mint_idle_label(config: &WidgetConfig) -> String {
    format!(
        "Mint NFT ({} {})",
        config.mint_price.trim(),
        config.target_chain.native_currency.symbol
    )
}

pub fn render(
    session: &Session,
    state: ConnectionState,
    config: &WidgetConfig,
    notification: Option<&Notification>,
) -> WidgetView {
    let short_address = session
        .address
        .as_ref()
        .filter(|_| session.connected)
        .map(|address| address.short_form());

    let connect_button = match (&short_address, state) {
        (_, ConnectionState::Connecting) => ConnectButtonView {
            button: ButtonView {
                label: CONNECTING_LABEL.into(),
                enabled: false,
            },
            connected: false,
        },
        (Some(short), _) => ConnectButtonView {
            button: ButtonView {
                label: short.clone(),
                enabled: true,
            },
            connected: true,
        },
        (None, _) => ConnectButtonView {
            button: ButtonView {
                label: CONNECT_LABEL.into(),
                enabled: true,
            },
            connected: false,
        },
    };

    let mint_button = match state {
        ConnectionState::Minting => ButtonView {
            label: MINT_PENDING_LABEL.into(),
            enabled: false,
        },
        ConnectionState::Connected if session.connected => ButtonView {
            label: mint_idle_label(config),
            enabled: true,
        },
        _ => ButtonView {
            label: MINT_DISCONNECTED_LABEL.into(),
            enabled: false,
        },
    };

    let title = match &short_address {
        Some(short) => format!("{} | {short}", config.collection_title),
        None => format!("{} | {IDLE_TITLE_SUFFIX}", config.collection_title),
    };

    WidgetView {
        connect_button,
        mint_button,
        title,
        notification: notification.cloned(),
    }
}
