use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The user declined the request in the wallet UI.
pub const USER_REJECTED: i64 = 4001;
/// The requested method/account has not been authorized by the user.
pub const UNAUTHORIZED: i64 = 4100;
/// `wallet_switchEthereumChain` target is not known to the wallet.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;
/// JSON-RPC internal error, also used for undecodable provider results.
pub const INTERNAL: i64 = -32603;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    UserRejected,
    Unauthorized,
    UnrecognizedChain,
    Other,
}

/// Error object rejected by an injected wallet provider (`{ code, message }`).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected(message: impl Into<String>) -> Self {
        Self::new(USER_REJECTED, message)
    }

    pub fn unrecognized_chain(message: impl Into<String>) -> Self {
        Self::new(UNRECOGNIZED_CHAIN, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL, message)
    }

    pub fn kind(&self) -> ProviderErrorKind {
        match self.code {
            USER_REJECTED => ProviderErrorKind::UserRejected,
            UNAUTHORIZED => ProviderErrorKind::Unauthorized,
            UNRECOGNIZED_CHAIN => ProviderErrorKind::UnrecognizedChain,
            _ => ProviderErrorKind::Other,
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.kind() == ProviderErrorKind::UserRejected
    }
}
