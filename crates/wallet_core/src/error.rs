use shared::{domain::ChainId, error::ProviderError};
use thiserror::Error;

/// Every way a controller operation can fail. All of them are recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("no wallet capability is available")]
    CapabilityUnavailable,
    #[error("wallet granted no accounts")]
    NoAccountGranted,
    #[error("request rejected by user")]
    UserRejected,
    #[error("wallet request failed: {0}")]
    CapabilityError(String),
    #[error("insufficient balance: need {required} ETH, have {available} ETH")]
    InsufficientBalance { required: String, available: String },
    #[error("wallet is not connected")]
    NotConnected,
    #[error("mint failed: {0}")]
    MintError(String),
    #[error("network switch failed: {0}")]
    NetworkSwitchError(String),
    #[error("wallet is on chain {actual}, expected {expected}")]
    WrongNetwork { expected: ChainId, actual: ChainId },
    #[error("another wallet operation is still in progress")]
    Busy,
    #[error("wallet reset the session while connecting")]
    ConnectionInterrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorContext {
    Connect,
    Mint,
}

impl ControllerError {
    pub fn from_provider(context: ErrorContext, err: &ProviderError) -> Self {
        if err.is_user_rejection() {
            return Self::UserRejected;
        }
        match context {
            ErrorContext::Connect => Self::CapabilityError(err.message.clone()),
            ErrorContext::Mint => Self::MintError(err.message.clone()),
        }
    }

    pub fn user_message(&self, context: ErrorContext) -> String {
        match self {
            Self::CapabilityUnavailable => {
                "No Ethereum wallet found. Please install MetaMask or Coinbase Wallet.".to_string()
            }
            Self::NoAccountGranted => "Please connect your wallet.".to_string(),
            Self::UserRejected => match context {
                ErrorContext::Connect => "Please connect your wallet to continue.".to_string(),
                ErrorContext::Mint => "Transaction was cancelled.".to_string(),
            },
            Self::CapabilityError(message) => format!("Failed to connect wallet: {message}"),
            Self::InsufficientBalance { required, .. } => {
                format!("Insufficient balance. You need {required} ETH to mint.")
            }
            Self::NotConnected => "Please connect your wallet first.".to_string(),
            Self::MintError(message) => format!("Minting failed: {message}"),
            Self::NetworkSwitchError(message) => message.clone(),
            Self::WrongNetwork { .. } => {
                "Please switch your wallet to the required network before minting.".to_string()
            }
            Self::Busy => "Please wait for the current wallet request to finish.".to_string(),
            Self::ConnectionInterrupted => {
                "Wallet connection was interrupted. Please try again.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_rejection_is_context_independent() {
        let err = ProviderError::user_rejected("nope");
        assert_eq!(
            ControllerError::from_provider(ErrorContext::Connect, &err),
            ControllerError::UserRejected
        );
        assert_eq!(
            ControllerError::from_provider(ErrorContext::Mint, &err),
            ControllerError::UserRejected
        );
    }

    #[test]
    fn other_provider_errors_keep_their_message() {
        let err = ProviderError::internal("rpc down");
        assert_eq!(
            ControllerError::from_provider(ErrorContext::Connect, &err),
            ControllerError::CapabilityError("rpc down".into())
        );
        assert_eq!(
            ControllerError::from_provider(ErrorContext::Mint, &err),
            ControllerError::MintError("rpc down".into())
        );
    }

    #[test]
    fn rejection_banner_depends_on_operation() {
        assert_eq!(
            ControllerError::UserRejected.user_message(ErrorContext::Mint),
            "Transaction was cancelled."
        );
        assert_eq!(
            ControllerError::UserRejected.user_message(ErrorContext::Connect),
            "Please connect your wallet to continue."
        );
    }
}
