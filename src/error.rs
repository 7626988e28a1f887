use thiserror::Error;

use crate::wallet::provider::ProviderError;

pub type WalletResult<T> = std::result::Result<T, WalletError>;

/// Failures surfaced by the wallet connection manager. None of them are fatal:
/// the manager stays usable after any of these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("No browser wallet provider found. Please install a wallet extension to continue.")]
    ProviderUnavailable,

    #[error("No accounts found. Please connect your wallet.")]
    NoAccounts,

    #[error("Wallet not connected")]
    NotConnected,

    #[error("Unsupported network: chain {0} is not in the network registry")]
    UnsupportedNetwork(u64),

    #[error("Network switch failed: {0}")]
    SwitchFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Transaction {hash} was abandoned when the wallet disconnected")]
    TransactionAbandoned { hash: String },

    #[error("Wallet provider error: {0}")]
    Provider(#[from] ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        assert_eq!(WalletError::NotConnected.to_string(), "Wallet not connected");
        assert_eq!(
            WalletError::UnsupportedNetwork(99999).to_string(),
            "Unsupported network: chain 99999 is not in the network registry"
        );
        assert_eq!(
            WalletError::SwitchFailed("rejected".into()).to_string(),
            "Network switch failed: rejected"
        );
    }

    #[test]
    fn provider_errors_convert() {
        let err: WalletError = ProviderError::UserRejected("closed popup".into()).into();
        assert!(matches!(err, WalletError::Provider(ProviderError::UserRejected(_))));
    }
}
