//! Error types shared by the key store, the network gateway and the commands.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while running a wallet command.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("key file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("malformed key file {}: {reason}", path.display())]
    MalformedKeyFile { path: PathBuf, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid mnemonic phrase: {0}")]
    InvalidMnemonic(String),

    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid amount '{amount}': {reason}")]
    InvalidAmount { amount: String, reason: String },

    #[error("transfer failed: {cause}")]
    TransferFailed { cause: String },

    #[error("airdrop failed: {cause}")]
    AirdropFailed { cause: String },

    #[error("{missing} of {total} transactions could not be resolved")]
    HistoryFetchPartial { missing: usize, total: usize },

    #[error("failed to fetch transaction history: {0}")]
    HistoryFetchFailed(String),

    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Process exit status for failures caused by bad user input.
pub const EXIT_USAGE: i32 = 2;
/// Process exit status for runtime, file and network failures.
pub const EXIT_FAILURE: i32 = 1;

impl WalletError {
    /// Category label printed in front of the message on stderr.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            WalletError::FileNotFound(_) => "FileNotFound",
            WalletError::MalformedKeyFile { .. } => "MalformedKeyFile",
            WalletError::ReadError { .. } => "ReadError",
            WalletError::WriteError { .. } => "WriteError",
            WalletError::InvalidMnemonic(_) => "InvalidMnemonic",
            WalletError::InvalidAddress { .. } => "InvalidAddress",
            WalletError::InvalidAmount { .. } => "InvalidAmount",
            WalletError::TransferFailed { .. } => "TransferFailed",
            WalletError::AirdropFailed { .. } => "AirdropFailed",
            WalletError::HistoryFetchPartial { .. } => "HistoryFetchPartial",
            WalletError::HistoryFetchFailed(_) => "HistoryFetchFailed",
            WalletError::NetworkUnavailable(_) => "NetworkUnavailable",
            WalletError::InvalidConfig(_) => "InvalidConfig",
        }
    }

    /// Input validation failures are usage errors; everything else is a
    /// runtime failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            WalletError::InvalidMnemonic(_)
            | WalletError::InvalidAddress { .. }
            | WalletError::InvalidAmount { .. }
            | WalletError::InvalidConfig(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }

    pub(crate) fn invalid_amount(amount: &str, reason: impl Into<String>) -> Self {
        WalletError::InvalidAmount {
            amount: amount.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = WalletError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_usage_errors() {
        let err = WalletError::invalid_amount("abc", "not a number");
        assert_eq!(err.kind(), "InvalidAmount");
        assert_eq!(err.exit_code(), EXIT_USAGE);
        assert_eq!(err.to_string(), "invalid amount 'abc': not a number");
    }

    #[test]
    fn network_errors_are_runtime_failures() {
        let err = WalletError::NetworkUnavailable("timed out".into());
        assert_eq!(err.kind(), "NetworkUnavailable");
        assert_eq!(err.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn file_not_found_mentions_path() {
        let err = WalletError::FileNotFound(PathBuf::from("missing.json"));
        assert!(err.to_string().contains("missing.json"));
        assert_eq!(err.exit_code(), EXIT_FAILURE);
    }
}
