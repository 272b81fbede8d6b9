//! Transfer failure categories

use thiserror::Error;

use crate::domain::ValidationError;

/// Why a chain transfer did not go through
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error(transparent)]
    Validation(ValidationError),

    #[error("invalid private key")]
    InvalidPrivateKey,

    #[error("insufficient balance: have {balance} {symbol}, need {requested} {symbol}")]
    InsufficientBalance {
        balance: String,
        requested: String,
        symbol: String,
    },

    #[error("insufficient funds to cover the transfer and gas")]
    InsufficientFunds,

    #[error("nonce conflict: a pending transaction from this account is in the way, try again")]
    NonceConflict,

    #[error("transaction was rejected")]
    Rejected,

    #[error("the network timed out, try again later")]
    Timeout,

    #[error("{0}")]
    Rpc(String),
}

impl TransferError {
    /// Map an RPC error message onto a category. JSON-RPC error payloads
    /// carry no portable kind so the message text is all there is.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("insufficient funds") {
            TransferError::InsufficientFunds
        } else if lower.contains("nonce") || lower.contains("replacement transaction underpriced") {
            TransferError::NonceConflict
        } else if lower.contains("rejected") || lower.contains("denied") {
            TransferError::Rejected
        } else if lower.contains("timeout") || lower.contains("timed out") {
            TransferError::Timeout
        } else {
            TransferError::Rpc(message.to_string())
        }
    }

    /// Stable category name for machine-readable output
    pub fn kind(&self) -> &'static str {
        match self {
            TransferError::Validation(_) => "validation",
            TransferError::InvalidPrivateKey => "invalid_private_key",
            TransferError::InsufficientBalance { .. } => "insufficient_balance",
            TransferError::InsufficientFunds => "insufficient_funds",
            TransferError::NonceConflict => "nonce_conflict",
            TransferError::Rejected => "rejected",
            TransferError::Timeout => "timeout",
            TransferError::Rpc(_) => "rpc",
        }
    }

    /// Classify an error from the RPC layer using its full context chain
    pub fn from_rpc(err: &anyhow::Error) -> Self {
        Self::classify(&format!("{err:#}"))
    }
}

impl From<ValidationError> for TransferError {
    fn from(err: ValidationError) -> Self {
        TransferError::Validation(err)
    }
}
