//! Error types for the frontrunner bot

use ethers::types::H256;
use thiserror::Error;

/// Main error type for the bot
#[derive(Error, Debug)]
pub enum FrontrunnerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Transaction {tx_hash:?} reverted")]
    Reverted { tx_hash: H256 },

    #[error("Transaction {tx_hash:?} dropped from mempool")]
    Dropped { tx_hash: H256 },

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Timeout waiting for {operation}")]
    Timeout {
        operation: String,
        tx_hash: Option<H256>,
    },

    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: String, need: String },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FrontrunnerError {
    /// Errors that belong to a single attempt and never abort a run
    pub fn is_attempt_error(&self) -> bool {
        matches!(
            self,
            FrontrunnerError::Transaction(_)
                | FrontrunnerError::Reverted { .. }
                | FrontrunnerError::Dropped { .. }
                | FrontrunnerError::Wallet(_)
                | FrontrunnerError::Contract(_)
                | FrontrunnerError::Timeout { .. }
        )
    }

    /// Hash of a transaction that reached the mempool before the error
    pub fn submitted_tx(&self) -> Option<H256> {
        match self {
            FrontrunnerError::Reverted { tx_hash } | FrontrunnerError::Dropped { tx_hash } => {
                Some(*tx_hash)
            }
            FrontrunnerError::Timeout { tx_hash, .. } => *tx_hash,
            _ => None,
        }
    }

    /// Errors that end the session before any attempt is made
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FrontrunnerError::Config(_)
                | FrontrunnerError::Connectivity(_)
                | FrontrunnerError::InsufficientBalance { .. }
        )
    }
}

/// Result type for bot operations
pub type FrontrunnerResult<T> = Result<T, FrontrunnerError>;
