//! Error types for transaction operations.

use std::path::PathBuf;

use hapcfg_types::{TransactionId, TransactionStatus, TypeError, Version};

/// Errors that can occur while staging or committing transactions.
#[derive(Debug, thiserror::Error)]
pub enum TxnError {
    /// The expected version is no longer the committed one.
    #[error("version in configuration file is {current}, given version is {given}")]
    VersionConflict { current: Version, given: Version },

    #[error("transaction {0} does not exist")]
    TransactionNotFound(TransactionId),

    #[error("transaction {id} is {status}, not in progress")]
    TransactionNotInProgress {
        id: TransactionId,
        status: TransactionStatus,
    },

    /// Both or neither of transaction id and version were supplied.
    #[error("{0}")]
    InvalidScope(String),

    #[error(transparent)]
    InvalidTransactionId(#[from] TypeError),

    #[error("cannot read version from {path}: {line:?}")]
    InvalidVersionHeader { path: PathBuf, line: String },

    /// The committed version is at the top of its range.
    #[error("version {version} in {path} cannot be advanced")]
    VersionExhausted { path: PathBuf, version: Version },

    #[error("transaction lock poisoned")]
    LockPoisoned,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for transaction results.
pub type TxnResult<T> = Result<T, TxnError>;
