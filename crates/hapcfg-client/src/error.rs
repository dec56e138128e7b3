use std::fmt;

use hapcfg_parser::ParserError;
use hapcfg_txn::TxnError;
use hapcfg_types::{TransactionId, ValidationError, Version};
use thiserror::Error;

/// Errors surfaced to callers of [`Client`](crate::Client).
///
/// Messages name the offending object and its section. Lower-layer faults
/// that fit no other kind are carried as [`ConfError::Engine`] with their
/// message only.
#[derive(Debug, Error)]
pub enum ConfError {
    /// An object or its enclosing section does not exist.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("version in configuration file is {current}, given version is {given}")]
    VersionConflict { current: Version, given: Version },

    #[error("{0}")]
    InvalidScope(String),

    #[error("transaction {0} does not exist")]
    TransactionNotFound(TransactionId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Engine(String),
}

/// Classification of a [`ConfError`], without the message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    ValidationFailed,
    VersionConflict,
    InvalidScope,
    TransactionNotFound,
    Config,
    Engine,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::ValidationFailed => "validation_failed",
            Self::VersionConflict => "version_conflict",
            Self::InvalidScope => "invalid_scope",
            Self::TransactionNotFound => "transaction_not_found",
            Self::Config => "config",
            Self::Engine => "engine",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::ValidationFailed(_) => ErrorKind::ValidationFailed,
            Self::VersionConflict { .. } => ErrorKind::VersionConflict,
            Self::InvalidScope(_) => ErrorKind::InvalidScope,
            Self::TransactionNotFound(_) => ErrorKind::TransactionNotFound,
            Self::Config(_) => ErrorKind::Config,
            Self::Engine(_) => ErrorKind::Engine,
        }
    }
}

impl From<ValidationError> for ConfError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationFailed(err.to_string())
    }
}

impl From<TxnError> for ConfError {
    fn from(err: TxnError) -> Self {
        match err {
            TxnError::VersionConflict { current, given } => Self::VersionConflict { current, given },
            TxnError::TransactionNotFound(id) => Self::TransactionNotFound(id),
            TxnError::TransactionNotInProgress { .. }
            | TxnError::InvalidScope(_)
            | TxnError::InvalidTransactionId(_) => Self::InvalidScope(err.to_string()),
            other => Self::Engine(other.to_string()),
        }
    }
}

/// Engine faults reaching this conversion were not classified by the
/// accessor, so they surface as [`ConfError::Engine`]. That includes a
/// malformed directive read back from the file.
impl From<ParserError> for ConfError {
    fn from(err: ParserError) -> Self {
        Self::Engine(err.to_string())
    }
}

pub type ConfResult<T> = Result<T, ConfError>;

#[cfg(test)]
mod tests {
    use super::*;
    use hapcfg_parser::SectionKind;

    #[test]
    fn version_conflict_keeps_versions() {
        let err: ConfError = TxnError::VersionConflict {
            current: Version::new(4),
            given: Version::new(3),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::VersionConflict);
        assert_eq!(
            err.to_string(),
            "version in configuration file is 4, given version is 3"
        );
    }

    #[test]
    fn unclassified_faults_are_engine_errors() {
        let err: ConfError = ParserError::SectionMissing {
            kind: SectionKind::Frontend,
            name: "web".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Engine);

        let err: ConfError = TxnError::LockPoisoned.into();
        assert_eq!(err.kind(), ErrorKind::Engine);
    }

    #[test]
    fn malformed_directive_is_an_engine_error() {
        let err: ConfError = ParserError::InvalidDirective {
            line: "bind".into(),
            reason: "missing address".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Engine);
    }

    #[test]
    fn validation_errors_classify() {
        let err: ConfError = ValidationError::new("port", "out of range").into();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert_eq!(err.to_string(), "validation failed: port: out of range");
    }
}
