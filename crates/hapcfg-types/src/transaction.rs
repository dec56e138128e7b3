use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::version::Version;

/// Characters that may not appear in a transaction id.
///
/// Ids name staging files on disk, so anything that could escape the
/// transaction directory is rejected.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', ' ', '\t', '\n', '\r', '\0'];

/// Identifier of an explicit transaction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(String);

impl TransactionId {
    /// Generate a fresh, time-ordered (UUID v7) transaction id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Parse a caller-supplied id.
    ///
    /// # Examples
    ///
    /// ```
    /// use hapcfg_types::TransactionId;
    ///
    /// assert!(TransactionId::parse("273e3385-2d0c-4fb1-aa27-93cbb31ff203").is_ok());
    /// assert!(TransactionId::parse("").is_err());
    /// assert!(TransactionId::parse("../haproxy.cfg").is_err());
    /// ```
    pub fn parse(id: &str) -> Result<Self, TypeError> {
        if id.is_empty() {
            return Err(TypeError::InvalidTransactionId {
                id: id.to_string(),
                reason: "must not be empty".into(),
            });
        }
        if let Some(ch) = id.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
            return Err(TypeError::InvalidTransactionId {
                id: id.to_string(),
                reason: format!("contains forbidden character: {ch:?}"),
            });
        }
        if id.starts_with('.') {
            return Err(TypeError::InvalidTransactionId {
                id: id.to_string(),
                reason: "must not start with '.'".into(),
            });
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TransactionId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TransactionId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.0
    }
}

/// Lifecycle state of a staged transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Staged and accepting further edits.
    InProgress,
    /// Rejected at commit time; kept for inspection until deleted.
    Failed,
    /// Committed into the configuration file.
    Success,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Failed => "failed",
            Self::Success => "success",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "failed" => Ok(Self::Failed),
            "success" => Ok(Self::Success),
            other => Err(TypeError::InvalidStatus(other.to_string())),
        }
    }
}

/// A staged edit of the configuration file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Committed version the snapshot was taken from.
    #[serde(rename = "_version")]
    pub version: Version,
    pub status: TransactionStatus,
}
