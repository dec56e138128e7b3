use std::fmt;

use hapcfg_types::TransactionId;

/// Which view of the configuration an entry belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheScope {
    Committed,
    Transaction(TransactionId),
}

impl CacheScope {
    /// Scope for a read: `None` reads the committed configuration.
    pub fn of(transaction: Option<&TransactionId>) -> Self {
        match transaction {
            Some(id) => Self::Transaction(id.clone()),
            None => Self::Committed,
        }
    }
}

impl From<Option<&TransactionId>> for CacheScope {
    fn from(transaction: Option<&TransactionId>) -> Self {
        Self::of(transaction)
    }
}

impl fmt::Display for CacheScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Committed => f.write_str("committed"),
            Self::Transaction(id) => write!(f, "transaction {id}"),
        }
    }
}
