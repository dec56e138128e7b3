//! The [`TransactionStore`] trait defining the staging service interface.

use std::path::PathBuf;

use hapcfg_types::{Transaction, TransactionId, TransactionStatus, Version};

use crate::error::TxnResult;

/// Staging service for configuration transactions.
///
/// Implementations own the committed configuration file and the staged
/// per-transaction snapshots. They must be thread-safe (`Send + Sync`) and
/// must make [`start`](Self::start) and [`commit`](Self::commit) atomic with
/// respect to each other: a commit either replaces the committed file
/// entirely or leaves it untouched.
///
/// Only one caller should edit a given explicit transaction's snapshot at a
/// time; the store does not enforce that.
pub trait TransactionStore: Send + Sync {
    /// Version of the committed configuration.
    fn version(&self) -> TxnResult<Version>;

    /// Base version of a staged transaction.
    fn transaction_version(&self, id: &TransactionId) -> TxnResult<Version> {
        Ok(self.get(id)?.version)
    }

    /// Path of the file to load for `id`, or of the committed file for
    /// `None`.
    fn file_path(&self, id: Option<&TransactionId>) -> TxnResult<PathBuf>;

    /// Stage a new transaction on top of `version`.
    ///
    /// Fails with [`TxnError::VersionConflict`](crate::TxnError::VersionConflict)
    /// if `version` is not the committed version.
    fn start(&self, version: Version) -> TxnResult<Transaction>;

    /// Look up a transaction in any status.
    fn get(&self, id: &TransactionId) -> TxnResult<Transaction>;

    /// All known transactions, optionally filtered by status.
    fn list(&self, status: Option<TransactionStatus>) -> TxnResult<Vec<Transaction>>;

    /// Make a staged snapshot the committed configuration.
    ///
    /// Returns the new committed version. If the snapshot's base version is
    /// no longer current the transaction is marked failed and
    /// [`TxnError::VersionConflict`](crate::TxnError::VersionConflict) is
    /// returned; the committed file is not touched.
    fn commit(&self, id: &TransactionId) -> TxnResult<Version>;

    /// Discard a transaction and its snapshot, whatever its status.
    fn delete(&self, id: &TransactionId) -> TxnResult<()>;
}
