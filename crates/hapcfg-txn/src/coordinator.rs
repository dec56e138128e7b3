//! Change scopes: the open/commit/abort protocol around one edit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hapcfg_types::{Transaction, TransactionId, Version};
use tracing::{debug, warn};

use crate::error::{TxnError, TxnResult};
use crate::traits::TransactionStore;

/// Selects where a write happens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Edit an explicit transaction opened earlier. The edit stays staged
    /// until the transaction itself is committed.
    Transaction(TransactionId),
    /// Edit the committed configuration, which must currently be at this
    /// version. The edit is committed immediately.
    Version(Version),
}

impl Scope {
    /// Build a scope from loosely supplied selectors; exactly one must be
    /// present.
    pub fn from_parts(
        transaction: Option<TransactionId>,
        version: Option<Version>,
    ) -> TxnResult<Self> {
        match (transaction, version) {
            (Some(id), None) => Ok(Self::Transaction(id)),
            (None, Some(version)) => Ok(Self::Version(version)),
            (Some(_), Some(_)) => Err(TxnError::InvalidScope(
                "both version and transaction specified, specify only one".into(),
            )),
            (None, None) => Err(TxnError::InvalidScope(
                "version or transaction not specified, specify only one".into(),
            )),
        }
    }

    pub fn transaction_id(&self) -> Option<&TransactionId> {
        match self {
            Self::Transaction(id) => Some(id),
            Self::Version(_) => None,
        }
    }
}

impl From<TransactionId> for Scope {
    fn from(id: TransactionId) -> Self {
        Self::Transaction(id)
    }
}

impl From<Version> for Scope {
    fn from(version: Version) -> Self {
        Self::Version(version)
    }
}

/// Opens change scopes against a transaction store.
#[derive(Clone)]
pub struct Coordinator {
    store: Arc<dyn TransactionStore>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator").finish_non_exhaustive()
    }
}

impl Coordinator {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn TransactionStore {
        self.store.as_ref()
    }

    /// Open a scope for one edit.
    ///
    /// An explicit scope must name a transaction that is still in progress.
    /// An implicit scope checks the version and stages a fresh snapshot.
    pub fn open(&self, scope: &Scope) -> TxnResult<ChangeScope<'_>> {
        match scope {
            Scope::Transaction(id) => {
                let transaction = self.store.get(id)?;
                if transaction.status != hapcfg_types::TransactionStatus::InProgress {
                    return Err(TxnError::TransactionNotInProgress {
                        id: id.clone(),
                        status: transaction.status,
                    });
                }
                let path = self.store.file_path(Some(id))?;
                Ok(ChangeScope {
                    store: self.store.as_ref(),
                    transaction,
                    path,
                    implicit: false,
                    open: true,
                })
            }
            Scope::Version(version) => {
                let current = self.store.version()?;
                if *version != current {
                    return Err(TxnError::VersionConflict {
                        current,
                        given: *version,
                    });
                }
                let transaction = self.store.start(*version)?;
                let path = self.store.file_path(Some(&transaction.id))?;
                debug!(transaction = %transaction.id, %version, "implicit scope opened");
                Ok(ChangeScope {
                    store: self.store.as_ref(),
                    transaction,
                    path,
                    implicit: true,
                    open: true,
                })
            }
        }
    }
}

/// An open edit scope over one staged snapshot.
///
/// Load the engine from [`path`](Self::path), mutate, save back to the same
/// path, then [`commit`](Self::commit). Both `commit` and
/// [`abort`](Self::abort) consume the scope. Dropping an open implicit scope
/// discards its snapshot.
pub struct ChangeScope<'a> {
    store: &'a dyn TransactionStore,
    transaction: Transaction,
    path: PathBuf,
    implicit: bool,
    open: bool,
}

impl std::fmt::Debug for ChangeScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeScope")
            .field("transaction", &self.transaction)
            .field("path", &self.path)
            .field("implicit", &self.implicit)
            .field("open", &self.open)
            .finish()
    }
}

impl ChangeScope<'_> {
    /// The snapshot file this scope edits.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn is_implicit(&self) -> bool {
        self.implicit
    }

    /// Finish the edit.
    ///
    /// An implicit scope commits its snapshot and returns the new committed
    /// version; if the commit fails the snapshot is discarded. An explicit
    /// scope leaves its snapshot staged and returns the transaction's
    /// version.
    pub fn commit(mut self) -> TxnResult<Version> {
        self.open = false;
        if !self.implicit {
            return Ok(self.transaction.version);
        }
        match self.store.commit(&self.transaction.id) {
            Ok(version) => Ok(version),
            Err(err) => {
                self.discard();
                Err(err)
            }
        }
    }

    /// Abandon the edit. An implicit scope's snapshot is deleted; an
    /// explicit scope's snapshot is left as it was last saved.
    pub fn abort(mut self) -> TxnResult<()> {
        self.open = false;
        if self.implicit {
            self.store.delete(&self.transaction.id)?;
            debug!(transaction = %self.transaction.id, "implicit scope aborted");
        }
        Ok(())
    }

    fn discard(&self) {
        if let Err(err) = self.store.delete(&self.transaction.id) {
            warn!(transaction = %self.transaction.id, error = %err, "failed to discard staged snapshot");
        }
    }
}

impl Drop for ChangeScope<'_> {
    fn drop(&mut self) {
        if self.open && self.implicit {
            self.discard();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileTransactionStore;
    use hapcfg_types::TransactionStatus;
    use std::fs;

    const CONFIG: &str = "# _version=1\nfrontend web\n";

    fn setup() -> (tempfile::TempDir, Coordinator) {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("haproxy.cfg");
        fs::write(&cfg, CONFIG).unwrap();
        let store = FileTransactionStore::new(cfg, dir.path().join("transactions"));
        (dir, Coordinator::new(Arc::new(store)))
    }

    fn committed(coord: &Coordinator) -> String {
        fs::read_to_string(coord.store().file_path(None).unwrap()).unwrap()
    }

    #[test]
    fn scope_from_parts_requires_exactly_one() {
        let id = TransactionId::generate();
        assert_eq!(
            Scope::from_parts(Some(id.clone()), None).unwrap(),
            Scope::Transaction(id.clone())
        );
        assert_eq!(
            Scope::from_parts(None, Some(Version::new(3))).unwrap(),
            Scope::Version(Version::new(3))
        );
        assert!(matches!(
            Scope::from_parts(Some(id), Some(Version::new(3))),
            Err(TxnError::InvalidScope(_))
        ));
        assert!(matches!(
            Scope::from_parts(None, None),
            Err(TxnError::InvalidScope(_))
        ));
    }

    #[test]
    fn implicit_commit_advances_version() {
        let (_dir, coord) = setup();
        let scope = coord.open(&Scope::Version(Version::new(1))).unwrap();
        assert!(scope.is_implicit());
        fs::write(scope.path(), "# _version=1\nfrontend web\n  bind :80\n").unwrap();

        assert_eq!(scope.commit().unwrap(), Version::new(2));
        assert_eq!(committed(&coord), "# _version=2\nfrontend web\n  bind :80\n");
        assert!(coord.store().list(None).unwrap().is_empty());
    }

    #[test]
    fn stale_version_rejected_at_open() {
        let (_dir, coord) = setup();
        let err = coord.open(&Scope::Version(Version::new(0))).unwrap_err();
        assert!(matches!(err, TxnError::VersionConflict { .. }));
        assert!(coord.store().list(None).unwrap().is_empty());
    }

    #[test]
    fn racing_implicit_scopes_second_commit_conflicts() {
        let (_dir, coord) = setup();
        let first = coord.open(&Scope::Version(Version::new(1))).unwrap();
        let second = coord.open(&Scope::Version(Version::new(1))).unwrap();

        fs::write(first.path(), "# _version=1\nfrontend web\n  bind :1\n").unwrap();
        fs::write(second.path(), "# _version=1\nfrontend web\n  bind :2\n").unwrap();

        first.commit().unwrap();
        let after_first = committed(&coord);

        let err = second.commit().unwrap_err();
        assert!(matches!(
            err,
            TxnError::VersionConflict { current, given }
                if current == Version::new(2) && given == Version::new(1)
        ));
        assert_eq!(committed(&coord), after_first);
        // the failed implicit snapshot was discarded, not left behind
        assert!(coord.store().list(None).unwrap().is_empty());
    }

    #[test]
    fn abort_discards_implicit_snapshot() {
        let (_dir, coord) = setup();
        let scope = coord.open(&Scope::Version(Version::new(1))).unwrap();
        let path = scope.path().to_path_buf();
        scope.abort().unwrap();
        assert!(!path.exists());
        assert_eq!(committed(&coord), CONFIG);
    }

    #[test]
    fn dropping_open_implicit_scope_discards() {
        let (_dir, coord) = setup();
        let path = {
            let scope = coord.open(&Scope::Version(Version::new(1))).unwrap();
            scope.path().to_path_buf()
        };
        assert!(!path.exists());
        assert!(coord.store().list(None).unwrap().is_empty());
    }

    #[test]
    fn explicit_scope_stays_staged() {
        let (_dir, coord) = setup();
        let t = coord.store().start(Version::new(1)).unwrap();

        let scope = coord.open(&Scope::Transaction(t.id.clone())).unwrap();
        assert!(!scope.is_implicit());
        fs::write(scope.path(), "# _version=1\nfrontend web\n  bind :9\n").unwrap();
        assert_eq!(scope.commit().unwrap(), Version::new(1));

        assert_eq!(committed(&coord), CONFIG);
        let staged = coord.store().get(&t.id).unwrap();
        assert_eq!(staged.status, TransactionStatus::InProgress);

        // abort and drop never discard an explicit snapshot
        coord
            .open(&Scope::Transaction(t.id.clone()))
            .unwrap()
            .abort()
            .unwrap();
        drop(coord.open(&Scope::Transaction(t.id.clone())).unwrap());
        assert!(coord.store().get(&t.id).is_ok());
    }

    #[test]
    fn explicit_scope_requires_in_progress_transaction() {
        let (_dir, coord) = setup();
        let missing = TransactionId::generate();
        assert!(matches!(
            coord.open(&Scope::Transaction(missing)),
            Err(TxnError::TransactionNotFound(_))
        ));

        let a = coord.store().start(Version::new(1)).unwrap();
        let b = coord.store().start(Version::new(1)).unwrap();
        coord.store().commit(&a.id).unwrap();
        coord.store().commit(&b.id).unwrap_err();
        assert!(matches!(
            coord.open(&Scope::Transaction(b.id)),
            Err(TxnError::TransactionNotInProgress { .. })
        ));
    }
}
