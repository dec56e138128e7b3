//! File-backed transaction store.
//!
//! Layout, for a configuration file `haproxy.cfg`:
//!
//! ```text
//! <transaction_dir>/haproxy.cfg.<id>          in-progress snapshot
//! <transaction_dir>/failed/haproxy.cfg.<id>   snapshot rejected at commit
//! ```
//!
//! A transaction's base version is the header of its snapshot, and its
//! status is the directory it lives in, so nothing besides the files
//! themselves needs to be persisted.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use hapcfg_types::{Transaction, TransactionId, TransactionStatus, Version};
use tracing::{debug, info, warn};

use crate::error::{TxnError, TxnResult};
use crate::header::{read_version, stamp_version, version_of};
use crate::traits::TransactionStore;

const FAILED_DIR: &str = "failed";

/// A [`TransactionStore`] keeping snapshots as files.
#[derive(Debug)]
pub struct FileTransactionStore {
    config_file: PathBuf,
    transaction_dir: PathBuf,
    /// Serializes start and commit within this process.
    lock: Mutex<()>,
}

impl FileTransactionStore {
    /// Create a store for `config_file` keeping snapshots in
    /// `transaction_dir`. Neither path is touched until first use.
    pub fn new(config_file: impl Into<PathBuf>, transaction_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
            transaction_dir: transaction_dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn transaction_dir(&self) -> &Path {
        &self.transaction_dir
    }

    fn guard(&self) -> TxnResult<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| TxnError::LockPoisoned)
    }

    /// `haproxy.cfg.` for a configuration file named `haproxy.cfg`.
    fn file_prefix(&self) -> String {
        let base = self
            .config_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "config".to_string());
        format!("{base}.")
    }

    fn snapshot_path(&self, id: &TransactionId, status: TransactionStatus) -> PathBuf {
        let name = format!("{}{id}", self.file_prefix());
        match status {
            TransactionStatus::Failed => self.transaction_dir.join(FAILED_DIR).join(name),
            _ => self.transaction_dir.join(name),
        }
    }

    /// Find the snapshot of `id` and the status its location implies.
    fn locate(&self, id: &TransactionId) -> Option<(PathBuf, TransactionStatus)> {
        [TransactionStatus::InProgress, TransactionStatus::Failed]
            .into_iter()
            .map(|status| (self.snapshot_path(id, status), status))
            .find(|(path, _)| path.is_file())
    }

    fn locate_or_err(&self, id: &TransactionId) -> TxnResult<(PathBuf, TransactionStatus)> {
        self.locate(id)
            .ok_or_else(|| TxnError::TransactionNotFound(id.clone()))
    }

    /// Move a staged snapshot to the failed directory.
    fn fail(&self, id: &TransactionId) -> TxnResult<()> {
        let from = self.snapshot_path(id, TransactionStatus::InProgress);
        let to = self.snapshot_path(id, TransactionStatus::Failed);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(from, to)?;
        Ok(())
    }

    fn scan(&self, status: TransactionStatus) -> TxnResult<Vec<Transaction>> {
        let dir = match status {
            TransactionStatus::InProgress => self.transaction_dir.clone(),
            TransactionStatus::Failed => self.transaction_dir.join(FAILED_DIR),
            TransactionStatus::Success => return Ok(Vec::new()),
        };
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let prefix = self.file_prefix();
        let mut transactions = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(id) = file_name
                .to_str()
                .and_then(|n| n.strip_prefix(prefix.as_str()))
                .and_then(|raw| TransactionId::parse(raw).ok())
            else {
                continue;
            };
            transactions.push(Transaction {
                version: read_version(&entry.path())?,
                id,
                status,
            });
        }
        Ok(transactions)
    }
}

/// Replace `path` with `contents` via a temporary file in the same
/// directory, so readers never observe a partially written file.
fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl TransactionStore for FileTransactionStore {
    fn version(&self) -> TxnResult<Version> {
        read_version(&self.config_file)
    }

    fn file_path(&self, id: Option<&TransactionId>) -> TxnResult<PathBuf> {
        match id {
            None => Ok(self.config_file.clone()),
            Some(id) => Ok(self.locate_or_err(id)?.0),
        }
    }

    fn start(&self, version: Version) -> TxnResult<Transaction> {
        let _guard = self.guard()?;
        let current = read_version(&self.config_file)?;
        if version != current {
            return Err(TxnError::VersionConflict {
                current,
                given: version,
            });
        }

        fs::create_dir_all(&self.transaction_dir)?;
        let id = TransactionId::generate();
        fs::copy(
            &self.config_file,
            self.snapshot_path(&id, TransactionStatus::InProgress),
        )?;

        info!(transaction = %id, %version, "transaction started");
        Ok(Transaction {
            id,
            version,
            status: TransactionStatus::InProgress,
        })
    }

    fn get(&self, id: &TransactionId) -> TxnResult<Transaction> {
        let (path, status) = self.locate_or_err(id)?;
        Ok(Transaction {
            id: id.clone(),
            version: read_version(&path)?,
            status,
        })
    }

    fn list(&self, status: Option<TransactionStatus>) -> TxnResult<Vec<Transaction>> {
        let mut transactions = Vec::new();
        for s in [TransactionStatus::InProgress, TransactionStatus::Failed] {
            if status.map_or(true, |wanted| wanted == s) {
                transactions.extend(self.scan(s)?);
            }
        }
        transactions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(transactions)
    }

    fn commit(&self, id: &TransactionId) -> TxnResult<Version> {
        let _guard = self.guard()?;
        let (staged, status) = self.locate_or_err(id)?;
        if status != TransactionStatus::InProgress {
            return Err(TxnError::TransactionNotInProgress {
                id: id.clone(),
                status,
            });
        }

        let current = read_version(&self.config_file)?;
        let text = fs::read_to_string(&staged)?;
        let base = version_of(&text).ok_or_else(|| TxnError::InvalidVersionHeader {
            path: staged.clone(),
            line: text.lines().next().unwrap_or_default().to_string(),
        })?;

        if base != current {
            self.fail(id)?;
            warn!(transaction = %id, %current, given = %base, "transaction failed on version conflict");
            return Err(TxnError::VersionConflict {
                current,
                given: base,
            });
        }

        let next = current.next().ok_or_else(|| TxnError::VersionExhausted {
            path: self.config_file.clone(),
            version: current,
        })?;
        write_atomic(&self.config_file, &stamp_version(&text, next))?;
        fs::remove_file(&staged)?;

        info!(transaction = %id, version = %next, "transaction committed");
        Ok(next)
    }

    fn delete(&self, id: &TransactionId) -> TxnResult<()> {
        let (path, status) = self.locate_or_err(id)?;
        fs::remove_file(path)?;
        debug!(transaction = %id, %status, "transaction deleted");
        Ok(())
    }
}
