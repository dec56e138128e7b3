//! Transaction staging and optimistic version control for hapcfg.
//!
//! Every edit of the configuration file goes through a staged snapshot.
//! A caller either names an explicit transaction it opened earlier, or
//! supplies the version it last read and gets a single-shot implicit
//! transaction that is committed (or discarded) within the same call.
//!
//! # Architecture
//!
//! - [`TransactionStore`] is the staging service: it resolves snapshot
//!   paths, reads versions, and commits or discards snapshots.
//!   [`FileTransactionStore`] keeps snapshots as files next to the
//!   configuration.
//! - [`Coordinator`] opens a [`ChangeScope`] for a [`Scope`] selector. The
//!   scope is consumed by [`ChangeScope::commit`] or [`ChangeScope::abort`];
//!   dropping an open implicit scope discards its snapshot.
//!
//! # Concurrency
//!
//! Control is optimistic. Nothing is locked between reading a version and
//! committing; the commit re-checks that the snapshot's base version is
//! still current and fails with [`TxnError::VersionConflict`] otherwise.

pub mod coordinator;
pub mod error;
pub mod file;
pub mod header;
pub mod traits;

pub use coordinator::{ChangeScope, Coordinator, Scope};
pub use error::{TxnError, TxnResult};
pub use file::FileTransactionStore;
pub use header::{read_version, stamp_version, VERSION_PREFIX};
pub use traits::TransactionStore;
