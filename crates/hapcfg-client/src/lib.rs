//! Transactional access to configuration objects.
//!
//! [`Client`] is the entry point. Reads take an optional transaction id and
//! return the object together with the version it was read at. Writes take a
//! [`Scope`]: either an explicit transaction, where the edit stays staged
//! until [`Client::commit_transaction`], or the version the caller last
//! read, where the edit is committed at once if that version is still
//! current.
//!
//! # Modules
//!
//! - [`config`]: [`ClientConfig`], loaded from TOML
//! - [`error`]: [`ConfError`] and its [`ErrorKind`] classification
//! - [`object`]: the [`ConfigObject`] trait tying a model type to its
//!   record, codec, and cache
//! - [`accessor`]: section-level list/find/insert/set/delete over an engine
//! - [`client`]: the [`Client`] operations

pub mod accessor;
pub mod client;
pub mod config;
pub mod error;
pub mod object;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{ConfError, ConfResult, ErrorKind};
pub use object::ConfigObject;

pub use hapcfg_txn::Scope;
pub use hapcfg_types::{Bind, Transaction, TransactionId, TransactionStatus, Version, Versioned};
