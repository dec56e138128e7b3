//! Foundation types for hapcfg.
//!
//! This crate holds the structured model that the rest of the workspace
//! reads from and writes to the configuration file. Every other hapcfg crate
//! depends on `hapcfg-types`.
//!
//! # Key Types
//!
//! - [`Bind`]: A listening endpoint declared inside a frontend section
//! - [`Version`]: Monotonic counter stamped on the whole configuration file
//! - [`TransactionId`]: Identifier of a staged, multi-step edit
//! - [`Transaction`]: A staged edit together with its base version and status
//! - [`Versioned`]: A read result paired with the version it was read at

pub mod bind;
pub mod error;
pub mod transaction;
pub mod version;

pub use bind::Bind;
pub use error::{TypeError, ValidationError};
pub use transaction::{Transaction, TransactionId, TransactionStatus};
pub use version::{Version, Versioned};
