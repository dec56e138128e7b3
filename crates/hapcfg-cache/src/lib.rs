//! Read-through cache for hapcfg.
//!
//! Entries are keyed by section and [`CacheScope`]: either the committed
//! configuration or one explicit transaction. Each section holds per-name
//! entries and, independently, the full ordered list. Any write to a member
//! drops the list entry, so an aggregate is never served after one of its
//! members changed.
//!
//! The cache is never the source of truth. Every operation is a no-op while
//! it is disabled, and disabling it drops everything it held.

pub mod cache;
pub mod object;
pub mod scope;
pub mod version;

pub use cache::Cache;
pub use object::{Keyed, ObjectCache};
pub use scope::CacheScope;
pub use version::VersionCache;
