//! Codec between on-disk directive records and configuration objects.
//!
//! Decoding is deliberately permissive: unknown options are skipped, an
//! unparseable port or timeout is left unset, and a record whose endpoint
//! has no segment at all is dropped instead of reported. Callers must
//! tolerate getting fewer objects back than there are records on disk.
//!
//! Encoding is deterministic: options are always emitted in the same order
//! so that rewriting an unchanged object produces an identical line.

pub mod bind;

pub use bind::BindCodec;
