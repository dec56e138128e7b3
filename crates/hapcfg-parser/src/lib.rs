//! Section/directive engine for hapcfg.
//!
//! The configuration file is a sequence of sections (`global`, `defaults`,
//! `frontend <name>`, ...) each holding indented directive lines. This crate
//! addresses directives by `(section kind, section name, keyword, index)`
//! and never interprets what a directive means beyond its own syntax.
//!
//! # Modules
//!
//! - [`error`]: [`ParserError`], the explicit engine fault kinds
//! - [`section`]: [`SectionKind`]
//! - [`directive`]: the [`Directive`] trait for typed records
//! - [`bind`]: [`BindRecord`] and its tagged [`BindOption`] list
//! - [`traits`]: the [`ConfigEngine`] trait
//! - [`text`]: [`TextConfig`], the in-memory text engine

pub mod bind;
pub mod directive;
pub mod error;
pub mod section;
pub mod text;
pub mod traits;

pub use bind::{BindOption, BindRecord};
pub use directive::Directive;
pub use error::{ParserError, ParserResult};
pub use section::SectionKind;
pub use text::TextConfig;
pub use traits::ConfigEngine;
