//! Error types for engine operations.

use crate::section::SectionKind;

/// Faults reported by a [`ConfigEngine`](crate::ConfigEngine).
///
/// Callers classify faults by matching on the variant; there are no
/// sentinel values to compare against.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    /// The addressed section is not present in the file.
    #[error("{kind} section {name:?} is missing")]
    SectionMissing { kind: SectionKind, name: String },

    /// No directive matched: either the section holds no `keyword`
    /// directives at all (`index` is `None`) or `index` is out of range.
    #[error("no {keyword} directive{}", at_index(.index))]
    FetchError {
        keyword: String,
        index: Option<usize>,
    },

    /// A line could not be parsed, or a record would not render to a
    /// parseable line.
    #[error("invalid directive {line:?}: {reason}")]
    InvalidDirective { line: String, reason: String },

    /// I/O error while loading or saving a file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn at_index(index: &Option<usize>) -> String {
    index.map(|i| format!(" at index {i}")).unwrap_or_default()
}

/// Convenience alias for engine results.
pub type ParserResult<T> = Result<T, ParserError>;
