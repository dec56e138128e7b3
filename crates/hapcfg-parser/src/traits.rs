//! The [`ConfigEngine`] trait defining the engine interface.

use std::path::Path;

use crate::directive::Directive;
use crate::error::ParserResult;
use crate::section::SectionKind;

/// Engine over a loaded configuration file.
///
/// Directives are addressed by section kind, section name, keyword, and the
/// index among that section's directives with the same keyword. Indexes are
/// positional: the format has no stable directive ids, so an index taken
/// from one load is only meaningful against that same loaded state.
///
/// An engine is a per-request handle. It is loaded from a file, mutated in
/// memory, and saved back; nothing is written until [`save`](Self::save).
pub trait ConfigEngine: Send {
    /// Replace the in-memory state with the contents of `path`.
    fn load_data(&mut self, path: &Path) -> ParserResult<()>;

    /// Write the in-memory state to `path`.
    fn save(&self, path: &Path) -> ParserResult<()>;

    /// Names of all sections of `kind`, in file order.
    fn section_names(&self, kind: SectionKind) -> Vec<String>;

    /// Raw lines of every `keyword` directive in the section.
    ///
    /// Fails with [`ParserError::SectionMissing`] if the section does not
    /// exist and [`ParserError::FetchError`] if it holds no such directive.
    fn get_lines(&self, kind: SectionKind, section: &str, keyword: &str)
        -> ParserResult<Vec<String>>;

    /// Insert a line before the `index`-th `keyword` directive, or after the
    /// last one when `index` is `None`.
    fn insert_line(
        &mut self,
        kind: SectionKind,
        section: &str,
        keyword: &str,
        line: String,
        index: Option<usize>,
    ) -> ParserResult<()>;

    /// Replace the `index`-th `keyword` directive.
    fn set_line(
        &mut self,
        kind: SectionKind,
        section: &str,
        keyword: &str,
        line: String,
        index: usize,
    ) -> ParserResult<()>;

    /// Remove the `index`-th `keyword` directive.
    fn delete_line(
        &mut self,
        kind: SectionKind,
        section: &str,
        keyword: &str,
        index: usize,
    ) -> ParserResult<()>;

    /// All `D` directives in the section, parsed.
    fn get<D: Directive>(&self, kind: SectionKind, section: &str) -> ParserResult<Vec<D>>
    where
        Self: Sized,
    {
        self.get_lines(kind, section, D::KEYWORD)?
            .iter()
            .map(|line| D::from_line(line))
            .collect()
    }

    /// Insert a `D` directive; see [`insert_line`](Self::insert_line).
    fn insert<D: Directive>(
        &mut self,
        kind: SectionKind,
        section: &str,
        record: &D,
        index: Option<usize>,
    ) -> ParserResult<()>
    where
        Self: Sized,
    {
        let line = renderable(record)?;
        self.insert_line(kind, section, D::KEYWORD, line, index)
    }

    /// Replace the `index`-th `D` directive.
    fn set<D: Directive>(
        &mut self,
        kind: SectionKind,
        section: &str,
        record: &D,
        index: usize,
    ) -> ParserResult<()>
    where
        Self: Sized,
    {
        let line = renderable(record)?;
        self.set_line(kind, section, D::KEYWORD, line, index)
    }

    /// Remove the `index`-th `D` directive.
    fn delete<D: Directive>(
        &mut self,
        kind: SectionKind,
        section: &str,
        index: usize,
    ) -> ParserResult<()>
    where
        Self: Sized,
    {
        self.delete_line(kind, section, D::KEYWORD, index)
    }
}

/// Render a record, refusing records that would not parse back as themselves.
fn renderable<D: Directive>(record: &D) -> ParserResult<String> {
    record.validate()?;
    Ok(record.to_line())
}
