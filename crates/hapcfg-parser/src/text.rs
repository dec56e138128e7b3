//! In-memory text engine.
//!
//! [`TextConfig`] keeps the file as a preamble (every line before the first
//! section, including the version header and comments) followed by a list
//! of sections. Section bodies are kept line by line with indentation
//! stripped; comments and blank lines survive a load/save cycle, and body
//! lines are written back with a two-space indent.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::{ParserError, ParserResult};
use crate::section::SectionKind;
use crate::traits::ConfigEngine;

const INDENT: &str = "  ";

#[derive(Clone, Debug, PartialEq, Eq)]
struct Section {
    kind: SectionKind,
    name: String,
    /// Header line as written, e.g. `frontend web # public`.
    header: String,
    /// Body lines, trimmed. Blank lines are empty strings.
    body: Vec<String>,
}

impl Section {
    fn new(kind: SectionKind, name: &str) -> Self {
        let header = if name.is_empty() {
            kind.keyword().to_string()
        } else {
            format!("{} {name}", kind.keyword())
        };
        Self {
            kind,
            name: name.to_string(),
            header,
            body: Vec::new(),
        }
    }

    fn matches(&self, kind: SectionKind, name: &str) -> bool {
        self.kind == kind && (!kind.is_named() || self.name == name)
    }

    /// Body positions of every `keyword` directive, in order.
    fn positions(&self, keyword: &str) -> Vec<usize> {
        self.body
            .iter()
            .enumerate()
            .filter(|(_, line)| line.split_whitespace().next() == Some(keyword))
            .map(|(i, _)| i)
            .collect()
    }

    /// Where a new directive goes when appended: after the last directive
    /// with the same keyword, or at the end of the body ahead of trailing
    /// blank lines.
    fn append_position(&self, positions: &[usize]) -> usize {
        match positions.last() {
            Some(last) => last + 1,
            None => {
                let trailing_blank = self
                    .body
                    .iter()
                    .rev()
                    .take_while(|line| line.is_empty())
                    .count();
                self.body.len() - trailing_blank
            }
        }
    }
}

/// A configuration file held in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextConfig {
    preamble: Vec<String>,
    sections: Vec<Section>,
}

impl TextConfig {
    /// An empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration text.
    pub fn parse(text: &str) -> ParserResult<Self> {
        let mut config = Self::new();
        for line in text.lines() {
            let trimmed = line.trim();
            let mut tokens = trimmed.split_whitespace();
            let section_kind = tokens.next().and_then(SectionKind::from_keyword);

            if let Some(kind) = section_kind {
                let name = tokens.next().filter(|t| !t.starts_with('#')).unwrap_or("");
                if kind.is_named() && name.is_empty() {
                    return Err(ParserError::InvalidDirective {
                        line: line.to_string(),
                        reason: format!("{kind} section requires a name"),
                    });
                }
                let mut section = Section::new(kind, name);
                section.header = trimmed.to_string();
                config.sections.push(section);
            } else if let Some(section) = config.sections.last_mut() {
                section.body.push(trimmed.to_string());
            } else {
                config.preamble.push(line.to_string());
            }
        }
        Ok(config)
    }

    /// Render the configuration as text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.preamble {
            out.push_str(line);
            out.push('\n');
        }
        for section in &self.sections {
            out.push_str(&section.header);
            out.push('\n');
            for line in &section.body {
                if !line.is_empty() {
                    out.push_str(INDENT);
                    out.push_str(line);
                }
                out.push('\n');
            }
        }
        out
    }

    /// Append an empty section. Fails if it already exists.
    pub fn add_section(&mut self, kind: SectionKind, name: &str) -> ParserResult<()> {
        if kind.is_named() && name.is_empty() {
            return Err(ParserError::InvalidDirective {
                line: kind.keyword().to_string(),
                reason: format!("{kind} section requires a name"),
            });
        }
        if self.sections.iter().any(|s| s.matches(kind, name)) {
            return Err(ParserError::InvalidDirective {
                line: format!("{kind} {name}"),
                reason: "section already exists".into(),
            });
        }
        self.sections.push(Section::new(kind, name));
        Ok(())
    }

    fn section(&self, kind: SectionKind, name: &str) -> ParserResult<&Section> {
        self.sections
            .iter()
            .find(|s| s.matches(kind, name))
            .ok_or_else(|| ParserError::SectionMissing {
                kind,
                name: name.to_string(),
            })
    }

    fn section_mut(&mut self, kind: SectionKind, name: &str) -> ParserResult<&mut Section> {
        self.sections
            .iter_mut()
            .find(|s| s.matches(kind, name))
            .ok_or_else(|| ParserError::SectionMissing {
                kind,
                name: name.to_string(),
            })
    }
}

fn fetch_error(keyword: &str, index: Option<usize>) -> ParserError {
    ParserError::FetchError {
        keyword: keyword.to_string(),
        index,
    }
}

impl FromStr for TextConfig {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TextConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl ConfigEngine for TextConfig {
    fn load_data(&mut self, path: &Path) -> ParserResult<()> {
        let text = fs::read_to_string(path)?;
        *self = Self::parse(&text)?;
        debug!(path = %path.display(), sections = self.sections.len(), "configuration loaded");
        Ok(())
    }

    fn save(&self, path: &Path) -> ParserResult<()> {
        fs::write(path, self.render())?;
        debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    fn section_names(&self, kind: SectionKind) -> Vec<String> {
        self.sections
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.name.clone())
            .collect()
    }

    fn get_lines(
        &self,
        kind: SectionKind,
        section: &str,
        keyword: &str,
    ) -> ParserResult<Vec<String>> {
        let section = self.section(kind, section)?;
        let positions = section.positions(keyword);
        if positions.is_empty() {
            return Err(fetch_error(keyword, None));
        }
        Ok(positions
            .into_iter()
            .map(|i| section.body[i].clone())
            .collect())
    }

    fn insert_line(
        &mut self,
        kind: SectionKind,
        section: &str,
        keyword: &str,
        line: String,
        index: Option<usize>,
    ) -> ParserResult<()> {
        let section = self.section_mut(kind, section)?;
        let positions = section.positions(keyword);
        let at = match index {
            Some(i) if i < positions.len() => positions[i],
            Some(i) if i > positions.len() => return Err(fetch_error(keyword, Some(i))),
            _ => section.append_position(&positions),
        };
        section.body.insert(at, line);
        Ok(())
    }

    fn set_line(
        &mut self,
        kind: SectionKind,
        section: &str,
        keyword: &str,
        line: String,
        index: usize,
    ) -> ParserResult<()> {
        let section = self.section_mut(kind, section)?;
        let at = *section
            .positions(keyword)
            .get(index)
            .ok_or_else(|| fetch_error(keyword, Some(index)))?;
        section.body[at] = line;
        Ok(())
    }

    fn delete_line(
        &mut self,
        kind: SectionKind,
        section: &str,
        keyword: &str,
        index: usize,
    ) -> ParserResult<()> {
        let section = self.section_mut(kind, section)?;
        let at = *section
            .positions(keyword)
            .get(index)
            .ok_or_else(|| fetch_error(keyword, Some(index)))?;
        section.body.remove(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::{BindOption, BindRecord};

    const SAMPLE: &str = "\
# _version=3
# managed file
global
  daemon
  maxconn 4096

defaults
  mode http

frontend web # public entry
  bind 0.0.0.0:80 name http
  # tls listener
  bind 0.0.0.0:443 name https ssl crt /etc/ssl/web.pem
  default_backend app

frontend empty

backend app
  server s1 10.0.0.10:8080
";

    fn sample() -> TextConfig {
        TextConfig::parse(SAMPLE).unwrap()
    }

    #[test]
    fn render_is_lossless_for_normalized_input() {
        assert_eq!(sample().render(), SAMPLE);
    }

    #[test]
    fn indentation_is_normalized() {
        let cfg = TextConfig::parse("frontend f\n\t\tbind :80\n").unwrap();
        assert_eq!(cfg.render(), "frontend f\n  bind :80\n");
    }

    #[test]
    fn section_names_in_file_order() {
        let cfg = sample();
        assert_eq!(cfg.section_names(SectionKind::Frontend), vec!["web", "empty"]);
        assert_eq!(cfg.section_names(SectionKind::Backend), vec!["app"]);
        assert_eq!(cfg.section_names(SectionKind::Listen), Vec::<String>::new());
    }

    #[test]
    fn unnamed_frontend_is_invalid() {
        assert!(matches!(
            TextConfig::parse("frontend\n  bind :80\n"),
            Err(ParserError::InvalidDirective { .. })
        ));
    }

    #[test]
    fn get_typed_directives() {
        let binds: Vec<BindRecord> = sample().get(SectionKind::Frontend, "web").unwrap();
        assert_eq!(binds.len(), 2);
        assert_eq!(binds[0].path, "0.0.0.0:80");
        assert!(binds[1].options.contains(&BindOption::word("ssl")));
    }

    #[test]
    fn get_on_missing_section() {
        let err = sample()
            .get::<BindRecord>(SectionKind::Frontend, "nope")
            .unwrap_err();
        assert!(matches!(err, ParserError::SectionMissing { .. }));
    }

    #[test]
    fn get_on_section_without_directive() {
        let err = sample()
            .get::<BindRecord>(SectionKind::Frontend, "empty")
            .unwrap_err();
        assert!(matches!(err, ParserError::FetchError { index: None, .. }));
    }

    #[test]
    fn unnamed_sections_ignore_the_name() {
        let lines = sample()
            .get_lines(SectionKind::Global, "whatever", "maxconn")
            .unwrap();
        assert_eq!(lines, vec!["maxconn 4096"]);
    }

    #[test]
    fn insert_appends_after_last_same_keyword() {
        let mut cfg = sample();
        cfg.insert(
            SectionKind::Frontend,
            "web",
            &BindRecord::new("127.0.0.1:8080"),
            None,
        )
        .unwrap();
        let lines = cfg.get_lines(SectionKind::Frontend, "web", "bind").unwrap();
        assert_eq!(lines[2], "bind 127.0.0.1:8080");
        assert!(cfg
            .render()
            .contains("  bind 127.0.0.1:8080\n  default_backend app\n"));
    }

    #[test]
    fn insert_into_empty_section_keeps_trailing_blank() {
        let mut cfg = sample();
        cfg.insert(SectionKind::Frontend, "empty", &BindRecord::new(":81"), None)
            .unwrap();
        assert!(cfg.render().contains("frontend empty\n  bind :81\n\nbackend app\n"));
    }

    #[test]
    fn insert_at_index() {
        let mut cfg = sample();
        cfg.insert(SectionKind::Frontend, "web", &BindRecord::new(":1"), Some(0))
            .unwrap();
        let binds: Vec<BindRecord> = cfg.get(SectionKind::Frontend, "web").unwrap();
        assert_eq!(binds[0].path, ":1");
        assert_eq!(binds.len(), 3);

        let err = cfg
            .insert(SectionKind::Frontend, "web", &BindRecord::new(":2"), Some(9))
            .unwrap_err();
        assert!(matches!(err, ParserError::FetchError { index: Some(9), .. }));
    }

    #[test]
    fn insert_refuses_unrenderable_record() {
        let mut cfg = sample();
        let err = cfg
            .insert(SectionKind::Frontend, "web", &BindRecord::new(""), None)
            .unwrap_err();
        assert!(matches!(err, ParserError::InvalidDirective { .. }));
        assert_eq!(cfg, sample());
    }

    #[test]
    fn set_and_delete_by_index() {
        let mut cfg = sample();
        cfg.set(SectionKind::Frontend, "web", &BindRecord::new(":8080"), 1)
            .unwrap();
        let binds: Vec<BindRecord> = cfg.get(SectionKind::Frontend, "web").unwrap();
        assert_eq!(binds[1].path, ":8080");

        cfg.delete::<BindRecord>(SectionKind::Frontend, "web", 0).unwrap();
        let binds: Vec<BindRecord> = cfg.get(SectionKind::Frontend, "web").unwrap();
        assert_eq!(binds.len(), 1);
        assert_eq!(binds[0].path, ":8080");
        // the comment line is untouched
        assert!(cfg.render().contains("  # tls listener\n"));
    }

    #[test]
    fn stale_index_is_a_fetch_error() {
        let mut cfg = sample();
        let err = cfg
            .delete::<BindRecord>(SectionKind::Frontend, "web", 2)
            .unwrap_err();
        assert!(matches!(err, ParserError::FetchError { index: Some(2), .. }));
        let err = cfg
            .set(SectionKind::Frontend, "web", &BindRecord::new(":1"), 5)
            .unwrap_err();
        assert!(matches!(err, ParserError::FetchError { index: Some(5), .. }));
    }

    #[test]
    fn mutation_on_missing_section() {
        let mut cfg = sample();
        let err = cfg
            .insert(SectionKind::Frontend, "ghost", &BindRecord::new(":1"), None)
            .unwrap_err();
        assert!(matches!(err, ParserError::SectionMissing { .. }));
    }

    #[test]
    fn add_section_then_insert() {
        let mut cfg = TextConfig::new();
        cfg.add_section(SectionKind::Frontend, "fresh").unwrap();
        assert!(cfg.add_section(SectionKind::Frontend, "fresh").is_err());
        cfg.insert(SectionKind::Frontend, "fresh", &BindRecord::new(":80"), None)
            .unwrap();
        assert_eq!(cfg.render(), "frontend fresh\n  bind :80\n");
    }

    #[test]
    fn load_and_save_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("haproxy.cfg");
        fs::write(&path, SAMPLE).unwrap();

        let mut cfg = TextConfig::new();
        cfg.load_data(&path).unwrap();
        cfg.delete::<BindRecord>(SectionKind::Frontend, "web", 0).unwrap();
        cfg.save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# _version=3\n"));
        assert!(!text.contains("name http\n"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = TextConfig::new();
        let err = cfg.load_data(&dir.path().join("absent.cfg")).unwrap_err();
        assert!(matches!(err, ParserError::Io(_)));
    }
}
