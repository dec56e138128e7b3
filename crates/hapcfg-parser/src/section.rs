use std::fmt;

/// The kinds of section a configuration file can contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Global,
    Defaults,
    Frontend,
    Backend,
    Listen,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        Self::Global,
        Self::Defaults,
        Self::Frontend,
        Self::Backend,
        Self::Listen,
    ];

    /// The keyword that opens a section of this kind.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Defaults => "defaults",
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::Listen => "listen",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.keyword() == keyword)
    }

    /// Whether sections of this kind must carry a name.
    pub fn is_named(&self) -> bool {
        !matches!(self, Self::Global | Self::Defaults)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
