//! On-disk form of the `bind` directive.
//!
//! ```text
//! bind <path> [option ...]
//! ```
//!
//! `path` is `address[:port]` or a filesystem socket path. Options are either
//! a bare word (`ssl`) or a keyword followed by exactly one value
//! (`crt /etc/ssl/site.pem`). Which keywords take a value is fixed by the
//! proxy's grammar; everything else is a word.

use crate::directive::Directive;
use crate::error::{ParserError, ParserResult};

/// Bind option keywords that consume the following token as their value.
const VALUE_OPTIONS: &[&str] = &[
    "accept-netscaler-cip",
    "alpn",
    "backlog",
    "ca-file",
    "ca-ignore-err",
    "ca-sign-file",
    "ca-sign-pass",
    "ciphers",
    "ciphersuites",
    "crl-file",
    "crt",
    "crt-ignore-err",
    "crt-list",
    "curves",
    "ecdhe",
    "gid",
    "group",
    "id",
    "interface",
    "level",
    "maxconn",
    "mode",
    "mss",
    "name",
    "namespace",
    "nice",
    "npn",
    "process",
    "severity-output",
    "ssl-max-ver",
    "ssl-min-ver",
    "tcp-ut",
    "tls-ticket-keys",
    "uid",
    "user",
    "verify",
];

/// One option on a bind line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindOption {
    /// A bare flag such as `ssl` or `transparent`.
    Word(String),
    /// A keyword with a value such as `name web` or `crt /path.pem`.
    Value { name: String, value: String },
}

impl BindOption {
    pub fn word(name: impl Into<String>) -> Self {
        Self::Word(name.into())
    }

    pub fn value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Value {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Word(name) | Self::Value { name, .. } => name,
        }
    }

    /// Whether `keyword` takes a value on a bind line.
    pub fn takes_value(keyword: &str) -> bool {
        VALUE_OPTIONS.contains(&keyword)
    }
}

/// A parsed `bind` line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindRecord {
    /// The `address[:port]` or socket path token.
    pub path: String,
    pub options: Vec<BindOption>,
}

impl BindRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            options: Vec::new(),
        }
    }
}

impl Directive for BindRecord {
    const KEYWORD: &'static str = "bind";

    fn from_args(args: &[&str]) -> ParserResult<Self> {
        let invalid = |reason: String| ParserError::InvalidDirective {
            line: format!("{} {}", Self::KEYWORD, args.join(" ")),
            reason,
        };

        let (path, rest) = args
            .split_first()
            .ok_or_else(|| invalid("missing address".into()))?;

        let mut options = Vec::new();
        let mut tokens = rest.iter();
        while let Some(token) = tokens.next() {
            if BindOption::takes_value(token) {
                let value = tokens
                    .next()
                    .ok_or_else(|| invalid(format!("option {token:?} requires a value")))?;
                options.push(BindOption::value(*token, *value));
            } else {
                options.push(BindOption::word(*token));
            }
        }

        Ok(Self {
            path: path.to_string(),
            options,
        })
    }

    fn validate(&self) -> ParserResult<()> {
        for option in &self.options {
            let consistent = match option {
                BindOption::Word(name) => !BindOption::takes_value(name),
                BindOption::Value { name, .. } => BindOption::takes_value(name),
            };
            if !consistent {
                return Err(ParserError::InvalidDirective {
                    line: self.to_line(),
                    reason: format!("option {:?} has the wrong arity", option.name()),
                });
            }
        }
        for arg in self.to_args() {
            if arg.is_empty() || arg.chars().any(char::is_whitespace) {
                return Err(ParserError::InvalidDirective {
                    line: self.to_line(),
                    reason: format!("argument {arg:?} is not a single token"),
                });
            }
        }
        Ok(())
    }

    fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(1 + self.options.len() * 2);
        args.push(self.path.clone());
        for option in &self.options {
            match option {
                BindOption::Word(name) => args.push(name.clone()),
                BindOption::Value { name, value } => {
                    args.push(name.clone());
                    args.push(value.clone());
                }
            }
        }
        args
    }
}
