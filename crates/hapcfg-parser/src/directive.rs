use crate::error::{ParserError, ParserResult};

/// A typed directive record stored as one line inside a section.
///
/// A line is the directive's [`KEYWORD`](Directive::KEYWORD) followed by
/// whitespace-separated arguments. Implementors describe how arguments map
/// to fields; the line framing is shared.
pub trait Directive: Sized {
    /// Keyword that starts every line of this directive.
    const KEYWORD: &'static str;

    /// Build a record from the arguments following the keyword.
    fn from_args(args: &[&str]) -> ParserResult<Self>;

    /// The arguments this record renders to, without the keyword.
    fn to_args(&self) -> Vec<String>;

    /// Check that every argument renders as exactly one token.
    ///
    /// A record that fails this would be read back as a different record,
    /// so engines refuse to write it.
    fn validate(&self) -> ParserResult<()> {
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

    /// Parse a whole line, keyword included.
    fn from_line(line: &str) -> ParserResult<Self> {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some(keyword) if keyword == Self::KEYWORD => {
                let args: Vec<&str> = tokens.collect();
                Self::from_args(&args)
            }
            _ => Err(ParserError::InvalidDirective {
                line: line.to_string(),
                reason: format!("expected keyword {:?}", Self::KEYWORD),
            }),
        }
    }

    /// Render the record as a line, keyword included.
    fn to_line(&self) -> String {
        let mut line = Self::KEYWORD.to_string();
        for arg in self.to_args() {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }
}
