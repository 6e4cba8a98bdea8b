use core::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    UnexpectedToken { found: String, expected: &'static str },
    UnexpectedCharacter(char),
    UnterminatedString,
    InvalidInteger(String),
    PositionalAfterKeyword,
    DuplicateKeyword(String),
}

impl ParseError {
    pub(crate) fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;
        match &self.kind {
            ParseErrorKind::UnexpectedToken { found, expected } => {
                write!(f, "unexpected {found}, expected {expected}")
            }
            ParseErrorKind::UnexpectedCharacter(ch) => write!(f, "unexpected character {ch:?}"),
            ParseErrorKind::UnterminatedString => write!(f, "unterminated string"),
            ParseErrorKind::InvalidInteger(text) => write!(f, "invalid integer literal {text}"),
            ParseErrorKind::PositionalAfterKeyword => {
                write!(f, "positional argument after keyword arguments")
            }
            ParseErrorKind::DuplicateKeyword(name) => {
                write!(f, "keyword argument '{name}' given more than once")
            }
        }
    }
}

impl core::error::Error for ParseError {}
