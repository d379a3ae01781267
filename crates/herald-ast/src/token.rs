//! Token types for the herald lexer.

use crate::Location;

/// Token types produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Raw text content outside tags.
    Text,
    /// `{{` - escaped tag open
    Open,
    /// `{{{` - raw tag open
    OpenRaw,
    /// `}}` - escaped tag close
    Close,
    /// `}}}` - raw tag close
    CloseRaw,
    /// `#` - block open marker
    Hash,
    /// `/` - block close marker or partial path separator
    Slash,
    /// `>` - partial include marker
    Gt,
    /// `=` - hash argument separator
    Equal,
    /// `.` - path separator
    Dot,
    /// `|` - block parameter delimiter
    Pipe,
    /// Quoted string literal; the value holds the unescaped contents
    Str,
    /// Numeric literal
    Number,
    /// Identifier: [A-Za-z_@][A-Za-z0-9_-]*
    Ident,
    /// Whitespace (spaces, tabs, newlines) inside tags
    Whitespace,
    /// End of file
    Eof,
}

impl TokenType {
    /// Fixed source text of punctuation tokens.
    pub fn literal(self) -> Option<&'static str> {
        match self {
            TokenType::Open => Some("{{"),
            TokenType::OpenRaw => Some("{{{"),
            TokenType::Close => Some("}}"),
            TokenType::CloseRaw => Some("}}}"),
            TokenType::Hash => Some("#"),
            TokenType::Slash => Some("/"),
            TokenType::Gt => Some(">"),
            TokenType::Equal => Some("="),
            TokenType::Dot => Some("."),
            TokenType::Pipe => Some("|"),
            _ => None,
        }
    }
}

/// A token with its type, value, and location.
#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub location: Location,
}

impl Token {
    pub fn new(token_type: TokenType, value: impl Into<String>, location: Location) -> Self {
        Self {
            token_type,
            value: value.into(),
            location,
        }
    }
}
