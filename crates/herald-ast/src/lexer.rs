//! Hand-written lexer for herald templates.
//!
//! Two-mode state machine:
//! - Text mode: accumulates raw text until a `{{` delimiter
//! - Tag mode: tokenizes punctuation, literals and identifiers inside
//!   `{{` ... `}}` (or `{{{` ... `}}}` for raw output)
//!
//! Comments (`{{! ... }}` and `{{!-- ... --}}`) are dropped here and never
//! reach the parser. Escape: `\{{` → `{{` (processed inline as text).

use crate::token::{Token, TokenType};
use crate::{Location, ParseError};

/// Tokenize a source string into a sequence of tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize()
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    in_tag: bool,
    raw: bool,
}

impl<'a> Lexer<'a> {
    const TAG_OPEN: &'static str = "{{";
    const TAG_OPEN_ESCAPE: &'static str = "\\{{";
    const LONG_COMMENT_OPEN: &'static str = "{{!--";
    const LONG_COMMENT_CLOSE: &'static str = "--}}";
    const COMMENT_OPEN: &'static str = "{{!";

    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            col: 1,
            in_tag: false,
            raw: false,
        }
    }

    fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut tag_start = self.location();

        while self.pos < self.source.len() {
            if self.in_tag {
                self.tokenize_tag(&mut tokens)?;
            } else {
                self.tokenize_text(&mut tokens)?;
                tag_start = tokens.last().map(|t| t.location).unwrap_or(tag_start);
            }
        }

        if self.in_tag {
            return Err(ParseError::Unterminated {
                what: "tag",
                line: tag_start.line,
                column: tag_start.column,
            });
        }

        tokens.push(Token::new(TokenType::Eof, "", self.location()));
        Ok(tokens)
    }

    /// Tokenize text mode: accumulate text until `{{`, then open a tag.
    fn tokenize_text(&mut self, tokens: &mut Vec<Token>) -> Result<(), ParseError> {
        let start_loc = self.location();
        let mut text = String::new();
        let mut chunk_start = self.pos;

        while self.pos < self.source.len() {
            if self.looking_at(Self::TAG_OPEN_ESCAPE) {
                text.push_str(&self.source[chunk_start..self.pos]);
                text.push_str(Self::TAG_OPEN);
                self.advance_n(Self::TAG_OPEN_ESCAPE.len());
                chunk_start = self.pos;
                continue;
            }
            if self.looking_at(Self::TAG_OPEN) {
                break;
            }
            self.advance_one();
        }
        text.push_str(&self.source[chunk_start..self.pos]);

        if !text.is_empty() {
            tokens.push(Token::new(TokenType::Text, text, start_loc));
        }

        if !self.looking_at(Self::TAG_OPEN) {
            return Ok(());
        }

        let loc = self.location();
        if self.looking_at(Self::LONG_COMMENT_OPEN) {
            return self.skip_comment(Self::LONG_COMMENT_OPEN, Self::LONG_COMMENT_CLOSE, loc);
        }
        if self.looking_at(Self::COMMENT_OPEN) {
            return self.skip_comment(Self::COMMENT_OPEN, "}}", loc);
        }

        if self.looking_at_token(TokenType::OpenRaw) {
            self.emit_fixed(tokens, TokenType::OpenRaw, loc);
            self.raw = true;
        } else {
            self.emit_fixed(tokens, TokenType::Open, loc);
        }
        self.in_tag = true;
        Ok(())
    }

    fn skip_comment(&mut self, open: &str, close: &str, loc: Location) -> Result<(), ParseError> {
        self.advance_n(open.len());
        while self.pos < self.source.len() {
            if self.looking_at(close) {
                self.advance_n(close.len());
                return Ok(());
            }
            self.advance_one();
        }
        Err(ParseError::Unterminated {
            what: "comment",
            line: loc.line,
            column: loc.column,
        })
    }

    /// Tokenize tag mode: one token per call.
    fn tokenize_tag(&mut self, tokens: &mut Vec<Token>) -> Result<(), ParseError> {
        let loc = self.location();
        let ch = self.source.as_bytes()[self.pos];

        match ch {
            b'}' if self.raw && self.looking_at_token(TokenType::CloseRaw) => {
                self.emit_fixed(tokens, TokenType::CloseRaw, loc);
                self.in_tag = false;
                self.raw = false;
            }
            b'}' if !self.raw && self.looking_at_token(TokenType::Close) => {
                self.emit_fixed(tokens, TokenType::Close, loc);
                self.in_tag = false;
            }
            b'#' => self.emit_fixed(tokens, TokenType::Hash, loc),
            b'/' => self.emit_fixed(tokens, TokenType::Slash, loc),
            b'>' => self.emit_fixed(tokens, TokenType::Gt, loc),
            b'=' => self.emit_fixed(tokens, TokenType::Equal, loc),
            b'.' => self.emit_fixed(tokens, TokenType::Dot, loc),
            b'|' => self.emit_fixed(tokens, TokenType::Pipe, loc),

            b' ' | b'\t' | b'\r' | b'\n' => {
                let start = self.pos;
                while matches!(self.peek_byte(0), Some(b' ' | b'\t' | b'\r' | b'\n')) {
                    self.advance_one();
                }
                let ws_text = &self.source[start..self.pos];
                tokens.push(Token::new(TokenType::Whitespace, ws_text, loc));
            }

            b'\'' | b'"' => {
                let value = self.read_string(ch, loc)?;
                tokens.push(Token::new(TokenType::Str, value, loc));
            }

            b'0'..=b'9' => self.read_number(tokens, loc),
            b'-' if matches!(self.peek_byte(1), Some(b'0'..=b'9')) => self.read_number(tokens, loc),

            b'A'..=b'Z' | b'a'..=b'z' | b'_' | b'@' => {
                let start = self.pos;
                self.advance_one();
                while self.is_ident_continue_at(self.pos) {
                    self.advance_one();
                }
                let ident = &self.source[start..self.pos];
                tokens.push(Token::new(TokenType::Ident, ident, loc));
            }

            _ => {
                let found = self.source[self.pos..].chars().next().unwrap_or('?');
                return Err(ParseError::UnexpectedCharacter {
                    found,
                    line: loc.line,
                    column: loc.column,
                });
            }
        }

        Ok(())
    }

    fn read_string(&mut self, quote: u8, loc: Location) -> Result<String, ParseError> {
        self.advance_one();
        let mut value = String::new();
        loop {
            let Some(ch) = self.source[self.pos..].chars().next() else {
                return Err(ParseError::Unterminated {
                    what: "string",
                    line: loc.line,
                    column: loc.column,
                });
            };
            self.advance_one();
            match ch {
                '\\' => {
                    if let Some(escaped) = self.source[self.pos..].chars().next() {
                        value.push(escaped);
                        self.advance_one();
                    }
                }
                c if c as u32 == quote as u32 => return Ok(value),
                c => value.push(c),
            }
        }
    }

    fn read_number(&mut self, tokens: &mut Vec<Token>, loc: Location) {
        let start = self.pos;
        if self.peek_byte(0) == Some(b'-') {
            self.advance_one();
        }
        while matches!(self.peek_byte(0), Some(b'0'..=b'9')) {
            self.advance_one();
        }
        if self.peek_byte(0) == Some(b'.') && matches!(self.peek_byte(1), Some(b'0'..=b'9')) {
            self.advance_one();
            while matches!(self.peek_byte(0), Some(b'0'..=b'9')) {
                self.advance_one();
            }
        }
        let text = &self.source[start..self.pos];
        tokens.push(Token::new(TokenType::Number, text, loc));
    }

    fn location(&self) -> Location {
        Location::new(self.line, self.col, self.pos)
    }

    /// Check if the source at current position starts with the given text.
    fn looking_at(&self, pattern: &str) -> bool {
        self.source[self.pos..].starts_with(pattern)
    }

    /// Return the fixed literal for a token type.
    fn token_literal(token_type: TokenType) -> &'static str {
        token_type.literal().unwrap_or_default()
    }

    fn looking_at_token(&self, token_type: TokenType) -> bool {
        self.looking_at(Self::token_literal(token_type))
    }

    /// Emit a token with fixed literal text and advance by its byte length.
    fn emit_fixed(&mut self, tokens: &mut Vec<Token>, token_type: TokenType, loc: Location) {
        let literal = Self::token_literal(token_type);
        tokens.push(Token::new(token_type, literal, loc));
        self.advance_n(literal.len());
    }

    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.source.as_bytes().get(self.pos + offset).copied()
    }

    fn is_ident_continue_at(&self, pos: usize) -> bool {
        matches!(
            self.source.as_bytes().get(pos),
            Some(b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-')
        )
    }

    /// Advance by one character, updating line/column tracking.
    fn advance_one(&mut self) {
        let Some(ch) = self.source[self.pos..].chars().next() else {
            return;
        };
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.pos += ch.len_utf8();
    }

    /// Advance by n bytes of ASCII delimiter text.
    fn advance_n(&mut self, n: usize) {
        let target = self.pos + n;
        while self.pos < target {
            self.advance_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(tokens: &[Token]) -> Vec<TokenType> {
        tokens.iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn test_plain_text() {
        let tokens = tokenize("Hello, World!").unwrap();
        assert_eq!(types(&tokens), vec![TokenType::Text, TokenType::Eof]);
        assert_eq!(tokens[0].value, "Hello, World!");
    }

    #[test]
    fn test_non_ascii_text_is_preserved() {
        let tokens = tokenize("Bonjour Zoé, 12 €").unwrap();
        assert_eq!(tokens[0].value, "Bonjour Zoé, 12 €");
    }

    #[test]
    fn test_variable() {
        let tokens = tokenize("{{ name }}").unwrap();
        assert_eq!(
            types(&tokens),
            vec![
                TokenType::Open,
                TokenType::Whitespace,
                TokenType::Ident,
                TokenType::Whitespace,
                TokenType::Close,
                TokenType::Eof,
            ]
        );
        assert_eq!(tokens[2].value, "name");
    }

    #[test]
    fn test_raw_tag() {
        let tokens = tokenize("{{{stylesheet}}}").unwrap();
        assert_eq!(
            types(&tokens),
            vec![
                TokenType::OpenRaw,
                TokenType::Ident,
                TokenType::CloseRaw,
                TokenType::Eof
            ]
        );
    }

    #[test]
    fn test_escape_sequence() {
        let tokens = tokenize("a\\{{b").unwrap();
        assert_eq!(types(&tokens), vec![TokenType::Text, TokenType::Eof]);
        assert_eq!(tokens[0].value, "a{{b");
    }

    #[test]
    fn test_string_literals() {
        let tokens = tokenize(r#"{{#extend 'base'}}{{t "it\"s"}}"#).unwrap();
        let strings: Vec<_> = tokens
            .iter()
            .filter(|t| t.token_type == TokenType::Str)
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(strings, vec!["base", "it\"s"]);
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("{{limit -3 4.5}}").unwrap();
        let numbers: Vec<_> = tokens
            .iter()
            .filter(|t| t.token_type == TokenType::Number)
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(numbers, vec!["-3", "4.5"]);
    }

    #[test]
    fn test_comments_are_dropped() {
        let tokens = tokenize("a{{! short }}b{{!-- has }} inside --}}c").unwrap();
        let text: Vec<_> = tokens
            .iter()
            .filter(|t| t.token_type == TokenType::Text)
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(text, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unterminated_tag() {
        let result = tokenize("Hello {{ name");
        assert!(matches!(
            result,
            Err(ParseError::Unterminated { what: "tag", .. })
        ));
    }

    #[test]
    fn test_unterminated_string() {
        let result = tokenize("{{#content 'title}}");
        assert!(matches!(
            result,
            Err(ParseError::Unterminated { what: "string", .. })
        ));
    }

    #[test]
    fn test_locations_track_lines() {
        let tokens = tokenize("line one\n{{ name }}").unwrap();
        assert_eq!(tokens[1].location.line, 2);
        assert_eq!(tokens[1].location.column, 1);
    }
}
