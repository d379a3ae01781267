//! Recursive descent parser for herald templates.
//!
//! Consumes the lexer's token stream and produces a [`Template`]. Purely
//! syntactic: partial names, helpers and paths are not resolved here.

use crate::token::{Token, TokenType};
use crate::{
    BlockNode, EachBlock, ExpressionNode, HashArg, IfBlock, IncludeNode, LayoutNode, Literal,
    Location, Node, Param, ParseError, Path, Template, TextNode, UnlessBlock,
};

/// Parse a token stream into an AST Template.
pub fn parse(tokens: Vec<Token>) -> Result<Template, ParseError> {
    let mut parser = Parser::new(tokens);
    parser.parse()
}

const EXTEND: &str = "extend";
const CONTENT: &str = "content";
const ELSE: &str = "else";

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    seen_layout: bool,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            seen_layout: false,
        }
    }

    fn parse(&mut self) -> Result<Template, ParseError> {
        let nodes = self.parse_nodes()?;
        if self.current_type() != TokenType::Eof {
            return if self.is_else_tag() {
                self.unexpected_token(Some("'else' outside of a section"))
            } else {
                let loc = self.current_location();
                let name = self.peek_close_name().unwrap_or_default();
                Err(ParseError::UnexpectedToken {
                    message: format!("Unexpected block close '{name}'"),
                    line: loc.line,
                    column: loc.column,
                })
            };
        }
        Ok(Template::new(nodes, Location::new(1, 1, 0)))
    }

    fn parse_nodes(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        while self.current_type() != TokenType::Eof && !self.is_block_close() && !self.is_else_tag()
        {
            nodes.push(self.parse_node()?);
        }
        Ok(nodes)
    }

    fn parse_node(&mut self) -> Result<Node, ParseError> {
        match self.current_type() {
            TokenType::Text => {
                let token = self.consume(TokenType::Text)?;
                Ok(Node::Text(TextNode {
                    content: token.value,
                    location: token.location,
                }))
            }
            TokenType::Open => self.parse_tag(),
            TokenType::OpenRaw => self.parse_raw_expression(),
            _ => self.unexpected_token(None),
        }
    }

    fn parse_tag(&mut self) -> Result<Node, ParseError> {
        let open = self.consume(TokenType::Open)?;
        self.skip_whitespace();

        match self.current_type() {
            TokenType::Hash => self.parse_block_open(open.location),
            TokenType::Gt => self.parse_include(open.location),
            _ => {
                let node = self.parse_expression(true, open.location, TokenType::Close)?;
                Ok(Node::Expression(node))
            }
        }
    }

    fn parse_raw_expression(&mut self) -> Result<Node, ParseError> {
        let open = self.consume(TokenType::OpenRaw)?;
        self.skip_whitespace();
        let node = self.parse_expression(false, open.location, TokenType::CloseRaw)?;
        Ok(Node::Expression(node))
    }

    fn parse_block_open(&mut self, location: Location) -> Result<Node, ParseError> {
        self.consume(TokenType::Hash)?;
        self.skip_whitespace();

        let keyword = self.consume_ident("Expected block name after '#'")?;
        match keyword.value.as_str() {
            EXTEND => self.parse_layout(location),
            CONTENT => self.parse_content(location),
            "if" => self.parse_if_block(location),
            "unless" => self.parse_unless_block(location),
            "each" => self.parse_each_block(location),
            other => Err(ParseError::UnknownDirective {
                name: other.to_string(),
                line: keyword.location.line,
                column: keyword.location.column,
            }),
        }
    }

    // ========================================================================
    // Layout directives
    // ========================================================================

    fn parse_layout(&mut self, location: Location) -> Result<Node, ParseError> {
        if self.depth > 0 {
            return Err(ParseError::InvalidLayout {
                message: "'extend' must appear at the top level of a template".to_string(),
                line: location.line,
                column: location.column,
            });
        }
        if self.seen_layout {
            return Err(ParseError::InvalidLayout {
                message: "a template can extend only one layout".to_string(),
                line: location.line,
                column: location.column,
            });
        }
        self.seen_layout = true;

        let partial = self.parse_directive_name(EXTEND)?;
        let body = self.parse_body()?;
        self.consume_block_close(EXTEND, location)?;

        Ok(Node::Layout(LayoutNode {
            partial,
            body,
            location,
        }))
    }

    fn parse_content(&mut self, location: Location) -> Result<Node, ParseError> {
        let name = self.parse_directive_name(CONTENT)?;
        let body = self.parse_body()?;
        self.consume_block_close(CONTENT, location)?;

        Ok(Node::Block(BlockNode {
            name,
            body,
            location,
        }))
    }

    /// `'name'}}` after an `extend` or `content` keyword.
    fn parse_directive_name(&mut self, keyword: &str) -> Result<String, ParseError> {
        self.consume_required_whitespace()?;
        let loc = self.current_location();
        if self.current_type() != TokenType::Str {
            return Err(ParseError::UnexpectedToken {
                message: format!("'{keyword}' expects a quoted name"),
                line: loc.line,
                column: loc.column,
            });
        }
        let name = self.consume(TokenType::Str)?.value;
        self.skip_whitespace();
        if self.current_type() != TokenType::Close {
            return self.unexpected_token(Some(&format!("'{keyword}' takes a single name")));
        }
        self.consume(TokenType::Close)?;
        Ok(name)
    }

    // ========================================================================
    // Sections
    // ========================================================================

    fn parse_if_block(&mut self, location: Location) -> Result<Node, ParseError> {
        self.consume_required_whitespace()?;
        let condition = self.parse_param()?;
        self.skip_whitespace();
        self.consume(TokenType::Close)?;

        let then_branch = self.parse_body()?;
        let else_branch = self.parse_else_branch()?;
        self.consume_block_close("if", location)?;

        Ok(Node::If(IfBlock {
            condition,
            then_branch,
            else_branch,
            location,
        }))
    }

    fn parse_unless_block(&mut self, location: Location) -> Result<Node, ParseError> {
        self.consume_required_whitespace()?;
        let condition = self.parse_param()?;
        self.skip_whitespace();
        self.consume(TokenType::Close)?;

        let body = self.parse_body()?;
        let else_branch = self.parse_else_branch()?;
        self.consume_block_close("unless", location)?;

        Ok(Node::Unless(UnlessBlock {
            condition,
            body,
            else_branch,
            location,
        }))
    }

    fn parse_each_block(&mut self, location: Location) -> Result<Node, ParseError> {
        self.consume_required_whitespace()?;
        let collection = self.parse_param()?;
        self.skip_whitespace();

        let mut block_params = Vec::new();
        if self.current_type() == TokenType::Ident && self.current_value() == "as" {
            self.advance();
            self.skip_whitespace();
            self.consume(TokenType::Pipe)?;
            self.skip_whitespace();
            while self.current_type() == TokenType::Ident {
                block_params.push(self.consume(TokenType::Ident)?.value);
                self.skip_whitespace();
            }
            if block_params.is_empty() {
                return self.unexpected_token(Some("Expected block parameter name"));
            }
            self.consume(TokenType::Pipe)?;
            self.skip_whitespace();
        }
        self.consume(TokenType::Close)?;

        let body = self.parse_body()?;
        let else_branch = self.parse_else_branch()?;
        self.consume_block_close("each", location)?;

        Ok(Node::Each(EachBlock {
            collection,
            block_params,
            body,
            else_branch,
            location,
        }))
    }

    fn parse_body(&mut self) -> Result<Vec<Node>, ParseError> {
        self.depth += 1;
        let nodes = self.parse_nodes();
        self.depth -= 1;
        nodes
    }

    fn parse_else_branch(&mut self) -> Result<Option<Vec<Node>>, ParseError> {
        if !self.is_else_tag() {
            return Ok(None);
        }
        self.consume(TokenType::Open)?;
        self.skip_whitespace();
        self.consume(TokenType::Ident)?;
        self.skip_whitespace();
        self.consume(TokenType::Close)?;
        Ok(Some(self.parse_body()?))
    }

    // ========================================================================
    // Includes and expressions
    // ========================================================================

    fn parse_include(&mut self, location: Location) -> Result<Node, ParseError> {
        self.consume(TokenType::Gt)?;
        self.skip_whitespace();

        let name = match self.current_type() {
            TokenType::Str => self.consume(TokenType::Str)?.value,
            TokenType::Ident => {
                let mut name = self.consume(TokenType::Ident)?.value;
                while self.current_type() == TokenType::Slash {
                    self.advance();
                    name.push('/');
                    name.push_str(&self.consume_ident("Expected partial name segment")?.value);
                }
                name
            }
            _ => return self.unexpected_token(Some("Expected partial name")),
        };

        let (params, hash) = self.parse_arguments(TokenType::Close)?;
        if !params.is_empty() {
            return Err(ParseError::UnexpectedToken {
                message: format!("Partial '{name}' only accepts key=value arguments"),
                line: location.line,
                column: location.column,
            });
        }
        self.consume(TokenType::Close)?;

        Ok(Node::Include(IncludeNode {
            name,
            hash,
            location,
        }))
    }

    fn parse_expression(
        &mut self,
        escaped: bool,
        location: Location,
        close: TokenType,
    ) -> Result<ExpressionNode, ParseError> {
        let path = self.parse_path()?;
        let (params, hash) = self.parse_arguments(close)?;
        self.consume(close)?;

        Ok(ExpressionNode {
            path,
            params,
            hash,
            escaped,
            location,
        })
    }

    /// Positional params followed by `key=value` pairs, up to `close`.
    fn parse_arguments(
        &mut self,
        close: TokenType,
    ) -> Result<(Vec<Param>, Vec<HashArg>), ParseError> {
        let mut params = Vec::new();
        let mut hash: Vec<HashArg> = Vec::new();

        while self.current_type() == TokenType::Whitespace {
            self.skip_whitespace();
            if self.current_type() == close {
                break;
            }

            if self.is_hash_arg() {
                let key_token = self.consume(TokenType::Ident)?;
                self.consume(TokenType::Equal)?;
                if hash.iter().any(|arg| arg.key == key_token.value) {
                    return Err(ParseError::UnexpectedToken {
                        message: format!("Duplicate argument: {}", key_token.value),
                        line: key_token.location.line,
                        column: key_token.location.column,
                    });
                }
                let value = self.parse_param()?;
                hash.push(HashArg {
                    key: key_token.value,
                    value,
                    location: key_token.location,
                });
            } else if hash.is_empty() {
                params.push(self.parse_param()?);
            } else {
                return self.unexpected_token(Some("Positional argument after key=value"));
            }
        }

        Ok((params, hash))
    }

    fn parse_param(&mut self) -> Result<Param, ParseError> {
        let token = self
            .current_token()
            .cloned()
            .unwrap_or_else(|| Token::new(TokenType::Eof, "", Location::default()));

        match token.token_type {
            TokenType::Str => {
                self.advance();
                Ok(Param::Literal(Literal::String(token.value)))
            }
            TokenType::Number => {
                self.advance();
                parse_number(&token).map(Param::Literal)
            }
            TokenType::Ident => match token.value.as_str() {
                "true" => {
                    self.advance();
                    Ok(Param::Literal(Literal::Bool(true)))
                }
                "false" => {
                    self.advance();
                    Ok(Param::Literal(Literal::Bool(false)))
                }
                "null" => {
                    self.advance();
                    Ok(Param::Literal(Literal::Null))
                }
                _ => Ok(Param::Path(self.parse_path()?)),
            },
            TokenType::Dot => Ok(Param::Path(self.parse_path()?)),
            _ => self.unexpected_token(Some("Expected argument")),
        }
    }

    fn parse_path(&mut self) -> Result<Path, ParseError> {
        let location = self.current_location();
        let mut parents = 0;
        while self.current_type() == TokenType::Dot && self.type_at(self.pos + 1) == TokenType::Dot {
            self.consume(TokenType::Dot)?;
            self.consume(TokenType::Dot)?;
            if self.current_type() != TokenType::Slash {
                return self.unexpected_token(Some("Expected '/' after '..'"));
            }
            self.consume(TokenType::Slash)?;
            parents += 1;
        }

        let first = self.consume_ident("Expected identifier")?;
        let mut segments = vec![first.value];

        while self.current_type() == TokenType::Dot {
            self.consume(TokenType::Dot)?;
            segments.push(self.consume_ident("Expected identifier after '.'")?.value);
        }

        Ok(Path::new(segments, location).with_parents(parents))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn is_hash_arg(&self) -> bool {
        self.current_type() == TokenType::Ident
            && self.type_at(self.pos + 1) == TokenType::Equal
    }

    /// `{{/` with optional whitespace before the slash.
    fn is_block_close(&self) -> bool {
        self.current_type() == TokenType::Open
            && self.type_at(self.skip_whitespace_from(self.pos + 1)) == TokenType::Slash
    }

    /// `{{else}}` with optional surrounding whitespace.
    fn is_else_tag(&self) -> bool {
        if self.current_type() != TokenType::Open {
            return false;
        }
        let p = self.skip_whitespace_from(self.pos + 1);
        let is_else = self.type_at(p) == TokenType::Ident
            && self.tokens.get(p).map(|t| t.value.as_str()) == Some(ELSE);
        is_else && self.type_at(self.skip_whitespace_from(p + 1)) == TokenType::Close
    }

    fn peek_close_name(&self) -> Option<String> {
        let p = self.skip_whitespace_from(self.pos + 1);
        let p = self.skip_whitespace_from(p + 1);
        self.tokens.get(p).map(|t| t.value.clone())
    }

    fn consume_block_close(&mut self, keyword: &str, opened_at: Location) -> Result<(), ParseError> {
        if self.current_type() == TokenType::Eof {
            return Err(ParseError::UnclosedBlock {
                name: keyword.to_string(),
                line: opened_at.line,
                column: opened_at.column,
            });
        }
        if self.is_else_tag() {
            return self.unexpected_token(Some(&format!("'else' is not allowed in '{keyword}'")));
        }

        let close_loc = self.current_location();
        self.consume(TokenType::Open)?;
        self.skip_whitespace();
        self.consume(TokenType::Slash)?;
        self.skip_whitespace();
        let name = self.consume_ident("Expected block name after '/'")?;
        if name.value != keyword {
            return Err(ParseError::MismatchedClose {
                expected: keyword.to_string(),
                found: name.value,
                line: close_loc.line,
                column: close_loc.column,
            });
        }
        self.skip_whitespace();
        self.consume(TokenType::Close)?;
        Ok(())
    }

    fn skip_whitespace_from(&self, mut p: usize) -> usize {
        while self.type_at(p) == TokenType::Whitespace {
            p += 1;
        }
        p
    }

    fn type_at(&self, p: usize) -> TokenType {
        self.tokens
            .get(p)
            .map(|t| t.token_type)
            .unwrap_or(TokenType::Eof)
    }

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn current_type(&self) -> TokenType {
        self.type_at(self.pos)
    }

    fn current_value(&self) -> &str {
        self.current_token().map(|t| t.value.as_str()).unwrap_or("")
    }

    fn current_location(&self) -> Location {
        self.current_token()
            .map(|t| t.location)
            .unwrap_or_default()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn consume(&mut self, expected: TokenType) -> Result<Token, ParseError> {
        let token = self.current_token().cloned();
        match token {
            Some(t) if t.token_type == expected => {
                self.advance();
                Ok(t)
            }
            Some(t) if t.token_type == TokenType::Eof => Err(ParseError::UnexpectedToken {
                message: format!("Expected {:?}, got end of input", expected),
                line: t.location.line,
                column: t.location.column,
            }),
            Some(t) => Err(ParseError::UnexpectedToken {
                message: format!("Expected {:?}, got {:?}", expected, t.token_type),
                line: t.location.line,
                column: t.location.column,
            }),
            None => Err(ParseError::UnexpectedToken {
                message: format!("Expected {:?}, got end of input", expected),
                line: 0,
                column: 0,
            }),
        }
    }

    fn consume_ident(&mut self, message: &str) -> Result<Token, ParseError> {
        if self.current_type() != TokenType::Ident {
            return self.unexpected_token(Some(message));
        }
        self.consume(TokenType::Ident)
    }

    fn consume_required_whitespace(&mut self) -> Result<(), ParseError> {
        if self.current_type() != TokenType::Whitespace {
            let loc = self.current_location();
            return Err(ParseError::UnexpectedToken {
                message: "Expected whitespace".to_string(),
                line: loc.line,
                column: loc.column,
            });
        }
        self.skip_whitespace();
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while self.current_type() == TokenType::Whitespace {
            self.advance();
        }
    }

    fn unexpected_token<T>(&self, message: Option<&str>) -> Result<T, ParseError> {
        let loc = self.current_location();
        let msg = match (message, self.current_token()) {
            (Some(m), Some(t)) => format!("{}: {:?}", m, t.token_type),
            (Some(m), None) => m.to_string(),
            (None, Some(t)) => format!("Unexpected token: {:?}", t.token_type),
            (None, None) => "Unexpected end of input".to_string(),
        };
        Err(ParseError::UnexpectedToken {
            message: msg,
            line: loc.line,
            column: loc.column,
        })
    }
}

fn parse_number(token: &Token) -> Result<Literal, ParseError> {
    if let Ok(n) = token.value.parse::<i64>() {
        return Ok(Literal::Integer(n));
    }
    token
        .value
        .parse::<f64>()
        .map(Literal::Float)
        .map_err(|_| ParseError::UnexpectedToken {
            message: format!("Invalid number literal '{}'", token.value),
            line: token.location.line,
            column: token.location.column,
        })
}
