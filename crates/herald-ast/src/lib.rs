//! AST for herald templates.
//!
//! Templates use a Handlebars-flavoured syntax. Two block directives carry
//! the layout-inheritance structure:
//!
//! - `{{#extend 'partial'}} ... {{/extend}}` declares the layout a template
//!   builds on ([`LayoutNode`]).
//! - `{{#content 'name'}} ... {{/content}}` declares a named, overridable
//!   region ([`BlockNode`]).
//!
//! Everything else (text, expressions, sections, partial includes) is
//! ordinary template content.

use thiserror::Error;

mod lexer;
mod parser;
pub mod token;

// ============================================================================
// Location
// ============================================================================

/// Location in source code (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

impl Location {
    pub fn new(line: usize, column: usize, byte_offset: usize) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

// ============================================================================
// AST Nodes
// ============================================================================

/// A parsed template: the root of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
    location: Location,
}

impl Template {
    pub fn new(nodes: Vec<Node>, location: Location) -> Self {
        Self { nodes, location }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// The top-level `extend` directive, if the template declares one.
    pub fn layout(&self) -> Option<&LayoutNode> {
        self.nodes.iter().find_map(|node| match node {
            Node::Layout(layout) => Some(layout),
            _ => None,
        })
    }

    pub fn layout_mut(&mut self) -> Option<&mut LayoutNode> {
        self.nodes.iter_mut().find_map(|node| match node {
            Node::Layout(layout) => Some(layout),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(TextNode),
    Expression(ExpressionNode),
    Layout(LayoutNode),
    Block(BlockNode),
    If(IfBlock),
    Unless(UnlessBlock),
    Each(EachBlock),
    Include(IncludeNode),
}

impl Node {
    /// A literal text node with no source location.
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(TextNode {
            content: content.into(),
            location: Location::default(),
        })
    }

    pub fn location(&self) -> Location {
        match self {
            Node::Text(n) => n.location,
            Node::Expression(n) => n.location,
            Node::Layout(n) => n.location,
            Node::Block(n) => n.location,
            Node::If(n) => n.location,
            Node::Unless(n) => n.location,
            Node::Each(n) => n.location,
            Node::Include(n) => n.location,
        }
    }
}

/// Raw text content.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub content: String,
    pub location: Location,
}

/// Output tag: `{{ path }}`, `{{ helper arg key=value }}` or the raw
/// `{{{ ... }}}` forms.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionNode {
    pub path: Path,
    pub params: Vec<Param>,
    pub hash: Vec<HashArg>,
    pub escaped: bool,
    pub location: Location,
}

impl ExpressionNode {
    /// True when the tag is a bare path with no arguments.
    pub fn is_bare(&self) -> bool {
        self.params.is_empty() && self.hash.is_empty()
    }
}

/// Layout directive: `{{#extend 'partial'}} ... {{/extend}}`
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub partial: String,
    pub body: Vec<Node>,
    pub location: Location,
}

impl LayoutNode {
    /// Content blocks declared directly inside this layout body.
    pub fn blocks(&self) -> impl Iterator<Item = &BlockNode> {
        self.body.iter().filter_map(|node| match node {
            Node::Block(block) => Some(block),
            _ => None,
        })
    }

    /// The last direct content block called `name`.
    pub fn block_mut(&mut self, name: &str) -> Option<&mut BlockNode> {
        self.body.iter_mut().rev().find_map(|node| match node {
            Node::Block(block) if block.name == name => Some(block),
            _ => None,
        })
    }
}

/// Content block directive: `{{#content 'name'}} ... {{/content}}`
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub name: String,
    pub body: Vec<Node>,
    pub location: Location,
}

impl BlockNode {
    pub fn new(name: impl Into<String>, body: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            body,
            location: Location::default(),
        }
    }
}

/// Conditional section: `{{#if cond}} ... {{else}} ... {{/if}}`
#[derive(Debug, Clone, PartialEq)]
pub struct IfBlock {
    pub condition: Param,
    pub then_branch: Vec<Node>,
    pub else_branch: Option<Vec<Node>>,
    pub location: Location,
}

/// Inverse conditional section: `{{#unless cond}} ... {{/unless}}`
#[derive(Debug, Clone, PartialEq)]
pub struct UnlessBlock {
    pub condition: Param,
    pub body: Vec<Node>,
    pub else_branch: Option<Vec<Node>>,
    pub location: Location,
}

/// Loop section: `{{#each items}} ... {{/each}}` or
/// `{{#each items as |item index|}} ... {{/each}}`
#[derive(Debug, Clone, PartialEq)]
pub struct EachBlock {
    pub collection: Param,
    pub block_params: Vec<String>,
    pub body: Vec<Node>,
    pub else_branch: Option<Vec<Node>>,
    pub location: Location,
}

/// Partial include: `{{> name key=value}}`
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeNode {
    pub name: String,
    pub hash: Vec<HashArg>,
    pub location: Location,
}

/// Hash argument: `key=value`
#[derive(Debug, Clone, PartialEq)]
pub struct HashArg {
    pub key: String,
    pub value: Param,
    pub location: Location,
}

/// An argument: either a literal or a path into the data context.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Literal(Literal),
    Path(Path),
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Param::Literal(literal) => write!(f, "{literal}"),
            Param::Path(path) => write!(f, "{}", path.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{s}'"),
            Literal::Integer(n) => write!(f, "{n}"),
            Literal::Float(n) => write!(f, "{n}"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Null => f.write_str("null"),
        }
    }
}

/// A dot-separated path (e.g., user.profile.name, this, @index), optionally
/// prefixed by `../` segments that climb to enclosing iteration scopes.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    segments: Vec<String>,
    parents: usize,
    location: Location,
}

impl Path {
    pub fn new(segments: Vec<String>, location: Location) -> Self {
        Self {
            segments,
            parents: 0,
            location,
        }
    }

    pub fn with_parents(mut self, parents: usize) -> Self {
        self.parents = parents;
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of leading `../` segments.
    pub fn parents(&self) -> usize {
        self.parents
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Single-segment name, used for helper lookup.
    pub fn as_simple(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [name] if self.parents == 0 => Some(name.as_str()),
            _ => None,
        }
    }

    /// Returns the path as written, e.g. `../user.name`.
    pub fn as_str(&self) -> String {
        format!("{}{}", "../".repeat(self.parents), self.segments.join("."))
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected character '{found}' at line {line}, column {column}")]
    UnexpectedCharacter {
        found: char,
        line: usize,
        column: usize,
    },

    #[error("unterminated {what} starting at line {line}, column {column}")]
    Unterminated {
        what: &'static str,
        line: usize,
        column: usize,
    },

    #[error("{message} at line {line}, column {column}")]
    UnexpectedToken {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("unknown block directive '{name}' at line {line}, column {column}")]
    UnknownDirective {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("block '{name}' opened at line {line}, column {column} is never closed")]
    UnclosedBlock {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("'{{{{/{found}}}}}' does not close '{expected}' at line {line}, column {column}")]
    MismatchedClose {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },

    #[error("{message} at line {line}, column {column}")]
    InvalidLayout {
        message: String,
        line: usize,
        column: usize,
    },
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a template source string into an AST.
pub fn parse(source: &str) -> Result<Template, ParseError> {
    let tokens = lexer::tokenize(source)?;
    parser::parse(tokens)
}
