//! Error types for the herald rendering engine.

use thiserror::Error;

pub use herald_ast::{Location, ParseError};

/// All errors that can occur while composing and rendering a template.
///
/// Every variant is fatal for the render call that produced it: there is no
/// partial output and no retry.
#[derive(Error, Debug)]
pub enum HeraldError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] ParseError),

    #[error("Cannot find partial {name}")]
    UnresolvedPartial { name: String },

    #[error("Cyclic layout chain: {}", chain.join(" -> "))]
    CyclicLayout { chain: Vec<String> },

    #[error("Cyclic include of partial {name}")]
    CyclicInclude { name: String },

    #[error(transparent)]
    Helper(#[from] HelperError),

    #[error("Missing helper '{name}' at {location}")]
    MissingHelper { name: String, location: Location },

    #[error("'{expression}' at {location} needs a data context but none is available")]
    MissingContext {
        expression: String,
        location: Location,
    },

    /// Only raised by registries built with strict variables.
    #[error("Undefined variable '{name}' at {location}")]
    UndefinedVariable { name: String, location: Location },

    #[error("Type error: {message}")]
    TypeError { message: String },

    #[error("Partial load error: {message}")]
    PartialLoad { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Failure raised by a helper function.
///
/// Lookup-style helpers fill `available` with every name they know so the
/// message tells the template author what they could have written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Helper '{helper}' failed: {message}")]
pub struct HelperError {
    pub helper: String,
    pub argument: Option<String>,
    pub available: Vec<String>,
    pub message: String,
}

impl HelperError {
    pub fn new(helper: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            helper: helper.into(),
            argument: None,
            available: Vec::new(),
            message: message.into(),
        }
    }

    /// A lookup miss: `argument` is not among `available` in `what`.
    pub fn not_found(
        helper: impl Into<String>,
        argument: impl Into<String>,
        what: &str,
        available: Vec<String>,
    ) -> Self {
        let argument = argument.into();
        let message = format!(
            "Cannot find {argument} in {what}. Available vars {}",
            available.join(", ")
        );
        Self {
            helper: helper.into(),
            argument: Some(argument),
            available,
            message,
        }
    }
}

/// Result type alias for herald operations
pub type Result<T> = std::result::Result<T, HeraldError>;
