//! Data context for variable resolution during phase-1 rendering.

use crate::error::{HeraldError, Result};
use crate::value::Value;
use herald_ast::Path;
use std::collections::HashMap;

/// Read-only lookup scope built from the caller's data.
///
/// Sections and includes push frames on top of the root value; a frame
/// may rebind `this` (inside `each`) and carries named bindings (block
/// params, `@index`, include arguments).
pub struct Context {
    root: Value,
    frames: Vec<Frame>,
}

struct Frame {
    this: Option<Value>,
    bindings: HashMap<String, Value>,
}

impl Context {
    /// Create a new context from root data
    pub fn new(root: Value) -> Self {
        Self {
            root,
            frames: Vec::new(),
        }
    }

    /// The current `this`: the innermost iteration item, or the root.
    pub fn this(&self) -> &Value {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.this.as_ref())
            .unwrap_or(&self.root)
    }

    /// Resolve a path, failing when any segment is missing.
    pub fn resolve(&self, path: &Path) -> Result<&Value> {
        self.lookup(path)
            .ok_or_else(|| HeraldError::UndefinedVariable {
                name: path.as_str(),
                location: path.location(),
            })
    }

    /// Resolve a path, returning `None` when any segment is missing.
    ///
    /// A bare first segment is looked up among the bindings of every open
    /// scope (block params, `@index`, include arguments), then on the
    /// current `this` only. `../` segments step out to the `this` of an
    /// enclosing iteration.
    pub fn lookup(&self, path: &Path) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;

        let mut value = if path.parents() > 0 {
            let scope = self.enclosing(path.parents())?;
            if first == "this" {
                scope
            } else {
                scope.as_object()?.get(first)?
            }
        } else if first == "this" {
            self.this()
        } else {
            self.lookup_name(first)?
        };

        for segment in rest {
            value = value.as_object()?.get(segment)?;
        }

        Some(value)
    }

    /// Push a scope with named bindings (include arguments).
    pub fn push_scope(&mut self, bindings: HashMap<String, Value>) {
        self.frames.push(Frame {
            this: None,
            bindings,
        });
    }

    /// Push a scope for one `each` iteration.
    pub fn push_iteration(&mut self, item: Value, bindings: HashMap<String, Value>) {
        self.frames.push(Frame {
            this: Some(item),
            bindings,
        });
    }

    /// Pop the current scope
    pub fn pop_scope(&mut self) {
        self.frames.pop();
    }

    fn lookup_name(&self, name: &str) -> Option<&Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(name))
            .or_else(|| self.this().as_object()?.get(name))
    }

    /// `this` of the iteration `depth` levels out; the root is outermost.
    fn enclosing(&self, depth: usize) -> Option<&Value> {
        self.frames
            .iter()
            .rev()
            .filter_map(|frame| frame.this.as_ref())
            .chain(std::iter::once(&self.root))
            .nth(depth)
    }
}
