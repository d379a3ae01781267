//! Renderer for evaluating herald templates.
//!
//! The same tree walker serves both phases. Phase 1 renders content block
//! bodies with a data [`Context`]; phase 2 renders the composed template
//! with none, so any data lookup there fails with
//! [`HeraldError::MissingContext`].
//!
//! In phase 1 a missing path renders as an empty string, the way
//! Handlebars treats `undefined`, unless the registry was built with
//! strict variables.

use crate::context::Context;
use crate::error::{HeraldError, Result};
use crate::html_escape;
use crate::layout::ContentBlockMap;
use crate::registry::{HelperCall, Registry};
use crate::value::Value;
use herald_ast::{
    BlockNode, EachBlock, ExpressionNode, IfBlock, IncludeNode, LayoutNode, Literal, Location,
    Node, Param, Path, Template, UnlessBlock,
};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Block name to the body that replaces it while rendering a layout.
type Overrides<'a> = HashMap<&'a str, &'a [Node]>;

/// Tree walker over one registry.
pub struct Renderer<'r> {
    registry: &'r Registry,
    include_stack: Vec<String>,
    layout_stack: Vec<String>,
}

impl<'r> Renderer<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            include_stack: Vec::new(),
            layout_stack: Vec::new(),
        }
    }

    /// Phase 1: render every block body against `context`, in map order.
    ///
    /// Stops at the first failing block.
    pub fn render_blocks(
        &mut self,
        blocks: &ContentBlockMap,
        context: &mut Context,
    ) -> Result<IndexMap<String, String>> {
        let mut rendered = IndexMap::with_capacity(blocks.len());
        for (name, body) in blocks {
            let text = self.render_nodes(body, Some(&mut *context), &Overrides::new())?;
            tracing::trace!(block = %name, bytes = text.len(), "block rendered");
            rendered.insert(name.clone(), text);
        }
        Ok(rendered)
    }

    /// Phase 2: render a composed template without data.
    pub fn render_composed(&mut self, template: &Template) -> Result<String> {
        self.render_nodes(template.nodes(), None, &Overrides::new())
    }

    /// Render a whole template against `context`.
    pub fn render_with_context(&mut self, template: &Template, context: &mut Context) -> Result<String> {
        self.render_nodes(template.nodes(), Some(context), &Overrides::new())
    }

    fn render_nodes<'a>(
        &mut self,
        nodes: &'a [Node],
        mut ctx: Option<&mut Context>,
        overrides: &Overrides<'a>,
    ) -> Result<String> {
        let mut output = String::new();

        for node in nodes {
            let rendered = match node {
                Node::Text(n) => {
                    output.push_str(&n.content);
                    continue;
                }
                Node::Expression(n) => self.render_expression(n, ctx.as_deref())?,
                Node::Layout(n) => self.render_layout(n, ctx.as_deref_mut(), overrides)?,
                Node::Block(n) => self.render_block(n, ctx.as_deref_mut(), overrides)?,
                Node::If(n) => self.render_if(n, ctx.as_deref_mut(), overrides)?,
                Node::Unless(n) => self.render_unless(n, ctx.as_deref_mut(), overrides)?,
                Node::Each(n) => self.render_each(n, ctx.as_deref_mut(), overrides)?,
                Node::Include(n) => self.render_include(n, ctx.as_deref_mut())?,
            };
            output.push_str(&rendered);
        }

        Ok(output)
    }

    /// Render the extended partial with this layout's blocks as overrides.
    ///
    /// Overrides handed down from a nearer template take precedence over
    /// the blocks declared here. Anything in the layout body that is not a
    /// block produces no output.
    fn render_layout<'a>(
        &mut self,
        layout: &'a LayoutNode,
        ctx: Option<&mut Context>,
        inherited: &Overrides<'a>,
    ) -> Result<String> {
        if self.layout_stack.contains(&layout.partial) {
            let mut chain = self.layout_stack.clone();
            chain.push(layout.partial.clone());
            return Err(HeraldError::CyclicLayout { chain });
        }

        let parent = self.registry.parse_partial(&layout.partial)?;

        let mut overrides: Overrides<'_> = layout
            .blocks()
            .map(|block| (block.name.as_str(), block.body.as_slice()))
            .collect();
        overrides.extend(inherited.iter().map(|(name, body)| (*name, *body)));

        self.layout_stack.push(layout.partial.clone());
        let result = self.render_nodes(parent.nodes(), ctx, &overrides);
        self.layout_stack.pop();
        result
    }

    fn render_block<'a>(
        &mut self,
        block: &'a BlockNode,
        ctx: Option<&mut Context>,
        overrides: &Overrides<'a>,
    ) -> Result<String> {
        match overrides.get(block.name.as_str()).copied() {
            Some(body) => {
                // The override may itself contain a block of the same name.
                let mut rest = overrides.clone();
                rest.remove(block.name.as_str());
                self.render_nodes(body, ctx, &rest)
            }
            None => self.render_nodes(&block.body, ctx, overrides),
        }
    }

    fn render_expression(&self, node: &ExpressionNode, ctx: Option<&Context>) -> Result<String> {
        let raw = self.evaluate(node, ctx)?;
        if node.escaped {
            Ok(html_escape::escape(&raw).into_owned())
        } else {
            Ok(raw)
        }
    }

    /// Helper call when the name is a registered helper, variable otherwise.
    fn evaluate(&self, node: &ExpressionNode, ctx: Option<&Context>) -> Result<String> {
        if let Some(name) = node.path.as_simple() {
            if let Some(helper) = self.registry.helper(name) {
                let params = node
                    .params
                    .iter()
                    .map(|param| self.resolve_param(param, ctx, node.location))
                    .collect::<Result<Vec<_>>>()?;
                let hash = node
                    .hash
                    .iter()
                    .map(|arg| {
                        self.resolve_param(&arg.value, ctx, arg.location)
                            .map(|value| (arg.key.clone(), value))
                    })
                    .collect::<Result<IndexMap<_, _>>>()?;

                tracing::trace!(helper = name, "calling helper");
                let call = HelperCall::new(name, params, hash, ctx);
                return Ok(helper.call(&call)?);
            }
        }

        if !node.is_bare() {
            return Err(HeraldError::MissingHelper {
                name: node.path.as_str(),
                location: node.location,
            });
        }

        let ctx = ctx.ok_or_else(|| HeraldError::MissingContext {
            expression: node.path.as_str(),
            location: node.location,
        })?;
        match self.lookup(ctx, &node.path)? {
            Some(value) => value.stringify(),
            None => Ok(String::new()),
        }
    }

    fn lookup<'c>(&self, ctx: &'c Context, path: &Path) -> Result<Option<&'c Value>> {
        if self.registry.strict_variables() {
            ctx.resolve(path).map(Some)
        } else {
            Ok(ctx.lookup(path))
        }
    }

    /// Value of a helper argument or include binding.
    fn resolve_param(&self, param: &Param, ctx: Option<&Context>, location: Location) -> Result<Value> {
        match param {
            Param::Literal(literal) => Ok(literal_value(literal)),
            Param::Path(path) => {
                let ctx = ctx.ok_or_else(|| HeraldError::MissingContext {
                    expression: path.as_str(),
                    location,
                })?;
                Ok(self.lookup(ctx, path)?.cloned().unwrap_or(Value::Null))
            }
        }
    }

    fn render_if<'a>(
        &mut self,
        node: &'a IfBlock,
        ctx: Option<&mut Context>,
        overrides: &Overrides<'a>,
    ) -> Result<String> {
        let value = section_value(&node.condition, ctx.as_deref(), node.location)?;

        if value.is_truthy() {
            self.render_nodes(&node.then_branch, ctx, overrides)
        } else if let Some(else_branch) = &node.else_branch {
            self.render_nodes(else_branch, ctx, overrides)
        } else {
            Ok(String::new())
        }
    }

    fn render_unless<'a>(
        &mut self,
        node: &'a UnlessBlock,
        ctx: Option<&mut Context>,
        overrides: &Overrides<'a>,
    ) -> Result<String> {
        let value = section_value(&node.condition, ctx.as_deref(), node.location)?;

        if !value.is_truthy() {
            self.render_nodes(&node.body, ctx, overrides)
        } else if let Some(else_branch) = &node.else_branch {
            self.render_nodes(else_branch, ctx, overrides)
        } else {
            Ok(String::new())
        }
    }

    fn render_each<'a>(
        &mut self,
        node: &'a EachBlock,
        ctx: Option<&mut Context>,
        overrides: &Overrides<'a>,
    ) -> Result<String> {
        let collection = section_value(&node.collection, ctx.as_deref(), node.location)?;
        let items: Vec<(Option<String>, Value)> = match collection {
            Value::Array(items) => items.into_iter().map(|item| (None, item)).collect(),
            Value::Object(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
            other if !other.is_truthy() => Vec::new(),
            other => {
                return Err(HeraldError::TypeError {
                    message: format!(
                        "Cannot iterate over {} '{}' at {}",
                        other.type_name(),
                        node.collection,
                        node.location
                    ),
                })
            }
        };

        if items.is_empty() {
            return match &node.else_branch {
                Some(else_branch) => self.render_nodes(else_branch, ctx, overrides),
                None => Ok(String::new()),
            };
        }

        let Some(ctx) = ctx else {
            return Err(HeraldError::MissingContext {
                expression: node.collection.to_string(),
                location: node.location,
            });
        };

        let len = items.len();
        let mut output = String::new();
        for (index, (key, item)) in items.into_iter().enumerate() {
            let bindings = iteration_bindings(node, index, len, key, &item);

            ctx.push_iteration(item, bindings);
            let result = self.render_nodes(&node.body, Some(&mut *ctx), overrides);
            ctx.pop_scope();

            output.push_str(&result?);
        }

        Ok(output)
    }

    fn render_include(&mut self, node: &IncludeNode, ctx: Option<&mut Context>) -> Result<String> {
        if self.include_stack.contains(&node.name) {
            return Err(HeraldError::CyclicInclude {
                name: node.name.clone(),
            });
        }

        let partial = self.registry.parse_partial(&node.name)?;
        let bindings = node
            .hash
            .iter()
            .map(|arg| {
                self.resolve_param(&arg.value, ctx.as_deref(), arg.location)
                    .map(|value| (arg.key.clone(), value))
            })
            .collect::<Result<HashMap<_, _>>>()?;

        self.include_stack.push(node.name.clone());
        let result = match ctx {
            Some(ctx) => {
                ctx.push_scope(bindings);
                let result = self.render_nodes(partial.nodes(), Some(&mut *ctx), &Overrides::new());
                ctx.pop_scope();
                result
            }
            None => self.render_nodes(partial.nodes(), None, &Overrides::new()),
        };
        self.include_stack.pop();

        result
    }
}

fn iteration_bindings(
    node: &EachBlock,
    index: usize,
    len: usize,
    key: Option<String>,
    item: &Value,
) -> HashMap<String, Value> {
    let position = Value::Integer(index as i64);
    let mut bindings = HashMap::new();
    bindings.insert("@index".to_string(), position.clone());
    bindings.insert("@first".to_string(), Value::Bool(index == 0));
    bindings.insert("@last".to_string(), Value::Bool(index + 1 == len));

    let second = match key {
        Some(key) => {
            let key = Value::String(key);
            bindings.insert("@key".to_string(), key.clone());
            key
        }
        None => position,
    };

    if let Some(name) = node.block_params.first() {
        bindings.insert(name.clone(), item.clone());
    }
    if let Some(name) = node.block_params.get(1) {
        bindings.insert(name.clone(), second);
    }
    bindings
}

/// Value of a section condition or collection. Missing paths are null.
fn section_value(param: &Param, ctx: Option<&Context>, location: Location) -> Result<Value> {
    match param {
        Param::Literal(literal) => Ok(literal_value(literal)),
        Param::Path(path) => {
            let ctx = ctx.ok_or_else(|| HeraldError::MissingContext {
                expression: path.as_str(),
                location,
            })?;
            Ok(ctx.lookup(path).cloned().unwrap_or(Value::Null))
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::String(s) => Value::String(s.clone()),
        Literal::Integer(n) => Value::Integer(*n),
        Literal::Float(n) => Value::Float(*n),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    }
}
