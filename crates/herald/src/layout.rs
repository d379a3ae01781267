//! Layout chain resolution.
//!
//! Walks `extend` directives upward through the registry's partials and
//! collects the content blocks that must be rendered against data.

use crate::error::{HeraldError, Result};
use crate::registry::Registry;
use herald_ast::{Node, Template};
use indexmap::IndexMap;

/// Block name to block body, in walk order.
///
/// Re-inserting a name keeps its original position and replaces the body,
/// so when two levels define the same block the one further up the chain
/// is kept.
pub type ContentBlockMap = IndexMap<String, Vec<Node>>;

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The template that was resolved, unchanged.
    pub template: Template,
    pub content_blocks: ContentBlockMap,
    /// Partial names, nearest ancestor first.
    pub chain: Vec<String>,
}

/// Follow the `extend` chain starting at `template`.
///
/// Only levels that themselves extend something contribute blocks; the
/// outermost layout's blocks are slots and are left for the final render.
pub fn resolve(template: Template, registry: &Registry) -> Result<Resolution> {
    let mut content_blocks = ContentBlockMap::new();
    let mut chain: Vec<String> = Vec::new();

    let mut next = collect_level(&template, &mut content_blocks);
    while let Some(name) = next {
        if chain.contains(&name) {
            chain.push(name);
            return Err(HeraldError::CyclicLayout { chain });
        }
        let parent = registry.parse_partial(&name)?;
        chain.push(name);
        next = collect_level(&parent, &mut content_blocks);
    }

    tracing::debug!(
        chain = ?chain,
        blocks = ?content_blocks.keys().collect::<Vec<_>>(),
        "layout chain resolved"
    );

    Ok(Resolution {
        template,
        content_blocks,
        chain,
    })
}

/// Record the blocks of `level`'s layout and return the partial it extends.
fn collect_level(level: &Template, content_blocks: &mut ContentBlockMap) -> Option<String> {
    let layout = level.layout()?;
    for block in layout.blocks() {
        content_blocks.insert(block.name.clone(), block.body.clone());
    }
    Some(layout.partial.clone())
}
