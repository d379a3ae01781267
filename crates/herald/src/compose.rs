//! Re-injection of rendered block text into the template tree.

use herald_ast::{BlockNode, Node, Template};
use indexmap::IndexMap;

/// Return a copy of `template` whose layout blocks hold `rendered` text.
///
/// For each entry the last direct block of that name inside the top-level
/// layout gets a single text node as its body. Names with no such block
/// are appended to the layout as new blocks, in map order. A template
/// without a layout comes back unchanged.
pub fn inject(template: &Template, rendered: &IndexMap<String, String>) -> Template {
    let mut composed = template.clone();
    let Some(layout) = composed.layout_mut() else {
        return composed;
    };

    for (name, text) in rendered {
        let body = vec![Node::text(text.clone())];
        match layout.block_mut(name) {
            Some(block) => block.body = body,
            None => layout
                .body
                .push(Node::Block(BlockNode::new(name.clone(), body))),
        }
    }

    tracing::debug!(blocks = rendered.len(), "rendered blocks injected");
    composed
}
