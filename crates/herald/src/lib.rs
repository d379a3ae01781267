//! herald - layout-inheritance templates rendered in two phases
//!
//! A template may `extend` a layout partial and fill its named `content`
//! blocks. Rendering runs in two phases:
//!
//! 1. every content block collected along the layout chain is rendered
//!    against the caller's data;
//! 2. the rendered text is injected back into the template, which is then
//!    rendered again with no data at all.
//!
//! The result carries both the composed document and the individual block
//! fragments, so a caller can either send the full markup or let a remote
//! service apply the layout itself.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//!
//! let herald = herald::Herald::builder()
//!     .partial("base", "<h1>{{#content 'title'}}{{/content}}</h1>")
//!     .build()
//!     .into_herald();
//!
//! let result = herald
//!     .render(
//!         "{{#extend 'base'}}{{#content 'title'}}Hello {{name}}{{/content}}{{/extend}}",
//!         json!({"name": "Ada"}),
//!     )
//!     .unwrap();
//!
//! assert_eq!(result.full, "<h1>Hello Ada</h1>");
//! assert_eq!(result.parts["title"], "Hello Ada");
//! ```

pub mod compose;
pub mod context;
pub mod error;
pub mod helpers;
pub mod html_escape;
pub mod layout;
pub mod notification;
pub mod partial_loader;
pub mod registry;
pub mod renderer;
pub mod value;

pub use error::{HelperError, HeraldError, Result};
pub use helpers::{LinkOptions, Palette, SubdomainType, Translate};
pub use herald_ast::{Location, ParseError, Template};
pub use layout::{ContentBlockMap, Resolution};
pub use notification::{
    build_attributes, NotificationAttributes, NotificationPayload, NotificationView,
};
pub use partial_loader::PartialLoader;
pub use registry::{Helper, HelperCall, Registry, RegistryBuilder, COZY_LAYOUT};
pub use renderer::Renderer;
pub use value::Value;

use context::Context;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

/// Output of one render call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderResult {
    /// The fully composed document.
    pub full: String,
    /// Block name to its phase-1 output, in layout walk order.
    pub parts: IndexMap<String, String>,
}

/// Entry point: renders templates against a shared registry.
///
/// Cloning is cheap and clones share the registry.
#[derive(Debug, Clone)]
pub struct Herald {
    registry: Arc<Registry>,
}

impl Herald {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Parse `source` and resolve its layout chain without rendering.
    pub fn resolve(&self, source: &str) -> Result<Resolution> {
        let template = herald_ast::parse(source)?;
        layout::resolve(template, &self.registry)
    }

    /// Render `source` with `data`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use serde_json::json;
    ///
    /// let herald = herald::Herald::default();
    /// let result = herald.render("{{palette 'white'}}", json!({})).unwrap();
    /// assert_eq!(result.full, "#FFFFFF");
    /// assert!(result.parts.is_empty());
    /// ```
    pub fn render(&self, source: &str, data: serde_json::Value) -> Result<RenderResult> {
        let resolution = self.resolve(source)?;
        let mut renderer = Renderer::new(&self.registry);

        let mut context = Context::new(Value::from_json(data));
        let parts = renderer.render_blocks(&resolution.content_blocks, &mut context)?;
        tracing::debug!(
            chain_length = resolution.chain.len(),
            blocks = parts.len(),
            "content blocks rendered"
        );

        let composed = compose::inject(&resolution.template, &parts);
        let full = renderer.render_composed(&composed)?;
        tracing::debug!(bytes = full.len(), "template composed");

        Ok(RenderResult { full, parts })
    }
}

impl Default for Herald {
    fn default() -> Self {
        Self::new(Registry::builder().build())
    }
}

impl From<Registry> for Herald {
    fn from(registry: Registry) -> Self {
        Self::new(registry)
    }
}

/// Convenience function: render with the built-in registry.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
///
/// let result = herald::render(
///     "{{#extend 'cozy-layout'}}{{#content 'emailTitle'}}Hi {{name}}{{/content}}{{/extend}}",
///     json!({"name": "Ada"}),
/// )
/// .unwrap();
///
/// assert!(result.full.contains("Hi Ada"));
/// assert_eq!(result.parts["emailTitle"], "Hi Ada");
/// ```
pub fn render(source: &str, data: serde_json::Value) -> Result<RenderResult> {
    Herald::default().render(source, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_herald_reuse() {
        let herald = Herald::builder()
            .partial("base", "[{{#content 'a'}}{{/content}}]")
            .build()
            .into_herald();
        let source = "{{#extend 'base'}}{{#content 'a'}}{{name}}{{/content}}{{/extend}}";

        assert_eq!(herald.render(source, json!({"name": "Alice"})).unwrap().full, "[Alice]");
        assert_eq!(herald.render(source, json!({"name": "Bob"})).unwrap().full, "[Bob]");
    }

    #[test]
    fn test_herald_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<Herald>();
    }
}
