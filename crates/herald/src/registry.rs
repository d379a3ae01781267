//! Helper and partial registry.
//!
//! A [`Registry`] is assembled once by [`RegistryBuilder::build`], which
//! merges the built-in tables with caller-supplied partials and helpers
//! (caller entries win). After that it only hands out shared references,
//! so one instance can back any number of concurrent render calls.

use crate::context::Context;
use crate::error::{HelperError, HeraldError, Result};
use crate::helpers::{self, LinkOptions, Palette, Translate};
use crate::value::Value;
use crate::Herald;
use herald_ast::Template;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Name of the built-in e-mail layout partial.
pub const COZY_LAYOUT: &str = "cozy-layout";

const COZY_LAYOUT_SOURCE: &str = include_str!("../layouts/cozy-layout.hbs");
const DEFAULT_STYLESHEET: &str = include_str!("../layouts/style.css");

/// Arguments of a single helper invocation, already resolved to values.
pub struct HelperCall<'a> {
    name: &'a str,
    params: Vec<Value>,
    hash: IndexMap<String, Value>,
    context: Option<&'a Context>,
}

impl<'a> HelperCall<'a> {
    pub fn new(
        name: &'a str,
        params: Vec<Value>,
        hash: IndexMap<String, Value>,
        context: Option<&'a Context>,
    ) -> Self {
        Self {
            name,
            params,
            hash,
            context,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn param(&self, index: usize) -> Option<&Value> {
        self.params.get(index)
    }

    pub fn hash(&self) -> &IndexMap<String, Value> {
        &self.hash
    }

    pub fn hash_str(&self, key: &str) -> Option<&str> {
        self.hash.get(key).and_then(Value::as_str)
    }

    /// The data context, when the helper runs during phase 1.
    pub fn context(&self) -> Option<&Context> {
        self.context
    }

    /// Positional string argument, or a helper error naming the position.
    pub fn str_param(&self, index: usize) -> std::result::Result<&str, HelperError> {
        self.param(index).and_then(Value::as_str).ok_or_else(|| {
            HelperError::new(
                self.name,
                format!("expects a string argument at position {index}"),
            )
        })
    }
}

/// A named template function.
pub trait Helper: Send + Sync {
    fn call(&self, call: &HelperCall<'_>) -> std::result::Result<String, HelperError>;
}

impl<F> Helper for F
where
    F: Fn(&HelperCall<'_>) -> std::result::Result<String, HelperError> + Send + Sync,
{
    fn call(&self, call: &HelperCall<'_>) -> std::result::Result<String, HelperError> {
        self(call)
    }
}

/// Immutable set of partials and helpers used by a render call.
pub struct Registry {
    partials: IndexMap<String, String>,
    helpers: IndexMap<String, Arc<dyn Helper>>,
    strict_variables: bool,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn partial(&self, name: &str) -> Option<&str> {
        self.partials.get(name).map(String::as_str)
    }

    pub fn partial_names(&self) -> impl Iterator<Item = &str> {
        self.partials.keys().map(String::as_str)
    }

    pub fn helper(&self, name: &str) -> Option<&dyn Helper> {
        self.helpers.get(name).map(|helper| helper.as_ref())
    }

    pub fn helper_names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(String::as_str)
    }

    /// Whether a missing variable is an error instead of empty output.
    pub fn strict_variables(&self) -> bool {
        self.strict_variables
    }

    /// Wrap this registry in a [`Herald`] renderer.
    pub fn into_herald(self) -> Herald {
        Herald::new(self)
    }

    /// Parse a partial's source, failing when the name is unknown.
    pub fn parse_partial(&self, name: &str) -> Result<Template> {
        let source = self
            .partial(name)
            .ok_or_else(|| HeraldError::UnresolvedPartial {
                name: name.to_string(),
            })?;
        tracing::trace!(partial = name, "parsing partial");
        Ok(herald_ast::parse(source)?)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("partials", &self.partials.keys().collect::<Vec<_>>())
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .field("strict_variables", &self.strict_variables)
            .finish()
    }
}

/// Collects caller partials, caller helpers and built-in configuration.
#[derive(Clone)]
pub struct RegistryBuilder {
    partials: IndexMap<String, String>,
    helpers: IndexMap<String, Arc<dyn Helper>>,
    palette: Palette,
    stylesheet: String,
    links: Option<LinkOptions>,
    translator: Option<Arc<dyn Translate>>,
    lang: Option<String>,
    strict_variables: bool,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            partials: IndexMap::new(),
            helpers: IndexMap::new(),
            palette: Palette::default(),
            stylesheet: DEFAULT_STYLESHEET.to_string(),
            links: None,
            translator: None,
            lang: None,
            strict_variables: false,
        }
    }

    pub fn partial(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.partials.insert(name.into(), source.into());
        self
    }

    pub fn partials<I, K, V>(mut self, partials: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.partials
            .extend(partials.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn helper(mut self, name: impl Into<String>, helper: impl Helper + 'static) -> Self {
        self.helpers.insert(name.into(), Arc::new(helper));
        self
    }

    pub fn shared_helper(mut self, name: impl Into<String>, helper: Arc<dyn Helper>) -> Self {
        self.helpers.insert(name.into(), helper);
        self
    }

    /// Register a closure helper; the closure's argument type is inferred.
    pub fn helper_fn<F>(self, name: impl Into<String>, helper: F) -> Self
    where
        F: Fn(&HelperCall<'_>) -> std::result::Result<String, HelperError> + Send + Sync + 'static,
    {
        self.helper(name, helper)
    }

    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn stylesheet(mut self, stylesheet: impl Into<String>) -> Self {
        self.stylesheet = stylesheet.into();
        self
    }

    /// Enables the `webLink` and `universalLink` helpers.
    pub fn links(mut self, options: LinkOptions) -> Self {
        self.links = Some(options);
        self
    }

    /// Enables the `t` helper.
    pub fn translator(mut self, translator: impl Translate + 'static) -> Self {
        self.translator = Some(Arc::new(translator));
        self
    }

    /// Enables the `tGlobal` helper for one of the built-in locales.
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Fail with [`HeraldError::UndefinedVariable`] when an output tag or
    /// helper argument names a missing path. Off by default, where such a
    /// path renders as an empty string.
    pub fn strict_variables(mut self, strict: bool) -> Self {
        self.strict_variables = strict;
        self
    }

    pub fn build(self) -> Registry {
        let builtin_partials =
            IndexMap::from([(COZY_LAYOUT.to_string(), COZY_LAYOUT_SOURCE.to_string())]);
        let builtin_helpers = helpers::builtins(
            self.palette,
            self.stylesheet,
            self.links,
            self.translator,
            self.lang,
        );

        let registry = Registry {
            partials: merge(builtin_partials, self.partials),
            helpers: merge(builtin_helpers, self.helpers),
            strict_variables: self.strict_variables,
        };
        tracing::debug!(
            partials = registry.partials.len(),
            helpers = registry.helpers.len(),
            "registry built"
        );
        registry
    }
}

/// Caller entries override built-ins of the same name.
fn merge<V>(builtins: IndexMap<String, V>, user: IndexMap<String, V>) -> IndexMap<String, V> {
    let mut merged = builtins;
    merged.extend(user);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_helper(registry: &Registry, name: &str, params: Vec<Value>) -> String {
        let call = HelperCall::new(name, params, IndexMap::new(), None);
        registry.helper(name).unwrap().call(&call).unwrap()
    }

    #[test]
    fn test_builtins_are_present() {
        let registry = Registry::builder().build();
        assert!(registry.partial(COZY_LAYOUT).is_some());
        assert!(registry.helper("palette").is_some());
        assert!(registry.helper("stylesheet").is_some());
        // Optional built-ins stay off until configured.
        assert!(registry.helper("t").is_none());
        assert!(registry.helper("webLink").is_none());
        assert!(registry.helper("tGlobal").is_none());
        assert!(!registry.strict_variables());
    }

    #[test]
    fn test_lang_enables_global_translations() {
        let registry = Registry::builder().lang("fr").build();
        assert!(registry.helper("tGlobal").is_some());
    }

    #[test]
    fn test_user_helper_shadows_builtin() {
        let registry = Registry::builder()
            .helper_fn("palette", |_call| Ok("overridden".to_string()))
            .build();
        assert_eq!(
            call_helper(&registry, "palette", vec![Value::from("white")]),
            "overridden"
        );
    }

    #[test]
    fn test_user_partial_shadows_builtin() {
        let registry = Registry::builder()
            .partial(COZY_LAYOUT, "custom")
            .partial("extra", "x")
            .build();
        assert_eq!(registry.partial(COZY_LAYOUT), Some("custom"));
        assert_eq!(registry.partial("extra"), Some("x"));
    }

    #[test]
    fn test_missing_partial_is_not_a_build_error() {
        let registry = Registry::builder().build();
        assert!(matches!(
            registry.parse_partial("missing"),
            Err(HeraldError::UnresolvedPartial { ref name }) if name == "missing"
        ));
    }

    #[test]
    fn test_str_param_reports_position() {
        let call = HelperCall::new("palette", vec![Value::Integer(1)], IndexMap::new(), None);
        let err = call.str_param(0).unwrap_err();
        assert_eq!(err.helper, "palette");
        assert!(err.message.contains("position 0"));
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
