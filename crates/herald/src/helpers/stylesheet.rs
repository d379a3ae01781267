//! CSS custom-property resolution for the `stylesheet` helper.
//!
//! E-mail clients ignore `var(--x)`, so the stylesheet is inlined with
//! every reference replaced by a concrete value before it reaches MJML.

use crate::error::HelperError;
use crate::registry::{Helper, HelperCall};
use crate::value::Value;
use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(--[A-Za-z0-9_-]+)\s*:\s*([^;}]+)").expect("declaration pattern is valid")
});

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var\(\s*(--[A-Za-z0-9_-]+)\s*\)").expect("reference pattern is valid")
});

/// Replace every `var(--name)` in `css`.
///
/// Values come from `overrides` first, then from the custom properties
/// declared in `css` itself. A declared value may reference one other
/// variable. Any reference left after that is an error naming it.
pub fn resolve_css_properties(
    css: &str,
    overrides: &IndexMap<String, String>,
) -> Result<String, HelperError> {
    let mut known: IndexMap<String, String> = DECLARATION
        .captures_iter(css)
        .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
        .collect();
    for (name, value) in overrides {
        known.insert(name.clone(), value.clone());
    }

    let once = substitute(css, &known);
    let resolved = substitute(&once, &known);

    if let Some(caps) = REFERENCE.captures(&resolved) {
        let mut names: Vec<String> = known.keys().cloned().collect();
        names.sort();
        return Err(HelperError::not_found(
            "stylesheet",
            &caps[1],
            "stylesheet",
            names,
        ));
    }
    Ok(resolved)
}

fn substitute(css: &str, known: &IndexMap<String, String>) -> String {
    REFERENCE
        .replace_all(css, |caps: &Captures<'_>| match known.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn property_name(key: &str) -> String {
    if key.starts_with("--") {
        key.to_string()
    } else {
        format!("--{key}")
    }
}

pub(crate) struct StylesheetHelper {
    css: String,
}

impl StylesheetHelper {
    pub(crate) fn new(css: String) -> Self {
        Self { css }
    }
}

impl Helper for StylesheetHelper {
    fn call(&self, call: &HelperCall<'_>) -> Result<String, HelperError> {
        let mut overrides = IndexMap::new();

        match call.param(0) {
            None | Some(Value::Null) => {}
            Some(Value::Object(props)) => {
                for (key, value) in props {
                    overrides.insert(property_name(key), override_value(call, key, value)?);
                }
            }
            Some(other) => {
                return Err(HelperError::new(
                    call.name(),
                    format!("expects an object of overrides, got {}", other.type_name()),
                ))
            }
        }

        for (key, value) in call.hash() {
            overrides.insert(property_name(key), override_value(call, key, value)?);
        }

        resolve_css_properties(&self.css, &overrides)
    }
}

fn override_value(call: &HelperCall<'_>, key: &str, value: &Value) -> Result<String, HelperError> {
    value.stringify().map_err(|_| {
        HelperError::new(
            call.name(),
            format!("override {key} must be a scalar, got {}", value.type_name()),
        )
    })
}
