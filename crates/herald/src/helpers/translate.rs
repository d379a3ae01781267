//! The `t` helper, backed by a caller-supplied translator.

use crate::error::HelperError;
use crate::registry::{Helper, HelperCall};
use crate::value::Value;
use indexmap::IndexMap;
use std::sync::Arc;

/// Locale lookup supplied by the caller; backs the `t` helper.
pub trait Translate: Send + Sync {
    fn translate(&self, key: &str, args: &IndexMap<String, Value>) -> String;
}

impl<F> Translate for F
where
    F: Fn(&str, &IndexMap<String, Value>) -> String + Send + Sync,
{
    fn translate(&self, key: &str, args: &IndexMap<String, Value>) -> String {
        self(key, args)
    }
}

pub(crate) struct TranslateHelper {
    translator: Arc<dyn Translate>,
}

impl TranslateHelper {
    pub(crate) fn new(translator: Arc<dyn Translate>) -> Self {
        Self { translator }
    }
}

impl Helper for TranslateHelper {
    fn call(&self, call: &HelperCall<'_>) -> Result<String, HelperError> {
        let key = call.str_param(0)?;
        Ok(self.translator.translate(key, call.hash()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwards_key_and_hash() {
        let translator = |key: &str, args: &IndexMap<String, Value>| {
            let name = args.get("name").and_then(Value::as_str).unwrap_or("?");
            format!("{key}:{name}")
        };
        let helper = TranslateHelper::new(Arc::new(translator));

        let mut hash = IndexMap::new();
        hash.insert("name".to_string(), Value::from("Ada"));
        let call = HelperCall::new("t", vec![Value::from("greeting")], hash, None);
        assert_eq!(helper.call(&call).unwrap(), "greeting:Ada");
    }

    #[test]
    fn test_key_must_be_a_string() {
        let helper = TranslateHelper::new(Arc::new(|key: &str, _: &IndexMap<String, Value>| {
            key.to_string()
        }));
        let call = HelperCall::new("t", Vec::new(), IndexMap::new(), None);
        assert!(helper.call(&call).is_err());
    }
}
