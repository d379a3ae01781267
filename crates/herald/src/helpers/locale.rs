//! Built-in locales behind the `tGlobal` helper.
//!
//! Unlike `t`, which asks the caller's translator, `tGlobal` reads strings
//! shipped with the crate, so shared layouts can be translated without
//! every notification providing the same keys.

use crate::error::HelperError;
use crate::registry::{Helper, HelperCall};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::sync::LazyLock;

/// Used when no language is set or the language has no built-in table.
pub const DEFAULT_LANG: &str = "en";

static LOCALES: LazyLock<IndexMap<&'static str, JsonValue>> = LazyLock::new(|| {
    [
        ("en", include_str!("../../locales/en.json")),
        ("fr", include_str!("../../locales/fr.json")),
    ]
    .into_iter()
    .map(|(lang, source)| {
        let table = serde_json::from_str(source).expect("built-in locale is valid JSON");
        (lang, table)
    })
    .collect()
});

/// Languages with a built-in table.
pub fn builtin_langs() -> impl Iterator<Item = &'static str> {
    LOCALES.keys().copied()
}

/// Look up a dotted `key` in the built-in table for `lang`.
///
/// Returns `None` when the key is missing or does not name a string.
pub fn global_translation(lang: &str, key: &str) -> Option<&'static str> {
    let table = LOCALES.get(lang).or_else(|| LOCALES.get(DEFAULT_LANG))?;
    key.split('.')
        .try_fold(table, |node, segment| node.get(segment))?
        .as_str()
}

pub(crate) struct GlobalTranslateHelper {
    lang: String,
}

impl GlobalTranslateHelper {
    pub(crate) fn new(lang: String) -> Self {
        Self { lang }
    }
}

impl Helper for GlobalTranslateHelper {
    fn call(&self, call: &HelperCall<'_>) -> Result<String, HelperError> {
        let key = call.str_param(0)?;
        match global_translation(&self.lang, key) {
            Some(text) => Ok(text.to_string()),
            None => {
                tracing::trace!(lang = %self.lang, key, "no built-in translation");
                Ok(String::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn call(helper: &GlobalTranslateHelper, key: &str) -> String {
        let call = HelperCall::new("tGlobal", vec![Value::from(key)], IndexMap::new(), None);
        helper.call(&call).unwrap()
    }

    #[test]
    fn test_lookup_by_dotted_key() {
        assert_eq!(global_translation("en", "footer.unsubscribe"), Some("Unsubscribe"));
        assert_eq!(global_translation("fr", "footer.unsubscribe"), Some("Se désabonner"));
    }

    #[test]
    fn test_unknown_lang_falls_back_to_english() {
        assert_eq!(global_translation("de", "actions.open"), Some("Open"));
    }

    #[test]
    fn test_missing_or_non_string_key() {
        assert_eq!(global_translation("en", "footer.nope"), None);
        assert_eq!(global_translation("en", "footer"), None);
    }

    #[test]
    fn test_helper_renders_missing_key_as_empty() {
        let helper = GlobalTranslateHelper::new("fr".to_string());
        assert_eq!(call(&helper, "actions.open"), "Ouvrir");
        assert_eq!(call(&helper, "actions.missing"), "");
    }

    #[test]
    fn test_every_builtin_lang_has_the_same_keys() {
        fn keys(node: &JsonValue, prefix: &str, out: &mut Vec<String>) {
            if let Some(map) = node.as_object() {
                for (key, child) in map {
                    keys(child, &format!("{prefix}{key}."), out);
                }
            } else {
                out.push(prefix.trim_end_matches('.').to_string());
            }
        }
        let mut reference = Vec::new();
        keys(&LOCALES[DEFAULT_LANG], "", &mut reference);
        for lang in builtin_langs() {
            let mut found = Vec::new();
            keys(&LOCALES[lang], "", &mut found);
            assert_eq!(found, reference, "locale {lang}");
        }
    }
}
