//! Named colour constants exposed through the `palette` helper.

use crate::error::HelperError;
use crate::registry::{Helper, HelperCall};
use indexmap::IndexMap;
use serde::Deserialize;

const COZY_PALETTE: &[(&str, &str)] = &[
    ("primaryColor", "#297EF2"),
    ("primaryColorLight", "#5C9DF5"),
    ("primaryContrastTextColor", "#FFFFFF"),
    ("white", "#FFFFFF"),
    ("paleGrey", "#F5F6F7"),
    ("silver", "#D6D8DA"),
    ("coolGrey", "#95999D"),
    ("slateGrey", "#5D6165"),
    ("charcoalGrey", "#32363F"),
    ("black", "#000000"),
    ("pomegranate", "#F52D2D"),
    ("emerald", "#35CE68"),
    ("texasRose", "#FFAE5F"),
    ("dodgerBlue", "#297EF2"),
];

/// Colour name to CSS value. Order is kept for error messages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Palette(IndexMap<String, String>);

impl Palette {
    pub fn new(colors: IndexMap<String, String>) -> Self {
        Self(colors)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Like [`Palette::get`], failing with every known name on a miss.
    pub fn lookup(&self, name: &str) -> Result<&str, HelperError> {
        self.get(name).ok_or_else(|| {
            HelperError::not_found("palette", name, "palette", self.names())
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self(
            COZY_PALETTE
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        )
    }
}

pub(crate) struct PaletteHelper {
    palette: Palette,
}

impl PaletteHelper {
    pub(crate) fn new(palette: Palette) -> Self {
        Self { palette }
    }
}

impl Helper for PaletteHelper {
    fn call(&self, call: &HelperCall<'_>) -> Result<String, HelperError> {
        let name = call.str_param(0)?;
        self.palette.lookup(name).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_default_palette_knows_cozy_colors() {
        let palette = Palette::default();
        assert_eq!(palette.get("primaryColor"), Some("#297EF2"));
        assert_eq!(palette.get("charcoalGrey"), Some("#32363F"));
    }

    #[test]
    fn test_unknown_color_lists_known_names() {
        let err = Palette::default().lookup("mauve").unwrap_err();
        assert_eq!(err.argument.as_deref(), Some("mauve"));
        assert!(err.available.contains(&"paleGrey".to_string()));
        assert!(err.message.starts_with("Cannot find mauve in palette. Available vars primaryColor"));
    }

    #[test]
    fn test_deserializes_from_plain_object() {
        let palette: Palette =
            serde_json::from_value(serde_json::json!({"brand": "#123456"})).unwrap();
        assert_eq!(palette.get("brand"), Some("#123456"));
        assert_eq!(palette.get("white"), None);
    }

    #[test]
    fn test_helper_reads_first_argument() {
        let helper = PaletteHelper::new(Palette::default());
        let call = HelperCall::new("palette", vec![Value::from("white")], IndexMap::new(), None);
        assert_eq!(helper.call(&call).unwrap(), "#FFFFFF");
    }
}
