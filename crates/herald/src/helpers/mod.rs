//! Built-in helpers.

mod links;
mod locale;
mod palette;
mod stylesheet;
mod translate;

pub use links::{universal_link, web_link, LinkOptions, SubdomainType};
pub use locale::{builtin_langs, global_translation, DEFAULT_LANG};
pub use palette::Palette;
pub use stylesheet::resolve_css_properties;
pub use translate::Translate;

use crate::registry::Helper;
use indexmap::IndexMap;
use links::{LinkHelper, LinkKind};
use locale::GlobalTranslateHelper;
use palette::PaletteHelper;
use std::sync::Arc;
use stylesheet::StylesheetHelper;
use translate::TranslateHelper;

/// The built-in helper table for one registry.
///
/// `palette` and `stylesheet` are always present; the others only when
/// their collaborators are configured (see [`configured`]).
pub(crate) fn builtins(
    palette: Palette,
    stylesheet: String,
    links: Option<LinkOptions>,
    translator: Option<Arc<dyn Translate>>,
    lang: Option<String>,
) -> IndexMap<String, Arc<dyn Helper>> {
    let mut table: IndexMap<String, Arc<dyn Helper>> = IndexMap::new();
    table.insert("palette".into(), Arc::new(PaletteHelper::new(palette)));
    table.insert(
        "stylesheet".into(),
        Arc::new(StylesheetHelper::new(stylesheet)),
    );
    table.extend(configured(links, translator, lang));
    table
}

/// `webLink`/`universalLink` when `links` is set, `t` when a translator
/// is set and `tGlobal` when a language is set.
pub(crate) fn configured(
    links: Option<LinkOptions>,
    translator: Option<Arc<dyn Translate>>,
    lang: Option<String>,
) -> IndexMap<String, Arc<dyn Helper>> {
    let mut table: IndexMap<String, Arc<dyn Helper>> = IndexMap::new();

    if let Some(options) = links {
        table.insert(
            "webLink".into(),
            Arc::new(LinkHelper::new(options.clone(), LinkKind::Web)),
        );
        table.insert(
            "universalLink".into(),
            Arc::new(LinkHelper::new(options, LinkKind::Universal)),
        );
    }

    if let Some(translator) = translator {
        table.insert("t".into(), Arc::new(TranslateHelper::new(translator)));
    }

    if let Some(lang) = lang {
        table.insert("tGlobal".into(), Arc::new(GlobalTranslateHelper::new(lang)));
    }

    table
}
