//! Notification attributes built from a rendered e-mail.
//!
//! A [`NotificationView`] describes one kind of notification: where its
//! data comes from, which template renders it and how the result is
//! summarised. [`build_attributes`] runs the whole pipeline and returns the
//! attributes of the document a caller posts to the notification service.

use crate::error::Result;
use crate::helpers::{self, LinkOptions, Translate, DEFAULT_LANG};
use crate::registry::{Helper, RegistryBuilder};
use crate::{Herald, RenderResult};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

/// Document type of notifications on the wire.
pub const NOTIFICATIONS_DOCTYPE: &str = "io.cozy.notifications";

/// One kind of notification.
pub trait NotificationView {
    fn category(&self) -> &str;

    /// Template source, usually extending a registered layout.
    fn template(&self) -> &str;

    fn preferred_channels(&self) -> Vec<String> {
        vec!["mail".to_string()]
    }

    /// Data for the template. `None` means there is nothing to notify.
    fn build_data(&self) -> Result<Option<JsonValue>>;

    fn should_send(&self, _data: &JsonValue) -> bool {
        true
    }

    fn title(&self, data: &JsonValue) -> String;

    /// Short text for push channels.
    fn push_content(&self, _data: &JsonValue) -> Option<String> {
        None
    }

    fn partials(&self) -> IndexMap<String, String> {
        IndexMap::new()
    }

    fn helpers(&self) -> Vec<(String, Arc<dyn Helper>)> {
        Vec::new()
    }

    /// Language of the recipient. Exposed to the template as `lang` and
    /// used by `tGlobal`, which falls back to English when unset.
    fn lang(&self) -> Option<&str> {
        None
    }

    /// Backs this view's `t` helper.
    fn translator(&self) -> Option<Arc<dyn Translate>> {
        None
    }

    /// Instance the `webLink` and `universalLink` helpers point at.
    fn link_options(&self) -> Option<LinkOptions> {
        None
    }

    /// Merged into the attributes after the standard fields.
    fn extra_attributes(&self) -> Map<String, JsonValue> {
        Map::new()
    }

    /// Turns the composed markup into the HTML that is sent. The default
    /// keeps it as is; callers that compile MJML plug the compiler in here.
    fn compile_markup(&self, full: &str) -> String {
        full.to_string()
    }

    /// Plain-text version of the HTML content.
    fn to_text(&self, html: &str) -> String;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationAttributes {
    pub category: String,
    pub title: String,
    pub message: Option<String>,
    pub preferred_channels: Vec<String>,
    pub content: String,
    pub content_html: String,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Body of the request creating a notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationPayload {
    pub data: NotificationDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationDocument {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub attributes: NotificationAttributes,
}

impl NotificationPayload {
    pub fn new(attributes: NotificationAttributes) -> Self {
        Self {
            data: NotificationDocument {
                doc_type: NOTIFICATIONS_DOCTYPE.to_string(),
                attributes,
            },
        }
    }
}

/// Render `view` and assemble its attributes.
///
/// Returns `Ok(None)` when the view has no data or declines to send. The
/// view's partials and helpers are added on top of `base`, then the
/// helpers built from the view itself (`t`, `tGlobal`, `webLink` and
/// `universalLink`), which win over same-named view helpers.
pub fn build_attributes<V>(view: &V, base: RegistryBuilder) -> Result<Option<NotificationAttributes>>
where
    V: NotificationView + ?Sized,
{
    let category = view.category();
    let Some(mut data) = view.build_data()? else {
        tracing::debug!(category, "no data, notification skipped");
        return Ok(None);
    };
    if !view.should_send(&data) {
        tracing::debug!(category, "view declined to send");
        return Ok(None);
    }

    if let (Some(lang), JsonValue::Object(map)) = (view.lang(), &mut data) {
        map.insert("lang".to_string(), JsonValue::from(lang));
    }

    let view_builtins = helpers::configured(
        view.link_options(),
        view.translator(),
        Some(view.lang().unwrap_or(DEFAULT_LANG).to_string()),
    );
    let builder = view
        .helpers()
        .into_iter()
        .chain(view_builtins)
        .fold(base.partials(view.partials()), |builder, (name, helper)| {
            builder.shared_helper(name, helper)
        });
    let herald = Herald::new(builder.build());

    let RenderResult { full, .. } = herald.render(view.template(), data.clone())?;
    let content_html = view.compile_markup(&full);

    Ok(Some(NotificationAttributes {
        category: category.to_string(),
        title: view.title(&data),
        message: view.push_content(&data),
        preferred_channels: view.preferred_channels(),
        content: view.to_text(&content_html),
        content_html,
        extra: view.extra_attributes(),
    }))
}
