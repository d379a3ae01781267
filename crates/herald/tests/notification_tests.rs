//! Integration tests for notification attributes, using the fixture
//! partials from tests/fixtures/partials/.

use herald::{
    build_attributes, Helper, HelperCall, HelperError, LinkOptions, NotificationPayload,
    NotificationView, PartialLoader, Registry, RegistryBuilder, SubdomainType, Translate, Value,
};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value as JsonValue};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn base_builder() -> RegistryBuilder {
    let loader = PartialLoader::new(fixtures_dir().join("partials")).unwrap();
    Registry::builder()
        .partials(loader.load_all().unwrap())
        .translator(|key: &str, args: &IndexMap<String, Value>| {
            let count = args
                .get("count")
                .and_then(|v| v.stringify().ok())
                .unwrap_or_default();
            format!("{key} ({count})")
        })
}

struct BalanceLower {
    template: String,
    accounts: JsonValue,
    extra: bool,
}

impl BalanceLower {
    fn new(accounts: JsonValue) -> Self {
        let path = fixtures_dir().join("templates").join("balance-lower.hbs");
        let template = fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Failed to read {}", path.display()));
        Self {
            template,
            accounts,
            extra: false,
        }
    }
}

struct Strip;

impl Helper for Strip {
    fn call(&self, call: &HelperCall<'_>) -> Result<String, HelperError> {
        Ok(call.str_param(0)?.trim().to_string())
    }
}

impl NotificationView for BalanceLower {
    fn category(&self) -> &str {
        "balance-lower"
    }

    fn template(&self) -> &str {
        &self.template
    }

    fn preferred_channels(&self) -> Vec<String> {
        vec!["mail".to_string(), "mobile".to_string()]
    }

    fn build_data(&self) -> herald::Result<Option<JsonValue>> {
        let Some(accounts) = self.accounts.as_array() else {
            return Ok(None);
        };
        Ok(Some(json!({
            "accounts": accounts,
            "count": accounts.len(),
        })))
    }

    fn should_send(&self, data: &JsonValue) -> bool {
        data["count"].as_u64().unwrap_or(0) > 0
    }

    fn title(&self, data: &JsonValue) -> String {
        format!("{} accounts below threshold", data["count"])
    }

    fn push_content(&self, data: &JsonValue) -> Option<String> {
        data["accounts"][0]["label"].as_str().map(str::to_string)
    }

    fn helpers(&self) -> Vec<(String, Arc<dyn Helper>)> {
        vec![("strip".to_string(), Arc::new(Strip) as Arc<dyn Helper>)]
    }

    fn extra_attributes(&self) -> Map<String, JsonValue> {
        let mut extra = Map::new();
        if self.extra {
            extra.insert("state".to_string(), json!("low"));
        }
        extra
    }

    fn to_text(&self, html: &str) -> String {
        let mut text = String::new();
        let mut in_tag = false;
        for c in html.chars() {
            match c {
                '<' => in_tag = true,
                '>' => {
                    in_tag = false;
                    text.push(' ');
                }
                _ if !in_tag => text.push(c),
                _ => {}
            }
        }
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

fn accounts() -> JsonValue {
    json!([
        {"label": "Checking", "balance": 12.5, "currency": "EUR"},
        {"label": "Savings", "balance": -3, "currency": "EUR"}
    ])
}

#[test]
fn test_loader_reads_nested_partials() {
    let loader = PartialLoader::new(fixtures_dir().join("partials")).unwrap();
    let partials = loader.load_all().unwrap();
    let names: Vec<&str> = partials.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["banks/base", "banks/signature", "frame"]);
}

#[test]
fn test_builds_attributes_from_rendered_template() {
    let view = BalanceLower::new(accounts());
    let attributes = build_attributes(&view, base_builder()).unwrap().unwrap();

    assert_eq!(attributes.category, "balance-lower");
    assert_eq!(attributes.title, "2 accounts below threshold");
    assert_eq!(attributes.message.as_deref(), Some("Checking"));
    assert_eq!(attributes.preferred_channels, vec!["mail", "mobile"]);

    let html = &attributes.content_html;
    assert!(html.contains("<title>balance-lower.title (2)</title>"));
    assert!(html.contains("<li>Checking: 12.5 EUR</li><li>Savings: -3 EUR</li>"));
    assert!(html.contains("<footer>Your bank assistant\n</footer>"));

    assert!(attributes
        .content
        .starts_with("balance-lower.title (2) Checking: 12.5 EUR Savings: -3 EUR"));
    assert!(attributes.content.ends_with("Your bank assistant"));
}

#[test]
fn test_skips_when_there_is_no_data() {
    let view = BalanceLower::new(JsonValue::Null);
    assert_eq!(build_attributes(&view, base_builder()).unwrap(), None);
}

#[test]
fn test_skips_when_view_declines() {
    let view = BalanceLower::new(json!([]));
    assert_eq!(build_attributes(&view, base_builder()).unwrap(), None);
}

#[test]
fn test_render_errors_surface_unchanged() {
    let mut view = BalanceLower::new(accounts());
    view.template = "{{#extend 'banks/missing'}}{{/extend}}".to_string();
    let err = build_attributes(&view, base_builder()).unwrap_err();
    assert_eq!(err.to_string(), "Cannot find partial banks/missing");
}

#[test]
fn test_view_helpers_are_available_to_the_template() {
    let mut view = BalanceLower::new(accounts());
    view.template =
        "{{#extend 'frame'}}{{#content 'body'}}[{{strip '  padded  '}}]{{/content}}{{/extend}}"
            .to_string();
    let attributes = build_attributes(&view, base_builder()).unwrap().unwrap();
    assert!(attributes.content_html.contains("<body>[padded]<footer>"));
}

#[test]
fn test_payload_is_ready_to_post() {
    let mut view = BalanceLower::new(accounts());
    view.extra = true;
    let attributes = build_attributes(&view, base_builder()).unwrap().unwrap();

    let payload = serde_json::to_value(NotificationPayload::new(attributes)).unwrap();
    assert_eq!(payload["data"]["type"], "io.cozy.notifications");
    assert_eq!(payload["data"]["attributes"]["category"], "balance-lower");
    assert_eq!(payload["data"]["attributes"]["state"], "low");
    assert!(payload["data"]["attributes"]["content_html"]
        .as_str()
        .is_some_and(|html| html.starts_with("<html>")));
}

const LOCALIZED: &str = "{{#extend 'frame'}}\
{{#content 'title'}}{{t 'subject'}}{{/content}}\
{{#content 'body'}}{{lang}}|{{tGlobal 'footer.unsubscribe'}}|{{webLink slug='banks' path='/balances'}}{{/content}}\
{{/extend}}";

struct Fixed(&'static str);

impl Helper for Fixed {
    fn call(&self, _call: &HelperCall<'_>) -> Result<String, HelperError> {
        Ok(self.0.to_string())
    }
}

#[derive(Default)]
struct Localized {
    lang: Option<&'static str>,
    translated: bool,
    linked: bool,
}

impl NotificationView for Localized {
    fn category(&self) -> &str {
        "localized"
    }

    fn template(&self) -> &str {
        LOCALIZED
    }

    fn build_data(&self) -> herald::Result<Option<JsonValue>> {
        Ok(Some(json!({"name": "Ada"})))
    }

    fn title(&self, data: &JsonValue) -> String {
        data["lang"].as_str().unwrap_or("none").to_string()
    }

    fn helpers(&self) -> Vec<(String, Arc<dyn Helper>)> {
        let fixed: Arc<dyn Helper> = Arc::new(Fixed("from view helper"));
        vec![
            ("t".to_string(), fixed.clone()),
            ("webLink".to_string(), fixed),
        ]
    }

    fn lang(&self) -> Option<&str> {
        self.lang
    }

    fn translator(&self) -> Option<Arc<dyn Translate>> {
        self.translated.then(|| {
            Arc::new(|key: &str, _: &IndexMap<String, Value>| format!("view:{key}"))
                as Arc<dyn Translate>
        })
    }

    fn link_options(&self) -> Option<LinkOptions> {
        self.linked.then(|| {
            LinkOptions::new(
                Url::parse("https://alice.mycozy.cloud").unwrap(),
                SubdomainType::Flat,
            )
        })
    }

    fn to_text(&self, html: &str) -> String {
        html.to_string()
    }
}

#[test]
fn test_view_builtins_win_over_view_helpers() {
    let view = Localized {
        lang: Some("fr"),
        translated: true,
        linked: true,
    };
    let attributes = build_attributes(&view, base_builder()).unwrap().unwrap();

    assert_eq!(attributes.title, "fr");
    let html = &attributes.content_html;
    assert!(html.contains("<title>view:subject</title>"), "{html}");
    assert!(
        html.contains("<body>fr|Se désabonner|https://alice-banks.mycozy.cloud/#/balances<footer>"),
        "{html}"
    );
}

#[test]
fn test_view_helpers_apply_without_view_builtins() {
    let view = Localized::default();
    let attributes = build_attributes(&view, base_builder()).unwrap().unwrap();

    // No lang: nothing is injected and tGlobal reads the English table.
    assert_eq!(attributes.title, "none");
    let html = &attributes.content_html;
    assert!(html.contains("<title>from view helper</title>"), "{html}");
    assert!(
        html.contains("<body>|Unsubscribe|from view helper<footer>"),
        "{html}"
    );
}
