//! Deep links into Cozy applications (`webLink` and `universalLink`).

use crate::error::HelperError;
use crate::registry::{Helper, HelperCall};
use serde::Deserialize;
use url::Url;

const UNIVERSAL_LINK_BASE: &str = "https://links.mycozy.cloud";

/// How application sub-domains are derived from the instance host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubdomainType {
    /// `alice.mycozy.cloud` -> `alice-drive.mycozy.cloud`
    #[default]
    Flat,
    /// `alice.mycozy.cloud` -> `drive.alice.mycozy.cloud`
    Nested,
}

/// Where the instance lives and how its apps are addressed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkOptions {
    pub origin: Url,
    #[serde(default)]
    pub subdomain: SubdomainType,
}

impl LinkOptions {
    pub fn new(origin: Url, subdomain: SubdomainType) -> Self {
        Self { origin, subdomain }
    }
}

/// Link opening `path` inside the web app `slug`.
pub fn web_link(options: &LinkOptions, slug: &str, path: &str) -> Result<Url, HelperError> {
    let host = options
        .origin
        .host_str()
        .ok_or_else(|| HelperError::new("webLink", "origin has no host"))?;

    let app_host = match options.subdomain {
        SubdomainType::Nested => format!("{slug}.{host}"),
        SubdomainType::Flat => match host.split_once('.') {
            Some((instance, domain)) => format!("{instance}-{slug}.{domain}"),
            None => format!("{host}-{slug}"),
        },
    };

    let mut url = options.origin.clone();
    url.set_host(Some(&app_host))
        .map_err(|e| HelperError::new("webLink", format!("invalid host {app_host}: {e}")))?;
    url.set_path("/");
    url.set_query(None);
    if path.is_empty() {
        url.set_fragment(None);
    } else {
        url.set_fragment(Some(&with_leading_slash(path)));
    }
    Ok(url)
}

/// Link that opens the native app when installed, the web app otherwise.
pub fn universal_link(options: &LinkOptions, slug: &str, path: &str) -> Result<Url, HelperError> {
    let fallback = web_link(options, slug, path)?;
    let path = if path.is_empty() {
        String::new()
    } else {
        with_leading_slash(path)
    };

    let mut url = Url::parse(&format!("{UNIVERSAL_LINK_BASE}/{slug}{path}"))
        .map_err(|e| HelperError::new("universalLink", e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("fallback", fallback.as_str());
    Ok(url)
}

fn with_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[derive(Clone, Copy)]
pub(crate) enum LinkKind {
    Web,
    Universal,
}

pub(crate) struct LinkHelper {
    options: LinkOptions,
    kind: LinkKind,
}

impl LinkHelper {
    pub(crate) fn new(options: LinkOptions, kind: LinkKind) -> Self {
        Self { options, kind }
    }
}

impl Helper for LinkHelper {
    fn call(&self, call: &HelperCall<'_>) -> Result<String, HelperError> {
        let slug = call
            .hash_str("slug")
            .ok_or_else(|| HelperError::new(call.name(), "missing slug argument"))?;
        let path = call
            .hash_str("path")
            .or_else(|| call.hash_str("nativePath"))
            .unwrap_or("");

        let url = match self.kind {
            LinkKind::Web => web_link(&self.options, slug, path)?,
            LinkKind::Universal => universal_link(&self.options, slug, path)?,
        };
        Ok(url.into())
    }
}
