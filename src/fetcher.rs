use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{ConfigError, LookupError};

/// Outcome of one catalogue lookup. Every failure (no match, malformed
/// search response, transport error, timeout) ends up as `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Found { document: String },
    Failed { reason: String },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Found { .. })
    }
}

impl From<Result<String, LookupError>> for FetchResult {
    fn from(r: Result<String, LookupError>) -> Self {
        match r {
            Ok(document) => FetchResult::Found { document },
            Err(e) => FetchResult::Failed { reason: e.to_string() },
        }
    }
}

/// Retrieves the product page for an item identifier from one brand's site.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, item: &str) -> FetchResult;

    /// Absolute URL for a (possibly relative) link found on a fetched page.
    fn resolve_url(&self, href: &str) -> Option<Url> {
        Url::parse(href).ok()
    }
}

pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// jikiu.com: JSON part-number search, then the catalogue page of the first hit.
pub struct JikiuFetcher {
    client: Client,
    base: Url,
}

impl JikiuFetcher {
    pub fn new(client: Client, base_url: &str) -> Result<Self, ConfigError> {
        let mut base =
            Url::parse(base_url).map_err(|e| ConfigError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl(base_url.to_string()));
        }
        // Directory form, so relative links and endpoints land under it.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { client, base })
    }

    /// Base URL extended by path segments, each percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn search(&self, item: &str) -> Result<String, LookupError> {
        let body = self
            .client
            .post(self.endpoint(&["service", "get_part_number"]))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest")
            .json(&json!({ "search_part": item }))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let parsed: Value = serde_json::from_str(&body)?;
        first_match_pid(&parsed).ok_or(LookupError::NoMatch)
    }

    async fn page(&self, pid: &str) -> Result<String, LookupError> {
        let document = self
            .client
            .get(self.endpoint(&["catalogue", pid]))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(document)
    }

    async fn try_fetch(&self, item: &str) -> Result<String, LookupError> {
        let pid = self.search(item).await?;
        debug!(item, pid = %pid, "search matched");
        self.page(&pid).await
    }
}

#[async_trait]
impl PageFetcher for JikiuFetcher {
    async fn fetch(&self, item: &str) -> FetchResult {
        self.try_fetch(item).await.into()
    }

    fn resolve_url(&self, href: &str) -> Option<Url> {
        self.base.join(href).ok()
    }
}

/// The search answers with an array of candidates; the first one wins.
fn first_match_pid(v: &Value) -> Option<String> {
    match v.as_array()?.first()?.get("pid")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
