//! Hacker News discussion-thread resolution.
//!
//! A thread URL (`news.ycombinator.com/item?id=<n>`) is looked up through the
//! public item API to learn the story title and the article it links to.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{Result, SynthError};

const HN_HOST: &str = "news.ycombinator.com";

/// A resolved discussion thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HnThread {
    pub id: u64,
    pub title: String,
    pub article_url: Option<String>,
}

impl HnThread {
    /// Canonical thread URL.
    pub fn thread_url(&self) -> String {
        thread_url(self.id)
    }
}

pub fn thread_url(id: u64) -> String {
    format!("https://{}/item?id={}", HN_HOST, id)
}

/// Item id of a thread URL, or `None` when the URL is not a thread.
pub fn parse_item_id(url: &str) -> Option<u64> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.trim_start_matches("www.");
    if host != HN_HOST || parsed.path() != "/item" {
        return None;
    }
    parsed
        .query_pairs()
        .find(|(k, _)| k == "id")
        .and_then(|(_, v)| v.parse().ok())
}

#[async_trait]
pub trait ThreadResolver: Send + Sync {
    /// `Ok(None)` when `url` is not a thread URL or the item does not exist.
    async fn resolve(&self, url: &str) -> Result<Option<HnThread>>;
}

/// Resolver backed by the public item API.
pub struct HnResolver {
    client: reqwest::Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct ItemRaw {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl HnResolver {
    pub fn new(api_base: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ThreadResolver for HnResolver {
    async fn resolve(&self, url: &str) -> Result<Option<HnThread>> {
        let Some(id) = parse_item_id(url) else {
            return Ok(None);
        };

        let endpoint = format!("{}/item/{}.json", self.api_base, id);
        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| SynthError::Fetch(format!("Thread lookup failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SynthError::Fetch(format!(
                "Thread lookup failed (HTTP {})",
                response.status().as_u16()
            )));
        }

        // The API answers `null` for unknown ids.
        let item: Option<ItemRaw> = response
            .json()
            .await
            .map_err(|e| SynthError::Fetch(format!("Thread lookup returned bad JSON: {}", e)))?;

        debug!(id, found = item.is_some(), "Thread lookup complete");

        Ok(item.map(|item| HnThread {
            id: item.id,
            title: item.title.unwrap_or_default(),
            article_url: item.url.filter(|u| !u.trim().is_empty()),
        }))
    }
}
