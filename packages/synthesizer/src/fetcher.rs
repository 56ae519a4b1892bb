//! Content fetching through the HTML proxy.
//!
//! The proxy takes a `url` query parameter and answers with the raw HTML of
//! the target page, or with a JSON error envelope. Pages are reduced to
//! visible text before they reach the model.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Result, SynthError, PASTE_FALLBACK_HINT};

/// Fetches the visible text of a page.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Fetcher backed by the configured content proxy.
pub struct ProxyFetcher {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl ProxyFetcher {
    /// `base_url` is the proxy endpoint; `None` makes every fetch fail with a
    /// configuration error.
    pub fn new(base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self { client, base_url }
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn proxy_url(&self, target: &str) -> Result<Url> {
        let base = self
            .base_url
            .as_deref()
            .filter(|b| !is_placeholder(b))
            .ok_or_else(|| {
                SynthError::Configuration(
                    "Content proxy is not configured. Set PROXY_BASE_URL.".into(),
                )
            })?;

        Url::parse_with_params(base, &[("url", target)]).map_err(|e| {
            SynthError::Configuration(format!("PROXY_BASE_URL is not a valid URL: {}", e))
        })
    }
}

#[async_trait]
impl ContentFetcher for ProxyFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let target = url.trim();
        Url::parse(target)
            .map_err(|_| SynthError::Validation(format!("'{}' is not a valid URL.", target)))?;

        let proxy_url = self.proxy_url(target)?;
        debug!(url = %target, "Proxy fetch starting");

        let response = self.client.get(proxy_url).send().await.map_err(|e| {
            warn!(url = %target, error = %e, "Proxy request failed");
            SynthError::fetch(format!(
                "Could not reach the content proxy while fetching {}.",
                target
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = envelope_error(&body);
            warn!(url = %target, status = %status, detail = ?detail, "Proxy returned an error");
            return Err(SynthError::fetch(proxy_error_message(
                status.as_u16(),
                detail.as_deref(),
            )));
        }

        let body = response.text().await.map_err(|e| {
            SynthError::fetch(format!("Failed to read the response for {}: {}.", target, e))
        })?;

        // Some proxies answer 200 with an error envelope.
        if let Some(detail) = envelope_error(&body) {
            return Err(SynthError::fetch(format!("Proxy error: {}.", detail)));
        }

        let text = html_to_text(&body);
        debug!(url = %target, html_len = body.len(), text_len = text.len(), "Proxy fetch complete");

        if text.is_empty() {
            return Err(SynthError::Parsing(format!(
                "No readable text was found at {}. {}",
                target, PASTE_FALLBACK_HINT
            )));
        }

        Ok(text)
    }
}

#[derive(Deserialize)]
struct ProxyErrorEnvelope {
    error: String,
}

fn envelope_error(body: &str) -> Option<String> {
    let trimmed = body.trim_start();
    if !trimmed.starts_with('{') {
        return None;
    }
    serde_json::from_str::<ProxyErrorEnvelope>(trimmed)
        .ok()
        .map(|e| e.error)
        .filter(|e| !e.trim().is_empty())
}

/// User-facing message for a non-2xx proxy status.
pub fn proxy_error_message(status: u16, detail: Option<&str>) -> String {
    let base = match status {
        403 => "The site blocked the request (HTTP 403).".to_string(),
        404 => "The page was not found (HTTP 404).".to_string(),
        400 => "The proxy rejected the request as malformed (HTTP 400).".to_string(),
        502 => "The target site failed to respond through the proxy (HTTP 502).".to_string(),
        other => format!("Proxy error (HTTP {}).", other),
    };
    match detail {
        Some(detail) => format!("{} Details: {}.", base, detail.trim_end_matches('.')),
        None => base,
    }
}

fn is_placeholder(base: &str) -> bool {
    let lower = base.trim().to_ascii_lowercase();
    lower.is_empty()
        || lower.contains("your-proxy")
        || lower.contains("your_proxy")
        || lower.contains("<proxy")
        || !(lower.starts_with("http://") || lower.starts_with("https://"))
}

lazy_static! {
    static ref DROP_BLOCKS: Regex =
        Regex::new(r"(?is)<(script|style|noscript|head|template|svg)\b[^>]*>.*?</(script|style|noscript|head|template|svg)\s*>")
            .unwrap();
    static ref COMMENTS: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref BLOCK_BREAKS: Regex = Regex::new(
        r"(?i)<br\s*/?>|</?(p|div|li|ul|ol|h[1-6]|tr|table|section|article|header|footer|blockquote|pre|main|nav|aside)\b[^>]*>"
    )
    .unwrap();
    static ref TAGS: Regex = Regex::new(r"(?s)<[^>]+>").unwrap();
    static ref NUMERIC_ENTITY: Regex = Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").unwrap();
    static ref INLINE_SPACE: Regex = Regex::new(r"[ \t\u{a0}]+").unwrap();
    static ref BLANK_RUNS: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Strip markup and return the visible text of an HTML document.
pub fn html_to_text(html: &str) -> String {
    let text = DROP_BLOCKS.replace_all(html, "");
    let text = COMMENTS.replace_all(&text, "");
    let text = BLOCK_BREAKS.replace_all(&text, "\n");
    let text = TAGS.replace_all(&text, "");
    let text = decode_entities(&text);

    let lines: Vec<String> = text
        .lines()
        .map(|line| INLINE_SPACE.replace_all(line, " ").trim().to_string())
        .collect();
    let joined = lines.join("\n");

    BLANK_RUNS.replace_all(&joined, "\n\n").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    let named = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&mdash;", "\u{2014}")
        .replace("&ndash;", "\u{2013}")
        .replace("&hellip;", "\u{2026}");

    let numeric = NUMERIC_ENTITY.replace_all(&named, |caps: &regex::Captures| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x').or_else(|| raw.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    // Last, so "&amp;lt;" decodes to "&lt;" and not "<".
    numeric.replace("&amp;", "&")
}
