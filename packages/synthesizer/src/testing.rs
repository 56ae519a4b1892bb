//! Testing utilities including mock implementations.
//!
//! These let the orchestrator and the CLI flows run without making real
//! model, proxy or thread-lookup calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{Result, SynthError};
use crate::fetcher::ContentFetcher;
use crate::generator::{Generator, UpdateFn};
use crate::hn::{HnThread, ThreadResolver};
use crate::model::ModelId;
use crate::prompts::{format_summary_prompt, SYNTHESIS_PROMPT};

/// Scripted outcome of one generation.
#[derive(Debug, Clone)]
enum Scripted {
    Chunks(Vec<String>),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Script {
    outcome: Scripted,
    delay: Duration,
}

impl Script {
    fn text(text: &str) -> Self {
        Self {
            outcome: Scripted::Chunks(vec![text.to_string()]),
            delay: Duration::ZERO,
        }
    }
}

/// Record of a call made to the mock generator.
#[derive(Debug, Clone)]
pub enum MockCall {
    Generate {
        model: ModelId,
        prompt: String,
        streaming: bool,
    },
}

/// A mock generator for testing.
///
/// Summaries are scripted per source content, synthesis once for all calls.
/// Unscripted summaries echo a deterministic bullet so tests only script
/// what they assert on.
#[derive(Default, Clone)]
pub struct MockGenerator {
    summaries: Arc<RwLock<HashMap<String, Script>>>,
    synthesis: Arc<RwLock<Option<Script>>>,
    calls: Arc<RwLock<Vec<MockCall>>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the summary returned for `content`.
    pub fn with_summary(self, content: impl Into<String>, summary: &str) -> Self {
        self.summaries
            .write()
            .unwrap()
            .insert(content.into(), Script::text(summary));
        self
    }

    /// Script the summary for `content` as a sequence of streamed chunks.
    pub fn with_summary_chunks(self, content: impl Into<String>, chunks: &[&str]) -> Self {
        self.summaries.write().unwrap().insert(
            content.into(),
            Script {
                outcome: Scripted::Chunks(chunks.iter().map(|c| c.to_string()).collect()),
                delay: Duration::ZERO,
            },
        );
        self
    }

    /// Make summarizing `content` fail with `message`.
    pub fn with_failure(self, content: impl Into<String>, message: &str) -> Self {
        self.summaries.write().unwrap().insert(
            content.into(),
            Script {
                outcome: Scripted::Fail(message.to_string()),
                delay: Duration::ZERO,
            },
        );
        self
    }

    /// Delay the summary for `content` (before its first chunk).
    pub fn with_delay(self, content: impl Into<String>, delay: Duration) -> Self {
        let content = content.into();
        {
            let mut summaries = self.summaries.write().unwrap();
            let script = summaries
                .entry(content.clone())
                .or_insert_with(|| Script::text(&default_summary(&content)));
            script.delay = delay;
        }
        self
    }

    /// Script the synthesis output.
    pub fn with_synthesis(self, text: &str) -> Self {
        *self.synthesis.write().unwrap() = Some(Script::text(text));
        self
    }

    /// Make synthesis fail with `message`.
    pub fn with_synthesis_failure(self, message: &str) -> Self {
        *self.synthesis.write().unwrap() = Some(Script {
            outcome: Scripted::Fail(message.to_string()),
            delay: Duration::ZERO,
        });
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.read().unwrap().clone()
    }

    /// Number of synthesis calls made.
    pub fn synthesis_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|MockCall::Generate { prompt, .. }| prompt.starts_with(SYNTHESIS_PROMPT))
            .count()
    }

    fn script_for(&self, prompt: &str) -> Script {
        if prompt.starts_with(SYNTHESIS_PROMPT) {
            return self
                .synthesis
                .read()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Script::text("# Synthesis\n\n## TOPIC FOLLOWS: Topic\n• point"));
        }

        let prefix = format_summary_prompt("");
        let content = prompt.strip_prefix(prefix.as_str()).unwrap_or(prompt);
        self.summaries
            .read()
            .unwrap()
            .get(content)
            .cloned()
            .unwrap_or_else(|| Script::text(&default_summary(content)))
    }

    async fn run(
        &self,
        model: ModelId,
        prompt: &str,
        on_update: Option<&UpdateFn<'_>>,
    ) -> Result<String> {
        self.calls.write().unwrap().push(MockCall::Generate {
            model,
            prompt: prompt.to_string(),
            streaming: on_update.is_some(),
        });

        let script = self.script_for(prompt);
        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }

        match script.outcome {
            Scripted::Fail(message) => Err(SynthError::Generation(message)),
            Scripted::Chunks(chunks) => {
                let mut text = String::new();
                for chunk in chunks {
                    text.push_str(&chunk);
                    if let Some(callback) = on_update {
                        callback(&text);
                    }
                    tokio::task::yield_now().await;
                }
                Ok(text)
            }
        }
    }
}

fn default_summary(content: &str) -> String {
    format!("• The overall main point is {}", content)
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, model: ModelId, prompt: &str) -> Result<String> {
        self.run(model, prompt, None).await
    }

    async fn generate_streaming(
        &self,
        model: ModelId,
        prompt: &str,
        on_update: &UpdateFn<'_>,
    ) -> Result<String> {
        self.run(model, prompt, Some(on_update)).await
    }
}

/// A mock fetcher returning scripted page text per URL.
#[derive(Default, Clone)]
pub struct MockFetcher {
    pages: Arc<RwLock<HashMap<String, std::result::Result<String, String>>>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    fetched: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), Ok(text.into()));
        self
    }

    /// Make fetching `url` fail with a fetch error carrying `message`.
    pub fn with_failure(self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.pages
            .write()
            .unwrap()
            .insert(url.into(), Err(message.into()));
        self
    }

    pub fn with_delay(self, url: impl Into<String>, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(url.into(), delay);
        self
    }

    /// URLs fetched so far, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.read().unwrap().clone()
    }
}

#[async_trait]
impl ContentFetcher for MockFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.fetched.write().unwrap().push(url.to_string());

        let delay = self.delays.read().unwrap().get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let page = self.pages.read().unwrap().get(url).cloned();
        match page {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(SynthError::fetch(message)),
            None => Err(SynthError::fetch(format!("No mock page for {}.", url))),
        }
    }
}

/// A mock thread resolver with scripted threads per URL.
#[derive(Default, Clone)]
pub struct MockResolver {
    threads: Arc<RwLock<HashMap<String, HnThread>>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thread(self, url: impl Into<String>, thread: HnThread) -> Self {
        self.threads.write().unwrap().insert(url.into(), thread);
        self
    }
}

#[async_trait]
impl ThreadResolver for MockResolver {
    async fn resolve(&self, url: &str) -> Result<Option<HnThread>> {
        Ok(self.threads.read().unwrap().get(url).cloned())
    }
}
