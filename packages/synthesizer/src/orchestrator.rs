//! Run orchestration
//!
//! One run is fetch -> summarize -> (synthesize) for one or two sources.
//! Progress is published as [`RunSnapshot`]s on a watch channel. Every run
//! takes a new generation number; updates from a run that no longer owns the
//! current generation are dropped, and such a run never records history.

use futures::future::try_join;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{Result, SynthError};
use crate::fetcher::ContentFetcher;
use crate::generator::{Generator, UpdateFn};
use crate::history::{HistoryEntry, HistoryStore};
use crate::hn::ThreadResolver;
use crate::model::{RunRequest, RunResult, SourceInput, Status};
use crate::provenance::{append_provenance, ProvenanceLinks};
use crate::summarize::{summarize, synthesize};

/// Observable state of the current run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSnapshot {
    pub generation: u64,
    pub status: Status,
    pub result: RunResult,
    pub error: Option<String>,
}

#[derive(Clone, Copy)]
enum Field {
    Summary1,
    Summary2,
    Synthesis,
}

/// Publishes updates on behalf of a single run generation.
struct RunScope<'a> {
    generation: u64,
    state: &'a watch::Sender<RunSnapshot>,
}

impl RunScope<'_> {
    fn is_current(&self) -> bool {
        self.state.borrow().generation == self.generation
    }

    /// Move the status forward. Never moves it back.
    fn advance(&self, status: Status) {
        self.state.send_if_modified(|snap| {
            if snap.generation != self.generation || status <= snap.status {
                return false;
            }
            debug!(generation = self.generation, status = ?status, "Run status");
            snap.status = status;
            true
        });
    }

    fn set(&self, field: Field, text: &str) {
        self.state.send_if_modified(|snap| {
            if snap.generation != self.generation {
                return false;
            }
            let slot = match field {
                Field::Summary1 => &mut snap.result.summary1,
                Field::Summary2 => &mut snap.result.summary2,
                Field::Synthesis => &mut snap.result.synthesis,
            };
            *slot = Some(text.to_string());
            true
        });
    }

    fn fail(&self, err: &SynthError) {
        self.state.send_if_modified(|snap| {
            if snap.generation != self.generation {
                return false;
            }
            snap.status = Status::Error;
            snap.result = RunResult::default();
            snap.error = Some(err.to_string());
            true
        });
    }
}

/// Thread metadata attached to a run's history entry.
#[derive(Debug, Default)]
struct ThreadInfo {
    url: Option<String>,
    title: Option<String>,
}

pub struct Orchestrator {
    fetcher: Arc<dyn ContentFetcher>,
    resolver: Arc<dyn ThreadResolver>,
    history: Arc<HistoryStore>,
    generation: AtomicU64,
    state: watch::Sender<RunSnapshot>,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        resolver: Arc<dyn ThreadResolver>,
        history: Arc<HistoryStore>,
    ) -> Self {
        let (state, _) = watch::channel(RunSnapshot::default());
        Self {
            fetcher,
            resolver,
            history,
            generation: AtomicU64::new(0),
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> RunSnapshot {
        self.state.borrow().clone()
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Run the request to completion.
    ///
    /// Precondition failures (no generator, empty inputs) return an error
    /// without touching the published state. Any later failure moves the
    /// run to [`Status::Error`] and discards its results.
    pub async fn run(
        &self,
        generator: Option<&dyn Generator>,
        request: &RunRequest,
    ) -> Result<RunResult> {
        let generator = generator.ok_or_else(SynthError::missing_credential)?;
        validate(request)?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(RunSnapshot {
            generation,
            ..Default::default()
        });
        let scope = RunScope {
            generation,
            state: &self.state,
        };

        info!(
            generation,
            model = %request.model,
            dual = request.is_dual(),
            "Run started"
        );

        match self.execute(generator, request, &scope).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!(generation, kind = e.kind(), error = %e, "Run failed");
                scope.fail(&e);
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        generator: &dyn Generator,
        request: &RunRequest,
        scope: &RunScope<'_>,
    ) -> Result<RunResult> {
        let model = request.model;

        // Fetch
        let second_fetch = request.source2.as_ref().is_some_and(SourceInput::needs_fetch);
        if request.source1.needs_fetch() {
            scope.advance(Status::Fetching1);
        } else if second_fetch {
            scope.advance(Status::Fetching2);
        }

        let (content1, content2) = match &request.source2 {
            None => (self.load(&request.source1).await?, None),
            Some(source2) => {
                let second_pending = AtomicBool::new(second_fetch);
                let first = async {
                    let text = self.load(&request.source1).await?;
                    if second_pending.load(Ordering::SeqCst) {
                        scope.advance(Status::Fetching2);
                    }
                    Ok::<_, SynthError>(text)
                };
                let second = async {
                    let text = self.load(source2).await?;
                    second_pending.store(false, Ordering::SeqCst);
                    Ok::<_, SynthError>(text)
                };
                let (a, b) = try_join(first, second).await?;
                (a, Some(b))
            }
        };

        // Summarize
        scope.advance(Status::Summarizing1);
        let on_summary1: &UpdateFn<'_> = &|text: &str| scope.set(Field::Summary1, text);
        let on_summary2: &UpdateFn<'_> = &|text: &str| scope.set(Field::Summary2, text);

        let mut result = RunResult::default();
        match &content2 {
            None => {
                let summary = summarize(generator, model, &content1, Some(on_summary1)).await?;
                scope.set(Field::Summary1, &summary);
                result.summary1 = Some(summary);
            }
            Some(content2) => {
                let second_pending = AtomicBool::new(true);
                let first = async {
                    let summary = summarize(generator, model, &content1, Some(on_summary1)).await?;
                    if second_pending.load(Ordering::SeqCst) {
                        scope.advance(Status::Summarizing2);
                    }
                    Ok::<_, SynthError>(summary)
                };
                let second = async {
                    let summary = summarize(generator, model, content2, Some(on_summary2)).await?;
                    second_pending.store(false, Ordering::SeqCst);
                    Ok::<_, SynthError>(summary)
                };
                let (summary1, summary2) = try_join(first, second).await?;
                scope.set(Field::Summary1, &summary1);
                scope.set(Field::Summary2, &summary2);
                result.summary1 = Some(summary1);
                result.summary2 = Some(summary2);
            }
        }

        let thread = self.resolve_thread(request).await;

        // Synthesize
        if let Some(content2) = &content2 {
            scope.advance(Status::Synthesizing);
            let on_synthesis: &UpdateFn<'_> = &|text: &str| scope.set(Field::Synthesis, text);
            let raw = synthesize(generator, model, &content1, content2, Some(on_synthesis)).await?;

            let links = ProvenanceLinks {
                source1: request.source1.url().map(String::from),
                source2: request.source2.as_ref().and_then(|s| s.url()).map(String::from),
                thread: thread.url.clone(),
            };
            let synthesis = append_provenance(&raw, &links);
            scope.set(Field::Synthesis, &synthesis);
            result.synthesis = Some(synthesis);
        }

        if !scope.is_current() {
            debug!(generation = scope.generation, "Superseded run finished, not recording");
            return Ok(result);
        }

        let mut entry = HistoryEntry::new(model, result.clone());
        entry.url1 = request.source1.url().map(String::from);
        entry.url2 = request.source2.as_ref().and_then(|s| s.url()).map(String::from);
        entry.hn_thread_url = thread.url;
        entry.hn_title = thread.title;
        let entry_id = entry.id;

        if let Err(e) = self.history.add(entry).await {
            warn!(error = %e, "Failed to persist history entry");
        }

        scope.advance(Status::Done);
        info!(generation = scope.generation, entry = %entry_id, "Run complete");
        Ok(result)
    }

    async fn load(&self, source: &SourceInput) -> Result<String> {
        match source {
            SourceInput::Url(url) => self.fetcher.fetch_text(url.trim()).await,
            SourceInput::Text(text) => Ok(text.clone()),
        }
    }

    /// First URL source that resolves to a discussion thread. Best-effort.
    async fn resolve_thread(&self, request: &RunRequest) -> ThreadInfo {
        let urls = [
            request.source1.url(),
            request.source2.as_ref().and_then(|s| s.url()),
        ];
        for url in urls.into_iter().flatten() {
            match self.resolver.resolve(url.trim()).await {
                Ok(Some(thread)) => {
                    debug!(id = thread.id, "Resolved discussion thread");
                    return ThreadInfo {
                        url: Some(thread.thread_url()),
                        title: Some(thread.title).filter(|t| !t.trim().is_empty()),
                    };
                }
                Ok(None) => {}
                Err(e) => warn!(url, error = %e, "Thread lookup failed, continuing without it"),
            }
        }
        ThreadInfo::default()
    }
}

fn validate(request: &RunRequest) -> Result<()> {
    let check = |n: u8, source: &SourceInput| {
        if !source.is_blank() {
            return Ok(());
        }
        Err(SynthError::Validation(match source {
            SourceInput::Url(_) => format!("Please provide a URL for Source {}.", n),
            SourceInput::Text(_) => format!("Please paste some content for Source {}.", n),
        }))
    };
    check(1, &request.source1)?;
    if let Some(source2) = &request.source2 {
        check(2, source2)?;
    }
    Ok(())
}
