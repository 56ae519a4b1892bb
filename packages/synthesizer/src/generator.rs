// Generation backend seam.
//
// Infrastructure only: prompt construction lives in `summarize`, the
// orchestrator talks to this trait so tests can script model output.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use gemini_client::{GeminiClient, GenerateChunk, GenerateRequest};
use tracing::debug;

use crate::error::Result;
use crate::model::ModelId;

/// Callback receiving the cumulative text after each streamed chunk.
pub type UpdateFn<'a> = dyn Fn(&str) + Send + Sync + 'a;

#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete a prompt in one shot.
    async fn generate(&self, model: ModelId, prompt: &str) -> Result<String>;

    /// Complete a prompt, reporting cumulative text as chunks arrive.
    /// Returns the final cumulative text.
    async fn generate_streaming(
        &self,
        model: ModelId,
        prompt: &str,
        on_update: &UpdateFn<'_>,
    ) -> Result<String> {
        // Default implementation reports once at the end
        let text = self.generate(model, prompt).await?;
        on_update(&text);
        Ok(text)
    }
}

/// Generator backed by the hosted Gemini API.
#[derive(Clone)]
pub struct GeminiGenerator {
    client: GeminiClient,
}

impl GeminiGenerator {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GeminiClient {
        &self.client
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(&self, model: ModelId, prompt: &str) -> Result<String> {
        let response = self
            .client
            .generate(GenerateRequest::text(model.as_str(), prompt))
            .await?;
        Ok(response.text)
    }

    async fn generate_streaming(
        &self,
        model: ModelId,
        prompt: &str,
        on_update: &UpdateFn<'_>,
    ) -> Result<String> {
        let stream = self
            .client
            .generate_stream(GenerateRequest::text(model.as_str(), prompt))
            .await?;

        let (text, chunks) = accumulate(stream, on_update).await?;
        debug!(model = %model, chunks, len = text.len(), "Stream finished");
        Ok(text)
    }
}

/// Drain a chunk stream, reporting the cumulative text after every non-empty
/// delta. Returns the final text and the number of chunks received.
pub async fn accumulate<S>(stream: S, on_update: &UpdateFn<'_>) -> Result<(String, usize)>
where
    S: Stream<Item = gemini_client::Result<GenerateChunk>>,
{
    futures::pin_mut!(stream);
    let mut text = String::new();
    let mut chunks = 0usize;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        chunks += 1;
        if chunk.delta.is_empty() {
            continue;
        }
        text.push_str(&chunk.delta);
        on_update(&text);
    }
    Ok((text, chunks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemini_client::GeminiError;
    use std::sync::Mutex;

    fn delta(text: &str) -> gemini_client::Result<GenerateChunk> {
        Ok(GenerateChunk {
            delta: text.to_string(),
            finish_reason: None,
        })
    }

    #[tokio::test]
    async fn test_accumulate_reports_cumulative_text() {
        let seen = Mutex::new(Vec::new());
        let record: &UpdateFn<'_> = &|text: &str| seen.lock().unwrap().push(text.to_string());

        let stream = futures::stream::iter(vec![delta("• One"), delta(""), delta("\n• Two")]);
        let (text, chunks) = accumulate(stream, record).await.unwrap();

        assert_eq!(text, "• One\n• Two");
        assert_eq!(chunks, 3);
        assert_eq!(*seen.lock().unwrap(), vec!["• One", "• One\n• Two"]);
    }

    #[tokio::test]
    async fn test_accumulate_stops_on_stream_error() {
        let seen = Mutex::new(Vec::new());
        let record: &UpdateFn<'_> = &|text: &str| seen.lock().unwrap().push(text.to_string());

        let stream = futures::stream::iter(vec![
            delta("partial"),
            Err(GeminiError::Api("Resource exhausted".into())),
            delta("never"),
        ]);
        let err = accumulate(stream, record).await.unwrap_err();

        assert_eq!(err.to_string(), "API error: Resource exhausted");
        assert_eq!(*seen.lock().unwrap(), vec!["partial"]);
    }
}
