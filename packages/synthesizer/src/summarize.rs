//! Summarization and synthesis clients.
//!
//! Both wrap a [`Generator`] with a fixed instruction template. With an
//! update callback the call streams; without one it is a single request.

use std::time::Instant;
use tracing::{debug, warn};

use crate::error::{Result, SynthError};
use crate::generator::{Generator, UpdateFn};
use crate::model::ModelId;
use crate::prompts::{format_summary_prompt, format_synthesis_prompt};

/// Summarize one source.
pub async fn summarize(
    generator: &dyn Generator,
    model: ModelId,
    content: &str,
    on_update: Option<&UpdateFn<'_>>,
) -> Result<String> {
    let prompt = format_summary_prompt(content);
    complete(generator, model, &prompt, on_update, "summary").await
}

/// Synthesize two sources into one topic-structured narrative.
pub async fn synthesize(
    generator: &dyn Generator,
    model: ModelId,
    content1: &str,
    content2: &str,
    on_update: Option<&UpdateFn<'_>>,
) -> Result<String> {
    let prompt = format_synthesis_prompt(content1, content2);
    complete(generator, model, &prompt, on_update, "synthesis").await
}

async fn complete(
    generator: &dyn Generator,
    model: ModelId,
    prompt: &str,
    on_update: Option<&UpdateFn<'_>>,
    task: &'static str,
) -> Result<String> {
    let start = Instant::now();

    let outcome = match on_update {
        Some(callback) => generator.generate_streaming(model, prompt, callback).await,
        None => generator.generate(model, prompt).await,
    };

    let text = outcome.map_err(|e| {
        warn!(task, model = %model, error = %e, "Generation failed");
        match e {
            SynthError::Generation(_) => e,
            other => SynthError::Generation(other.to_string()),
        }
    })?;

    if text.trim().is_empty() {
        warn!(task, model = %model, "Model returned no text");
        return Err(SynthError::Generation(format!(
            "The model returned no text for the {}.",
            task
        )));
    }

    debug!(
        task,
        model = %model,
        prompt_len = prompt.len(),
        output_len = text.len(),
        duration_ms = start.elapsed().as_millis(),
        "Generation complete"
    );

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCall, MockGenerator};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_summarize_uses_summary_template() {
        let generator = MockGenerator::new().with_summary("content A", "• The overall main point is A");

        let summary = summarize(&generator, ModelId::Pro, "content A", None).await.unwrap();

        assert_eq!(summary, "• The overall main point is A");
        let calls = generator.calls();
        assert!(matches!(&calls[0], MockCall::Generate { model: ModelId::Pro, streaming: false, .. }));
    }

    #[tokio::test]
    async fn test_streaming_reports_cumulative_text_in_order() {
        let generator = MockGenerator::new().with_summary_chunks("body", &["One", " two", " three"]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: &UpdateFn<'_> = &move |text: &str| sink.lock().unwrap().push(text.to_string());

        let summary = summarize(&generator, ModelId::Flash, "body", Some(callback))
            .await
            .unwrap();

        assert_eq!(summary, "One two three");
        assert_eq!(*seen.lock().unwrap(), vec!["One", "One two", "One two three"]);
    }

    #[tokio::test]
    async fn test_blank_output_is_generation_error() {
        let generator = MockGenerator::new().with_summary("x", "   ");

        let err = summarize(&generator, ModelId::Flash, "x", None).await.unwrap_err();

        assert_eq!(err.kind(), "generation");
    }

    #[tokio::test]
    async fn test_failure_message_passes_through() {
        let generator = MockGenerator::new().with_failure("x", "API error: quota exceeded");

        let err = summarize(&generator, ModelId::Flash, "x", None).await.unwrap_err();

        assert_eq!(err.to_string(), "API error: quota exceeded");
    }

    #[tokio::test]
    async fn test_synthesize_sends_both_sources() {
        let generator = MockGenerator::new().with_synthesis("# Headline");

        let out = synthesize(&generator, ModelId::Flash, "left", "right", None)
            .await
            .unwrap();

        assert_eq!(out, "# Headline");
        let MockCall::Generate { prompt, .. } = &generator.calls()[0];
        assert!(prompt.contains("Content 1:\nleft"));
        assert!(prompt.contains("Content 2:\nright"));
    }
}
