//! SSE streaming parser for `streamGenerateContent?alt=sse`.
//!
//! Converts a raw `reqwest` byte stream into `GenerateChunk` values.
//! Handles CRLF line endings, partial lines split across network reads,
//! and error envelopes delivered inside the stream.

use bytes::Bytes;
use futures::stream::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::GeminiError;
use crate::types::{ErrorEnvelope, GenerateResponseRaw};

/// A single chunk from a streaming generation.
#[derive(Debug, Clone)]
pub struct GenerateChunk {
    /// The text delta for this chunk.
    pub delta: String,
    /// Set on the final chunk of a candidate (e.g. "STOP", "MAX_TOKENS").
    pub finish_reason: Option<String>,
}

/// Stream adapter that converts raw SSE bytes into `GenerateChunk` values.
pub struct GenerateContentStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    buffer: String,
    // Bytes of a UTF-8 sequence split across two network reads.
    pending: Vec<u8>,
}

impl GenerateContentStream {
    pub(crate) fn new(
        byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            buffer: String::new(),
            pending: Vec::new(),
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), GeminiError> {
        self.pending.extend_from_slice(bytes);
        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                self.buffer.push_str(text);
                self.pending.clear();
                Ok(())
            }
            Err(e) if e.error_len().is_none() => {
                // Incomplete trailing sequence: keep it for the next read.
                let valid = e.valid_up_to();
                let text = std::str::from_utf8(&self.pending[..valid])
                    .map_err(|e| GeminiError::Parse(format!("Invalid UTF-8 in stream: {}", e)))?;
                self.buffer.push_str(text);
                self.pending.drain(..valid);
                Ok(())
            }
            Err(e) => Err(GeminiError::Parse(format!("Invalid UTF-8 in stream: {}", e))),
        }
    }
}

impl Stream for GenerateContentStream {
    type Item = Result<GenerateChunk, GeminiError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(chunk) = try_parse_line(&mut this.buffer) {
                return Poll::Ready(Some(chunk));
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    if let Err(e) = this.push_bytes(&bytes) {
                        return Poll::Ready(Some(Err(e)));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(GeminiError::Network(e.to_string()))));
                }
                Poll::Ready(None) => {
                    if this.buffer.trim().is_empty() {
                        return Poll::Ready(None);
                    }
                    // Last event without a trailing newline.
                    this.buffer.push('\n');
                    if let Some(chunk) = try_parse_line(&mut this.buffer) {
                        return Poll::Ready(Some(chunk));
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Try to extract and parse a complete SSE data line from the buffer.
/// Returns `None` if no complete data line is available yet.
fn try_parse_line(buffer: &mut String) -> Option<Result<GenerateChunk, GeminiError>> {
    loop {
        let newline_pos = buffer.find('\n')?;
        let line = buffer[..newline_pos].trim().to_string();
        buffer.drain(..=newline_pos);

        if line.is_empty() {
            continue;
        }

        let Some(data) = line.strip_prefix("data:") else {
            // "event:", "id:", "retry:" and comments
            continue;
        };

        return Some(parse_data(data.trim()));
    }
}

fn parse_data(data: &str) -> Result<GenerateChunk, GeminiError> {
    let value: serde_json::Value = serde_json::from_str(data).map_err(|e| {
        GeminiError::Parse(format!(
            "Failed to parse stream chunk: {} (data: {})",
            e,
            preview(data, 200)
        ))
    })?;

    if value.get("error").is_some() {
        let envelope: ErrorEnvelope = serde_json::from_value(value)
            .map_err(|e| GeminiError::Parse(format!("Malformed error envelope: {}", e)))?;
        return Err(GeminiError::Api(envelope.error.message));
    }

    let raw: GenerateResponseRaw = serde_json::from_value(value)
        .map_err(|e| GeminiError::Parse(format!("Failed to parse stream chunk: {}", e)))?;

    if let Some(reason) = raw.block_reason() {
        return Err(GeminiError::Api(format!("Prompt blocked: {}", reason)));
    }

    Ok(GenerateChunk {
        delta: raw.first_text(),
        finish_reason: raw.finish_reason(),
    })
}

/// First `max_chars` characters of `data`, cut on a char boundary.
fn preview(data: &str, max_chars: usize) -> &str {
    data.char_indices().nth(max_chars).map_or(data, |(i, _)| &data[..i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn make_sse_bytes(lines: &[&str]) -> Vec<Result<Bytes, reqwest::Error>> {
        lines
            .iter()
            .map(|line| Ok(Bytes::from(format!("{}\r\n", line))))
            .collect()
    }

    fn chunk(text: &str) -> String {
        format!(
            r#"data: {{"candidates":[{{"content":{{"role":"model","parts":[{{"text":"{}"}}]}}}}]}}"#,
            text
        )
    }

    #[tokio::test]
    async fn test_parse_multiple_tokens() {
        let c1 = chunk("Hello");
        let c2 = chunk(" world");
        let data = make_sse_bytes(&[&c1, "", &c2, ""]);

        let mut stream = GenerateContentStream::new(futures::stream::iter(data));

        assert_eq!(stream.next().await.unwrap().unwrap().delta, "Hello");
        assert_eq!(stream.next().await.unwrap().unwrap().delta, " world");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_line_split_across_reads() {
        let line = format!("{}\n\n", chunk("split"));
        let (a, b) = line.split_at(20);
        let data: Vec<Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::from(a.to_string())),
            Ok(Bytes::from(b.to_string())),
        ];

        let mut stream = GenerateContentStream::new(futures::stream::iter(data));

        assert_eq!(stream.next().await.unwrap().unwrap().delta, "split");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_multibyte_char_split_across_reads() {
        let line = format!("{}\n", chunk("•"));
        let bytes = line.as_bytes();
        let pos = line.find('•').unwrap() + 1;
        let data: Vec<Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::copy_from_slice(&bytes[..pos])),
            Ok(Bytes::copy_from_slice(&bytes[pos..])),
        ];

        let mut stream = GenerateContentStream::new(futures::stream::iter(data));

        assert_eq!(stream.next().await.unwrap().unwrap().delta, "•");
    }

    #[tokio::test]
    async fn test_finish_reason() {
        let data = make_sse_bytes(&[
            r#"data: {"candidates":[{"content":{"parts":[{"text":"end"}]},"finishReason":"STOP"}]}"#,
        ]);

        let mut stream = GenerateContentStream::new(futures::stream::iter(data));
        let last = stream.next().await.unwrap().unwrap();

        assert_eq!(last.delta, "end");
        assert_eq!(last.finish_reason.as_deref(), Some("STOP"));
    }

    #[tokio::test]
    async fn test_error_envelope_in_stream() {
        let data = make_sse_bytes(&[
            r#"data: {"error":{"code":429,"message":"Resource exhausted","status":"RESOURCE_EXHAUSTED"}}"#,
        ]);

        let mut stream = GenerateContentStream::new(futures::stream::iter(data));
        let err = stream.next().await.unwrap().unwrap_err();

        assert!(matches!(err, GeminiError::Api(ref m) if m == "Resource exhausted"));
    }

    #[tokio::test]
    async fn test_trailing_event_without_newline() {
        let data: Vec<Result<Bytes, reqwest::Error>> = vec![Ok(Bytes::from(chunk("tail")))];

        let mut stream = GenerateContentStream::new(futures::stream::iter(data));

        assert_eq!(stream.next().await.unwrap().unwrap().delta, "tail");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_chunk_with_multibyte_text_is_parse_error() {
        let line = format!("data: {}•tail", "x".repeat(199));
        let data = make_sse_bytes(&[&line]);

        let mut stream = GenerateContentStream::new(futures::stream::iter(data));
        let err = stream.next().await.unwrap().unwrap_err();

        assert!(matches!(err, GeminiError::Parse(ref m) if m.contains("Failed to parse stream chunk")));
    }

    #[test]
    fn test_preview_cuts_on_char_boundary() {
        let data = format!("{}•tail", "x".repeat(199));
        assert_eq!(preview(&data, 200), format!("{}•", "x".repeat(199)));
        assert_eq!(preview("short", 200), "short");
    }
}
