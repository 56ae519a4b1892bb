//! Pure Gemini REST API client
//!
//! A clean, minimal client for the Gemini `generateContent` API with no
//! domain-specific logic. Supports one-shot generation and SSE streaming.
//!
//! # Example
//!
//! ```rust,ignore
//! use gemini_client::{GeminiClient, GenerateRequest};
//! use futures::StreamExt;
//!
//! let client = GeminiClient::from_env()?;
//!
//! // One-shot
//! let response = client
//!     .generate(GenerateRequest::text("gemini-2.5-flash", "Hello!"))
//!     .await?;
//!
//! // Streaming
//! let mut stream = client
//!     .generate_stream(GenerateRequest::text("gemini-2.5-flash", "Hello!"))
//!     .await?;
//! while let Some(chunk) = stream.next().await {
//!     print!("{}", chunk?.delta);
//! }
//! ```

pub mod error;
pub mod streaming;
pub mod types;

pub use error::{GeminiError, Result};
pub use streaming::{GenerateChunk, GenerateContentStream};
pub use types::*;

use reqwest::{header, Client, Response};
use types::{ErrorEnvelope, GenerateResponseRaw};
use tracing::{debug, warn};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Pure Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from environment variable `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| GeminiError::Config("GEMINI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for proxies, regional endpoints, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Get the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn post(&self, url: String, request: &GenerateRequest) -> Result<Response> {
        let response = self
            .http_client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, model = %request.model, "Gemini request failed");
                GeminiError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Gemini API error");
            return Err(GeminiError::Api(api_error_message(status.as_u16(), &error_text)));
        }

        Ok(response)
    }

    /// One-shot generation.
    ///
    /// Returns the concatenated text of the first candidate.
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let start = std::time::Instant::now();

        let response = self
            .post(self.endpoint(&request.model, "generateContent"), &request)
            .await?;

        let raw: GenerateResponseRaw = response
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.to_string()))?;

        if let Some(reason) = raw.block_reason() {
            return Err(GeminiError::Api(format!("Prompt blocked: {}", reason)));
        }
        if raw.candidates.is_empty() {
            return Err(GeminiError::Api("No candidates returned".into()));
        }

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "Gemini generateContent"
        );

        Ok(GenerateResponse {
            text: raw.first_text(),
            finish_reason: raw.finish_reason(),
            usage: raw.usage_metadata,
        })
    }

    /// Streaming generation.
    ///
    /// Uses SSE (`alt=sse`) and yields text deltas in arrival order.
    pub async fn generate_stream(&self, request: GenerateRequest) -> Result<GenerateContentStream> {
        let url = format!(
            "{}?alt=sse",
            self.endpoint(&request.model, "streamGenerateContent")
        );
        let response = self.post(url, &request).await?;

        debug!(model = %request.model, "Gemini stream opened");

        Ok(GenerateContentStream::new(response.bytes_stream()))
    }
}

/// Prefer the API's own error message over the raw body.
fn api_error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => match envelope.error.status {
            Some(code) => format!("{} ({})", envelope.error.message, code),
            None => envelope.error.message,
        },
        _ if body.trim().is_empty() => format!("HTTP {}", status),
        _ => format!("HTTP {}: {}", status, body.trim()),
    }
}
