//! Typed errors for the synthesizer library.
//!
//! Every variant carries the user-facing message; `Display` is what the CLI
//! prints and what a failed run records as its error.

use thiserror::Error;

/// Hint appended to every content-fetch failure.
pub const PASTE_FALLBACK_HINT: &str =
    "Try the \"paste text\" option instead: copy the page text and submit it directly.";

#[derive(Debug, Error)]
pub enum SynthError {
    /// Missing credential or proxy base URL. Blocks the action entirely.
    #[error("{0}")]
    Configuration(String),

    /// Missing or malformed user input. Blocks the action.
    #[error("{0}")]
    Validation(String),

    /// Proxy or network failure while fetching a source.
    #[error("{0}")]
    Fetch(String),

    /// Model call failed; message is passed through from the underlying failure.
    #[error("{0}")]
    Generation(String),

    /// Fetched content reduced to empty text.
    #[error("{0}")]
    Parsing(String),

    /// Local key-value persistence failed.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SynthError {
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch(format!("{} {}", message.into(), PASTE_FALLBACK_HINT))
    }

    pub fn missing_credential() -> Self {
        Self::Configuration("API key is not set. Please set your Gemini API key.".into())
    }

    /// Whether the CLI should prompt for a credential after this error.
    pub fn needs_credential(&self) -> bool {
        matches!(self, Self::Configuration(m) if m.starts_with("API key"))
    }

    /// Stable short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Validation(_) => "validation",
            Self::Fetch(_) => "fetch",
            Self::Generation(_) => "generation",
            Self::Parsing(_) => "parsing",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<gemini_client::GeminiError> for SynthError {
    fn from(err: gemini_client::GeminiError) -> Self {
        Self::Generation(err.to_string())
    }
}

impl From<std::io::Error> for SynthError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// Result type alias for synthesizer operations.
pub type Result<T> = std::result::Result<T, SynthError>;
