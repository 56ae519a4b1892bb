use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_HN_API_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Content proxy endpoint; fetches fail with a configuration error when unset
    pub proxy_base_url: Option<String>,
    /// Overrides the stored credential when set
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub hn_api_base_url: String,
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let data_dir = match env::var("SYNTHESIZER_DATA_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs::data_local_dir()
                .map(|d| d.join("content-synthesizer"))
                .context("No local data directory; set SYNTHESIZER_DATA_DIR")?,
        };

        Ok(Self {
            proxy_base_url: non_empty_var("PROXY_BASE_URL"),
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gemini_base_url: non_empty_var("GEMINI_BASE_URL")
                .unwrap_or_else(|| gemini_client::DEFAULT_BASE_URL.to_string()),
            hn_api_base_url: non_empty_var("HN_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_HN_API_BASE_URL.to_string()),
            data_dir,
        })
    }

    /// Configuration rooted at an explicit data directory, with no proxy or key.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            proxy_base_url: None,
            gemini_api_key: None,
            gemini_base_url: gemini_client::DEFAULT_BASE_URL.to_string(),
            hn_api_base_url: DEFAULT_HN_API_BASE_URL.to_string(),
            data_dir: data_dir.into(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
