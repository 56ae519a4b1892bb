//! Content Synthesizer
//!
//! Fetches one or two sources (web pages through a content proxy, or pasted
//! text), summarizes each with a Gemini model, and for two sources writes a
//! topic-structured synthesis with verified source links appended.
//!
//! # Usage
//!
//! ```rust,ignore
//! use synthesizer_core::{AppContext, Config, ModelId, RunRequest, SourceInput};
//!
//! let ctx = AppContext::new(Config::from_env()?)?;
//! ctx.set_credential(&api_key)?;
//!
//! let request = RunRequest::dual(
//!     ModelId::Flash,
//!     SourceInput::Url("https://example.com/post".into()),
//!     SourceInput::Url("https://news.ycombinator.com/item?id=1".into()),
//! );
//! let result = ctx.run(&request).await?;
//! ```
//!
//! # Modules
//!
//! - [`orchestrator`] - Run state machine, published over a watch channel
//! - [`fetcher`] - Proxy fetch and HTML to text
//! - [`summarize`] - Summary and synthesis calls over a [`Generator`]
//! - [`provenance`] - Appends source links to a synthesis
//! - [`topics`] - Parser for the synthesis markdown dialect
//! - [`history`] - Capped, pinnable run history
//! - [`skins`] - Interchangeable text renderers
//! - [`testing`] - Mock generator, fetcher and thread resolver

pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod fixtures;
pub mod generator;
pub mod history;
pub mod hn;
pub mod model;
pub mod orchestrator;
pub mod preferences;
pub mod prompts;
pub mod provenance;
pub mod skins;
pub mod storage;
pub mod summarize;
pub mod testing;
pub mod topics;

pub use config::Config;
pub use context::AppContext;
pub use error::{Result, SynthError};
pub use export::export_document;
pub use fetcher::{ContentFetcher, ProxyFetcher};
pub use generator::{GeminiGenerator, Generator, UpdateFn};
pub use history::{HistoryEntry, HistoryStore, HISTORY_CAP};
pub use hn::{HnResolver, HnThread, ThreadResolver};
pub use model::{ModelId, RunRequest, RunResult, SourceInput, Status};
pub use orchestrator::{Orchestrator, RunSnapshot};
pub use preferences::Preferences;
pub use provenance::{append_provenance, ProvenanceLinks};
pub use skins::{Skin, SkinId, SkinRegistry, SkinView};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use topics::{parse_synthesis, split_attribution, ParsedSynthesis, Topic};
