//! Core run data: model identifiers, run status, results and inputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SynthError;

// =============================================================================
// Model identifier
// =============================================================================

/// Closed set of generation models the app offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelId {
    #[serde(rename = "gemini-2.5-pro")]
    Pro,
    #[default]
    #[serde(rename = "gemini-2.5-flash")]
    Flash,
    #[serde(rename = "gemini-2.5-flash-lite")]
    FlashLite,
}

impl ModelId {
    /// Selector order.
    pub const ALL: [ModelId; 3] = [ModelId::Flash, ModelId::Pro, ModelId::FlashLite];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pro => "gemini-2.5-pro",
            Self::Flash => "gemini-2.5-flash",
            Self::FlashLite => "gemini-2.5-flash-lite",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pro => "2.5 Pro",
            Self::Flash => "2.5 Flash",
            Self::FlashLite => "2.5 Flash-Lite",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| {
                SynthError::Validation(format!(
                    "Unknown model '{}'. Choose one of: {}",
                    s,
                    Self::ALL.map(|m| m.as_str()).join(", ")
                ))
            })
    }
}

// =============================================================================
// Status
// =============================================================================

/// Run status. Advances linearly within a run; reset to `Idle` per run.
///
/// Ordered by phase (fetch, summarize, synthesize), then by source, so that
/// concurrent phases can only move the status forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Idle,
    #[serde(rename = "fetching-1")]
    Fetching1,
    #[serde(rename = "fetching-2")]
    Fetching2,
    #[serde(rename = "summarizing-1")]
    Summarizing1,
    #[serde(rename = "summarizing-2")]
    Summarizing2,
    Synthesizing,
    Done,
    Error,
}

impl Status {
    /// Text shown while the run is in this state.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching1 => "Fetching source 1...",
            Self::Summarizing1 => "Summarizing source 1...",
            Self::Fetching2 => "Fetching source 2...",
            Self::Summarizing2 => "Summarizing source 2...",
            Self::Synthesizing => "Synthesizing content...",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self, Self::Idle | Self::Done | Self::Error)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Results and inputs
// =============================================================================

/// Output of a run. Fields go absent -> partial (streaming) -> final.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<String>,
}

impl RunResult {
    pub fn is_empty(&self) -> bool {
        self.summary1.is_none() && self.summary2.is_none() && self.synthesis.is_none()
    }
}

/// One content input: a URL to fetch through the proxy, or pasted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    Url(String),
    Text(String),
}

impl SourceInput {
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url.as_str()),
            Self::Text(_) => None,
        }
    }

    pub fn needs_fetch(&self) -> bool {
        matches!(self, Self::Url(_))
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Url(s) | Self::Text(s) => s.trim().is_empty(),
        }
    }
}

/// Everything needed to start a run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub model: ModelId,
    pub source1: SourceInput,
    /// Present in dual-source mode.
    pub source2: Option<SourceInput>,
}

impl RunRequest {
    pub fn single(model: ModelId, source: SourceInput) -> Self {
        Self {
            model,
            source1: source,
            source2: None,
        }
    }

    pub fn dual(model: ModelId, source1: SourceInput, source2: SourceInput) -> Self {
        Self {
            model,
            source1,
            source2: Some(source2),
        }
    }

    pub fn is_dual(&self) -> bool {
        self.source2.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_round_trips_through_wire_name() {
        for model in ModelId::ALL {
            assert_eq!(model.as_str().parse::<ModelId>().unwrap(), model);
            assert_eq!(
                serde_json::to_string(&model).unwrap(),
                format!("\"{}\"", model.as_str())
            );
        }
    }

    #[test]
    fn test_unknown_model_is_validation_error() {
        let err = "gpt-4o".parse::<ModelId>().unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().contains("gemini-2.5-flash"));
    }

    #[test]
    fn test_status_order_is_linear() {
        let order = [
            Status::Idle,
            Status::Fetching1,
            Status::Fetching2,
            Status::Summarizing1,
            Status::Summarizing2,
            Status::Synthesizing,
            Status::Done,
        ];
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(serde_json::to_string(&Status::Fetching2).unwrap(), "\"fetching-2\"");
    }

    #[test]
    fn test_busy_states() {
        assert!(!Status::Idle.is_busy());
        assert!(Status::Synthesizing.is_busy());
        assert!(Status::Error.is_terminal());
    }

    #[test]
    fn test_blank_source() {
        assert!(SourceInput::Text("  \n".into()).is_blank());
        assert!(!SourceInput::Url("https://a.io".into()).is_blank());
    }
}
