//! Presentation skins
//!
//! Every skin renders the same [`SkinView`] to terminal text. Skins are
//! looked up by [`SkinId`] in a [`SkinRegistry`], which always has the
//! default skin to fall back on.

mod carousel;
mod default;
mod digest;
mod magazine;
mod outline;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use url::Url;

use crate::error::SynthError;
use crate::model::RunResult;
use crate::topics::{parse_synthesis, ParsedSynthesis};

pub use carousel::CarouselSkin;
pub use default::DefaultSkin;
pub use digest::DigestSkin;
pub use magazine::MagazineSkin;
pub use outline::OutlineSkin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkinId {
    #[default]
    Default,
    Magazine,
    Digest,
    Outline,
    Carousel,
}

impl SkinId {
    pub const ALL: [SkinId; 5] = [
        SkinId::Default,
        SkinId::Magazine,
        SkinId::Digest,
        SkinId::Outline,
        SkinId::Carousel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Magazine => "magazine",
            Self::Digest => "digest",
            Self::Outline => "outline",
            Self::Carousel => "carousel",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Default => "Result cards for each summary and the synthesis",
            Self::Magazine => "Editorial layout with a feature story",
            Self::Digest => "Executive summary, contents and read times",
            Self::Outline => "Numbered outline of topics and points",
            Self::Carousel => "One slide per topic",
        }
    }
}

impl fmt::Display for SkinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkinId {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| {
                SynthError::Validation(format!(
                    "Unknown skin '{}'. Choose one of: {}",
                    s,
                    Self::ALL.map(|id| id.as_str()).join(", ")
                ))
            })
    }
}

/// What a skin renders.
#[derive(Debug, Clone, Copy)]
pub struct SkinView<'a> {
    pub result: &'a RunResult,
    pub url1: Option<&'a str>,
    pub url2: Option<&'a str>,
    pub hn_title: Option<&'a str>,
}

impl<'a> SkinView<'a> {
    pub fn new(result: &'a RunResult) -> Self {
        Self {
            result,
            url1: None,
            url2: None,
            hn_title: None,
        }
    }

    pub fn parsed(&self) -> ParsedSynthesis {
        self.result
            .synthesis
            .as_deref()
            .map(parse_synthesis)
            .unwrap_or_default()
    }

    pub fn title_or(&self, fallback: &'a str) -> &'a str {
        self.hn_title.filter(|t| !t.trim().is_empty()).unwrap_or(fallback)
    }
}

pub trait Skin: Send + Sync {
    fn id(&self) -> SkinId;

    fn render(&self, view: &SkinView<'_>) -> String;
}

pub struct SkinRegistry {
    default: Box<dyn Skin>,
    skins: HashMap<SkinId, Box<dyn Skin>>,
}

impl SkinRegistry {
    /// Registry with every built-in skin.
    pub fn new() -> Self {
        let mut registry = Self {
            default: Box::new(DefaultSkin),
            skins: HashMap::new(),
        };
        registry.register(Box::new(MagazineSkin));
        registry.register(Box::new(DigestSkin));
        registry.register(Box::new(OutlineSkin));
        registry.register(Box::new(CarouselSkin));
        registry
    }

    pub fn register(&mut self, skin: Box<dyn Skin>) {
        if skin.id() == SkinId::Default {
            self.default = skin;
        } else {
            self.skins.insert(skin.id(), skin);
        }
    }

    pub fn get(&self, id: SkinId) -> &dyn Skin {
        self.skins
            .get(&id)
            .map(|s| &**s)
            .unwrap_or(self.default.as_ref())
    }

    /// Look up by name, falling back to the default skin.
    pub fn resolve(&self, name: &str) -> &dyn Skin {
        match name.parse::<SkinId>() {
            Ok(id) => self.get(id),
            Err(_) => {
                warn!(skin = name, "Unknown skin, using default");
                self.default.as_ref()
            }
        }
    }
}

impl Default for SkinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Shared rendering helpers
// =============================================================================

pub(crate) fn host_of(url: &str) -> Option<String> {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
}

pub(crate) fn push_line(out: &mut String, line: impl AsRef<str>) {
    out.push_str(line.as_ref());
    out.push('\n');
}

/// Render a markdown-ish block: headings unwrapped, bullets indented.
pub(crate) fn push_markdown(out: &mut String, text: &str, indent: &str) {
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(heading) = trimmed.strip_prefix("## ") {
            out.push('\n');
            push_line(out, format!("{}{}", indent, heading.trim().to_uppercase()));
        } else if let Some(heading) = trimmed.strip_prefix("# ") {
            push_line(out, format!("{}{}", indent, heading.trim()));
        } else if let Some(bullet) = crate::topics::strip_bullet(trimmed) {
            if !bullet.is_empty() {
                push_line(out, format!("{}  • {}", indent, bullet));
            }
        } else {
            push_line(out, format!("{}{}", indent, trimmed));
        }
    }
}

/// Whole minutes at 200 words per minute, at least one.
pub(crate) fn read_minutes(text: &str) -> usize {
    text.split_whitespace().count().div_ceil(200).max(1)
}

pub(crate) fn rule(ch: char, width: usize) -> String {
    ch.to_string().repeat(width)
}
