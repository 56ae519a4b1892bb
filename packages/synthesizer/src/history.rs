//! Run history
//!
//! Completed runs, most recent first, capped at [`HISTORY_CAP`]. The whole
//! list is persisted as one JSON array under the `history` key after every
//! mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, SynthError};
use crate::model::{ModelId, RunResult};
use crate::storage::{self, KeyValueStore};

pub const HISTORY_CAP: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub model: ModelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url2: Option<String>,
    pub results: RunResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hn_thread_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hn_title: Option<String>,
    #[serde(default)]
    pub pinned: bool,
}

impl HistoryEntry {
    pub fn new(model: ModelId, results: RunResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            model,
            url1: None,
            url2: None,
            results,
            hn_thread_url: None,
            hn_title: None,
            pinned: false,
        }
    }

    /// Title shown in the history list.
    pub fn display_title(&self) -> &str {
        self.hn_title
            .as_deref()
            .or(self.url1.as_deref())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Untitled")
    }
}

/// History list backed by a key-value store.
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    entries: Mutex<Vec<HistoryEntry>>,
}

impl HistoryStore {
    /// Load persisted history. Missing or corrupt data yields an empty list.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let entries = match store.get(storage::HISTORY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
                Ok(mut entries) => {
                    entries.truncate(HISTORY_CAP);
                    entries
                }
                Err(e) => {
                    warn!(error = %e, "Stored history is corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read stored history, starting empty");
                Vec::new()
            }
        };
        debug!(count = entries.len(), "History loaded");

        Self {
            store,
            entries: Mutex::new(entries),
        }
    }

    /// Prepend an entry, evicting the oldest beyond the cap.
    pub async fn add(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(0, entry);
        entries.truncate(HISTORY_CAP);
        self.persist(&entries)
    }

    /// Flip the pin on `id`. Unknown ids leave the list untouched.
    pub async fn toggle_pin(&self, id: Uuid) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        entry.pinned = !entry.pinned;
        self.persist(&entries)?;
        Ok(true)
    }

    pub async fn clear_all(&self) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.clear();
        self.persist(&entries)
    }

    pub async fn get(&self, id: Uuid) -> Option<HistoryEntry> {
        self.entries.lock().await.iter().find(|e| e.id == id).cloned()
    }

    /// Look up by full id or by a unique id prefix.
    pub async fn find(&self, id_or_prefix: &str) -> Result<HistoryEntry> {
        let needle = id_or_prefix.trim().to_lowercase();
        if needle.is_empty() {
            return Err(SynthError::Validation("History id is empty".into()));
        }
        let entries = self.entries.lock().await;
        let mut matches = entries
            .iter()
            .filter(|e| e.id.to_string().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(entry), None) => Ok(entry.clone()),
            (Some(_), Some(_)) => Err(SynthError::Validation(format!(
                "History id '{}' is ambiguous",
                id_or_prefix
            ))),
            (None, _) => Err(SynthError::Validation(format!(
                "No history entry '{}'",
                id_or_prefix
            ))),
        }
    }

    /// Stored order, most recent first.
    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().await.clone()
    }

    /// Pinned entries first, then the rest, each group in stored order.
    pub async fn display_order(&self) -> Vec<HistoryEntry> {
        let entries = self.entries.lock().await;
        let (pinned, rest): (Vec<_>, Vec<_>) = entries.iter().cloned().partition(|e| e.pinned);
        pinned.into_iter().chain(rest).collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn persist(&self, entries: &[HistoryEntry]) -> Result<()> {
        let raw = serde_json::to_string(entries).map_err(|e| SynthError::Storage(Box::new(e)))?;
        self.store.set(storage::HISTORY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn entry(url: &str) -> HistoryEntry {
        let mut entry = HistoryEntry::new(
            ModelId::Flash,
            RunResult {
                summary1: Some(format!("• summary of {}", url)),
                ..Default::default()
            },
        );
        entry.url1 = Some(url.to_string());
        entry
    }

    fn store() -> (Arc<MemoryStore>, HistoryStore) {
        let kv = Arc::new(MemoryStore::new());
        let history = HistoryStore::load(kv.clone());
        (kv, history)
    }

    #[tokio::test]
    async fn test_add_caps_and_keeps_newest_first() {
        let (_, history) = store();

        for i in 0..(HISTORY_CAP + 5) {
            history.add(entry(&format!("https://a.io/{}", i))).await.unwrap();
        }

        let entries = history.entries().await;
        assert_eq!(entries.len(), HISTORY_CAP);
        assert_eq!(entries[0].url1.as_deref(), Some("https://a.io/104"));
        assert_eq!(entries[HISTORY_CAP - 1].url1.as_deref(), Some("https://a.io/5"));
    }

    #[tokio::test]
    async fn test_toggle_pin_unknown_id_is_noop() {
        let (_, history) = store();
        history.add(entry("https://a.io")).await.unwrap();
        history.add(entry("https://b.io")).await.unwrap();
        let before = history.entries().await;

        let changed = history.toggle_pin(Uuid::new_v4()).await.unwrap();

        assert!(!changed);
        assert_eq!(history.entries().await, before);
    }

    #[tokio::test]
    async fn test_display_order_puts_pinned_first() {
        let (_, history) = store();
        let old = entry("https://old.io");
        let old_id = old.id;
        history.add(old).await.unwrap();
        history.add(entry("https://mid.io")).await.unwrap();
        history.add(entry("https://new.io")).await.unwrap();

        assert!(history.toggle_pin(old_id).await.unwrap());

        let titles: Vec<String> = history
            .display_order()
            .await
            .iter()
            .map(|e| e.display_title().to_string())
            .collect();
        assert_eq!(titles, vec!["https://old.io", "https://new.io", "https://mid.io"]);
        // Stored order is unchanged by pinning
        assert_eq!(history.entries().await[2].id, old_id);
    }

    #[tokio::test]
    async fn test_persists_camel_case_and_reloads() {
        let (kv, history) = store();
        let mut e = entry("https://a.io");
        e.hn_title = Some("Show HN".into());
        e.hn_thread_url = Some("https://news.ycombinator.com/item?id=1".into());
        history.add(e.clone()).await.unwrap();

        let raw = kv.get(storage::HISTORY).unwrap().unwrap();
        assert!(raw.contains("\"createdAt\""));
        assert!(raw.contains("\"hnThreadUrl\""));
        assert!(raw.contains("\"gemini-2.5-flash\""));

        let reloaded = HistoryStore::load(kv);
        assert_eq!(reloaded.entries().await, vec![e]);
    }

    #[tokio::test]
    async fn test_corrupt_history_loads_empty() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(storage::HISTORY, "{not json").unwrap();

        let history = HistoryStore::load(kv);

        assert!(history.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let (kv, history) = store();
        history.add(entry("https://a.io")).await.unwrap();

        history.clear_all().await.unwrap();

        assert_eq!(history.len().await, 0);
        assert_eq!(kv.get(storage::HISTORY).unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_find_by_prefix() {
        let (_, history) = store();
        let e = entry("https://a.io");
        let id = e.id;
        history.add(e).await.unwrap();

        let found = history.find(&id.to_string()[..8]).await.unwrap();
        assert_eq!(found.id, id);
        assert!(history.find("zzzz").await.is_err());
    }

    #[test]
    fn test_display_title_fallbacks() {
        let mut e = HistoryEntry::new(ModelId::Pro, RunResult::default());
        assert_eq!(e.display_title(), "Untitled");
        e.url1 = Some("https://a.io".into());
        assert_eq!(e.display_title(), "https://a.io");
        e.hn_title = Some("Ask HN".into());
        assert_eq!(e.display_title(), "Ask HN");
    }
}
