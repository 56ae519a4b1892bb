//! Persisted user choices: credential, model and skin.

use std::sync::Arc;
use tracing::warn;

use crate::error::{Result, SynthError};
use crate::model::ModelId;
use crate::skins::SkinId;
use crate::storage::{self, KeyValueStore};

#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn api_key(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(storage::API_KEY)?
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty()))
    }

    pub fn set_api_key(&self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(SynthError::Validation("API key cannot be empty".into()));
        }
        self.store.set(storage::API_KEY, key)
    }

    pub fn clear_api_key(&self) -> Result<()> {
        self.store.remove(storage::API_KEY)
    }

    /// Stored model, or the default when unset or unrecognized.
    pub fn model(&self) -> ModelId {
        self.read_choice(storage::SELECTED_MODEL)
    }

    pub fn set_model(&self, model: ModelId) -> Result<()> {
        self.store.set(storage::SELECTED_MODEL, model.as_str())
    }

    /// Stored skin, or the default when unset or unrecognized.
    pub fn skin(&self) -> SkinId {
        self.read_choice(storage::SELECTED_SKIN)
    }

    pub fn set_skin(&self, skin: SkinId) -> Result<()> {
        self.store.set(storage::SELECTED_SKIN, skin.as_str())
    }

    fn read_choice<T>(&self, key: &str) -> T
    where
        T: std::str::FromStr + Default,
    {
        match self.store.get(key) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|_| {
                warn!(key, value = %raw, "Ignoring unrecognized stored value");
                T::default()
            }),
            Ok(None) => T::default(),
            Err(e) => {
                warn!(key, error = %e, "Failed to read preference");
                T::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn prefs() -> Preferences {
        Preferences::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_defaults() {
        let prefs = prefs();
        assert_eq!(prefs.model(), ModelId::Flash);
        assert_eq!(prefs.skin(), SkinId::Default);
        assert_eq!(prefs.api_key().unwrap(), None);
    }

    #[test]
    fn test_round_trip_choices() {
        let prefs = prefs();
        prefs.set_model(ModelId::FlashLite).unwrap();
        prefs.set_skin(SkinId::Outline).unwrap();

        assert_eq!(prefs.model(), ModelId::FlashLite);
        assert_eq!(prefs.skin(), SkinId::Outline);
        assert_eq!(
            prefs.store().get(storage::SELECTED_MODEL).unwrap().as_deref(),
            Some("gemini-2.5-flash-lite")
        );
    }

    #[test]
    fn test_unknown_stored_values_fall_back() {
        let prefs = prefs();
        prefs.store().set(storage::SELECTED_MODEL, "gemini-1.0").unwrap();
        prefs.store().set(storage::SELECTED_SKIN, "mindmap").unwrap();

        assert_eq!(prefs.model(), ModelId::Flash);
        assert_eq!(prefs.skin(), SkinId::Default);
    }

    #[test]
    fn test_api_key_trimmed_and_cleared() {
        let prefs = prefs();
        assert!(prefs.set_api_key("   ").is_err());

        prefs.set_api_key("  secret \n").unwrap();
        assert_eq!(prefs.api_key().unwrap().as_deref(), Some("secret"));

        prefs.clear_api_key().unwrap();
        assert_eq!(prefs.api_key().unwrap(), None);
    }
}
