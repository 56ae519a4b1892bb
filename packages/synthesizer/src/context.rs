//! Application context
//!
//! Owns every long-lived piece of the app. The generation client exists
//! only while a credential is configured: it is created when a key is set
//! and dropped when the key is reset, and a run without it fails with a
//! configuration error.

use gemini_client::GeminiClient;
use std::sync::{Arc, RwLock};
use tracing::info;

use crate::config::Config;
use crate::error::{Result, SynthError};
use crate::fetcher::{ContentFetcher, ProxyFetcher};
use crate::generator::{GeminiGenerator, Generator};
use crate::history::HistoryStore;
use crate::hn::{HnResolver, ThreadResolver};
use crate::model::{RunRequest, RunResult};
use crate::orchestrator::Orchestrator;
use crate::preferences::Preferences;
use crate::skins::SkinRegistry;
use crate::storage::{FileStore, KeyValueStore};

/// Builds a generator for a credential.
pub type GeneratorFactory = dyn Fn(&str) -> Arc<dyn Generator> + Send + Sync;

pub struct AppContext {
    config: Config,
    preferences: Preferences,
    orchestrator: Orchestrator,
    skins: SkinRegistry,
    factory: Box<GeneratorFactory>,
    generator: RwLock<Option<Arc<dyn Generator>>>,
}

impl AppContext {
    /// Context backed by the data directory and the real services.
    pub fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.data_dir));
        let fetcher: Arc<dyn ContentFetcher> =
            Arc::new(ProxyFetcher::new(config.proxy_base_url.clone()));
        let resolver: Arc<dyn ThreadResolver> =
            Arc::new(HnResolver::new(config.hn_api_base_url.clone()));
        let base_url = config.gemini_base_url.clone();
        let factory = Box::new(move |key: &str| -> Arc<dyn Generator> {
            Arc::new(GeminiGenerator::new(
                GeminiClient::new(key).with_base_url(base_url.clone()),
            ))
        });

        Self::with_parts(config, store, fetcher, resolver, factory)
    }

    /// Context from explicit parts. A credential from the config or the
    /// store creates the generator immediately.
    pub fn with_parts(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        fetcher: Arc<dyn ContentFetcher>,
        resolver: Arc<dyn ThreadResolver>,
        factory: Box<GeneratorFactory>,
    ) -> Result<Self> {
        let preferences = Preferences::new(store.clone());
        let history = Arc::new(HistoryStore::load(store));
        let orchestrator = Orchestrator::new(fetcher, resolver, history);

        let key = match &config.gemini_api_key {
            Some(key) => Some(key.clone()),
            None => preferences.api_key()?,
        };
        let generator = key.map(|k| factory(&k));

        Ok(Self {
            config,
            preferences,
            orchestrator,
            skins: SkinRegistry::new(),
            factory,
            generator: RwLock::new(generator),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        self.orchestrator.history()
    }

    pub fn skins(&self) -> &SkinRegistry {
        &self.skins
    }

    /// Current generation client, if a credential is configured.
    pub fn generator(&self) -> Option<Arc<dyn Generator>> {
        self.generator.read().ok().and_then(|g| g.clone())
    }

    pub fn has_credential(&self) -> bool {
        self.generator().is_some()
    }

    /// Store a credential and create the client for it.
    pub fn set_credential(&self, key: &str) -> Result<()> {
        self.preferences.set_api_key(key)?;
        let generator = (self.factory)(key.trim());
        *self.generator_slot()? = Some(generator);
        info!("Credential configured");
        Ok(())
    }

    /// Forget the stored credential and drop the client.
    pub fn reset_credential(&self) -> Result<()> {
        self.preferences.clear_api_key()?;
        *self.generator_slot()? = None;
        info!("Credential cleared");
        Ok(())
    }

    pub async fn run(&self, request: &RunRequest) -> Result<RunResult> {
        let generator = self.generator();
        self.orchestrator.run(generator.as_deref(), request).await
    }

    fn generator_slot(&self) -> Result<std::sync::RwLockWriteGuard<'_, Option<Arc<dyn Generator>>>> {
        self.generator
            .write()
            .map_err(|_| SynthError::Storage("generator lock poisoned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelId, SourceInput};
    use crate::storage::MemoryStore;
    use crate::testing::{MockFetcher, MockGenerator, MockResolver};

    fn context(config: Config, store: Arc<MemoryStore>) -> AppContext {
        AppContext::with_parts(
            config,
            store,
            Arc::new(MockFetcher::new()),
            Arc::new(MockResolver::new()),
            Box::new(|_key: &str| -> Arc<dyn Generator> { Arc::new(MockGenerator::new()) }),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_run_without_credential_is_configuration_error() {
        let ctx = context(Config::with_data_dir("/unused"), Arc::new(MemoryStore::new()));

        let err = ctx
            .run(&RunRequest::single(ModelId::Flash, SourceInput::Text("x".into())))
            .await
            .unwrap_err();

        assert!(err.needs_credential());
        assert!(ctx.history().is_empty().await);
    }

    #[tokio::test]
    async fn test_credential_lifecycle() {
        let store = Arc::new(MemoryStore::new());
        let ctx = context(Config::with_data_dir("/unused"), store.clone());
        assert!(!ctx.has_credential());

        ctx.set_credential(" key-1 ").unwrap();
        assert!(ctx.has_credential());
        ctx.run(&RunRequest::single(ModelId::Flash, SourceInput::Text("x".into())))
            .await
            .unwrap();

        ctx.reset_credential().unwrap();
        assert!(!ctx.has_credential());
        assert_eq!(store.get(crate::storage::API_KEY).unwrap(), None);
    }

    #[test]
    fn test_stored_or_configured_key_creates_client() {
        let store = Arc::new(MemoryStore::new());
        store.set(crate::storage::API_KEY, "stored").unwrap();
        assert!(context(Config::with_data_dir("/unused"), store).has_credential());

        let mut config = Config::with_data_dir("/unused");
        config.gemini_api_key = Some("from-env".into());
        assert!(context(config, Arc::new(MemoryStore::new())).has_credential());
    }
}
