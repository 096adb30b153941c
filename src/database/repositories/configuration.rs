use crate::database::models::{ConfigEntry, Settings};
use crate::database::{collections, Store};
use crate::error::AppResult;

#[derive(Clone)]
pub struct ConfigurationRepository {
    store: Store,
}

impl ConfigurationRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn all(&self) -> AppResult<Vec<ConfigEntry>> {
        // The configuration collection holds a handful of keys.
        let docs = self.store.get_many(collections::CONFIGURATION, 100).await?;
        docs.iter().map(ConfigEntry::from_document).collect()
    }

    /// Typed settings snapshot with defaults applied. Fetched per request;
    /// never cached process-wide.
    pub async fn settings(&self) -> AppResult<Settings> {
        let entries = self.all().await?;
        Ok(Settings::from_entries(&entries))
    }

    pub async fn set(&self, key: &str, value: &str, hint: &str) -> AppResult<ConfigEntry> {
        let entry = ConfigEntry {
            key: key.to_string(),
            value: value.to_string(),
            hint: hint.to_string(),
        };
        self.store
            .upsert(collections::CONFIGURATION, entry.to_document())
            .await?;
        Ok(entry)
    }
}
