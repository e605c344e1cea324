use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Stored settings for one shop. The API key is only ever held as an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSettings {
    pub shop: String,
    pub encrypted_api_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Key-value persistence of [`ShopSettings`], keyed by shop domain.
#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, shop: &str) -> Result<Option<ShopSettings>>;

    /// Inserts or replaces the settings for `settings.shop`.
    async fn upsert(&self, settings: ShopSettings) -> Result<()>;
}

/// Process-local store, used by tests and one-shot tooling.
#[derive(Default)]
pub struct MemorySettingsStore {
    entries: RwLock<HashMap<String, ShopSettings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, shop: &str) -> Result<Option<ShopSettings>> {
        Ok(self.entries.read().await.get(shop).cloned())
    }

    async fn upsert(&self, settings: ShopSettings) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(settings.shop.clone(), settings);
        Ok(())
    }
}
