use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use super::store::{SettingsStore, ShopSettings};

/// Settings persisted as one JSON object on disk, keyed by shop:
/// ```json
/// {
///   "demo.myshopify.com": {
///     "shop": "demo.myshopify.com",
///     "encrypted_api_key": "v1:...:...:...",
///     "created_at": "2026-01-01T00:00:00Z",
///     "updated_at": "2026-01-01T00:00:00Z"
///   }
/// }
/// ```
///
/// Writes go to a sibling temp file and are renamed into place. The mutex
/// serializes read-modify-write cycles within this process only.
pub struct FileSettingsStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, ShopSettings>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("settings file '{}' is not valid JSON", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e)
                .with_context(|| format!("failed to read settings file '{}'", self.path.display())),
        }
    }

    async fn persist(&self, entries: &BTreeMap<String, ShopSettings>) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(entries)?).await?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to replace settings file '{}'", self.path.display()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, shop: &str) -> Result<Option<ShopSettings>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(shop))
    }

    async fn upsert(&self, settings: ShopSettings) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        debug!(path = %self.path.display(), shop = %settings.shop, "Writing shop settings");
        entries.insert(settings.shop.clone(), settings);
        self.persist(&entries).await
    }
}
