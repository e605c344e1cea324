//! Per-shop what3words API key settings.
//!
//! [`SettingsService`] validates form input, seals the API key with the
//! [`EnvelopeCodec`] and hands the envelope to a [`SettingsStore`]. The
//! plaintext key is only recovered through [`SettingsService::load_api_key`].

mod file;
mod store;
pub mod validate;

pub use file::FileSettingsStore;
pub use store::{MemorySettingsStore, SettingsStore, ShopSettings};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::crypto::{EnvelopeCodec, EnvelopeError};
use validate::{is_valid_shop, normalize_shop, validate_api_key, validate_shop};

/// Field-level errors from the settings form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    pub shop: Option<&'static str>,
    pub api_key: Option<&'static str>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.shop.is_none() && self.api_key.is_none()
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid settings: {0:?}")]
    Invalid(FieldErrors),

    #[error("no what3words API key configured for {shop}")]
    NotConfigured { shop: String },

    #[error("stored API key for {shop} is unusable: {source}")]
    Unreadable {
        shop: String,
        #[source]
        source: EnvelopeError,
    },

    #[error("failed to seal API key: {0}")]
    Seal(#[source] EnvelopeError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// What the settings page shows for a shop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsStatus {
    /// Normalized shop domain, empty when the input was not a valid shop.
    pub shop: String,
    pub has_api_key: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct SettingsService<S> {
    store: S,
    codec: EnvelopeCodec,
}

impl<S: SettingsStore> SettingsService<S> {
    pub fn new(store: S, codec: EnvelopeCodec) -> Self {
        Self { store, codec }
    }

    /// Validates, encrypts and upserts the API key for `raw_shop`.
    #[tracing::instrument(skip(self, api_key))]
    pub async fn save(&self, raw_shop: &str, api_key: &str) -> Result<ShopSettings, SettingsError> {
        let shop = normalize_shop(raw_shop);
        let api_key = api_key.trim();

        let errors = FieldErrors {
            shop: validate_shop(&shop),
            api_key: validate_api_key(api_key),
        };
        if !errors.is_empty() {
            return Err(SettingsError::Invalid(errors));
        }

        let encrypted_api_key = self.codec.encrypt(api_key).map_err(SettingsError::Seal)?;

        let now = Utc::now();
        let created_at = self
            .store
            .get(&shop)
            .await?
            .map(|existing| existing.created_at)
            .unwrap_or(now);

        let settings = ShopSettings {
            shop,
            encrypted_api_key,
            created_at,
            updated_at: now,
        };
        self.store.upsert(settings.clone()).await?;

        info!(shop = %settings.shop, "what3words API key encrypted and stored");
        Ok(settings)
    }

    /// Reports whether `raw_shop` has a key configured, without decrypting it.
    pub async fn status(&self, raw_shop: &str) -> Result<SettingsStatus, SettingsError> {
        let shop = normalize_shop(raw_shop);
        if !is_valid_shop(&shop) {
            return Ok(SettingsStatus::default());
        }

        let settings = self.store.get(&shop).await?;
        Ok(SettingsStatus {
            has_api_key: settings.is_some(),
            updated_at: settings.map(|s| s.updated_at),
            shop,
        })
    }

    /// Decrypts the stored API key for outbound what3words calls.
    pub async fn load_api_key(&self, raw_shop: &str) -> Result<String, SettingsError> {
        let shop = normalize_shop(raw_shop);
        let settings = self
            .store
            .get(&shop)
            .await?
            .ok_or_else(|| SettingsError::NotConfigured { shop: shop.clone() })?;

        self.codec
            .decrypt(&settings.encrypted_api_key)
            .map_err(|source| SettingsError::Unreadable { shop, source })
    }
}
