//! Process configuration read from the environment (after `.env` is loaded).

use std::fmt;
use std::path::PathBuf;

use crate::crypto::{EncryptionKey, KeyError};
use crate::infra::shopify::DEFAULT_API_VERSION;

pub const DEFAULT_SETTINGS_PATH: &str = "data/shop_settings.json";

/// Shopify app registration values.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ShopifyAppConfig {
    pub api_key: String,
    pub api_secret_key: String,
    pub scopes: Vec<String>,
    pub app_url: String,
}

impl ShopifyAppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_key: lookup("SHOPIFY_API_KEY").unwrap_or_default(),
            api_secret_key: lookup("SHOPIFY_API_SECRET").unwrap_or_default(),
            scopes: parse_scopes(&lookup("SCOPES").unwrap_or_default()),
            app_url: lookup("SHOPIFY_APP_URL").unwrap_or_default(),
        }
    }
}

impl fmt::Debug for ShopifyAppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopifyAppConfig")
            .field("api_key", &self.api_key)
            .field("api_secret_key", &"<redacted>")
            .field("scopes", &self.scopes)
            .field("app_url", &self.app_url)
            .finish()
    }
}

fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|scope| !scope.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug)]
pub struct AppConfig {
    pub shopify: ShopifyAppConfig,
    pub api_version: String,
    pub settings_path: PathBuf,
    pub encryption_key: EncryptionKey,
}

impl AppConfig {
    /// Loads everything the service needs, failing if the encryption key is
    /// missing or malformed.
    pub fn from_env() -> Result<Self, KeyError> {
        let encryption_key = EncryptionKey::from_env()?;

        let api_version = std::env::var("SHOPIFY_API_VERSION")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        let settings_path = std::env::var("SETTINGS_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SETTINGS_PATH.to_string());

        Ok(Self {
            shopify: ShopifyAppConfig::from_env(),
            api_version,
            settings_path: PathBuf::from(settings_path),
            encryption_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_scopes_are_trimmed_and_filtered() {
        assert_eq!(
            parse_scopes(" read_orders, write_orders ,,"),
            vec!["read_orders", "write_orders"]
        );
        assert!(parse_scopes("").is_empty());
    }

    #[test]
    fn test_shopify_config_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SHOPIFY_API_KEY", "client-id"),
            ("SHOPIFY_API_SECRET", "shhh"),
            ("SCOPES", "read_orders,write_orders"),
        ]);
        let config = ShopifyAppConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.api_key, "client-id");
        assert_eq!(config.scopes.len(), 2);
        assert_eq!(config.app_url, "");
        assert!(!format!("{config:?}").contains("shhh"));
    }
}
