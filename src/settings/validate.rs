//! Normalization and validation for the per-shop settings form.

use regex::Regex;
use std::sync::LazyLock;

static SHOP_DOMAIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9][a-z0-9-]*\.myshopify\.com$").expect("invalid shop domain pattern")
});

pub const SHOP_REQUIRED: &str = "Shop domain is required.";
pub const SHOP_MALFORMED: &str = "Shop domain must look like store-name.myshopify.com.";
pub const API_KEY_REQUIRED: &str = "what3words API key is required.";

/// Trims and lowercases a shop domain.
pub fn normalize_shop(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_valid_shop(shop: &str) -> bool {
    SHOP_DOMAIN_PATTERN.is_match(shop)
}

/// Returns the form error for an already-normalized shop domain.
pub fn validate_shop(shop: &str) -> Option<&'static str> {
    if shop.is_empty() {
        return Some(SHOP_REQUIRED);
    }
    if !is_valid_shop(shop) {
        return Some(SHOP_MALFORMED);
    }
    None
}

pub fn validate_api_key(api_key: &str) -> Option<&'static str> {
    if api_key.trim().is_empty() {
        Some(API_KEY_REQUIRED)
    } else {
        None
    }
}
