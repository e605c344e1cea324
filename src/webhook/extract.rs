//! Pulls the reconciliation target out of an `orders/create` payload.

use super::payload::OrdersCreatePayload;

/// Checkout attribute written by the checkout extension.
pub const W3W_ATTRIBUTE_KEY: &str = "w3w_address";

const ORDER_GID_PREFIX: &str = "gid://shopify/Order/";

fn normalize(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Returns the trimmed `w3w_address` note attribute, if present and non-blank.
///
/// Only the first attribute with an exactly matching name is considered.
pub fn extract_desired_value(payload: &OrdersCreatePayload) -> Option<String> {
    let attribute = payload
        .note_attributes
        .as_deref()?
        .iter()
        .flatten()
        .find(|attribute| attribute.name.as_deref() == Some(W3W_ATTRIBUTE_KEY))?;

    normalize(attribute.value.as_deref())
}

/// Returns the order's Admin API global id.
///
/// Prefers `admin_graphql_api_id`; falls back to templating the raw `id` into
/// `gid://shopify/Order/{id}`. A numeric `id` must be a whole number.
pub fn extract_external_id(payload: &OrdersCreatePayload) -> Option<String> {
    if let Some(gid) = normalize(payload.admin_graphql_api_id.as_deref()) {
        return Some(gid);
    }

    let raw = payload.id.as_ref()?.as_text()?;
    normalize(Some(raw.as_str())).map(|id| format!("{ORDER_GID_PREFIX}{id}"))
}
