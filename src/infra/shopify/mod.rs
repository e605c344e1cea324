//! Shopify Admin GraphQL implementation of [`MetafieldApi`](crate::services::metafield_api::MetafieldApi).

mod client;

pub use client::{DEFAULT_API_VERSION, ShopifyAdminClient};
