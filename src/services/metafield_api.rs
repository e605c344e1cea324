//! Trait and types for reading and writing order metafields.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Namespace and key addressing one metafield on an owner resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetafieldCoordinates {
    pub namespace: &'static str,
    pub key: &'static str,
}

/// One entry of a `metafieldsSet` mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetafieldInput {
    pub owner_id: String,
    pub namespace: String,
    pub key: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub value: String,
}

/// Structured rejection returned by the downstream API for a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    pub message: String,
    #[serde(default)]
    pub field: Option<Vec<String>>,
}

/// Abstraction over the store that holds order metafields (e.g., the Shopify Admin API).
///
/// `Err` means the call itself failed (transport, status, malformed response);
/// a write that reached the API but was refused comes back as `Ok` with
/// a non-empty list of [`UserError`]s.
#[async_trait::async_trait]
pub trait MetafieldApi: Send + Sync {
    /// Current value of the metafield at `coordinates` on `owner_id`, if set.
    async fn read_metafield(
        &self,
        owner_id: &str,
        coordinates: MetafieldCoordinates,
    ) -> Result<Option<String>>;

    /// Sets a metafield, returning the user errors reported for the write.
    async fn set_metafield(&self, input: MetafieldInput) -> Result<Vec<UserError>>;
}
