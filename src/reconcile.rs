//! Check-then-write reconciliation of the order's what3words metafield.
//!
//! One invocation handles one event: read the current metafield, compare it
//! with the desired value, and write only when they differ. Nothing is
//! retried here; a redelivered event converges because an up-to-date
//! metafield short-circuits before the write.

use thiserror::Error;
use tracing::{error, info};

use crate::services::metafield_api::{
    MetafieldApi, MetafieldCoordinates, MetafieldInput, UserError,
};
use crate::webhook::extract::{extract_desired_value, extract_external_id};
use crate::webhook::payload::OrdersCreatePayload;

pub const W3W_METAFIELD: MetafieldCoordinates = MetafieldCoordinates {
    namespace: "w3w",
    key: "address",
};
pub const W3W_METAFIELD_TYPE: &str = "single_line_text_field";

/// What the reconciler decided for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event carried no address or no order id; nothing was called.
    NothingToPersist,
    /// The stored value already matched; no write was issued.
    AlreadyUpToDate { order_id: String },
    /// One write landed without user errors.
    Persisted { order_id: String, value: String },
    /// The write was refused by the downstream API.
    Rejected {
        order_id: String,
        user_errors: Vec<UserError>,
    },
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Rejected { .. })
    }
}

/// Downstream call that did not complete.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to read metafield for {order_id}: {source}")]
    Read {
        order_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to write metafield for {order_id}: {source}")]
    Write {
        order_id: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Brings the order metafield in line with the checkout attribute.
pub struct Reconciler<A> {
    api: A,
}

impl<A: MetafieldApi> Reconciler<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Extracts the target from `payload` and reconciles it.
    pub async fn reconcile_payload(
        &self,
        payload: &OrdersCreatePayload,
    ) -> Result<Outcome, ReconcileError> {
        let desired = extract_desired_value(payload);
        let order_id = extract_external_id(payload);

        match (order_id, desired) {
            (Some(order_id), Some(desired)) => self.reconcile(&order_id, &desired).await,
            _ => {
                info!("No w3w_address to persist");
                Ok(Outcome::NothingToPersist)
            }
        }
    }

    /// Reads the current value for `order_id` and writes `desired` if it differs.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self, order_id: &str, desired: &str) -> Result<Outcome, ReconcileError> {
        let current = self
            .api
            .read_metafield(order_id, W3W_METAFIELD)
            .await
            .map_err(|source| ReconcileError::Read {
                order_id: order_id.to_string(),
                source,
            })?;

        if current.as_deref().map(str::trim) == Some(desired) {
            info!("Metafield already up to date");
            return Ok(Outcome::AlreadyUpToDate {
                order_id: order_id.to_string(),
            });
        }

        let input = MetafieldInput {
            owner_id: order_id.to_string(),
            namespace: W3W_METAFIELD.namespace.to_string(),
            key: W3W_METAFIELD.key.to_string(),
            field_type: W3W_METAFIELD_TYPE.to_string(),
            value: desired.to_string(),
        };

        let user_errors =
            self.api
                .set_metafield(input)
                .await
                .map_err(|source| ReconcileError::Write {
                    order_id: order_id.to_string(),
                    source,
                })?;

        if !user_errors.is_empty() {
            error!(?user_errors, "metafieldsSet userErrors");
            return Ok(Outcome::Rejected {
                order_id: order_id.to_string(),
                user_errors,
            });
        }

        info!("Persisted w3w metafield");
        Ok(Outcome::Persisted {
            order_id: order_id.to_string(),
            value: desired.to_string(),
        })
    }
}
