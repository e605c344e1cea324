use tracing::{Instrument, error, info, warn};

use super::payload::OrdersCreatePayload;
use crate::reconcile::{Outcome, Reconciler};
use crate::services::metafield_api::MetafieldApi;

/// Delivery metadata from the (already authenticated) webhook request.
#[derive(Debug, Clone)]
pub struct WebhookContext {
    pub topic: String,
    pub shop: String,
    pub webhook_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    /// `None` when no reconciliation ran (no session or unreadable body).
    pub outcome: Option<Outcome>,
}

impl WebhookResponse {
    fn new(status: u16, outcome: Option<Outcome>) -> Self {
        Self { status, outcome }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Handles one `orders/create` delivery.
///
/// `reconciler` is `None` when the shop has no active admin session; the
/// delivery is acknowledged and skipped. Rejected writes and downstream
/// failures answer 500 so the platform redelivers.
pub async fn handle_orders_create<A: MetafieldApi>(
    ctx: &WebhookContext,
    body: &[u8],
    reconciler: Option<&Reconciler<A>>,
) -> WebhookResponse {
    let span = tracing::info_span!(
        "webhook",
        topic = %ctx.topic,
        shop = %ctx.shop,
        webhook_id = %ctx.webhook_id,
    );

    async move {
        let Some(reconciler) = reconciler else {
            info!("Skipped: no active session");
            return WebhookResponse::new(200, None);
        };

        let payload = match OrdersCreatePayload::from_slice(body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Webhook body is not a valid orders/create payload");
                return WebhookResponse::new(400, None);
            }
        };

        match reconciler.reconcile_payload(&payload).await {
            Ok(outcome) if outcome.is_failure() => WebhookResponse::new(500, Some(outcome)),
            Ok(outcome) => WebhookResponse::new(200, Some(outcome)),
            Err(e) => {
                error!(error = %e, "Metafield reconciliation failed");
                WebhookResponse::new(500, None)
            }
        }
    }
    .instrument(span)
    .await
}
