//! `orders/create` webhook handling: payload shape, extraction, and the
//! handler that maps reconciliation outcomes to HTTP statuses.

pub mod extract;
pub mod handler;
pub mod payload;

pub use extract::{W3W_ATTRIBUTE_KEY, extract_desired_value, extract_external_id};
pub use handler::{WebhookContext, WebhookResponse, handle_orders_create};
pub use payload::{NoteAttribute, OrderId, OrdersCreatePayload};
