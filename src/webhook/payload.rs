//! Subset of the `orders/create` webhook body this service reads.
//!
//! Fields are read leniently: a value of the wrong JSON type is treated as
//! absent rather than failing the whole delivery.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Largest integer an `f64` holds exactly (2^53).
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Numeric order id as sent by Shopify, or a string form of it.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderId {
    Number(serde_json::Number),
    Text(String),
}

impl OrderId {
    /// Decimal text of the id. `None` for numbers that are not whole.
    pub fn as_text(&self) -> Option<String> {
        match self {
            OrderId::Number(n) => {
                if n.is_u64() || n.is_i64() {
                    return Some(n.to_string());
                }
                let float = n.as_f64()?;
                (float.fract() == 0.0 && float.abs() <= MAX_EXACT_FLOAT)
                    .then(|| format!("{float:.0}"))
            }
            OrderId::Text(s) => Some(s.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NoteAttribute {
    #[serde(default, deserialize_with = "string_or_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub value: Option<String>,
}

impl NoteAttribute {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            value: Some(value.to_string()),
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OrdersCreatePayload {
    #[serde(default, deserialize_with = "order_id_or_none")]
    pub id: Option<OrderId>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub admin_graphql_api_id: Option<String>,
    /// Entries that are not objects (including `null`) are kept as `None`.
    #[serde(default, deserialize_with = "attributes_or_none")]
    pub note_attributes: Option<Vec<Option<NoteAttribute>>>,
}

impl OrdersCreatePayload {
    /// Parses a webhook body. Fails only when the body is not a JSON object.
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_slice(body)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom("expected a JSON object"));
        }
        serde_json::from_value(value)
    }
}

fn string_or_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn order_id_or_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<OrderId>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(Some(OrderId::Number(n))),
        Value::String(s) => Ok(Some(OrderId::Text(s))),
        _ => Ok(None),
    }
}

fn attributes_or_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<Option<NoteAttribute>>>, D::Error> {
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(Some(items.into_iter().map(NoteAttribute::from_value).collect()))
}
