use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fetch::{HttpClient, post_json};
use crate::services::metafield_api::{
    MetafieldApi, MetafieldCoordinates, MetafieldInput, UserError,
};

pub const DEFAULT_API_VERSION: &str = "2024-10";

const GET_ORDER_METAFIELD_QUERY: &str = r#"
  query GetOrderW3WMetafield($id: ID!, $namespace: String!, $key: String!) {
    order(id: $id) {
      metafield(namespace: $namespace, key: $key) {
        value
      }
    }
  }
"#;

const SET_ORDER_METAFIELD_MUTATION: &str = r#"
  mutation SetOrderW3WMetafield($metafields: [MetafieldsSetInput!]!) {
    metafieldsSet(metafields: $metafields) {
      userErrors {
        field
        message
      }
    }
  }
"#;

#[derive(Serialize)]
struct GraphqlRequest<'a, V> {
    query: &'a str,
    variables: V,
}

#[derive(Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

impl<T> GraphqlResponse<T> {
    /// Top-level GraphQL errors fail the whole call.
    fn into_data(self) -> Result<Option<T>> {
        if self.errors.is_empty() {
            return Ok(self.data);
        }
        let messages: Vec<String> = self.errors.into_iter().map(|e| e.message).collect();
        Err(anyhow!("GraphQL request failed: {}", messages.join("; ")))
    }
}

#[derive(Serialize)]
struct MetafieldQueryVariables<'a> {
    id: &'a str,
    namespace: &'a str,
    key: &'a str,
}

#[derive(Deserialize)]
struct OrderMetafieldData {
    order: Option<OrderNode>,
}

#[derive(Deserialize)]
struct OrderNode {
    metafield: Option<MetafieldNode>,
}

#[derive(Deserialize)]
struct MetafieldNode {
    value: Option<String>,
}

#[derive(Serialize)]
struct MetafieldsSetVariables {
    metafields: Vec<MetafieldInput>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetafieldsSetData {
    metafields_set: Option<MetafieldsSetPayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetafieldsSetPayload {
    #[serde(default)]
    user_errors: Vec<UserError>,
}

/// Shopify Admin GraphQL API client for a single shop.
///
/// Authentication is the wrapped [`HttpClient`]'s concern, typically
/// [`AccessToken`](crate::fetch::auth::AccessToken).
pub struct ShopifyAdminClient<C> {
    client: C,
    endpoint: String,
}

impl<C: HttpClient> ShopifyAdminClient<C> {
    pub fn new(client: C, shop: &str, api_version: &str) -> Self {
        Self {
            client,
            endpoint: format!("https://{shop}/admin/api/{api_version}/graphql.json"),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl<C: HttpClient> MetafieldApi for ShopifyAdminClient<C> {
    async fn read_metafield(
        &self,
        owner_id: &str,
        coordinates: MetafieldCoordinates,
    ) -> Result<Option<String>> {
        let request = GraphqlRequest {
            query: GET_ORDER_METAFIELD_QUERY,
            variables: MetafieldQueryVariables {
                id: owner_id,
                namespace: coordinates.namespace,
                key: coordinates.key,
            },
        };

        let response: GraphqlResponse<OrderMetafieldData> =
            post_json(&self.client, &self.endpoint, &request).await?;

        let value = response
            .into_data()?
            .and_then(|data| data.order)
            .and_then(|order| order.metafield)
            .and_then(|metafield| metafield.value);

        debug!(owner_id, found = value.is_some(), "Metafield read");
        Ok(value)
    }

    async fn set_metafield(&self, input: MetafieldInput) -> Result<Vec<UserError>> {
        let request = GraphqlRequest {
            query: SET_ORDER_METAFIELD_MUTATION,
            variables: MetafieldsSetVariables {
                metafields: vec![input],
            },
        };

        let response: GraphqlResponse<MetafieldsSetData> =
            post_json(&self.client, &self.endpoint, &request).await?;

        Ok(response
            .into_data()?
            .and_then(|data| data.metafields_set)
            .map(|payload| payload.user_errors)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const COORDINATES: MetafieldCoordinates = MetafieldCoordinates {
        namespace: "w3w",
        key: "address",
    };

    /// Replays canned `(status, body)` pairs and records request bodies.
    #[derive(Default)]
    struct CannedClient {
        responses: Mutex<VecDeque<(u16, &'static str)>>,
        requests: Mutex<Vec<(String, serde_json::Value)>>,
    }

    impl CannedClient {
        fn with(responses: &[(u16, &'static str)]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().copied().collect()),
                requests: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl HttpClient for CannedClient {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            let body = req
                .body()
                .and_then(|b| b.as_bytes())
                .map(|b| serde_json::from_slice(b).unwrap())
                .unwrap_or(serde_json::Value::Null);
            self.requests
                .lock()
                .unwrap()
                .push((req.url().to_string(), body));

            let (status, body) = self.responses.lock().unwrap().pop_front().unwrap();
            let resp = http::Response::builder().status(status).body(body).unwrap();
            Ok(resp.into())
        }
    }

    fn input() -> MetafieldInput {
        MetafieldInput {
            owner_id: "gid://shopify/Order/1".to_string(),
            namespace: "w3w".to_string(),
            key: "address".to_string(),
            field_type: "single_line_text_field".to_string(),
            value: "filled.count.soap".to_string(),
        }
    }

    #[test]
    fn test_endpoint_for_shop() {
        let client = ShopifyAdminClient::new(CannedClient::default(), "demo.myshopify.com", "2024-10");
        assert_eq!(
            client.endpoint(),
            "https://demo.myshopify.com/admin/api/2024-10/graphql.json"
        );
    }

    #[tokio::test]
    async fn test_read_existing_value() {
        let http = CannedClient::with(&[(
            200,
            r#"{"data":{"order":{"metafield":{"value":"filled.count.soap"}}}}"#,
        )]);
        let client = ShopifyAdminClient::new(http, "demo.myshopify.com", DEFAULT_API_VERSION);

        let value = client
            .read_metafield("gid://shopify/Order/1", COORDINATES)
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("filled.count.soap"));

        let requests = client.client.requests.lock().unwrap();
        let (url, body) = &requests[0];
        assert_eq!(url, "https://demo.myshopify.com/admin/api/2024-10/graphql.json");
        assert_eq!(body["variables"]["id"], "gid://shopify/Order/1");
        assert_eq!(body["variables"]["namespace"], "w3w");
        assert_eq!(body["variables"]["key"], "address");
        assert!(body["query"].as_str().unwrap().contains("metafield(namespace"));
    }

    #[tokio::test]
    async fn test_read_missing_metafield_or_order() {
        let http = CannedClient::with(&[
            (200, r#"{"data":{"order":{"metafield":null}}}"#),
            (200, r#"{"data":{"order":null}}"#),
        ]);
        let client = ShopifyAdminClient::new(http, "demo.myshopify.com", DEFAULT_API_VERSION);

        assert_eq!(client.read_metafield("gid://shopify/Order/1", COORDINATES).await.unwrap(), None);
        assert_eq!(client.read_metafield("gid://shopify/Order/1", COORDINATES).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_fails_on_http_status() {
        let http = CannedClient::with(&[(401, r#"{"errors":"Invalid API key or access token"}"#)]);
        let client = ShopifyAdminClient::new(http, "demo.myshopify.com", DEFAULT_API_VERSION);

        let err = client
            .read_metafield("gid://shopify/Order/1", COORDINATES)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_read_fails_on_graphql_errors() {
        let http = CannedClient::with(&[(
            200,
            r#"{"data":null,"errors":[{"message":"Throttled"}]}"#,
        )]);
        let client = ShopifyAdminClient::new(http, "demo.myshopify.com", DEFAULT_API_VERSION);

        let err = client
            .read_metafield("gid://shopify/Order/1", COORDINATES)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Throttled"));
    }

    #[tokio::test]
    async fn test_set_sends_single_metafield_input() {
        let http = CannedClient::with(&[(200, r#"{"data":{"metafieldsSet":{"userErrors":[]}}}"#)]);
        let client = ShopifyAdminClient::new(http, "demo.myshopify.com", DEFAULT_API_VERSION);

        let errors = client.set_metafield(input()).await.unwrap();
        assert!(errors.is_empty());

        let requests = client.client.requests.lock().unwrap();
        let metafields = requests[0].1["variables"]["metafields"].as_array().unwrap();
        assert_eq!(metafields.len(), 1);
        assert_eq!(metafields[0]["ownerId"], "gid://shopify/Order/1");
        assert_eq!(metafields[0]["type"], "single_line_text_field");
        assert_eq!(metafields[0]["value"], "filled.count.soap");
    }

    #[tokio::test]
    async fn test_set_returns_user_errors() {
        let http = CannedClient::with(&[(
            200,
            r#"{"data":{"metafieldsSet":{"userErrors":[{"field":["metafields","0","value"],"message":"Value is invalid"}]}}}"#,
        )]);
        let client = ShopifyAdminClient::new(http, "demo.myshopify.com", DEFAULT_API_VERSION);

        let errors = client.set_metafield(input()).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Value is invalid");
        assert_eq!(
            errors[0].field.as_deref(),
            Some(&["metafields".to_string(), "0".to_string(), "value".to_string()][..])
        );
    }
}
