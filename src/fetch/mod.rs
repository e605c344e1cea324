mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// POSTs `body` as JSON and decodes a JSON response.
///
/// Non-2xx statuses are errors carrying the response body.
pub async fn post_json<C, B, R>(client: &C, url: &str, body: &B) -> Result<R>
where
    C: HttpClient + ?Sized,
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let mut req = reqwest::Request::new(
        reqwest::Method::POST,
        url.parse::<reqwest::Url>()
            .with_context(|| format!("invalid URL '{url}'"))?,
    );
    req.headers_mut().insert(
        reqwest::header::CONTENT_TYPE,
        reqwest::header::HeaderValue::from_static("application/json"),
    );
    *req.body_mut() = Some(serde_json::to_vec(body)?.into());

    let resp = client
        .execute(req)
        .await
        .map_err(|e| anyhow!("Failed to send request: {}", e))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow!("API returned status {}: {}", status, body));
    }

    resp.json()
        .await
        .map_err(|e| anyhow!("Failed to parse response: {}", e))
}
