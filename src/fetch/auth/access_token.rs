use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

pub const SHOPIFY_ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// An [`HttpClient`] wrapper that injects an access token as an HTTP header.
///
/// The header value is marked sensitive so it is omitted from reqwest's
/// debug output.
pub struct AccessToken<C> {
    inner: C,
    header_name: HeaderName,
    value: HeaderValue,
}

impl<C> AccessToken<C> {
    pub fn new(inner: C, header_name: &str, token: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .with_context(|| format!("invalid header name '{header_name}'"))?;
        let mut value =
            HeaderValue::from_str(token).context("access token is not a valid header value")?;
        value.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            value,
        })
    }

    /// Uses the Admin API header, `X-Shopify-Access-Token: <token>`.
    pub fn shopify(inner: C, token: &str) -> Result<Self> {
        Self::new(inner, SHOPIFY_ACCESS_TOKEN_HEADER, token)
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for AccessToken<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}
