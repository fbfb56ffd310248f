use async_trait::async_trait;
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::error::ProxyError;

/// What the scraping service answered, relayed to the caller as is.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Value,
}

#[async_trait]
pub trait ScrapeApi: Send + Sync {
    fn name(&self) -> &'static str;

    /// Forwards an already admitted URL.
    async fn scrape(&self, url: &str) -> Result<UpstreamReply, ProxyError>;
}

#[derive(Serialize)]
struct ScrapeBody<'a> {
    url: &'a str,
}

pub struct FirecrawlClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl FirecrawlClient {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl ScrapeApi for FirecrawlClient {
    fn name(&self) -> &'static str {
        "Firecrawl"
    }

    async fn scrape(&self, url: &str) -> Result<UpstreamReply, ProxyError> {
        let api_key = self.api_key.as_deref().ok_or(ProxyError::MissingCredential)?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&ScrapeBody { url })
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes).map_err(ProxyError::UpstreamBody)?;

        Ok(UpstreamReply { status, body })
    }
}

/// Pulls a usable `url` out of the request body. Missing, empty and
/// non-string values are all the same client error.
pub fn requested_url(body: &[u8]) -> Result<String, ProxyError> {
    let value: Value = serde_json::from_slice(body).map_err(ProxyError::InvalidBody)?;

    value
        .get("url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or(ProxyError::MissingUrl)
}
