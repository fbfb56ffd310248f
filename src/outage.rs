//! Best-effort aggregation of utility outage feeds.
//!
//! Each provider is fetched independently and yields a [`ProviderResult`].
//! Only reported results make it into the [`OutageSnapshot`]; a failed
//! provider is logged and its key is left out of the response.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{Config, USER_AGENT};
use crate::error::FetchError;
use crate::metrics::EdgeMetrics;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOutage {
    pub affected_areas: Vec<String>,
    pub customers_affected: u64,
    #[serde(serialize_with = "iso8601_millis")]
    pub last_updated: DateTime<Utc>,
}

impl ProviderOutage {
    pub fn empty(last_updated: DateTime<Utc>) -> Self {
        Self {
            affected_areas: Vec::new(),
            customers_affected: 0,
            last_updated,
        }
    }
}

fn iso8601_millis<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutageSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oncor: Option<ProviderOutage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub austin_energy: Option<ProviderOutage>,
}

#[derive(Debug)]
pub enum ProviderResult {
    Reported(ProviderOutage),
    Omitted(FetchError),
}

impl ProviderResult {
    pub fn is_reported(&self) -> bool {
        matches!(self, ProviderResult::Reported(_))
    }

    pub fn reported(self) -> Option<ProviderOutage> {
        match self {
            ProviderResult::Reported(outage) => Some(outage),
            ProviderResult::Omitted(_) => None,
        }
    }
}

#[async_trait]
pub trait OutageProvider: Send + Sync {
    fn name(&self) -> &'static str;
    fn url(&self) -> &str;

    /// Turns a successful response body into an outage record.
    fn extract(&self, body: &[u8], fetched_at: DateTime<Utc>) -> Result<ProviderOutage, FetchError>;

    async fn fetch(&self, client: &reqwest::Client) -> Result<ProviderOutage, FetchError> {
        let response = client
            .get(self.url())
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        self.extract(&body, Utc::now())
    }
}

/// Oncor publishes a GeoJSON-like feed of outage features.
pub struct OncorFeed {
    url: String,
}

impl OncorFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl OutageProvider for OncorFeed {
    fn name(&self) -> &'static str {
        "Oncor"
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn extract(
        &self,
        body: &[u8],
        fetched_at: DateTime<Utc>,
    ) -> Result<ProviderOutage, FetchError> {
        let data: Value =
            serde_json::from_slice(body).map_err(|e| FetchError::Parsing(e.to_string()))?;
        // Only a null document is unusable, any other shape reads as no outages
        if data.is_null() {
            return Err(FetchError::Parsing("feed is null".to_string()));
        }

        let affected_areas = match data.get("features") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(features)) => features
                .iter()
                .map(feature_location)
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(FetchError::Parsing("`features` is not an array".to_string()))
            }
        };

        let customers_affected = data
            .pointer("/summary/customers_out")
            .and_then(Value::as_u64)
            .unwrap_or(0);

        Ok(ProviderOutage {
            affected_areas,
            customers_affected,
            last_updated: fetched_at,
        })
    }
}

fn feature_location(feature: &Value) -> Result<String, FetchError> {
    if feature.is_null() {
        return Err(FetchError::Parsing("null entry in `features`".to_string()));
    }

    Ok(feature
        .pointer("/properties/location")
        .and_then(Value::as_str)
        .filter(|location| !location.is_empty())
        .unwrap_or("Unknown")
        .to_string())
}

/// Austin Energy only exposes an HTML outage map page. Nothing is extracted
/// from it yet, so a reachable page reports an empty outage.
pub struct AustinEnergyStatus {
    url: String,
}

impl AustinEnergyStatus {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl OutageProvider for AustinEnergyStatus {
    fn name(&self) -> &'static str {
        "Austin Energy"
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn extract(
        &self,
        body: &[u8],
        fetched_at: DateTime<Utc>,
    ) -> Result<ProviderOutage, FetchError> {
        debug!(bytes = body.len(), "austin energy page fetched");
        Ok(ProviderOutage::empty(fetched_at))
    }
}

pub struct OutageAggregator {
    client: reqwest::Client,
    oncor: Box<dyn OutageProvider>,
    austin_energy: Box<dyn OutageProvider>,
}

impl OutageAggregator {
    pub fn new(
        client: reqwest::Client,
        oncor: Box<dyn OutageProvider>,
        austin_energy: Box<dyn OutageProvider>,
    ) -> Self {
        Self {
            client,
            oncor,
            austin_energy,
        }
    }

    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        Self::new(
            client,
            Box::new(OncorFeed::new(config.oncor_outage_url.clone())),
            Box::new(AustinEnergyStatus::new(config.austin_energy_outage_url.clone())),
        )
    }

    async fn poll(&self, provider: &dyn OutageProvider) -> ProviderResult {
        let result = match provider.fetch(&self.client).await {
            Ok(outage) => ProviderResult::Reported(outage),
            Err(err) => {
                warn!(provider = provider.name(), %err, "failed to fetch outage data");
                ProviderResult::Omitted(err)
            }
        };
        EdgeMetrics::record_provider_result(provider.name(), result.is_reported());
        result
    }

    /// Both providers are polled concurrently; neither can cancel the other.
    pub async fn snapshot(&self) -> OutageSnapshot {
        let (oncor, austin_energy) = futures::join!(
            self.poll(self.oncor.as_ref()),
            self.poll(self.austin_energy.as_ref())
        );

        OutageSnapshot {
            oncor: oncor.reported(),
            austin_energy: austin_energy.reported(),
        }
    }
}
