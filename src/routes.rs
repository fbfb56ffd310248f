use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::admission::AdmissionPolicy;
use crate::config::Config;
use crate::error::ProxyError;
use crate::metrics::EdgeMetrics;
use crate::outage::{OutageAggregator, OutageSnapshot};
use crate::rate_limiter::RateLimiter;
use crate::scrape::{self, FirecrawlClient, ScrapeApi};

pub struct EdgeService {
    admission: AdmissionPolicy,
    scraper: Box<dyn ScrapeApi>,
    rate_limiter: Option<RateLimiter>,
    outages: OutageAggregator,
}

impl EdgeService {
    pub fn new(
        admission: AdmissionPolicy,
        scraper: Box<dyn ScrapeApi>,
        rate_limiter: Option<RateLimiter>,
        outages: OutageAggregator,
    ) -> Self {
        Self {
            admission,
            scraper,
            rate_limiter,
            outages,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = config.http_client()?;

        Ok(Self::new(
            config.admission.clone(),
            Box::new(FirecrawlClient::new(
                client.clone(),
                config.firecrawl_endpoint.clone(),
                config.firecrawl_api_key.clone(),
            )),
            config.scrape_rate_per_second.map(RateLimiter::per_second),
            OutageAggregator::from_config(config, client),
        ))
    }

    /// Validates, admits and forwards a scrape request body.
    pub async fn scrape(&self, body: &[u8]) -> Result<Response, ProxyError> {
        let url = scrape::requested_url(body)?;

        let decision = self.admission.decide(&url);
        EdgeMetrics::record_admission(decision);
        if !decision.is_admitted() {
            warn!(%url, decision = decision.as_str(), "scrape target rejected");
            return Err(ProxyError::UrlNotAllowed(decision));
        }

        if self
            .rate_limiter
            .as_ref()
            .is_some_and(|limiter| !limiter.check())
        {
            EdgeMetrics::record_scrape_rate_limited();
            return Err(ProxyError::RateLimited);
        }

        let reply = self.scraper.scrape(&url).await?;
        EdgeMetrics::record_scrape_upstream(self.scraper.name(), reply.status.as_u16());

        Ok((reply.status, Json(reply.body)).into_response())
    }

    pub async fn outages(&self) -> OutageSnapshot {
        self.outages.snapshot().await
    }
}

#[derive(Clone)]
pub struct AppState {
    service: Arc<EdgeService>,
}

impl AppState {
    pub fn new(service: EdgeService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

async fn handle_scrape(State(state): State<AppState>, body: Bytes) -> Result<Response, ProxyError> {
    state.service.scrape(&body).await
}

async fn handle_outages(State(state): State<AppState>) -> Json<OutageSnapshot> {
    Json(state.service.outages().await)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/firecrawl-scrape", post(handle_scrape))
        .route("/outage-live", get(handle_outages).post(handle_outages))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
