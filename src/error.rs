use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::admission::AdmissionDecision;

/// Everything that can end a scrape proxy request early.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("URL parameter is required")]
    MissingUrl,

    #[error("Request body is not valid JSON: {0}")]
    InvalidBody(#[source] serde_json::Error),

    #[error("URL is not allowed for security reasons")]
    UrlNotAllowed(AdmissionDecision),

    #[error("Too many scrape requests, try again shortly")]
    RateLimited,

    #[error("FIRECRAWL_API_KEY not configured")]
    MissingCredential,

    #[error("Request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Upstream returned an invalid body: {0}")]
    UpstreamBody(#[source] serde_json::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingUrl | ProxyError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::UrlNotAllowed(_) => StatusCode::FORBIDDEN,
            ProxyError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::MissingCredential
            | ProxyError::Upstream(_)
            | ProxyError::UpstreamBody(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to hand back to the caller. Server-side failures never
    /// expose their underlying cause.
    pub fn public_message(&self) -> String {
        match self {
            ProxyError::MissingCredential => "Scraping service is not configured".to_string(),
            ProxyError::Upstream(_) => "Scraping service request failed".to_string(),
            ProxyError::UpstreamBody(_) => {
                "Scraping service returned an invalid response".to_string()
            }
            other => other.to_string(),
        }
    }
}

// How error responses are serialized
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            // TraceLayer already carries method and uri on the span
            tracing::error!(err = %self, "scrape proxy failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}

/// Failure of a single outage provider fetch. Never surfaced to callers.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected status: {0}")]
    Status(StatusCode),

    #[error("Parsing failed: {0}")]
    Parsing(String),
}
