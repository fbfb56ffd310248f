#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use outage_edge::admission::AdmissionPolicy;
use outage_edge::config::Config;
use outage_edge::outage::OutageAggregator;
use outage_edge::rate_limiter::RateLimiter;
use outage_edge::routes::{router, AppState, EdgeService};
use outage_edge::scrape::FirecrawlClient;
use serde_json::Value;
use tower::ServiceExt;

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A local URL nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

// Proxy variables in the test environment must not reroute local upstreams
fn local_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

pub fn test_config() -> Config {
    Config {
        firecrawl_api_key: Some("test-key".to_string()),
        firecrawl_endpoint: closed_port_url(),
        oncor_outage_url: closed_port_url(),
        austin_energy_outage_url: closed_port_url(),
        ..Config::default()
    }
}

pub fn app(config: &Config) -> Router {
    app_with_policy(config, config.admission.clone())
}

pub fn app_with_policy(config: &Config, admission: AdmissionPolicy) -> Router {
    let client = local_client();
    let service = EdgeService::new(
        admission,
        Box::new(FirecrawlClient::new(
            client.clone(),
            config.firecrawl_endpoint.clone(),
            config.firecrawl_api_key.clone(),
        )),
        config.scrape_rate_per_second.map(RateLimiter::per_second),
        OutageAggregator::from_config(config, client),
    );
    router(AppState::new(service))
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
