use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use outage_edge::config::Config;
use outage_edge::routes::{router, AppState, EdgeService};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    if config.firecrawl_api_key.is_none() {
        warn!("FIRECRAWL_API_KEY is not set, scrape requests will fail");
    }

    let metrics = PrometheusBuilder::new().install_recorder()?;

    let service = EdgeService::from_config(&config)?;
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(metrics.render())))
        .merge(router(AppState::new(service)));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "outage edge listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
