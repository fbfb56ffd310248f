pub mod admission;
pub mod config;
pub mod error;
pub mod metrics;
pub mod outage;
pub mod rate_limiter;
pub mod routes;
pub mod scrape;
