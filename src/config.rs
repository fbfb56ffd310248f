use std::env;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;

use thiserror::Error;

use crate::admission::AdmissionPolicy;

pub const DEFAULT_FIRECRAWL_ENDPOINT: &str = "https://api.firecrawl.dev/v0/scrape";
pub const DEFAULT_ONCOR_OUTAGE_URL: &str =
    "https://www.oncor.com/documents/98476/171968/oncor_latest_outage_map_data.json";
pub const DEFAULT_AUSTIN_ENERGY_OUTAGE_URL: &str =
    "https://austinenergy.com/wps/portal/ae/customer-service/outages/outage-map";
pub const USER_AGENT: &str = "Killeen-Weather-Dashboard/1.0";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is not valid: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub firecrawl_api_key: Option<String>,
    pub firecrawl_endpoint: String,
    pub oncor_outage_url: String,
    pub austin_energy_outage_url: String,
    pub admission: AdmissionPolicy,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    /// Unset means scrape forwarding is not rate limited.
    pub scrape_rate_per_second: Option<NonZeroU32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            firecrawl_api_key: None,
            firecrawl_endpoint: DEFAULT_FIRECRAWL_ENDPOINT.to_string(),
            oncor_outage_url: DEFAULT_ONCOR_OUTAGE_URL.to_string(),
            austin_energy_outage_url: DEFAULT_AUSTIN_ENERGY_OUTAGE_URL.to_string(),
            admission: AdmissionPolicy::default(),
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
            scrape_rate_per_second: None,
        }
    }
}

impl Config {
    /// Reads the process environment. Call `dotenv::dotenv()` first if a
    /// `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let bind_addr = match var("BIND_ADDR") {
            Some(value) => parse("BIND_ADDR", value)?,
            None => defaults.bind_addr,
        };

        let admission = match var("ALLOWED_DOMAINS") {
            Some(value) => AdmissionPolicy::with_allowed_domains(value.split(',')),
            None => defaults.admission,
        };

        let connect_timeout = match var("UPSTREAM_CONNECT_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse("UPSTREAM_CONNECT_TIMEOUT_SECS", value)?),
            None => defaults.connect_timeout,
        };

        let timeout = match var("UPSTREAM_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse("UPSTREAM_TIMEOUT_SECS", value)?),
            None => defaults.timeout,
        };

        let scrape_rate_per_second = match var("SCRAPE_RATE_PER_SECOND") {
            Some(value) => Some(parse("SCRAPE_RATE_PER_SECOND", value)?),
            None => defaults.scrape_rate_per_second,
        };

        Ok(Self {
            bind_addr,
            firecrawl_api_key: var("FIRECRAWL_API_KEY"),
            firecrawl_endpoint: var("FIRECRAWL_ENDPOINT").unwrap_or(defaults.firecrawl_endpoint),
            oncor_outage_url: var("ONCOR_OUTAGE_URL").unwrap_or(defaults.oncor_outage_url),
            austin_energy_outage_url: var("AUSTIN_ENERGY_OUTAGE_URL")
                .unwrap_or(defaults.austin_energy_outage_url),
            admission,
            connect_timeout,
            timeout,
            scrape_rate_per_second,
        })
    }

    /// Shared outbound client with the configured timeouts.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .build()
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, SocketAddr::from(([0, 0, 0, 0], 3000)));
        assert_eq!(config.firecrawl_api_key, None);
        assert_eq!(config.firecrawl_endpoint, DEFAULT_FIRECRAWL_ENDPOINT);
        assert_eq!(config.oncor_outage_url, DEFAULT_ONCOR_OUTAGE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.scrape_rate_per_second, None);
        assert_eq!(config.admission, AdmissionPolicy::default());
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = config_from(&[("FIRECRAWL_API_KEY", "   ")]).unwrap();
        assert_eq!(config.firecrawl_api_key, None);
    }

    #[test]
    fn overrides_are_read() {
        let config = config_from(&[
            ("FIRECRAWL_API_KEY", "fc-secret"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("ALLOWED_DOMAINS", "example.org, weather.gov"),
            ("UPSTREAM_TIMEOUT_SECS", "5"),
            ("SCRAPE_RATE_PER_SECOND", "2"),
        ])
        .unwrap();

        assert_eq!(config.firecrawl_api_key.as_deref(), Some("fc-secret"));
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.scrape_rate_per_second, NonZeroU32::new(2));
        assert!(config.admission.admit("https://www.example.org/"));
        assert!(!config.admission.admit("https://www.oncor.com/"));
    }

    #[test]
    fn invalid_numbers_are_errors() {
        let err = config_from(&[("SCRAPE_RATE_PER_SECOND", "0")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "SCRAPE_RATE_PER_SECOND",
                value: "0".to_string()
            }
        );
        assert!(config_from(&[("UPSTREAM_TIMEOUT_SECS", "soon")]).is_err());
        assert!(config_from(&[("BIND_ADDR", "nowhere")]).is_err());
    }
}
