//! Admission control for outbound scrape targets.
//!
//! A candidate URL is admitted only when it parses, its host is not a
//! loopback or private-network literal, and the host ends with one of the
//! allow-listed domain suffixes.
//!
//! Matching is intentionally literal and inherits three known gaps, each
//! pinned by a test below:
//! - private ranges are prefix matched (`172.` blocks all of `172.0.0.0/8`,
//!   not just `172.16.0.0/12`);
//! - IPv6 loopback and unique-local hosts are never blocked;
//! - suffixes have no dot boundary, so `fakeoncor.com` passes for `oncor.com`.

use url::Url;

pub const DEFAULT_ALLOWED_DOMAINS: &[&str] =
    &["oncor.com", "austineergy.com", "nws.noaa.gov", "weather.gov"];

pub const DEFAULT_BLOCKED_HOSTS: &[&str] = &["localhost", "127.0.0.1"];

pub const DEFAULT_BLOCKED_PREFIXES: &[&str] = &["192.168.", "10.", "172."];

/// Outcome of evaluating one candidate against an [`AdmissionPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    Admitted,
    Malformed,
    MissingHost,
    InternalHost,
    NotAllowListed,
}

impl AdmissionDecision {
    pub fn is_admitted(self) -> bool {
        matches!(self, AdmissionDecision::Admitted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AdmissionDecision::Admitted => "admitted",
            AdmissionDecision::Malformed => "malformed",
            AdmissionDecision::MissingHost => "missing_host",
            AdmissionDecision::InternalHost => "internal_host",
            AdmissionDecision::NotAllowListed => "not_allow_listed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionPolicy {
    allowed_suffixes: Vec<String>,
    blocked_hosts: Vec<String>,
    blocked_prefixes: Vec<String>,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self::with_allowed_domains(DEFAULT_ALLOWED_DOMAINS.iter().copied())
    }
}

impl AdmissionPolicy {
    /// Builds a policy with the given allow-list and the stock loopback and
    /// private-prefix blocks.
    pub fn with_allowed_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_suffixes: normalize(domains),
            blocked_hosts: normalize(DEFAULT_BLOCKED_HOSTS.iter().copied()),
            blocked_prefixes: normalize(DEFAULT_BLOCKED_PREFIXES.iter().copied()),
        }
    }

    pub fn blocked_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blocked_hosts = normalize(hosts);
        self
    }

    pub fn blocked_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blocked_prefixes = normalize(prefixes);
        self
    }

    pub fn allowed_suffixes(&self) -> &[String] {
        &self.allowed_suffixes
    }

    pub fn admit(&self, candidate: &str) -> bool {
        self.decide(candidate).is_admitted()
    }

    /// Never fails: unparseable input is a [`AdmissionDecision::Malformed`]
    /// verdict rather than an error.
    pub fn decide(&self, candidate: &str) -> AdmissionDecision {
        let Ok(url) = Url::parse(candidate) else {
            return AdmissionDecision::Malformed;
        };

        let Some(host) = url.host_str() else {
            return AdmissionDecision::MissingHost;
        };
        let host = host.to_lowercase();

        if self.is_internal(&host) {
            return AdmissionDecision::InternalHost;
        }

        if self
            .allowed_suffixes
            .iter()
            .any(|suffix| host.ends_with(suffix.as_str()))
        {
            AdmissionDecision::Admitted
        } else {
            AdmissionDecision::NotAllowListed
        }
    }

    fn is_internal(&self, host: &str) -> bool {
        self.blocked_hosts.iter().any(|blocked| blocked == host)
            || self
                .blocked_prefixes
                .iter()
                .any(|prefix| host.starts_with(prefix.as_str()))
    }
}

fn normalize<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| value.as_ref().trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}
