use metrics::counter;

use crate::admission::AdmissionDecision;

pub struct EdgeMetrics;

impl EdgeMetrics {
    // Record every admission verdict, admitted or not
    pub fn record_admission(decision: AdmissionDecision) {
        counter!("admission_decisions_total", "decision" => decision.as_str()).increment(1);
    }

    // Record the status the scraping service answered with
    pub fn record_scrape_upstream(upstream: &'static str, status: u16) {
        counter!(
            "scrape_upstream_total",
            "upstream" => upstream,
            "status" => status.to_string()
        )
        .increment(1);
    }

    pub fn record_scrape_rate_limited() {
        counter!("scrape_rate_limited_total").increment(1);
    }

    // Record success/failure of outage provider fetches
    pub fn record_provider_result(provider: &'static str, success: bool) {
        counter!("outage_provider_total", "provider" => provider, "success" => success.to_string())
            .increment(1);
    }
}
