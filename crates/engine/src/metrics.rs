//! Engine metrics using the native Prometheus client.
//!
//! Metrics are domain-specific rather than generic event counters; use
//! traces for event-level granularity during investigations.

use prometheus::{
    register_counter, register_counter_vec, register_gauge, Counter, CounterVec, Gauge,
};
use std::sync::OnceLock;

static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Domain-specific metrics for the consensus engine.
pub struct Metrics {
    /// Candidates currently being voted on.
    pub records_active: Gauge,
    /// Outstanding queries awaiting a response.
    pub queries_outstanding: Gauge,
    /// Queries dispatched to peers.
    pub queries_sent: Counter,
    /// Queries that failed or timed out.
    pub queries_expired: Counter,
    /// Queries answered for peers.
    pub inbound_queries: Counter,
    /// Terminal verdicts delivered, labeled by status.
    pub verdicts: CounterVec,
}

impl Metrics {
    fn new() -> Self {
        Self {
            records_active: register_gauge!(
                "snowfall_records_active",
                "Candidates currently being voted on"
            )
            .unwrap(),

            queries_outstanding: register_gauge!(
                "snowfall_queries_outstanding",
                "Outstanding poll queries awaiting a response"
            )
            .unwrap(),

            queries_sent: register_counter!(
                "snowfall_queries_sent_total",
                "Total poll queries dispatched to peers"
            )
            .unwrap(),

            queries_expired: register_counter!(
                "snowfall_queries_expired_total",
                "Total poll queries that failed or timed out"
            )
            .unwrap(),

            inbound_queries: register_counter!(
                "snowfall_inbound_queries_total",
                "Total inbound poll queries answered"
            )
            .unwrap(),

            verdicts: register_counter_vec!(
                "snowfall_verdicts_total",
                "Terminal verdicts delivered",
                &["status"]
            )
            .unwrap(),
        }
    }
}

/// Global metrics instance, registered on first use.
pub fn global() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}

/// Record a delivered verdict.
pub fn record_verdict(status: snowfall_types::Status) {
    global()
        .verdicts
        .with_label_values(&[&status.to_string()])
        .inc();
}
