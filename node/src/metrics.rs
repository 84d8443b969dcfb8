//! # Prometheus Metrics
//!
//! Operational counters for the ledger host. `run --metrics-out` writes
//! them in the Prometheus text exposition format once the input is
//! drained, for a node-exporter textfile collector to pick up.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (prometheus handles are `Arc`s internally) so it can be
/// shared with the executor.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Invocations whose transaction committed (reads included).
    pub transactions_committed_total: IntCounter,
    /// Invocations rejected by a business rule, labelled by error kind.
    pub transactions_rejected_total: IntCounterVec,
    /// Invocations aborted by a storage, encoding, or invariant fault.
    pub infrastructure_faults_total: IntCounter,
    /// Events released by committed transactions.
    pub events_emitted_total: IntCounter,
    /// Histogram of transaction execution latency in seconds.
    pub transaction_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("assetledger".into()), None)?;

        let transactions_committed_total = IntCounter::new(
            "transactions_committed_total",
            "Total number of invocations whose transaction committed",
        )?;
        registry.register(Box::new(transactions_committed_total.clone()))?;

        let transactions_rejected_total = IntCounterVec::new(
            Opts::new(
                "transactions_rejected_total",
                "Total number of invocations rejected by a business rule",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(transactions_rejected_total.clone()))?;

        let infrastructure_faults_total = IntCounter::new(
            "infrastructure_faults_total",
            "Total number of invocations aborted by an infrastructure fault",
        )?;
        registry.register(Box::new(infrastructure_faults_total.clone()))?;

        let events_emitted_total = IntCounter::new(
            "events_emitted_total",
            "Total number of events released by committed transactions",
        )?;
        registry.register(Box::new(events_emitted_total.clone()))?;

        let transaction_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "transaction_latency_seconds",
                "Transaction execution latency in seconds, lock wait included",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )?;
        registry.register(Box::new(transaction_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            transactions_committed_total,
            transactions_rejected_total,
            infrastructure_faults_total,
            events_emitted_total,
            transaction_latency_seconds,
        })
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
