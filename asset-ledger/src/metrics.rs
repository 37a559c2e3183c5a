//! Metrics collection for observability
//!
//! Each [`Metrics`] owns its own registry, so several ledgers can live in one
//! process.
//!
//! # Metrics
//!
//! - `ledger_operations_total{operation}` - Commands executed successfully
//! - `ledger_failures_total{operation,kind}` - Commands rejected, by error kind
//! - `ledger_operation_duration_seconds{operation}` - Command latency
//! - `ledger_journal_records_total` - Journal records written

use crate::error::ErrorKind;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Successful commands by operation
    pub operations_total: IntCounterVec,

    /// Failed commands by operation and error kind
    pub failures_total: IntCounterVec,

    /// Command latency
    pub operation_duration: HistogramVec,

    /// Journal records written
    pub journal_records_total: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let operations_total = IntCounterVec::new(
            Opts::new("ledger_operations_total", "Commands executed successfully"),
            &["operation"],
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let failures_total = IntCounterVec::new(
            Opts::new("ledger_failures_total", "Commands rejected, by error kind"),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(failures_total.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new("ledger_operation_duration_seconds", "Command latency")
                .buckets(vec![0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 1.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        let journal_records_total = IntCounter::new(
            "ledger_journal_records_total",
            "Journal records written",
        )?;
        registry.register(Box::new(journal_records_total.clone()))?;

        Ok(Self {
            operations_total,
            failures_total,
            operation_duration,
            journal_records_total,
            registry,
        })
    }

    /// Record a successful command
    pub fn record_success(&self, operation: &str, duration_seconds: f64, journaled: bool) {
        self.operations_total.with_label_values(&[operation]).inc();
        self.operation_duration
            .with_label_values(&[operation])
            .observe(duration_seconds);
        if journaled {
            self.journal_records_total.inc();
        }
    }

    /// Record a rejected command
    pub fn record_failure(&self, operation: &str, kind: ErrorKind, duration_seconds: f64) {
        self.failures_total
            .with_label_values(&[operation, kind.as_str()])
            .inc();
        self.operation_duration
            .with_label_values(&[operation])
            .observe(duration_seconds);
    }

    /// Successful count for one operation
    pub fn operations(&self, operation: &str) -> u64 {
        self.operations_total.with_label_values(&[operation]).get()
    }

    /// Failure count for one operation and kind
    pub fn failures(&self, operation: &str, kind: ErrorKind) -> u64 {
        self.failures_total
            .with_label_values(&[operation, kind.as_str()])
            .get()
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
