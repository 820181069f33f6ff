mod server;

use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

pub use server::start_metrics_server;

// ============================================================================
// Metrics - Prometheus instrumentation
// ============================================================================
//
// Covers:
// - maintenance runs (orders scanned, repaired, violations found)
// - malformed records skipped while building snapshots
// - rejected status transitions
// - save retries and failures
// - dashboard build latency
//
// Scraped via /metrics (see `start_metrics_server`).
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Maintenance
    pub orders_scanned: IntCounterVec,
    pub orders_repaired: IntCounter,
    pub lifecycle_violations: IntCounterVec,
    pub maintenance_runs: IntCounterVec,
    pub maintenance_duration: HistogramVec,
    pub last_maintenance_run: IntGauge,

    // Snapshot / lifecycle
    pub records_skipped: IntCounter,
    pub transitions_rejected: IntCounterVec,

    // Persistence
    pub save_retries: IntCounter,
    pub save_failures: IntCounterVec,

    // Dashboard
    pub dashboard_build_duration: Histogram,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_scanned = IntCounterVec::new(
            Opts::new("orders_scanned_total", "Orders examined by maintenance runs"),
            &["mode"],
        )?;
        registry.register(Box::new(orders_scanned.clone()))?;

        let orders_repaired = IntCounter::new("orders_repaired_total", "Orders whose timestamps were repaired")?;
        registry.register(Box::new(orders_repaired.clone()))?;

        let lifecycle_violations = IntCounterVec::new(
            Opts::new("lifecycle_violations_total", "Lifecycle violations found in verify mode"),
            &["violation"],
        )?;
        registry.register(Box::new(lifecycle_violations.clone()))?;

        let maintenance_runs = IntCounterVec::new(
            Opts::new("maintenance_runs_total", "Completed maintenance runs"),
            &["mode", "outcome"],
        )?;
        registry.register(Box::new(maintenance_runs.clone()))?;

        let maintenance_duration = HistogramVec::new(
            HistogramOpts::new("maintenance_run_duration_seconds", "Maintenance run duration")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0]),
            &["mode"],
        )?;
        registry.register(Box::new(maintenance_duration.clone()))?;

        let last_maintenance_run = IntGauge::new(
            "maintenance_last_run_timestamp_seconds",
            "Unix time the last maintenance run finished",
        )?;
        registry.register(Box::new(last_maintenance_run.clone()))?;

        let records_skipped = IntCounter::new(
            "records_skipped_total",
            "Malformed order records left out of snapshots",
        )?;
        registry.register(Box::new(records_skipped.clone()))?;

        let transitions_rejected = IntCounterVec::new(
            Opts::new("transitions_rejected_total", "Status transitions rejected as illegal"),
            &["from", "to"],
        )?;
        registry.register(Box::new(transitions_rejected.clone()))?;

        let save_retries = IntCounter::new("order_save_retries_total", "Order save attempts beyond the first")?;
        registry.register(Box::new(save_retries.clone()))?;

        let save_failures = IntCounterVec::new(
            Opts::new("order_save_failures_total", "Order saves that did not succeed"),
            &["reason"],
        )?;
        registry.register(Box::new(save_failures.clone()))?;

        let dashboard_build_duration = Histogram::with_opts(
            HistogramOpts::new("dashboard_build_duration_seconds", "Time to build a dashboard report")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(dashboard_build_duration.clone()))?;

        Ok(Self {
            registry,
            orders_scanned,
            orders_repaired,
            lifecycle_violations,
            maintenance_runs,
            maintenance_duration,
            last_maintenance_run,
            records_skipped,
            transitions_rejected,
            save_retries,
            save_failures,
            dashboard_build_duration,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_scanned(&self, mode: &str, count: usize) {
        self.orders_scanned.with_label_values(&[mode]).inc_by(count as u64);
    }

    pub fn record_violation(&self, violation: &str) {
        self.lifecycle_violations.with_label_values(&[violation]).inc();
    }

    pub fn record_skipped(&self, count: usize) {
        self.records_skipped.inc_by(count as u64);
    }

    pub fn record_rejected_transition(&self, from: &str, to: &str) {
        self.transitions_rejected.with_label_values(&[from, to]).inc();
    }

    /// `attempts` includes the first try
    pub fn record_save(&self, attempts: u32, failure: Option<&str>) {
        self.save_retries.inc_by(attempts.saturating_sub(1) as u64);
        if let Some(reason) = failure {
            self.save_failures.with_label_values(&[reason]).inc();
        }
    }

    pub fn record_maintenance_run(&self, mode: &str, outcome: &str, duration_secs: f64, finished_at: i64) {
        self.maintenance_runs.with_label_values(&[mode, outcome]).inc();
        self.maintenance_duration.with_label_values(&[mode]).observe(duration_secs);
        self.last_maintenance_run.set(finished_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_value(metrics: &Metrics, name: &str) -> f64 {
        metrics
            .registry
            .gather()
            .iter()
            .find(|m| m.name() == name)
            .map(|m| m.metric.iter().map(|s| s.counter.value.unwrap_or(0.0)).sum())
            .unwrap_or(0.0)
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.orders_repaired.inc();
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_save_counts_retries_and_failures() {
        let metrics = Metrics::new().unwrap();
        metrics.record_save(1, None);
        metrics.record_save(3, None);
        metrics.record_save(2, Some("exhausted"));

        assert_eq!(counter_value(&metrics, "order_save_retries_total"), 3.0);
        assert_eq!(counter_value(&metrics, "order_save_failures_total"), 1.0);
    }

    #[test]
    fn test_record_rejected_transition() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rejected_transition("pending", "delivered");
        metrics.record_rejected_transition("delivered", "pending");
        metrics.record_rejected_transition("pending", "delivered");

        let gathered = metrics.registry.gather();
        let rejected = gathered.iter().find(|m| m.name() == "transitions_rejected_total").unwrap();
        assert_eq!(rejected.metric.len(), 2);
        assert_eq!(counter_value(&metrics, "transitions_rejected_total"), 3.0);
    }

    #[test]
    fn test_record_maintenance_run() {
        let metrics = Metrics::new().unwrap();
        metrics.record_scanned("repair", 12);
        metrics.record_maintenance_run("repair", "ok", 0.2, 1_700_000_000);

        assert_eq!(counter_value(&metrics, "orders_scanned_total"), 12.0);
        assert_eq!(metrics.last_maintenance_run.get(), 1_700_000_000);
    }
}
