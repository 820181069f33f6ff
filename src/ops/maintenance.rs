use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::analytics::{OrderSnapshot, SkippedRecord};
use crate::domain::order::{changed_fields, check_lifecycle, repair_order, Order, OrderError, RepairPolicy};
use crate::metrics::Metrics;
use crate::store::{OrderFilter, OrderRepository, RepositoryError};
use crate::utils::{retry_on_transient, RetryConfig, RetryResult};

// ============================================================================
// Maintenance Runner
// ============================================================================
//
// Repair mode: synthesize missing/out-of-order timestamps and save changed
// orders, retrying transient save failures.
// Verify mode: no synthesis, no writes. Every order breaking the lifecycle
// invariants is reported.
//
// Each order gets its own RNG seeded from (run seed, order id), so the
// result does not depend on the order in which concurrent tasks finish.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceMode {
    Repair,
    Verify,
}

impl MaintenanceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceMode::Repair => "repair",
            MaintenanceMode::Verify => "verify",
        }
    }
}

impl fmt::Display for MaintenanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaintenanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "repair" => Ok(MaintenanceMode::Repair),
            "verify" | "strict" => Ok(MaintenanceMode::Verify),
            other => Err(format!("unknown maintenance mode '{other}' (expected repair or verify)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MaintenanceOptions {
    pub mode: MaintenanceMode,
    pub seed: u64,
    pub concurrency: usize,
    pub policy: RepairPolicy,
    pub retry: RetryConfig,
    pub filter: OrderFilter,
}

impl Default for MaintenanceOptions {
    fn default() -> Self {
        Self {
            mode: MaintenanceMode::Repair,
            seed: 42,
            concurrency: 8,
            policy: RepairPolicy::default(),
            retry: RetryConfig::default(),
            filter: OrderFilter::all(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairedOrder {
    pub id: i64,
    pub fields: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderProblem {
    pub id: i64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceReport {
    pub run_id: Uuid,
    pub mode: MaintenanceMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub scanned: usize,
    pub unchanged: usize,
    pub repaired: Vec<RepairedOrder>,
    pub violations: Vec<OrderProblem>,
    pub failed: Vec<OrderProblem>,
    pub skipped: Vec<SkippedRecord>,
}

impl MaintenanceReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.failed.is_empty()
    }
}

enum Outcome {
    Unchanged,
    Repaired(RepairedOrder),
    Violation(OrderProblem),
    Failed(OrderProblem),
}

pub struct MaintenanceRunner {
    repository: Arc<dyn OrderRepository>,
    metrics: Option<Arc<Metrics>>,
    options: MaintenanceOptions,
}

impl MaintenanceRunner {
    pub fn new(repository: Arc<dyn OrderRepository>, options: MaintenanceOptions) -> Self {
        Self {
            repository,
            metrics: None,
            options,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<MaintenanceReport, RepositoryError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let timer = Instant::now();
        let mode = self.options.mode;

        tracing::info!(
            run_id = %run_id,
            mode = %mode,
            seed = self.options.seed,
            concurrency = self.options.concurrency,
            "Starting maintenance run"
        );

        let loaded = match self.repository.load_orders(&self.options.filter).await {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!(run_id = %run_id, error = %e, "Failed to load orders");
                if let Some(metrics) = &self.metrics {
                    metrics.record_maintenance_run(mode.as_str(), "error", timer.elapsed().as_secs_f64(), Utc::now().timestamp());
                }
                return Err(e);
            }
        };

        let snapshot = OrderSnapshot::from_parts(loaded.records, loaded.rejected);
        let scanned = snapshot.orders().len();

        let outcomes: Vec<Outcome> = stream::iter(snapshot.orders().iter())
            .map(|order| self.process(order, now))
            .buffer_unordered(self.options.concurrency.max(1))
            .collect()
            .await;

        let mut report = MaintenanceReport {
            run_id,
            mode,
            started_at,
            finished_at: Utc::now(),
            scanned,
            unchanged: 0,
            repaired: Vec::new(),
            violations: Vec::new(),
            failed: Vec::new(),
            skipped: snapshot.skipped().to_vec(),
        };

        for outcome in outcomes {
            match outcome {
                Outcome::Unchanged => report.unchanged += 1,
                Outcome::Repaired(repaired) => report.repaired.push(repaired),
                Outcome::Violation(problem) => report.violations.push(problem),
                Outcome::Failed(problem) => report.failed.push(problem),
            }
        }
        report.repaired.sort_by_key(|r| r.id);
        report.violations.sort_by_key(|p| p.id);
        report.failed.sort_by_key(|p| p.id);

        if let Some(metrics) = &self.metrics {
            metrics.record_scanned(mode.as_str(), scanned);
            metrics.record_skipped(report.skipped.len());
            metrics.orders_repaired.inc_by(report.repaired.len() as u64);
            let outcome = if report.is_clean() { "ok" } else { "issues" };
            metrics.record_maintenance_run(
                mode.as_str(),
                outcome,
                timer.elapsed().as_secs_f64(),
                report.finished_at.timestamp(),
            );
        }

        tracing::info!(
            run_id = %run_id,
            mode = %mode,
            scanned = report.scanned,
            repaired = report.repaired.len(),
            unchanged = report.unchanged,
            violations = report.violations.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            duration_ms = timer.elapsed().as_millis() as u64,
            "Maintenance run finished"
        );

        Ok(report)
    }

    async fn process(&self, order: &Order, now: DateTime<Utc>) -> Outcome {
        match self.options.mode {
            MaintenanceMode::Verify => self.verify(order, now),
            MaintenanceMode::Repair => self.repair(order, now).await,
        }
    }

    fn verify(&self, order: &Order, now: DateTime<Utc>) -> Outcome {
        match check_lifecycle(order, now) {
            Ok(()) => Outcome::Unchanged,
            Err(error) => {
                if let (Some(metrics), OrderError::LifecycleViolation { violation, .. }) = (&self.metrics, &error) {
                    metrics.record_violation(violation.kind());
                }
                tracing::warn!(order_id = order.id, error = %error, "Lifecycle violation");
                Outcome::Violation(OrderProblem {
                    id: order.id,
                    reason: error.to_string(),
                })
            }
        }
    }

    async fn repair(&self, order: &Order, now: DateTime<Utc>) -> Outcome {
        let mut rng = StdRng::seed_from_u64(self.options.seed.wrapping_add(order.id as u64));
        let repaired = repair_order(order, now, &self.options.policy, &mut rng);

        let fields = changed_fields(order, &repaired);
        if fields.is_empty() {
            return Outcome::Unchanged;
        }

        let result = retry_on_transient(&self.options.retry, |_attempt| self.repository.save_order(&repaired)).await;
        let attempts = result.attempts();

        let failure = match &result {
            RetryResult::Success { .. } => None,
            RetryResult::Exhausted { .. } => Some("exhausted"),
            RetryResult::Permanent { .. } => Some("permanent"),
        };
        if let Some(metrics) = &self.metrics {
            metrics.record_save(attempts, failure);
        }

        match result.into_result() {
            Ok(()) => {
                tracing::debug!(order_id = order.id, fields = ?fields, attempts = attempts, "Order repaired");
                Outcome::Repaired(RepairedOrder { id: order.id, fields })
            }
            Err(error) => {
                tracing::error!(order_id = order.id, error = %error, attempts = attempts, "Failed to save repaired order");
                Outcome::Failed(OrderProblem {
                    id: order.id,
                    reason: error.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::Customer;
    use crate::domain::order::{OrderRecord, OrderStatus};
    use crate::store::{InMemoryOrderRepository, LoadedOrders};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn broken_orders() -> Vec<Order> {
        let placed = now() - Duration::days(30);

        let mut shipped = Order::new_pending(1, 1, placed).with_total(80.0);
        shipped.status = OrderStatus::Shipped;

        let mut future = Order::new_pending(2, 1, now() + Duration::days(3));
        future.status = OrderStatus::Pending;

        let fine = Order::new_pending(3, 2, placed);

        let mut delivered = Order::new_pending(4, 2, placed);
        delivered.status = OrderStatus::Delivered;
        delivered.processing_date = Some(placed + Duration::days(1));
        delivered.delivery_date = Some(now() + Duration::days(2));

        vec![shipped, future, fine, delivered]
    }

    fn options(mode: MaintenanceMode) -> MaintenanceOptions {
        MaintenanceOptions {
            mode,
            seed: 7,
            concurrency: 3,
            retry: RetryConfig::immediate(3),
            ..MaintenanceOptions::default()
        }
    }

    #[tokio::test]
    async fn test_repair_run_fixes_and_saves_orders() {
        let repo = Arc::new(InMemoryOrderRepository::from_orders(&broken_orders()));
        let metrics = Arc::new(Metrics::new().unwrap());
        let runner = MaintenanceRunner::new(repo.clone(), options(MaintenanceMode::Repair)).with_metrics(metrics.clone());

        let report = runner.run(now()).await.unwrap();

        assert_eq!(report.scanned, 4);
        assert_eq!(report.unchanged, 1);
        let ids: Vec<i64> = report.repaired.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
        assert!(report.is_clean());
        assert_eq!(metrics.orders_repaired.get(), 3);

        for record in repo.load_orders(&OrderFilter::all()).await.unwrap().records {
            let order = Order::try_from(record).unwrap();
            assert!(check_lifecycle(&order, now()).is_ok(), "order {} still broken", order.id);
        }

        // a second run has nothing left to do
        let again = runner.run(now()).await.unwrap();
        assert!(again.repaired.is_empty());
        assert_eq!(again.unchanged, 4);
    }

    #[tokio::test]
    async fn test_repair_is_independent_of_concurrency() {
        let run = |concurrency| async move {
            let repo = Arc::new(InMemoryOrderRepository::from_orders(&broken_orders()));
            let options = MaintenanceOptions {
                concurrency,
                ..options(MaintenanceMode::Repair)
            };
            MaintenanceRunner::new(repo.clone(), options).run(now()).await.unwrap();
            repo.load_orders(&OrderFilter::all()).await.unwrap().records
        };

        assert_eq!(run(1).await, run(8).await);
    }

    #[tokio::test]
    async fn test_verify_reports_without_writing() {
        let orders = broken_orders();
        let repo = Arc::new(InMemoryOrderRepository::from_orders(&orders));
        let runner = MaintenanceRunner::new(repo.clone(), options(MaintenanceMode::Verify));

        let report = runner.run(now()).await.unwrap();

        let ids: Vec<i64> = report.violations.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
        assert!(report.repaired.is_empty());
        assert!(!report.is_clean());
        assert_eq!(repo.get(1).await.unwrap(), OrderRecord::from(&orders[0]));
    }

    #[tokio::test]
    async fn test_malformed_records_are_skipped() {
        let mut bad = OrderRecord::from(&Order::new_pending(9, 1, now()));
        bad.order_date = None;
        let repo = Arc::new(InMemoryOrderRepository::new(vec![bad], Vec::<Customer>::new()));

        let report = MaintenanceRunner::new(repo, options(MaintenanceMode::Repair)).run(now()).await.unwrap();
        assert_eq!(report.scanned, 0);
        assert_eq!(report.skipped.len(), 1);
    }

    /// Fails the first `failures` saves with a transient error
    struct FlakyRepository {
        inner: InMemoryOrderRepository,
        failures: u32,
        calls: AtomicU32,
        transient: bool,
    }

    #[async_trait]
    impl OrderRepository for FlakyRepository {
        async fn load_orders(&self, filter: &OrderFilter) -> Result<LoadedOrders, RepositoryError> {
            self.inner.load_orders(filter).await
        }

        async fn save_order(&self, order: &Order) -> Result<(), RepositoryError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(if self.transient {
                    RepositoryError::Unavailable("connection reset".into())
                } else {
                    RepositoryError::Decode("constraint violated".into())
                });
            }
            self.inner.save_order(order).await
        }

        async fn load_customers(&self) -> Result<Vec<Customer>, RepositoryError> {
            self.inner.load_customers().await
        }
    }

    fn flaky(failures: u32, transient: bool) -> Arc<FlakyRepository> {
        Arc::new(FlakyRepository {
            inner: InMemoryOrderRepository::from_orders(&broken_orders()[..1]),
            failures,
            calls: AtomicU32::new(0),
            transient,
        })
    }

    #[tokio::test]
    async fn test_transient_save_failure_is_retried() {
        let repo = flaky(2, true);
        let metrics = Arc::new(Metrics::new().unwrap());
        let runner = MaintenanceRunner::new(repo.clone(), options(MaintenanceMode::Repair)).with_metrics(metrics.clone());

        let report = runner.run(now()).await.unwrap();

        assert_eq!(report.repaired.len(), 1);
        assert!(report.failed.is_empty());
        assert_eq!(repo.calls.load(Ordering::SeqCst), 3);
        assert_eq!(metrics.save_retries.get(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_and_permanent_failures_are_reported() {
        let report = MaintenanceRunner::new(flaky(10, true), options(MaintenanceMode::Repair))
            .run(now())
            .await
            .unwrap();
        assert_eq!(report.failed.len(), 1);
        assert!(report.repaired.is_empty());

        let repo = flaky(1, false);
        let report = MaintenanceRunner::new(repo.clone(), options(MaintenanceMode::Repair))
            .run(now())
            .await
            .unwrap();
        assert_eq!(report.failed[0].id, 1);
        assert_eq!(repo.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("repair".parse::<MaintenanceMode>(), Ok(MaintenanceMode::Repair));
        assert_eq!(" Verify ".parse::<MaintenanceMode>(), Ok(MaintenanceMode::Verify));
        assert_eq!("strict".parse::<MaintenanceMode>(), Ok(MaintenanceMode::Verify));
        assert!("fix".parse::<MaintenanceMode>().is_err());
    }
}
