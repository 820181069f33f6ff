use chrono::{DateTime, Utc};
use std::time::Instant;

use crate::analytics::{DashboardOptions, DashboardReport, OrderSnapshot};
use crate::geo::CountryResolver;
use crate::metrics::Metrics;
use crate::store::{OrderFilter, OrderRepository, RepositoryError};

/// Load one snapshot of orders and customers and build the dashboard from it
pub async fn load_dashboard(
    repository: &dyn OrderRepository,
    resolver: &dyn CountryResolver,
    metrics: Option<&Metrics>,
    now: DateTime<Utc>,
    options: &DashboardOptions,
) -> Result<DashboardReport, RepositoryError> {
    let loaded = repository.load_orders(&OrderFilter::all()).await?;
    let customers = repository.load_customers().await?;

    let timer = Instant::now();
    let snapshot = OrderSnapshot::from_parts(loaded.records, loaded.rejected);
    let report = DashboardReport::build(&snapshot, &customers, resolver, now, options);

    if let Some(metrics) = metrics {
        metrics.record_skipped(snapshot.skipped_count());
        metrics.dashboard_build_duration.observe(timer.elapsed().as_secs_f64());
    }

    tracing::info!(
        orders = report.summary.total_orders,
        skipped = snapshot.skipped_count(),
        build_ms = timer.elapsed().as_millis() as u64,
        "Dashboard built"
    );

    Ok(report)
}
