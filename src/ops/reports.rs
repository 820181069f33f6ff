use chrono::{DateTime, Utc};

use crate::analytics::{customer_report, order_range_report, CustomerReport, OrderRangeReport, OrderSnapshot};
use crate::store::{OrderFilter, OrderRepository, RepositoryError};

pub async fn load_customer_report(repository: &dyn OrderRepository) -> Result<CustomerReport, RepositoryError> {
    let loaded = repository.load_orders(&OrderFilter::all()).await?;
    let customers = repository.load_customers().await?;
    let snapshot = OrderSnapshot::from_parts(loaded.records, loaded.rejected);

    let report = customer_report(&customers, snapshot.orders());
    tracing::info!(
        customers = report.summary.total_customers,
        skipped = snapshot.skipped_count(),
        "Customer report built"
    );
    Ok(report)
}

/// Orders placed within `[start, end]`; the date bounds are pushed down to the store
pub async fn load_order_report(
    repository: &dyn OrderRepository,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<OrderRangeReport, RepositoryError> {
    let mut filter = OrderFilter::all();
    filter.placed_since = start;
    filter.placed_until = end;

    let loaded = repository.load_orders(&filter).await?;
    let snapshot = OrderSnapshot::from_parts(loaded.records, loaded.rejected);

    let report = order_range_report(snapshot.orders(), start, end);
    tracing::info!(
        orders = report.summary.total_orders,
        skipped = snapshot.skipped_count(),
        "Order report built"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::Customer;
    use crate::domain::order::{Order, OrderRecord};
    use crate::store::InMemoryOrderRepository;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    fn repo() -> InMemoryOrderRepository {
        let orders = [
            Order::new_pending(1, 1, at(1)).with_total(10.0),
            Order::new_pending(2, 1, at(5)).with_total(20.0),
            Order::new_pending(3, 2, at(9)).with_total(30.0),
        ];
        InMemoryOrderRepository::new(
            orders.iter().map(OrderRecord::from).collect(),
            vec![Customer::new(1, at(1)), Customer::new(2, at(1))],
        )
    }

    #[tokio::test]
    async fn test_order_report_from_repository() {
        let report = load_order_report(&repo(), Some(at(5)), Some(at(9))).await.unwrap();

        let ids: Vec<i64> = report.orders.iter().map(|order| order.id).collect();
        assert_eq!(ids, vec![3, 2]);
        assert_eq!(report.summary.total_revenue, 50.0);

        let report = load_order_report(&repo(), None, Some(at(4))).await.unwrap();
        assert_eq!(report.summary.total_orders, 1);
    }

    #[tokio::test]
    async fn test_customer_report_from_repository() {
        let report = load_customer_report(&repo()).await.unwrap();

        assert_eq!(report.customers.len(), 2);
        assert_eq!(report.customers[0].total_orders, 2);
        assert_eq!(report.customers[0].total_spent, 30.0);
        assert_eq!(report.customers[1].last_order_date, Some(at(9)));
        assert_eq!(report.summary.average_order_value, 20.0);
    }
}
