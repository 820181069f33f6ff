use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::order::{apply_transition, Order, OrderError, OrderStatus};
use crate::metrics::Metrics;
use crate::store::{OrderFilter, OrderRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Order {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Load one order, move it to `new_status` and save it. `at` defaults to `now`.
pub async fn transition_order(
    repository: &dyn OrderRepository,
    metrics: Option<&Metrics>,
    order_id: i64,
    new_status: OrderStatus,
    at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Order, TransitionError> {
    let loaded = repository.load_orders(&OrderFilter::only(order_id)).await?;
    if let Some(skipped) = loaded.rejected.into_iter().next() {
        return Err(OrderError::MalformedOrder {
            id: Some(order_id),
            reason: skipped.reason,
        }
        .into());
    }
    let record = loaded
        .records
        .into_iter()
        .next()
        .ok_or(TransitionError::NotFound(order_id))?;
    let order = Order::try_from(record)?;

    let next = match apply_transition(&order, new_status, at, now) {
        Ok(next) => next,
        Err(error) => {
            if let (Some(metrics), OrderError::InvalidTransition { from, to }) = (metrics, &error) {
                metrics.record_rejected_transition(from.as_str(), to.as_str());
            }
            tracing::warn!(order_id = order_id, error = %error, "Transition rejected");
            return Err(error.into());
        }
    };

    repository.save_order(&next).await?;

    tracing::info!(
        order_id = order_id,
        from = %order.status,
        to = %next.status,
        "Order status updated"
    );

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryOrderRepository;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn repo() -> InMemoryOrderRepository {
        InMemoryOrderRepository::from_orders(&[Order::new_pending(1, 1, now() - Duration::days(2))])
    }

    #[tokio::test]
    async fn test_transition_is_persisted() {
        let repo = repo();
        let order = transition_order(&repo, None, 1, OrderStatus::Processing, None, now())
            .await
            .unwrap();
        assert_eq!(order.processing_date, Some(now()));

        let stored = Order::try_from(repo.get(1).await.unwrap()).unwrap();
        assert_eq!(stored.status, OrderStatus::Processing);
        assert_eq!(stored.processing_date, Some(now()));
    }

    #[tokio::test]
    async fn test_illegal_transition_is_rejected_and_counted() {
        let repo = repo();
        let metrics = Metrics::new().unwrap();

        let result = transition_order(&repo, Some(&metrics), 1, OrderStatus::Delivered, None, now()).await;

        assert!(matches!(
            result,
            Err(TransitionError::Order(OrderError::InvalidTransition { .. }))
        ));
        assert_eq!(
            metrics
                .transitions_rejected
                .with_label_values(&["pending", "delivered"])
                .get(),
            1
        );
        assert_eq!(repo.get(1).await.unwrap().status, "pending");
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let result = transition_order(&repo(), None, 42, OrderStatus::Cancelled, None, now()).await;
        assert!(matches!(result, Err(TransitionError::NotFound(42))));
    }

    #[tokio::test]
    async fn test_undecodable_order_is_malformed() {
        let path = std::env::temp_dir().join(format!("toystore-transition-{}.json", uuid::Uuid::new_v4()));
        let raw = serde_json::json!({
            "orders": [{ "id": 5, "customerId": 1, "status": "pending", "orderDate": "yesterday" }]
        });
        tokio::fs::write(&path, raw.to_string()).await.unwrap();
        let repo = InMemoryOrderRepository::from_json_file(&path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        let result = transition_order(&repo, None, 5, OrderStatus::Processing, None, now()).await;
        assert!(matches!(
            result,
            Err(TransitionError::Order(OrderError::MalformedOrder { id: Some(5), .. }))
        ));
    }
}
