use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::RwLock;

use super::repository::{LoadedOrders, OrderFilter, OrderRepository, RepositoryError};
use crate::domain::customer::Customer;
use crate::domain::order::{Order, OrderRecord, SkippedRecord};

/// On-disk JSON layout: `{ "orders": [...], "customers": [...] }`.
/// Orders stay untyped here so one bad entry does not sink the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub orders: Vec<serde_json::Value>,
    #[serde(default)]
    pub customers: Vec<Customer>,
}

/// Repository over records held in memory, optionally loaded from and
/// written back to a JSON snapshot file
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<BTreeMap<i64, OrderRecord>>,
    /// Entries that could not be decoded, kept verbatim for write-back
    rejected: Vec<(serde_json::Value, SkippedRecord)>,
    customers: RwLock<Vec<Customer>>,
}

impl InMemoryOrderRepository {
    pub fn new(records: Vec<OrderRecord>, customers: Vec<Customer>) -> Self {
        let orders = records.into_iter().map(|record| (record.id, record)).collect();
        Self {
            orders: RwLock::new(orders),
            rejected: Vec::new(),
            customers: RwLock::new(customers),
        }
    }

    pub fn from_orders(orders: &[Order]) -> Self {
        Self::new(orders.iter().map(OrderRecord::from).collect(), Vec::new())
    }

    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let file: SnapshotFile = serde_json::from_str(&raw)?;

        let mut records = Vec::with_capacity(file.orders.len());
        let mut rejected = Vec::new();
        for value in file.orders {
            match OrderRecord::decode(&value) {
                Ok(record) => records.push(record),
                Err(skipped) => {
                    tracing::warn!(
                        order_id = ?skipped.id,
                        reason = %skipped.reason,
                        "Could not decode order entry"
                    );
                    rejected.push((value, skipped));
                }
            }
        }

        tracing::info!(
            path = %path.display(),
            orders = records.len(),
            rejected = rejected.len(),
            customers = file.customers.len(),
            "Loaded order snapshot file"
        );

        let mut repository = Self::new(records, file.customers);
        repository.rejected = rejected;
        Ok(repository)
    }

    pub async fn write_json_file(&self, path: impl AsRef<Path>) -> Result<(), RepositoryError> {
        let path = path.as_ref();
        let mut orders = self
            .orders
            .read()
            .await
            .values()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        orders.extend(self.rejected.iter().map(|(value, _)| value.clone()));

        let file = SnapshotFile {
            orders,
            customers: self.customers.read().await.clone(),
        };
        let raw = serde_json::to_string_pretty(&file)?;
        tokio::fs::write(path, raw).await?;

        tracing::info!(path = %path.display(), orders = file.orders.len(), "Wrote order snapshot file");
        Ok(())
    }

    pub async fn get(&self, id: i64) -> Option<OrderRecord> {
        self.orders.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn load_orders(&self, filter: &OrderFilter) -> Result<LoadedOrders, RepositoryError> {
        let orders = self.orders.read().await;
        let records = orders
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();

        // undecodable entries only expose an id, so that is all a filter can test
        let rejected = self
            .rejected
            .iter()
            .filter(|(_, skipped)| filter.order_id.map_or(true, |id| skipped.id == Some(id)))
            .map(|(_, skipped)| skipped.clone())
            .collect();

        Ok(LoadedOrders { records, rejected })
    }

    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.write().await;
        let record = orders.get_mut(&order.id).ok_or(RepositoryError::NotFound(order.id))?;
        *record = OrderRecord::from(order);
        Ok(())
    }

    async fn load_customers(&self) -> Result<Vec<Customer>, RepositoryError> {
        Ok(self.customers.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use chrono::Utc;

    #[tokio::test]
    async fn test_save_replaces_existing_record() {
        let order = Order::new_pending(1, 1, Utc::now());
        let repo = InMemoryOrderRepository::from_orders(&[order.clone()]);

        let mut updated = order.clone();
        updated.status = OrderStatus::Cancelled;
        repo.save_order(&updated).await.unwrap();

        assert_eq!(repo.get(1).await.unwrap().status, "cancelled");
    }

    #[tokio::test]
    async fn test_save_unknown_order_fails() {
        let repo = InMemoryOrderRepository::default();
        let result = repo.save_order(&Order::new_pending(9, 1, Utc::now())).await;
        assert!(matches!(result, Err(RepositoryError::NotFound(9))));
    }

    #[tokio::test]
    async fn test_json_file_round_trip() {
        let path = std::env::temp_dir().join(format!("toystore-snapshot-{}.json", uuid::Uuid::new_v4()));
        let now = Utc::now();
        let repo = InMemoryOrderRepository::new(
            vec![OrderRecord::from(&Order::new_pending(3, 2, now).with_total(42.5))],
            vec![Customer::new(2, now).with_country("Barbados")],
        );

        repo.write_json_file(&path).await.unwrap();
        let loaded = InMemoryOrderRepository::from_json_file(&path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        let records = loaded.load_orders(&OrderFilter::all()).await.unwrap().records;
        assert_eq!(records.len(), 1);
        assert_eq!(Order::try_from(records[0].clone()).unwrap().value(), 42.5);
        assert_eq!(loaded.load_customers().await.unwrap()[0].country.as_deref(), Some("Barbados"));
    }

    #[tokio::test]
    async fn test_bad_entries_are_skipped_not_fatal() {
        let path = std::env::temp_dir().join(format!("toystore-snapshot-{}.json", uuid::Uuid::new_v4()));
        let raw = serde_json::json!({
            "orders": [
                { "id": 1, "customerId": 1, "status": "pending", "orderDate": "2024-01-10T00:00:00Z", "totalAmount": 20 },
                { "id": 2, "customerId": 1, "status": "pending", "orderDate": "not-a-date" },
                { "id": 3, "customerId": 2, "status": "pending", "orderDate": "2024-01-11T00:00:00Z", "totalAmount": true },
                {
                    "id": 4, "customerId": 2, "status": "shipped", "orderDate": "2024-01-12T00:00:00Z",
                    "lineItems": [{ "productId": 8, "quantity": 2, "unitPrice": "9.99", "lineTotal": "19.98" }]
                },
                "not an order"
            ],
            "customers": []
        });
        tokio::fs::write(&path, raw.to_string()).await.unwrap();

        let repo = InMemoryOrderRepository::from_json_file(&path).await.unwrap();
        let loaded = repo.load_orders(&OrderFilter::all()).await.unwrap();

        let ids: Vec<i64> = loaded.records.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(loaded.records[1].line_items[0].unit_price, 9.99);

        let rejected: Vec<Option<i64>> = loaded.rejected.iter().map(|skipped| skipped.id).collect();
        assert_eq!(rejected, vec![Some(2), Some(3), None]);

        let only = repo.load_orders(&OrderFilter::only(3)).await.unwrap();
        assert!(only.records.is_empty());
        assert_eq!(only.rejected.len(), 1);

        // undecodable entries survive a write-back untouched
        repo.write_json_file(&path).await.unwrap();
        let written: SnapshotFile =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        let _ = tokio::fs::remove_file(&path).await;
        assert_eq!(written.orders.len(), 5);
        assert!(written.orders.contains(&serde_json::json!("not an order")));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let result = InMemoryOrderRepository::from_json_file("/nonexistent/orders.json").await;
        assert!(matches!(result, Err(RepositoryError::Io(_))));
    }
}
