use crate::domain::order::{Order, OrderError, OrderRecord};

pub use crate::domain::order::SkippedRecord;

// ============================================================================
// Order Snapshot - validated input for every aggregation
// ============================================================================

/// Immutable set of orders loaded in one go. Records that fail validation
/// are kept out of `orders` and counted.
#[derive(Debug, Clone, Default)]
pub struct OrderSnapshot {
    orders: Vec<Order>,
    skipped: Vec<SkippedRecord>,
}

impl OrderSnapshot {
    pub fn from_records(records: Vec<OrderRecord>) -> Self {
        Self::from_parts(records, Vec::new())
    }

    /// Builds from decoded records plus records the store could not decode
    pub fn from_parts(records: Vec<OrderRecord>, rejected: Vec<SkippedRecord>) -> Self {
        let mut orders = Vec::with_capacity(records.len());
        let mut skipped = rejected;

        for record in records {
            let id = record.id;
            match Order::try_from(record) {
                Ok(order) => orders.push(order),
                Err(error) => {
                    tracing::warn!(order_id = id, error = %error, "Skipping malformed order record");
                    let reason = match error {
                        OrderError::MalformedOrder { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    skipped.push(SkippedRecord { id: Some(id), reason });
                }
            }
        }

        if !skipped.is_empty() {
            tracing::info!(
                valid = orders.len(),
                skipped = skipped.len(),
                "Order snapshot built with skipped records"
            );
        }

        Self { orders, skipped }
    }

    pub fn from_orders(orders: Vec<Order>) -> Self {
        Self {
            orders,
            skipped: Vec::new(),
        }
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::RawAmount;
    use chrono::Utc;

    fn record(id: i64) -> OrderRecord {
        OrderRecord::from(&Order::new_pending(id, 1, Utc::now()).with_total(10.0))
    }

    #[test]
    fn test_malformed_records_are_skipped_and_counted() {
        let mut no_date = record(2);
        no_date.order_date = None;
        let mut bad_total = record(3);
        bad_total.total_amount = Some(RawAmount::Text("n/a".to_string()));

        let snapshot = OrderSnapshot::from_records(vec![record(1), no_date, bad_total, record(4)]);

        assert_eq!(snapshot.orders().len(), 2);
        assert_eq!(snapshot.skipped_count(), 2);
        assert_eq!(snapshot.skipped()[0].id, Some(2));
        assert_eq!(snapshot.skipped()[0].reason, "orderDate is missing");
    }

    #[test]
    fn test_rejected_records_count_as_skipped() {
        let rejected = vec![SkippedRecord {
            id: Some(9),
            reason: "invalid type: boolean `true`".to_string(),
        }];
        let snapshot = OrderSnapshot::from_parts(vec![record(1)], rejected);

        assert_eq!(snapshot.orders().len(), 1);
        assert_eq!(snapshot.skipped_count(), 1);
        assert_eq!(snapshot.skipped()[0].id, Some(9));
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = OrderSnapshot::from_records(Vec::new());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.skipped_count(), 0);
    }
}
