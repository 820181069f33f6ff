use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::numeric::serialize_money;
use crate::domain::customer::{Customer, CustomerSegment};
use crate::domain::order::Order;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentStats {
    pub customers: usize,
    #[serde(serialize_with = "serialize_money")]
    pub lifetime_value: f64,
}

pub fn orders_by_customer(orders: &[Order]) -> HashMap<i64, Vec<&Order>> {
    let mut grouped: HashMap<i64, Vec<&Order>> = HashMap::new();
    for order in orders {
        grouped.entry(order.customer_id).or_default().push(order);
    }
    grouped
}

pub fn lifetime_value(orders: &[&Order]) -> f64 {
    orders.iter().map(|order| order.value()).sum()
}

/// Bucket every customer by lifetime value. All three segments are always
/// present; customers without orders land in `Low`.
pub fn segment_customers(
    customers: &[Customer],
    orders_by_customer: &HashMap<i64, Vec<&Order>>,
) -> BTreeMap<CustomerSegment, SegmentStats> {
    let mut segments: BTreeMap<CustomerSegment, SegmentStats> = CustomerSegment::ALL
        .into_iter()
        .map(|segment| (segment, SegmentStats::default()))
        .collect();

    for customer in customers {
        let value = orders_by_customer
            .get(&customer.id)
            .map(|orders| lifetime_value(orders))
            .unwrap_or(0.0);

        let stats = segments
            .entry(CustomerSegment::for_lifetime_value(value))
            .or_default();
        stats.customers += 1;
        stats.lifetime_value += value;
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn spend(customer_id: i64, totals: &[f64]) -> Vec<Order> {
        totals
            .iter()
            .enumerate()
            .map(|(i, total)| {
                Order::new_pending(customer_id * 100 + i as i64, customer_id, Utc::now()).with_total(*total)
            })
            .collect()
    }

    #[test]
    fn test_customers_are_segmented_by_lifetime_value() {
        let customers: Vec<Customer> = (1..=4).map(|id| Customer::new(id, Utc::now())).collect();
        let mut orders = spend(1, &[300.0, 200.0]);
        orders.extend(spend(2, &[199.99]));
        orders.extend(spend(3, &[200.0]));

        let grouped = orders_by_customer(&orders);
        let segments = segment_customers(&customers, &grouped);

        assert_eq!(segments[&CustomerSegment::High].customers, 1);
        assert_eq!(segments[&CustomerSegment::High].lifetime_value, 500.0);
        assert_eq!(segments[&CustomerSegment::Medium].customers, 1);
        // customer 4 has no orders
        assert_eq!(segments[&CustomerSegment::Low].customers, 2);
        assert_eq!(segments[&CustomerSegment::Low].lifetime_value, 199.99);
    }

    #[test]
    fn test_all_segments_reported_when_empty() {
        let segments = segment_customers(&[], &HashMap::new());
        assert_eq!(segments.len(), 3);
        assert!(segments.values().all(|s| s.customers == 0 && s.lifetime_value == 0.0));
    }
}
