use serde::Serialize;
use std::collections::HashSet;

use super::numeric::{ratio, serialize_money};
use crate::domain::order::Order;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub total_orders: usize,
    #[serde(serialize_with = "serialize_money")]
    pub total_revenue: f64,
    /// Distinct customers that placed an order in the snapshot
    pub total_customers: usize,
    #[serde(serialize_with = "serialize_money")]
    pub avg_order_value: f64,
}

pub fn compute_summary(orders: &[Order]) -> OrderSummary {
    let total_orders = orders.len();
    let total_revenue: f64 = orders.iter().map(Order::value).sum();
    let total_customers = orders
        .iter()
        .map(|order| order.customer_id)
        .collect::<HashSet<_>>()
        .len();

    OrderSummary {
        total_orders,
        total_revenue,
        total_customers,
        avg_order_value: ratio(total_revenue, total_orders as f64),
    }
}
