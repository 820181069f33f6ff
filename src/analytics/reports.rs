use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::numeric::{ratio, serialize_money};
use super::segments::{lifetime_value, orders_by_customer};
use crate::domain::customer::Customer;
use crate::domain::order::{Order, OrderStatus};

// ============================================================================
// Reports - flat per-customer and per-date-range views
// ============================================================================
//
// Unlike the dashboard these keep every row. Money follows the same policy:
// full precision inside, cents on the way out.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerReportRow {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub total_orders: usize,
    #[serde(serialize_with = "serialize_money")]
    pub total_spent: f64,
    pub last_order_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerReportSummary {
    pub total_customers: usize,
    #[serde(serialize_with = "serialize_money")]
    pub total_revenue: f64,
    #[serde(serialize_with = "serialize_money")]
    pub average_order_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerReport {
    pub customers: Vec<CustomerReportRow>,
    pub summary: CustomerReportSummary,
}

/// One row per known customer, by id, including customers with no orders.
/// Orders of customers missing from `customers` are left out.
pub fn customer_report(customers: &[Customer], orders: &[Order]) -> CustomerReport {
    let grouped = orders_by_customer(orders);

    let mut rows: Vec<CustomerReportRow> = customers
        .iter()
        .map(|customer| {
            let placed = grouped.get(&customer.id).map(Vec::as_slice).unwrap_or_default();
            CustomerReportRow {
                id: customer.id,
                name: customer.name.clone(),
                email: customer.email.clone(),
                total_orders: placed.len(),
                total_spent: lifetime_value(placed),
                last_order_date: placed.iter().map(|order| order.order_date).max(),
            }
        })
        .collect();
    rows.sort_by_key(|row| row.id);

    let total_revenue: f64 = rows.iter().map(|row| row.total_spent).sum();
    let total_orders: usize = rows.iter().map(|row| row.total_orders).sum();

    CustomerReport {
        summary: CustomerReportSummary {
            total_customers: rows.len(),
            total_revenue,
            average_order_value: ratio(total_revenue, total_orders as f64),
        },
        customers: rows,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRangeSummary {
    pub total_orders: usize,
    #[serde(serialize_with = "serialize_money")]
    pub total_revenue: f64,
    /// Count per status that occurs, in lifecycle order
    pub status_breakdown: BTreeMap<OrderStatus, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRangeReport {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Newest first
    pub orders: Vec<Order>,
    pub summary: OrderRangeSummary,
}

/// Orders placed within `[start, end]`. Either bound may be open.
pub fn order_range_report(
    orders: &[Order],
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> OrderRangeReport {
    let mut selected: Vec<Order> = orders
        .iter()
        .filter(|order| start.map_or(true, |start| order.order_date >= start))
        .filter(|order| end.map_or(true, |end| order.order_date <= end))
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));

    let mut status_breakdown = BTreeMap::new();
    for order in &selected {
        *status_breakdown.entry(order.status).or_insert(0) += 1;
    }

    OrderRangeReport {
        start,
        end,
        summary: OrderRangeSummary {
            total_orders: selected.len(),
            total_revenue: selected.iter().map(Order::value).sum(),
            status_breakdown,
        },
        orders: selected,
    }
}
