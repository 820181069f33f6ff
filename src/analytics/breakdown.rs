use serde::Serialize;
use std::collections::HashMap;

use super::numeric::{percentage, serialize_money, SHARE_DECIMALS};
use crate::domain::order::{Order, OrderStatus};

pub const UNCATEGORIZED: &str = "Uncategorized";

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusShare {
    pub status: OrderStatus,
    pub count: usize,
    #[serde(serialize_with = "serialize_money")]
    pub revenue: f64,
    pub percentage: f64,
}

/// One entry per status that occurs, in lifecycle order. Counts add up to
/// the number of orders.
pub fn status_breakdown(orders: &[Order]) -> Vec<StatusShare> {
    let mut totals: HashMap<OrderStatus, (usize, f64)> = HashMap::new();
    for order in orders {
        let entry = totals.entry(order.status).or_default();
        entry.0 += 1;
        entry.1 += order.value();
    }

    let total = orders.len() as f64;
    OrderStatus::ALL
        .into_iter()
        .filter_map(|status| {
            let (count, revenue) = totals.get(&status).copied()?;
            Some(StatusShare {
                status,
                count,
                revenue,
                percentage: percentage(count as f64, total, SHARE_DECIMALS),
            })
        })
        .collect()
}

// ============================================================================
// Category
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySales {
    pub category: String,
    pub units: u64,
    #[serde(serialize_with = "serialize_money")]
    pub revenue: f64,
    pub percentage: f64,
}

/// Line-item revenue per product category, highest revenue first
pub fn category_breakdown(orders: &[Order]) -> Vec<CategorySales> {
    let mut totals: HashMap<&str, (u64, f64)> = HashMap::new();
    for item in orders.iter().flat_map(|order| &order.line_items) {
        let category = item
            .category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .unwrap_or(UNCATEGORIZED);
        let entry = totals.entry(category).or_default();
        entry.0 += item.quantity as u64;
        entry.1 += item.line_total;
    }

    let line_revenue: f64 = totals.values().map(|(_, revenue)| revenue).sum();

    let mut categories: Vec<CategorySales> = totals
        .into_iter()
        .map(|(category, (units, revenue))| CategorySales {
            category: category.to_string(),
            units,
            revenue,
            percentage: percentage(revenue, line_revenue, SHARE_DECIMALS),
        })
        .collect();

    categories.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| a.category.cmp(&b.category))
    });
    categories
}

// ============================================================================
// Products
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: i64,
    pub product_name: Option<String>,
    pub units: u64,
    #[serde(serialize_with = "serialize_money")]
    pub revenue: f64,
}

/// Best sellers by units, then revenue
pub fn top_products(orders: &[Order], limit: usize) -> Vec<ProductSales> {
    let mut products: HashMap<i64, ProductSales> = HashMap::new();
    for item in orders.iter().flat_map(|order| &order.line_items) {
        let entry = products.entry(item.product_id).or_insert_with(|| ProductSales {
            product_id: item.product_id,
            product_name: None,
            units: 0,
            revenue: 0.0,
        });
        entry.units += item.quantity as u64;
        entry.revenue += item.line_total;
        if entry.product_name.is_none() {
            entry.product_name = item.product_name.clone();
        }
    }

    let mut products: Vec<ProductSales> = products.into_values().collect();
    products.sort_by(|a, b| {
        b.units
            .cmp(&a.units)
            .then_with(|| b.revenue.total_cmp(&a.revenue))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    products.truncate(limit);
    products
}

/// Newest orders first
pub fn recent_orders(orders: &[Order], limit: usize) -> Vec<Order> {
    let mut recent: Vec<&Order> = orders.iter().collect();
    recent.sort_by(|a, b| b.order_date.cmp(&a.order_date).then_with(|| b.id.cmp(&a.id)));
    recent.into_iter().take(limit).cloned().collect()
}
