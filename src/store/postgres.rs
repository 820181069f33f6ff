use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Duration;

use super::repository::{LoadedOrders, OrderFilter, OrderRepository, RepositoryError};
use crate::domain::customer::Customer;
use crate::domain::order::{DeliveryAddress, LineItem, Order, OrderRecord, RawAmount};

// ============================================================================
// Postgres Order Repository
// ============================================================================
//
// Tables: orders, order_items, products, customers.
// Amounts are read as text so malformed values reach validation instead of
// failing the whole query. `delivery_address` is a jsonb column.
//
// ============================================================================

const ORDER_COLUMNS: &str = "id, customer_id, status::text AS status, order_date, processing_date, \
     shipped_date, delivery_date, total_amount::text AS total_amount, tax_amount::text AS tax_amount, \
     shipping_cost::text AS shipping_cost, discount_amount::text AS discount_amount, \
     delivery_address::text AS delivery_address";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    customer_id: i64,
    status: String,
    order_date: Option<DateTime<Utc>>,
    processing_date: Option<DateTime<Utc>>,
    shipped_date: Option<DateTime<Utc>>,
    delivery_date: Option<DateTime<Utc>>,
    total_amount: Option<String>,
    tax_amount: Option<String>,
    shipping_cost: Option<String>,
    discount_amount: Option<String>,
    delivery_address: Option<String>,
}

#[derive(sqlx::FromRow)]
struct LineItemRow {
    order_id: i64,
    product_id: i64,
    quantity: i32,
    unit_price: f64,
    discount: Option<f64>,
    total_price: f64,
    product_name: Option<String>,
    category: Option<String>,
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i64,
    name: Option<String>,
    email: Option<String>,
    country: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<LineItemRow> for LineItem {
    fn from(row: LineItemRow) -> Self {
        LineItem {
            product_id: row.product_id,
            // negative quantities become 0 and are rejected by validation
            quantity: u32::try_from(row.quantity).unwrap_or(0),
            unit_price: row.unit_price,
            discount_percent: row.discount.unwrap_or(0.0),
            line_total: row.total_price,
            product_name: row.product_name,
            category: row.category,
        }
    }
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            email: row.email,
            country: row.country,
            created_at: row.created_at,
        }
    }
}

impl OrderRow {
    fn into_record(self, line_items: Vec<LineItem>) -> OrderRecord {
        let id = self.id;
        // an unreadable address is treated as absent
        let delivery_address = self.delivery_address.and_then(|raw| {
            serde_json::from_str::<DeliveryAddress>(&raw)
                .map_err(|e| {
                    tracing::warn!(order_id = id, error = %e, "Ignoring undecodable delivery address");
                })
                .ok()
        });

        OrderRecord {
            id,
            customer_id: self.customer_id,
            status: self.status,
            order_date: self.order_date,
            processing_date: self.processing_date,
            shipped_date: self.shipped_date,
            delivery_date: self.delivery_date,
            total_amount: self.total_amount.map(RawAmount::Text),
            tax_amount: self.tax_amount.map(RawAmount::Text),
            shipping_cost: self.shipping_cost.map(RawAmount::Text),
            discount_amount: self.discount_amount.map(RawAmount::Text),
            line_items,
            delivery_address,
        }
    }
}

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        tracing::info!(max_connections = max_connections, "Connected to Postgres");
        Ok(Self::new(pool))
    }

    async fn load_line_items(&self, order_ids: &[i64]) -> Result<HashMap<i64, Vec<LineItem>>, RepositoryError> {
        let rows = sqlx::query_as::<_, LineItemRow>(
            "SELECT oi.order_id, oi.product_id, oi.quantity,
                oi.unit_price::float8 AS unit_price,
                oi.discount::float8 AS discount,
                oi.total_price::float8 AS total_price,
                p.name AS product_name,
                p.category AS category
             FROM order_items oi
             LEFT JOIN products p ON p.id = oi.product_id
             WHERE oi.order_id = ANY($1)
             ORDER BY oi.order_id, oi.id",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<i64, Vec<LineItem>> = HashMap::new();
        for row in rows {
            items.entry(row.order_id).or_default().push(row.into());
        }
        Ok(items)
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn load_orders(&self, filter: &OrderFilter) -> Result<LoadedOrders, RepositoryError> {
        let statuses: Vec<String> = filter.statuses.iter().map(|s| s.as_str().to_string()).collect();

        let query = format!(
            "SELECT {ORDER_COLUMNS}
             FROM orders
             WHERE ($1::timestamptz IS NULL OR order_date IS NULL OR order_date >= $1)
               AND ($2::bigint IS NULL OR customer_id = $2)
               AND (cardinality($3::text[]) = 0 OR lower(status::text) = ANY($3))
               AND ($4::bigint IS NULL OR id = $4)
               AND ($5::timestamptz IS NULL OR order_date IS NULL OR order_date <= $5)
             ORDER BY id"
        );

        let rows = sqlx::query_as::<_, OrderRow>(&query)
            .bind(filter.placed_since)
            .bind(filter.customer_id)
            .bind(&statuses)
            .bind(filter.order_id)
            .bind(filter.placed_until)
            .fetch_all(&self.pool)
            .await?;

        let order_ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut items = self.load_line_items(&order_ids).await?;

        tracing::debug!(orders = rows.len(), "Loaded order records from Postgres");

        let records = rows
            .into_iter()
            .map(|row| {
                let line_items = items.remove(&row.id).unwrap_or_default();
                row.into_record(line_items)
            })
            .collect();
        Ok(LoadedOrders::new(records))
    }

    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders
             SET status = $2, order_date = $3, processing_date = $4,
                 shipped_date = $5, delivery_date = $6
             WHERE id = $1",
        )
        .bind(order.id)
        .bind(order.status.as_str())
        .bind(order.order_date)
        .bind(order.processing_date)
        .bind(order.shipped_date)
        .bind(order.delivery_date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(order.id));
        }
        Ok(())
    }

    async fn load_customers(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, email, country, created_at FROM customers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }
}
