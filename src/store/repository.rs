use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::customer::Customer;
use crate::domain::order::{Order, OrderRecord, OrderStatus, SkippedRecord};
use crate::utils::IsTransient;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Order {0} not found")]
    NotFound(i64),

    #[error("Could not decode stored data: {0}")]
    Decode(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepositoryError {
    pub fn is_transient(&self) -> bool {
        match self {
            RepositoryError::Database(error) => matches!(
                error,
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            RepositoryError::Unavailable(_) | RepositoryError::Io(_) => true,
            RepositoryError::NotFound(_) | RepositoryError::Decode(_) => false,
        }
    }
}

impl IsTransient for RepositoryError {
    fn is_transient(&self) -> bool {
        RepositoryError::is_transient(self)
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(error: serde_json::Error) -> Self {
        RepositoryError::Decode(error.to_string())
    }
}

/// Narrows `load_orders`. Empty filter loads everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub order_id: Option<i64>,
    pub statuses: Vec<OrderStatus>,
    pub placed_since: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the order date
    pub placed_until: Option<DateTime<Utc>>,
    pub customer_id: Option<i64>,
}

impl OrderFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only(order_id: i64) -> Self {
        Self {
            order_id: Some(order_id),
            ..Self::default()
        }
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = OrderStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn placed_since(mut self, since: DateTime<Utc>) -> Self {
        self.placed_since = Some(since);
        self
    }

    pub fn placed_until(mut self, until: DateTime<Utc>) -> Self {
        self.placed_until = Some(until);
        self
    }

    pub fn for_customer(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    /// Whether a raw record passes the filter. Records whose status or date
    /// cannot be read are kept so validation can report them.
    pub fn matches(&self, record: &OrderRecord) -> bool {
        if let Some(order_id) = self.order_id {
            if record.id != order_id {
                return false;
            }
        }

        if let Some(customer_id) = self.customer_id {
            if record.customer_id != customer_id {
                return false;
            }
        }

        if !self.statuses.is_empty() {
            if let Ok(status) = record.status.parse::<OrderStatus>() {
                if !self.statuses.contains(&status) {
                    return false;
                }
            }
        }

        let Some(order_date) = record.order_date else {
            return true;
        };
        self.placed_since.map_or(true, |since| order_date >= since)
            && self.placed_until.map_or(true, |until| order_date <= until)
    }
}

/// Result of one `load_orders` call: decoded records plus the ones the
/// store could not decode at all
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedOrders {
    pub records: Vec<OrderRecord>,
    pub rejected: Vec<SkippedRecord>,
}

impl LoadedOrders {
    pub fn new(records: Vec<OrderRecord>) -> Self {
        Self {
            records,
            rejected: Vec::new(),
        }
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Load every order record matching `filter` in one call
    async fn load_orders(&self, filter: &OrderFilter) -> Result<LoadedOrders, RepositoryError>;

    /// Persist status and lifecycle timestamps of an existing order
    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn load_customers(&self) -> Result<Vec<Customer>, RepositoryError>;
}
