use chrono::{DateTime, Utc};

use super::value_objects::{LifecycleStage, OrderStatus};

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("{stage} {at} must not be before {previous} or after {now}")]
    TimestampOutOfOrder {
        stage: LifecycleStage,
        at: DateTime<Utc>,
        previous: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("Malformed order {id:?}: {reason}")]
    MalformedOrder { id: Option<i64>, reason: String },

    #[error("Order {id} violates lifecycle invariant: {violation}")]
    LifecycleViolation { id: i64, violation: LifecycleViolation },

    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}

/// The specific lifecycle rule an order breaks
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LifecycleViolation {
    #[error("orderDate is in the future")]
    OrderDateInFuture,

    #[error("{0} is required by the current status but missing")]
    MissingTimestamp(LifecycleStage),

    #[error("{0} is set but not implied by the current status")]
    UnexpectedTimestamp(LifecycleStage),

    #[error("{0} is earlier than the timestamp before it")]
    OutOfOrder(LifecycleStage),

    #[error("{0} is in the future")]
    InFuture(LifecycleStage),
}

impl LifecycleViolation {
    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleViolation::OrderDateInFuture => "order_date_in_future",
            LifecycleViolation::MissingTimestamp(_) => "missing_timestamp",
            LifecycleViolation::UnexpectedTimestamp(_) => "unexpected_timestamp",
            LifecycleViolation::OutOfOrder(_) => "out_of_order",
            LifecycleViolation::InFuture(_) => "in_future",
        }
    }
}
