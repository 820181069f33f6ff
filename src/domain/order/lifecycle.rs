use chrono::{DateTime, Utc};

use super::errors::{LifecycleViolation, OrderError};
use super::model::Order;
use super::value_objects::{LifecycleStage, OrderStatus};

// ============================================================================
// Order Lifecycle - status transitions and timestamp invariants
// ============================================================================
//
// Transitions:
//   pending -> processing -> shipped -> delivered
//   pending | processing | shipped -> cancelled
//
// Entering processing/shipped/delivered sets the matching timestamp when it
// is still empty. Set timestamps are never overwritten here.
//
// ============================================================================

/// Move an order to `new_status`, stamping the entered stage with `now`
pub fn derive_timestamps_on_transition(
    order: &Order,
    new_status: OrderStatus,
    now: DateTime<Utc>,
) -> Result<Order, OrderError> {
    apply_transition(order, new_status, None, now)
}

/// Move an order to `new_status`, stamping the entered stage with `at`
/// (or `now` when not supplied)
pub fn apply_transition(
    order: &Order,
    new_status: OrderStatus,
    at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Order, OrderError> {
    if !order.status.can_transition_to(new_status) {
        return Err(OrderError::InvalidTransition {
            from: order.status,
            to: new_status,
        });
    }

    let mut next = order.clone();
    next.status = new_status;

    let Some(stage) = LifecycleStage::entered_by(new_status) else {
        return Ok(next);
    };

    if let Some(existing) = order.stage_timestamp(stage) {
        tracing::debug!(
            order_id = order.id,
            stage = %stage,
            existing = %existing,
            "Stage timestamp already set, keeping it"
        );
        return Ok(next);
    }

    let stamp = match at {
        Some(at) => {
            let previous = latest_before(order, stage);
            if at < previous || at > now {
                return Err(OrderError::TimestampOutOfOrder {
                    stage,
                    at,
                    previous,
                    now,
                });
            }
            at
        }
        None => now,
    };

    next.set_stage_timestamp(stage, Some(stamp));

    tracing::debug!(
        order_id = order.id,
        from = %order.status,
        to = %new_status,
        stage = %stage,
        at = %stamp,
        "Order transitioned"
    );

    Ok(next)
}

/// Latest timestamp recorded before `stage`, starting from `order_date`
fn latest_before(order: &Order, stage: LifecycleStage) -> DateTime<Utc> {
    LifecycleStage::ALL
        .into_iter()
        .filter(|earlier| *earlier < stage)
        .filter_map(|earlier| order.stage_timestamp(earlier))
        .fold(order.order_date, |latest, at| latest.max(at))
}

/// Verify the lifecycle invariants. Reports the first rule broken.
pub fn check_lifecycle(order: &Order, now: DateTime<Utc>) -> Result<(), OrderError> {
    find_violation(order, now).map_or(Ok(()), |violation| {
        Err(OrderError::LifecycleViolation {
            id: order.id,
            violation,
        })
    })
}

fn find_violation(order: &Order, now: DateTime<Utc>) -> Option<LifecycleViolation> {
    if order.order_date > now {
        return Some(LifecycleViolation::OrderDateInFuture);
    }

    let required = order.required_stages();
    for stage in LifecycleStage::ALL {
        let present = order.stage_timestamp(stage).is_some();
        match (required.contains(&stage), present) {
            (true, false) => return Some(LifecycleViolation::MissingTimestamp(stage)),
            (false, true) => return Some(LifecycleViolation::UnexpectedTimestamp(stage)),
            _ => {}
        }
    }

    let mut previous = order.order_date;
    for stage in LifecycleStage::ALL {
        let Some(at) = order.stage_timestamp(stage) else {
            continue;
        };
        if at < previous {
            return Some(LifecycleViolation::OutOfOrder(stage));
        }
        if at > now {
            return Some(LifecycleViolation::InFuture(stage));
        }
        previous = at;
    }

    None
}

// ============================================================================
// Unit Tests
// ============================================================================
